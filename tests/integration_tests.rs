use httpmock::prelude::*;
use pitcher_rating::app::presenter::{ChartRenderer, ExportFormat, Exporter};
use pitcher_rating::domain::model::{PitcherParams, SeasonRange, TeamParams};
use pitcher_rating::{
    FanGraphsProvider, LocalStorage, ProviderOptions, QueryService, RatingEngine, RatingError,
    Request, ResponseCache, Stage,
};
use std::path::Path;
use tempfile::TempDir;

const PATH: &str = "/api/leaders/major-league/data";

fn provider(server: &MockServer, cache: Option<ResponseCache>) -> FanGraphsProvider {
    FanGraphsProvider::new(
        ProviderOptions {
            base_url: server.url(PATH),
            ..Default::default()
        },
        cache,
    )
    .unwrap()
}

fn engine(
    server: &MockServer,
    out: &Path,
    formats: Vec<ExportFormat>,
) -> RatingEngine<FanGraphsProvider, LocalStorage> {
    RatingEngine::new(
        QueryService::new(provider(server, None)),
        Exporter::new(
            LocalStorage::new(out.join(".output").to_str().unwrap()),
            formats,
        ),
        ChartRenderer::new(LocalStorage::new(out.join(".figures").to_str().unwrap())),
    )
}

fn pitchers_body() -> serde_json::Value {
    serde_json::json!({
        "data": [
            {
                "Name": "<a href=\"statss.aspx?playerid=1\">Sonny Gray</a>",
                "PlayerName": "Sonny Gray",
                "Team": "<a href=\"leaders.aspx?team=8\">MIN</a>",
                "TeamNameAbb": "MIN",
                "Season": 2023,
                "IP": 184.0, "SO": 183, "BB": 55, "HBP": 4, "HR": 8, "TBF": 759,
                "K%": 0.2411, "BB%": 0.0725
            },
            {
                "Name": "<a href=\"statss.aspx?playerid=2\">Jordan Lyles</a>",
                "PlayerName": "Jordan Lyles",
                "Team": "<a href=\"leaders.aspx?team=7\">KCR</a>",
                "TeamNameAbb": "KCR",
                "Season": 2023,
                "IP": 177.2, "SO": 120, "BB": 42, "HBP": 9, "HR": 39, "TBF": 766,
                "K%": 0.1567, "BB%": 0.0548
            }
        ],
        "totalCount": 2
    })
}

#[tokio::test]
async fn test_end_to_end_pitchers_with_real_http() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path(PATH)
            .query_param("season1", "2023")
            .query_param("season", "2023")
            .query_param("team", "0");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(pitchers_body());
    });

    let engine = engine(&server, temp_dir.path(), vec![ExportFormat::Json]);
    let request = Request::Pitchers {
        params: PitcherParams {
            season: 2023,
            through: None,
            min_qualifier: None,
            ascending: false,
            limit: 1,
        },
        save: true,
        chart: true,
    };

    let summary = engine.run(&request, "20231001_120000").await.unwrap();

    api_mock.assert();
    assert_eq!(summary.table.len(), 1);
    assert_eq!(
        summary.table.columns(),
        &["Name", "Season", "Team", "IP", "SO", "BB", "HBP", "HR", "Rating"]
    );
    assert_eq!(summary.table.rows()[0][0], "Sonny Gray");
    assert_eq!(summary.table.rows()[0][2], "MIN");

    let json_path = temp_dir
        .path()
        .join(".output")
        .join("season_pitchers_20231001_120000.json");
    let written = std::fs::read_to_string(&json_path).unwrap();
    assert!(written.contains("\n    {\n        \"Name\": \"Sonny Gray\","));
    let rows: Vec<serde_json::Value> = serde_json::from_str(&written).unwrap();
    assert_eq!(rows.len(), 1);

    let chart = std::fs::read(
        temp_dir
            .path()
            .join(".figures")
            .join("season_pitchers_20231001_120000.png"),
    )
    .unwrap();
    assert!(chart.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[tokio::test]
async fn test_end_to_end_league_seasons() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path(PATH)
            .query_param("season1", "2022")
            .query_param("season", "2023")
            .query_param("team", "0,ts");
        then.status(200).json_body(serde_json::json!({"data": [
            {"TeamName": "NYY", "Season": 2023, "IP": 1450.1, "SO": 1500, "BB": 500, "HBP": 60, "HR": 180, "TBF": 6100},
            {"TeamName": "BOS", "Season": 2022, "IP": 1440.0, "SO": 1300, "BB": 520, "HBP": 70, "HR": 190, "TBF": 6200},
            {"TeamName": "NYY", "Season": 2022, "IP": 1445.2, "SO": 1400, "BB": 450, "HBP": 55, "HR": 160, "TBF": 6000},
            {"TeamName": "BOS", "Season": 2023, "IP": 1438.0, "SO": 1350, "BB": 510, "HBP": 65, "HR": 200, "TBF": 6150}
        ]}));
    });

    let engine = engine(
        &server,
        temp_dir.path(),
        vec![ExportFormat::Json, ExportFormat::Csv],
    );
    let request = Request::Seasons {
        range: SeasonRange {
            start: 2022,
            end: 2023,
        },
        save: true,
        chart: true,
    };

    let summary = engine.run(&request, "20231001_120000").await.unwrap();

    api_mock.assert();
    assert_eq!(
        summary.table.columns(),
        &["Season", "SO", "BB", "HBP", "HR", "TBF", "Rating"]
    );
    assert_eq!(summary.table.rows()[0][0], 2022);
    assert_eq!(summary.table.rows()[0][1], 2700);
    assert_eq!(summary.table.rows()[0][5], 12200);
    assert_eq!(summary.table.rows()[1][0], 2023);
    assert_eq!(summary.saved.len(), 2);

    let csv = std::fs::read_to_string(
        temp_dir
            .path()
            .join(".output")
            .join("seasons_20231001_120000.csv"),
    )
    .unwrap();
    assert!(csv.starts_with("Season,SO,BB,HBP,HR,TBF,Rating\n2022,2700,970,125,350,12200,"));
}

#[tokio::test]
async fn test_teams_ascending() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PATH).query_param("team", "0,ts");
        then.status(200).json_body(serde_json::json!([
            {"TeamName": "ATL", "Season": 2023, "IP": 1450.0, "SO": 1550, "BB": 480, "HBP": 55, "HR": 170, "TBF": 6050},
            {"TeamName": "COL", "Season": 2023, "IP": 1410.0, "SO": 1100, "BB": 590, "HBP": 75, "HR": 230, "TBF": 6400}
        ]));
    });

    let engine = engine(&server, temp_dir.path(), vec![ExportFormat::Json]);
    let request = Request::Teams {
        params: TeamParams {
            season: 2023,
            through: None,
            ascending: true,
            limit: 30,
        },
        save: false,
        chart: false,
    };

    let summary = engine.run(&request, "20231001_120000").await.unwrap();
    assert_eq!(summary.table.len(), 2);
    assert_eq!(summary.table.rows()[0][0], "COL");
    assert!(!temp_dir.path().join(".output").exists());
}

#[tokio::test]
async fn test_provider_outage_is_fetch_error() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(500);
    });

    let engine = engine(&server, temp_dir.path(), vec![ExportFormat::Json]);
    let request = Request::Seasons {
        range: SeasonRange {
            start: 2020,
            end: 2021,
        },
        save: true,
        chart: false,
    };

    let err = engine.run(&request, "20231001_120000").await.unwrap_err();

    api_mock.assert();
    assert_eq!(err.stage(), Some(Stage::Fetch));
    assert!(err.to_string().starts_with("could not get data"));
    // No partial output on failure.
    assert!(!temp_dir.path().join(".output").exists());
}

#[tokio::test]
async fn test_zero_tbf_from_provider_is_calculation_error() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200).json_body(serde_json::json!([
            {"PlayerName": "Position Player", "Team": "OAK", "Season": 2023, "IP": 0.0,
             "SO": 0, "BB": 0, "HBP": 0, "HR": 0, "TBF": 0}
        ]));
    });

    let engine = engine(&server, temp_dir.path(), vec![ExportFormat::Json]);
    let request = Request::Pitchers {
        params: PitcherParams {
            season: 2023,
            through: None,
            min_qualifier: Some(0),
            ascending: false,
            limit: 20,
        },
        save: false,
        chart: false,
    };

    let err = engine.run(&request, "20231001_120000").await.unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Calculation));
    assert!(matches!(err, RatingError::Calculation(_)));
}

#[tokio::test]
async fn test_cached_provider_reuses_response_across_services() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200).json_body(pitchers_body());
    });
    let cache_dir = temp_dir.path().join(".cache");
    let cache = || {
        ResponseCache::new(
            LocalStorage::new(cache_dir.to_str().unwrap()),
            chrono::Duration::hours(24),
        )
    };
    let params = PitcherParams {
        season: 2023,
        through: None,
        min_qualifier: None,
        ascending: false,
        limit: 20,
    };

    let first = QueryService::new(provider(&server, Some(cache())))
        .query_pitchers(&params)
        .await
        .unwrap();
    let second = QueryService::new(provider(&server, Some(cache())))
        .query_pitchers(&params)
        .await
        .unwrap();

    api_mock.assert_hits(1);
    assert_eq!(first, second);
}
