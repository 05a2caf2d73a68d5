use crate::adapters::cache::ResponseCache;
use crate::domain::model::{
    parse_percent, PitcherQuery, Record, SeasonSpan, TeamQuery, BB_PCT, K_PCT, NAME, SEASON, TEAM,
};
use crate::domain::ports::StatsProvider;
use crate::utils::error::FetchError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.fangraphs.com/api/leaders/major-league/data";
pub const DEFAULT_USER_AGENT: &str = concat!("pitcher-rating/", env!("CARGO_PKG_VERSION"));

/// Large enough to return every row on a single page.
const PAGE_ITEMS: &str = "2000000000";

#[derive(Debug, Clone)]
pub struct ProviderOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leaderboard {
    Pitchers,
    Teams,
}

impl Leaderboard {
    fn cache_stem(&self) -> &'static str {
        match self {
            Leaderboard::Pitchers => "pitching",
            Leaderboard::Teams => "team_pitching",
        }
    }

    fn team_param(&self) -> &'static str {
        match self {
            Leaderboard::Pitchers => "0",
            Leaderboard::Teams => "0,ts",
        }
    }
}

/// `StatsProvider` backed by the FanGraphs leaderboard JSON API.
pub struct FanGraphsProvider {
    client: Client,
    options: ProviderOptions,
    cache: Option<ResponseCache>,
}

impl FanGraphsProvider {
    pub fn new(options: ProviderOptions, cache: Option<ResponseCache>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            options,
            cache,
        })
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    fn leaderboard_url(
        &self,
        board: Leaderboard,
        span: &SeasonSpan,
        qual: &str,
    ) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.options.base_url).map_err(|e| FetchError::InvalidUrl {
            url: self.options.base_url.clone(),
            reason: e.to_string(),
        })?;

        url.query_pairs_mut()
            .append_pair("age", "")
            .append_pair("pos", "all")
            .append_pair("stats", "pit")
            .append_pair("lg", "all")
            .append_pair("qual", qual)
            .append_pair("season", &span.end.to_string())
            .append_pair("season1", &span.start.to_string())
            .append_pair("startdate", "")
            .append_pair("enddate", "")
            .append_pair("month", "0")
            .append_pair("hand", "")
            .append_pair("team", board.team_param())
            .append_pair("pageitems", PAGE_ITEMS)
            .append_pair("pagenum", "1")
            .append_pair("ind", "1")
            .append_pair("rost", "0")
            .append_pair("players", "")
            .append_pair("type", "8")
            .append_pair("postseason", "")
            .append_pair("sortdir", "default")
            .append_pair("sortstat", "WAR");

        Ok(url)
    }

    async fn fetch_leaderboard(
        &self,
        board: Leaderboard,
        span: &SeasonSpan,
        qual: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let url = self.leaderboard_url(board, span, qual)?;
        let key = format!(
            "{}_{}_{}_{}.json",
            board.cache_stem(),
            span.start,
            span.end,
            qual
        );

        let body = match self.cached(&key, url.as_str()).await {
            Some(body) => body,
            None => {
                let body = self.request(&url).await?;
                if let Some(cache) = &self.cache {
                    cache.put(&key, url.as_str(), &body).await;
                }
                body
            }
        };

        parse_rows(body, span)
    }

    async fn cached(&self, key: &str, url: &str) -> Option<Value> {
        match &self.cache {
            Some(cache) => cache.get(key, url).await,
            None => None,
        }
    }

    async fn request(&self, url: &Url) -> Result<Value, FetchError> {
        tracing::debug!("Making provider request to: {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        tracing::debug!("Provider response status: {}", status);

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl StatsProvider for FanGraphsProvider {
    async fn pitching_stats(&self, query: &PitcherQuery) -> Result<Vec<Record>, FetchError> {
        let qual = query
            .min_qualifier
            .map(|q| q.to_string())
            .unwrap_or_else(|| "y".to_string());
        self.fetch_leaderboard(Leaderboard::Pitchers, &query.span, &qual)
            .await
    }

    async fn team_pitching(&self, query: &TeamQuery) -> Result<Vec<Record>, FetchError> {
        self.fetch_leaderboard(Leaderboard::Teams, &query.span, "0")
            .await
    }
}

/// Accepts `{"data": [...]}` or a bare array of row objects.
fn parse_rows(body: Value, span: &SeasonSpan) -> Result<Vec<Record>, FetchError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(FetchError::UnexpectedShape {
                    message: "response object has no 'data' array".to_string(),
                })
            }
        },
        other => {
            return Err(FetchError::UnexpectedShape {
                message: format!("expected an array or object, got {}", type_name(&other)),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(obj) => Ok(normalize_row(obj, span)),
            other => Err(FetchError::UnexpectedShape {
                message: format!("row {} is {}, not an object", i, type_name(&other)),
            }),
        })
        .collect()
}

fn normalize_row(obj: Map<String, Value>, span: &SeasonSpan) -> Record {
    let mut record = Record {
        data: obj.into_iter().collect(),
    };

    if let Some(name) = plain_text(&record, &["PlayerName", NAME]) {
        record.insert(NAME, name);
    }
    if let Some(team) = plain_text(&record, &["TeamNameAbb", "TeamName", TEAM]) {
        record.insert(TEAM, team);
    }
    if !record.contains(SEASON) && span.is_single() {
        record.insert(SEASON, span.start);
    }

    for field in [K_PCT, BB_PCT] {
        let parsed = match record.get(field) {
            Some(Value::String(raw)) => parse_percent(raw),
            _ => None,
        };
        if let Some(rate) = parsed {
            record.insert(field, rate);
        }
    }

    record
}

/// First of `fields` holding a string, with any HTML markup removed.
fn plain_text(record: &Record, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match record.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(strip_html(s)),
        _ => None,
    })
}

fn strip_html(raw: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let re = TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
    re.replace_all(raw, "").trim().to_string()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use httpmock::prelude::*;
    use serde_json::json;
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

    fn pitcher_query(start: i32, end: i32, qual: Option<u32>) -> PitcherQuery {
        PitcherQuery {
            span: SeasonSpan { start, end },
            min_qualifier: qual,
        }
    }

    #[tokio::test]
    async fn test_pitching_stats_request_and_normalization() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path(PATH)
                .query_param("stats", "pit")
                .query_param("season1", "2023")
                .query_param("season", "2023")
                .query_param("qual", "y")
                .query_param("team", "0")
                .query_param("ind", "1");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "data": [{
                        "Name": "<a href=\"statss.aspx?playerid=1\">Gerrit Cole</a>",
                        "PlayerName": "Gerrit Cole",
                        "Team": "<a href=\"leaders.aspx?team=9\">NYY</a>",
                        "IP": 209.0,
                        "SO": 222, "BB": 48, "HBP": 4, "HR": 20, "TBF": 821,
                        "K%": 0.2704, "BB%": 0.0585
                    }],
                    "totalCount": 1
                }));
        });

        let rows = provider(&server, None)
            .pitching_stats(&pitcher_query(2023, 2023, None))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text(NAME).as_deref(), Some("Gerrit Cole"));
        assert_eq!(rows[0].text(TEAM).as_deref(), Some("NYY"));
        assert_eq!(rows[0].season(), Some(2023));
        assert_eq!(rows[0].number(K_PCT), Some(0.2704));
    }

    #[tokio::test]
    async fn test_min_qualifier_and_span() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path(PATH)
                .query_param("qual", "50")
                .query_param("season1", "2020")
                .query_param("season", "2022");
            then.status(200).json_body(json!([
                {"Name": "A", "Team": "BOS", "Season": 2020, "SO": 1, "BB": 1, "HBP": 0, "HR": 0, "TBF": 10},
                {"Name": "A", "Team": "BOS", "Season": 2021, "SO": 2, "BB": 1, "HBP": 0, "HR": 0, "TBF": 12}
            ]));
        });

        let rows = provider(&server, None)
            .pitching_stats(&pitcher_query(2020, 2022, Some(50)))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].season(), Some(2021));
    }

    #[tokio::test]
    async fn test_team_pitching_uses_team_totals() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path(PATH).query_param("team", "0,ts");
            then.status(200).json_body(json!({"data": [
                {"TeamName": "NYY", "Team": "<a>NYY</a>", "Season": 2022, "K%": "24.1 %"}
            ]}));
        });

        let rows = provider(&server, None)
            .team_pitching(&TeamQuery {
                span: SeasonSpan::single(2022),
            })
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(rows[0].text(TEAM).as_deref(), Some("NYY"));
        assert!((rows[0].number(K_PCT).unwrap() - 0.241).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_error_status_is_fetch_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(PATH);
            then.status(503);
        });

        let err = provider(&server, None)
            .pitching_stats(&pitcher_query(2023, 2023, None))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_unexpected_shapes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(PATH);
            then.status(200).json_body(json!({"message": "rate limited"}));
        });

        let err = provider(&server, None)
            .pitching_stats(&pitcher_query(2023, 2023, None))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedShape { .. }));

        let span = SeasonSpan::single(2023);
        assert!(matches!(
            parse_rows(json!([1, 2]), &span),
            Err(FetchError::UnexpectedShape { .. })
        ));
        assert!(matches!(
            parse_rows(json!("text"), &span),
            Err(FetchError::UnexpectedShape { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(PATH);
            then.status(200).body("<html>maintenance</html>");
        });

        let err = provider(&server, None)
            .team_pitching(&TeamQuery {
                span: SeasonSpan::single(2023),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_queries() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path(PATH);
            then.status(200).json_body(json!({"data": [{"Team": "SEA", "Season": 2023}]}));
        });
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(
            LocalStorage::new(dir.path().to_str().unwrap()),
            chrono::Duration::hours(1),
        );
        let provider = provider(&server, Some(cache));
        let query = TeamQuery {
            span: SeasonSpan::single(2023),
        };

        let first = provider.team_pitching(&query).await.unwrap();
        let second = provider.team_pitching(&query).await.unwrap();

        api_mock.assert_hits(1);
        assert_eq!(first, second);
        assert!(dir.path().join("team_pitching_2023_2023_0.json").exists());
    }

    #[tokio::test]
    async fn test_without_cache_every_query_hits_provider() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path(PATH);
            then.status(200).json_body(json!([]));
        });
        let provider = provider(&server, None);
        let query = pitcher_query(2023, 2023, None);

        provider.pitching_stats(&query).await.unwrap();
        provider.pitching_stats(&query).await.unwrap();

        assert!(!provider.cache_enabled());
        api_mock.assert_hits(2);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<a href=\"x\">Max Fried</a>"), "Max Fried");
        assert_eq!(strip_html("ATL"), "ATL");
    }

    #[test]
    fn test_season_filled_only_for_single_season() {
        let obj = json!({"Team": "ATL"}).as_object().unwrap().clone();
        let record = normalize_row(obj.clone(), &SeasonSpan::single(2019));
        assert_eq!(record.season(), Some(2019));

        let record = normalize_row(obj, &SeasonSpan { start: 2019, end: 2020 });
        assert_eq!(record.season(), None);
    }
}
