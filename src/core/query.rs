use crate::core::aggregate::aggregate_by_season;
use crate::core::rating::append_ratings;
use crate::domain::model::{
    PitcherParams, Record, ResultTable, SeasonRange, SeasonSpan, TeamParams, TeamQuery, BB, HBP,
    HR, IP, NAME, RATING, SEASON, SO, TBF, TEAM,
};
use crate::domain::ports::StatsProvider;
use crate::utils::error::{CalculationError, FetchError, Result, Stage};
use crate::utils::validation::Validate;
use std::cmp::Ordering;

pub const PITCHER_COLUMNS: [&str; 9] = [NAME, SEASON, TEAM, IP, SO, BB, HBP, HR, RATING];
pub const TEAM_COLUMNS: [&str; 8] = [TEAM, SEASON, IP, SO, BB, HBP, HR, RATING];
pub const SEASON_COLUMNS: [&str; 7] = [SEASON, SO, BB, HBP, HR, TBF, RATING];

/// Runs the three rating queries: fetch, (aggregate), rate, sort, select.
pub struct QueryService<P: StatsProvider> {
    provider: P,
}

impl<P: StatsProvider> QueryService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Pitchers for a season (or span), best first unless `ascending`.
    pub async fn query_pitchers(&self, params: &PitcherParams) -> Result<ResultTable> {
        params.validate()?;
        let query = params.query();

        tracing::debug!(
            "Fetching pitcher stats {}-{} (qualifier: {:?})",
            query.span.start,
            query.span.end,
            query.min_qualifier
        );
        let records = fetched(self.provider.pitching_stats(&query).await)?;
        tracing::debug!("Fetched {} pitcher rows", records.len());

        let rated = calculated(append_ratings(&records))?;
        let sorted = sort_by_rating(rated, params.ascending);
        let limited: Vec<Record> = sorted.into_iter().take(params.limit).collect();

        calculated(ResultTable::select(&limited, &PITCHER_COLUMNS))
    }

    /// Teams for a season (or span), best first unless `ascending`.
    pub async fn query_teams(&self, params: &TeamParams) -> Result<ResultTable> {
        params.validate()?;
        let query = params.query();

        tracing::debug!(
            "Fetching team stats {}-{}",
            query.span.start,
            query.span.end
        );
        let records = fetched(self.provider.team_pitching(&query).await)?;
        tracing::debug!("Fetched {} team rows", records.len());

        let rated = calculated(append_ratings(&records))?;
        let sorted = sort_by_rating(rated, params.ascending);
        let limited: Vec<Record> = sorted.into_iter().take(params.limit).collect();

        calculated(ResultTable::select(&limited, &TEAM_COLUMNS))
    }

    /// League-wide rating per season, ordered by season rather than rating.
    pub async fn query_league_seasons(&self, range: &SeasonRange) -> Result<ResultTable> {
        range.validate()?;
        let query = TeamQuery {
            span: SeasonSpan {
                start: range.start,
                end: range.end,
            },
        };

        tracing::debug!("Fetching team stats {}-{} for league totals", range.start, range.end);
        let records = fetched(self.provider.team_pitching(&query).await)?;
        tracing::debug!("Fetched {} team rows", records.len());

        let seasons = calculated(aggregate_by_season(&records))?;
        let mut rated = calculated(append_ratings(&seasons))?;
        rated.sort_by_key(|r| r.season());

        calculated(ResultTable::select(&rated, &SEASON_COLUMNS))
    }
}

/// Stable sort on `Rating`; ties keep provider order.
fn sort_by_rating(mut records: Vec<Record>, ascending: bool) -> Vec<Record> {
    let rating = |r: &Record| r.number(RATING).unwrap_or(f64::NAN);
    records.sort_by(|a, b| {
        let ord = rating(a).partial_cmp(&rating(b)).unwrap_or(Ordering::Equal);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    records
}

fn fetched<T>(result: std::result::Result<T, FetchError>) -> Result<T> {
    result.map_err(|e| {
        tracing::error!(stage = %Stage::Fetch, "Could not get data: {}", e);
        e.into()
    })
}

fn calculated<T>(result: std::result::Result<T, CalculationError>) -> Result<T> {
    result.map_err(|e| {
        tracing::error!(stage = %Stage::Calculation, "Could not compute rating: {}", e);
        e.into()
    })
}
