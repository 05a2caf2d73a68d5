use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Calculation,
    Persist,
    Chart,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Calculation => "calculation",
            Stage::Persist => "persist",
            Stage::Chart => "chart",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to statistics provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid provider URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("statistics provider returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("could not decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected provider response: {message}")]
    UnexpectedShape { message: String },
}

#[derive(Error, Debug)]
pub enum CalculationError {
    #[error("missing required column '{field}' in row {row}")]
    MissingField { field: String, row: usize },

    #[error("invalid value {value} for column '{field}' in row {row}")]
    InvalidField {
        field: String,
        value: String,
        row: usize,
    },

    #[error("row {row} has zero batters faced (TBF = 0)")]
    ZeroBattersFaced { row: usize },

    #[error("season {season} has zero batters faced (TBF = 0)")]
    ZeroBattersFacedSeason { season: i32 },
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("nothing to plot: result table is empty")]
    EmptyTable,

    #[error("drawing failed: {message}")]
    Draw { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum RatingError {
    #[error("could not get data: {0}")]
    Fetch(#[from] FetchError),

    #[error("could not compute rating: {0}")]
    Calculation(#[from] CalculationError),

    #[error("could not save result: {0}")]
    Persist(#[from] PersistError),

    #[error("could not generate chart: {0}")]
    Chart(#[from] ChartError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl RatingError {
    /// Stage that produced this error; `None` for configuration problems.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RatingError::Fetch(_) => Some(Stage::Fetch),
            RatingError::Calculation(_) => Some(Stage::Calculation),
            RatingError::Persist(_) => Some(Stage::Persist),
            RatingError::Chart(_) => Some(Stage::Chart),
            RatingError::Config { .. } | RatingError::InvalidConfigValue { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RatingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tags() {
        let err: RatingError = CalculationError::ZeroBattersFaced { row: 3 }.into();
        assert_eq!(err.stage(), Some(Stage::Calculation));
        assert_eq!(
            err.to_string(),
            "could not compute rating: row 3 has zero batters faced (TBF = 0)"
        );

        let err: RatingError = FetchError::Status {
            url: "http://x".to_string(),
            status: 503,
        }
        .into();
        assert_eq!(err.stage(), Some(Stage::Fetch));

        let err = RatingError::Config {
            message: "bad".to_string(),
        };
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Persist.to_string(), "persist");
        assert_eq!(Stage::Chart.to_string(), "chart");
    }
}
