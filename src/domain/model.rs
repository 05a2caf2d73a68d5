use crate::utils::error::{CalculationError, RatingError, Result};
use crate::utils::validation::{validate_range, Validate};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

pub const NAME: &str = "Name";
pub const TEAM: &str = "Team";
pub const SEASON: &str = "Season";
pub const IP: &str = "IP";
pub const SO: &str = "SO";
pub const BB: &str = "BB";
pub const HBP: &str = "HBP";
pub const HR: &str = "HR";
pub const TBF: &str = "TBF";
pub const K_PCT: &str = "K%";
pub const BB_PCT: &str = "BB%";
pub const RATING: &str = "Rating";

/// Earliest season the provider publishes.
pub const FIRST_SEASON: i32 = 1871;
pub const LAST_SEASON: i32 = 2100;

/// One untyped row as returned by the statistics provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.data.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field).filter(|v| !v.is_null())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Numeric value of a field, accepting numbers and numeric strings.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn season(&self) -> Option<i32> {
        self.number(SEASON)
            .filter(|s| s.fract() == 0.0)
            .map(|s| s as i32)
    }
}

/// The counting and rate stats the rating formula consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatLine {
    pub so: u64,
    pub bb: u64,
    pub hbp: u64,
    pub hr: u64,
    pub tbf: u64,
    pub k_pct: Option<f64>,
    pub bb_pct: Option<f64>,
}

impl StatLine {
    /// Validates the required columns of `record`. `row` is only used in error messages.
    pub fn from_record(record: &Record, row: usize) -> std::result::Result<Self, CalculationError> {
        Ok(Self {
            so: count(record, SO, row)?,
            bb: count(record, BB, row)?,
            hbp: count(record, HBP, row)?,
            hr: count(record, HR, row)?,
            tbf: count(record, TBF, row)?,
            k_pct: rate(record, K_PCT, row)?,
            bb_pct: rate(record, BB_PCT, row)?,
        })
    }
}

fn count(record: &Record, field: &str, row: usize) -> std::result::Result<u64, CalculationError> {
    let value = record
        .get(field)
        .ok_or_else(|| CalculationError::MissingField {
            field: field.to_string(),
            row,
        })?;

    let invalid = || CalculationError::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
        row,
    };

    if let Some(n) = value.as_u64() {
        return Ok(n);
    }

    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(invalid)?;

    // Providers sometimes emit counts as floats ("200.0").
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 {
        Ok(n as u64)
    } else {
        Err(invalid())
    }
}

fn rate(
    record: &Record,
    field: &str,
    row: usize,
) -> std::result::Result<Option<f64>, CalculationError> {
    let Some(value) = record.get(field) else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_percent(s),
        _ => None,
    };

    match parsed {
        Some(r) if r.is_finite() => Ok(Some(r)),
        _ => Err(CalculationError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
            row,
        }),
    }
}

/// Parses `"0.253"` as-is and `"25.3 %"` as a fraction.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    match trimmed.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok().map(|p| p / 100.0),
        None => trimmed.parse().ok(),
    }
}

/// Rows restricted to a fixed, ordered set of display columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultTable {
    pub fn select(
        records: &[Record],
        columns: &[&str],
    ) -> std::result::Result<Self, CalculationError> {
        let rows = records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                columns
                    .iter()
                    .map(|column| {
                        record.get(column).cloned().ok_or_else(|| {
                            CalculationError::MissingField {
                                field: column.to_string(),
                                row,
                            }
                        })
                    })
                    .collect()
            })
            .collect::<std::result::Result<Vec<Vec<Value>>, _>>()?;

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

// Array of records, keys in display-column order.
impl Serialize for ResultTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for values in &self.rows {
            seq.serialize_element(&RowRef {
                columns: &self.columns,
                values,
            })?;
        }
        seq.end()
    }
}

/// The three queries this tool answers; also names their output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SeasonPitchers,
    SeasonTeams,
    Seasons,
}

impl Operation {
    pub fn file_stem(&self) -> &'static str {
        match self {
            Operation::SeasonPitchers => "season_pitchers",
            Operation::SeasonTeams => "season_teams",
            Operation::Seasons => "seasons",
        }
    }
}

/// Inclusive range of seasons sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonSpan {
    pub start: i32,
    pub end: i32,
}

impl SeasonSpan {
    pub fn single(season: i32) -> Self {
        Self {
            start: season,
            end: season,
        }
    }

    pub fn through(season: i32, through: Option<i32>) -> Self {
        Self {
            start: season,
            end: through.unwrap_or(season),
        }
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }
}

impl Validate for SeasonSpan {
    fn validate(&self) -> Result<()> {
        validate_range("season", self.start, FIRST_SEASON, LAST_SEASON)?;
        validate_range("through", self.end, FIRST_SEASON, LAST_SEASON)?;
        if self.end < self.start {
            return Err(RatingError::InvalidConfigValue {
                field: "through".to_string(),
                value: self.end.to_string(),
                reason: format!("must not be earlier than {}", self.start),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitcherQuery {
    pub span: SeasonSpan,
    /// Minimum plate appearances; `None` means the provider's "qualified" default.
    pub min_qualifier: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamQuery {
    pub span: SeasonSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitcherParams {
    pub season: i32,
    pub through: Option<i32>,
    pub min_qualifier: Option<u32>,
    pub ascending: bool,
    pub limit: usize,
}

impl PitcherParams {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn query(&self) -> PitcherQuery {
        PitcherQuery {
            span: SeasonSpan::through(self.season, self.through),
            min_qualifier: self.min_qualifier,
        }
    }
}

impl Validate for PitcherParams {
    fn validate(&self) -> Result<()> {
        self.query().span.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamParams {
    pub season: i32,
    pub through: Option<i32>,
    pub ascending: bool,
    pub limit: usize,
}

impl TeamParams {
    pub const DEFAULT_LIMIT: usize = 30;

    pub fn query(&self) -> TeamQuery {
        TeamQuery {
            span: SeasonSpan::through(self.season, self.through),
        }
    }
}

impl Validate for TeamParams {
    fn validate(&self) -> Result<()> {
        self.query().span.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRange {
    pub start: i32,
    pub end: i32,
}

impl Validate for SeasonRange {
    fn validate(&self) -> Result<()> {
        validate_range("start", self.start, FIRST_SEASON, LAST_SEASON)?;
        validate_range("end", self.end, FIRST_SEASON, LAST_SEASON)?;
        if self.end < self.start {
            return Err(RatingError::InvalidConfigValue {
                field: "end".to_string(),
                value: self.end.to_string(),
                reason: format!("must not be earlier than start season {}", self.start),
            });
        }
        Ok(())
    }
}
