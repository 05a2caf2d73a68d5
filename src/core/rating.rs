//! Composite pitcher rating.
//!
//! Four component scores, each clamped to `[0, 2.375]`, are summed and scaled by `100 / 6`.
//! The constants below are the whole formula and must not be tuned.

use crate::domain::model::{Record, StatLine, RATING};
use crate::utils::error::CalculationError;

/// Baseline strikeout rate; the strikeout term is zero at or below it.
pub const STRIKEOUT_BASELINE: f64 = 0.10;
pub const STRIKEOUT_WEIGHT: f64 = 8.0;
pub const WALK_WEIGHT: f64 = 12.0;
pub const HBP_WEIGHT: f64 = 12.0;
pub const HOME_RUN_WEIGHT: f64 = 52.0;

pub const TERM_MIN: f64 = 0.0;
pub const TERM_MAX: f64 = 2.375;

/// Fixed scaling divisor; not `4 * TERM_MAX`.
pub const SCALE_DIVISOR: f64 = 6.0;

/// Highest rating the formula can produce: every term at `TERM_MAX`.
pub const MAX_RATING: f64 = 4.0 * TERM_MAX / SCALE_DIVISOR * 100.0;

/// The four clamped component scores of a rating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingTerms {
    pub strikeout: f64,
    pub walk: f64,
    pub hbp: f64,
    pub home_run: f64,
}

impl RatingTerms {
    pub fn rating(&self) -> f64 {
        (self.strikeout + self.walk + self.hbp + self.home_run) / SCALE_DIVISOR * 100.0
    }
}

fn clamp(term: f64) -> f64 {
    if term < TERM_MIN {
        TERM_MIN
    } else if term > TERM_MAX {
        TERM_MAX
    } else {
        term
    }
}

/// Component scores for one stat line. `row` only labels errors.
///
/// `K%`/`BB%` come from the line when the provider supplied them and are
/// derived as `SO/TBF` and `BB/TBF` otherwise.
pub fn rating_terms(line: &StatLine, row: usize) -> Result<RatingTerms, CalculationError> {
    if line.tbf == 0 {
        return Err(CalculationError::ZeroBattersFaced { row });
    }
    let tbf = line.tbf as f64;

    let k_pct = line.k_pct.unwrap_or(line.so as f64 / tbf);
    let bb_pct = line.bb_pct.unwrap_or(line.bb as f64 / tbf);

    Ok(RatingTerms {
        strikeout: clamp((k_pct - STRIKEOUT_BASELINE) * STRIKEOUT_WEIGHT),
        walk: clamp(TERM_MAX - bb_pct * WALK_WEIGHT),
        hbp: clamp(TERM_MAX - line.hbp as f64 / tbf * HBP_WEIGHT),
        home_run: clamp(TERM_MAX - line.hr as f64 / tbf * HOME_RUN_WEIGHT),
    })
}

pub fn calculate_rating(line: &StatLine, row: usize) -> Result<f64, CalculationError> {
    rating_terms(line, row).map(|terms| terms.rating())
}

/// Returns a copy of `records` with a `Rating` column appended to every row.
///
/// Fails on the first row with a missing or malformed required column or with `TBF == 0`.
pub fn append_ratings(records: &[Record]) -> Result<Vec<Record>, CalculationError> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let line = StatLine::from_record(record, row)?;
            let rating = calculate_rating(&line, row)?;
            let mut rated = record.clone();
            rated.insert(RATING, rating);
            Ok(rated)
        })
        .collect()
}
