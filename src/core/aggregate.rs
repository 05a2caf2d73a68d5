use crate::domain::model::{
    Record, StatLine, BB, BB_PCT, HBP, HR, K_PCT, SEASON, SO, TBF,
};
use crate::utils::error::CalculationError;
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Copy)]
struct SeasonTotals {
    so: u64,
    bb: u64,
    hbp: u64,
    hr: u64,
    tbf: u64,
}

impl SeasonTotals {
    fn add(&mut self, line: &StatLine) {
        self.so += line.so;
        self.bb += line.bb;
        self.hbp += line.hbp;
        self.hr += line.hr;
        self.tbf += line.tbf;
    }
}

/// Collapses team-season rows into one league row per distinct `Season`.
///
/// Counting stats are summed and `K%`/`BB%` recomputed from the sums. Output follows
/// first-encounter order of each season; callers sort.
pub fn aggregate_by_season(records: &[Record]) -> Result<Vec<Record>, CalculationError> {
    let mut order: Vec<i32> = Vec::new();
    let mut totals: HashMap<i32, SeasonTotals> = HashMap::new();

    for (row, record) in records.iter().enumerate() {
        let season = season_of(record, row)?;
        let line = StatLine::from_record(record, row)?;

        totals
            .entry(season)
            .or_insert_with(|| {
                order.push(season);
                SeasonTotals::default()
            })
            .add(&line);
    }

    order
        .into_iter()
        .map(|season| {
            let t = totals[&season];
            if t.tbf == 0 {
                return Err(CalculationError::ZeroBattersFacedSeason { season });
            }
            let tbf = t.tbf as f64;

            Ok(Record::new()
                .with(SEASON, season)
                .with(SO, t.so)
                .with(BB, t.bb)
                .with(HBP, t.hbp)
                .with(HR, t.hr)
                .with(TBF, t.tbf)
                .with(K_PCT, t.so as f64 / tbf)
                .with(BB_PCT, t.bb as f64 / tbf))
        })
        .collect()
}

fn season_of(record: &Record, row: usize) -> Result<i32, CalculationError> {
    match record.get(SEASON) {
        None => Err(CalculationError::MissingField {
            field: SEASON.to_string(),
            row,
        }),
        Some(value) => record.season().ok_or_else(|| CalculationError::InvalidField {
            field: SEASON.to_string(),
            value: value.to_string(),
            row,
        }),
    }
}
