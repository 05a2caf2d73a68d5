use crate::app::presenter::{render_table, ChartRenderer, Exporter};
use crate::core::query::QueryService;
use crate::domain::model::{Operation, PitcherParams, ResultTable, SeasonRange, TeamParams};
use crate::domain::ports::{StatsProvider, Storage};
use crate::utils::error::{RatingError, Result, Stage};
use crate::utils::monitor::SystemMonitor;

/// One invocation: which query to run and what to do with the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Pitchers {
        params: PitcherParams,
        save: bool,
        chart: bool,
    },
    Teams {
        params: TeamParams,
        save: bool,
        chart: bool,
    },
    Seasons {
        range: SeasonRange,
        save: bool,
        chart: bool,
    },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Pitchers { .. } => Operation::SeasonPitchers,
            Request::Teams { .. } => Operation::SeasonTeams,
            Request::Seasons { .. } => Operation::Seasons,
        }
    }

    fn wants_save(&self) -> bool {
        match *self {
            Request::Pitchers { save, .. }
            | Request::Teams { save, .. }
            | Request::Seasons { save, .. } => save,
        }
    }

    fn wants_chart(&self) -> bool {
        match *self {
            Request::Pitchers { chart, .. }
            | Request::Teams { chart, .. }
            | Request::Seasons { chart, .. } => chart,
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub operation: Operation,
    pub table: ResultTable,
    pub saved: Vec<String>,
    pub chart: Option<String>,
}

/// Query, print, then optionally persist and chart the result.
pub struct RatingEngine<P: StatsProvider, S: Storage> {
    service: QueryService<P>,
    exporter: Exporter<S>,
    charts: ChartRenderer<S>,
    monitor: SystemMonitor,
}

impl<P: StatsProvider, S: Storage> RatingEngine<P, S> {
    pub fn new(service: QueryService<P>, exporter: Exporter<S>, charts: ChartRenderer<S>) -> Self {
        Self::new_with_monitoring(service, exporter, charts, false)
    }

    pub fn new_with_monitoring(
        service: QueryService<P>,
        exporter: Exporter<S>,
        charts: ChartRenderer<S>,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            service,
            exporter,
            charts,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// `timestamp` names the output files (`%Y%m%d_%H%M%S`).
    pub async fn run(&self, request: &Request, timestamp: &str) -> Result<RunSummary> {
        let operation = request.operation();
        tracing::info!("Running {}", operation.file_stem());
        self.monitor.log_stats("Start");

        let table = match request {
            Request::Pitchers { params, .. } => self.service.query_pitchers(params).await?,
            Request::Teams { params, .. } => self.service.query_teams(params).await?,
            Request::Seasons { range, .. } => self.service.query_league_seasons(range).await?,
        };
        tracing::info!("Rated {} rows", table.len());
        self.monitor.log_stats("Query");

        println!("{}", render_table(&table));

        let mut saved = Vec::new();
        if request.wants_save() {
            saved = self
                .exporter
                .save(operation, timestamp, &table)
                .await
                .map_err(|e| {
                    tracing::error!(stage = %Stage::Persist, "Could not save result: {}", e);
                    RatingError::from(e)
                })?;
            for path in &saved {
                println!("saved this result to {}", path);
            }
            self.monitor.log_stats("Export");
        }

        let mut chart = None;
        if request.wants_chart() {
            let path = self
                .charts
                .save(operation, timestamp, &table)
                .await
                .map_err(|e| {
                    tracing::error!(stage = %Stage::Chart, "Could not generate chart: {}", e);
                    RatingError::from(e)
                })?;
            println!("saved chart to {}", path);
            chart = Some(path);
            self.monitor.log_stats("Chart");
        }

        self.monitor.log_final_stats();

        Ok(RunSummary {
            operation,
            table,
            saved,
            chart,
        })
    }
}

/// Timestamp used in output file names.
pub fn file_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
