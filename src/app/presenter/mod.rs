pub mod chart;
pub mod export;
pub mod table;

pub use chart::{ChartKind, ChartRenderer};
pub use export::{ExportFormat, Exporter};
pub use table::render_table;
