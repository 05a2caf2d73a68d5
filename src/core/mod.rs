pub mod aggregate;
pub mod engine;
pub mod query;
pub mod rating;

pub use crate::domain::model::{Record, ResultTable};
pub use crate::domain::ports::{StatsProvider, Storage};
pub use crate::utils::error::Result;
