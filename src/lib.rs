pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::Cli;

pub use adapters::{FanGraphsProvider, LocalStorage, ProviderOptions, ResponseCache};
pub use config::Settings;
pub use core::{
    aggregate::aggregate_by_season,
    engine::{RatingEngine, Request, RunSummary},
    query::QueryService,
    rating::{append_ratings, calculate_rating},
};
pub use utils::error::{RatingError, Result, Stage};
