// Adapters layer: concrete implementations of the domain ports (filesystem, HTTP provider, cache).

pub mod cache;
pub mod fangraphs;
pub mod storage;

pub use cache::ResponseCache;
pub use fangraphs::{FanGraphsProvider, ProviderOptions};
pub use storage::LocalStorage;
