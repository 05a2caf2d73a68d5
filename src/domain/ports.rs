use crate::domain::model::{PitcherQuery, Record, TeamQuery};
use crate::utils::error::FetchError;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = std::io::Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = std::io::Result<()>> + Send;
    /// Location of `path` as shown to the user.
    fn display_path(&self, path: &str) -> String;
}

/// Source of season pitching statistics.
///
/// Rows are untyped; callers validate the columns they need.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// One row per pitcher-season: `Name`, `Team`, `Season`, `IP`, `SO`, `BB`, `HBP`, `HR`,
    /// `TBF`, and usually `K%`/`BB%`.
    async fn pitching_stats(&self, query: &PitcherQuery) -> Result<Vec<Record>, FetchError>;

    /// One row per team-season: `Team`, `Season`, `IP`, `SO`, `BB`, `HBP`, `HR`, `TBF`.
    async fn team_pitching(&self, query: &TeamQuery) -> Result<Vec<Record>, FetchError>;
}
