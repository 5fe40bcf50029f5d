//! Session sources — where the dashboard's sessions and UTM campaigns come
//! from, plus the loader that turns a fetch into a reportable snapshot.
//!
//! Sources are consumed as `Arc<dyn SessionSource>` so the loader and the
//! API do not care whether data comes from a file, memory or a remote store.

pub mod geo;
pub mod json_file;
pub mod loader;
pub mod memory;
pub mod query;
pub mod record;

use async_trait::async_trait;
use funnel_core::{Campaign, DashboardResult, Dataset, Session};

pub use geo::{BoundingBoxResolver, GeoLocation, GeoResolver};
pub use json_file::JsonFileSource;
pub use loader::{DatasetLoader, LoadState, LoaderStatus, Snapshot};
pub use memory::InMemorySource;
pub use query::SessionQuery;

/// A provider of tracked sessions and UTM campaign records.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Short identifier used in logs and status output.
    fn name(&self) -> &str;

    /// Campaign records, newest first.
    async fn fetch_campaigns(&self) -> DashboardResult<Vec<Campaign>>;

    /// Sessions matching `query`, most recent landing first.
    async fn fetch_sessions(&self, query: &SessionQuery) -> DashboardResult<Vec<Session>>;

    /// Campaigns and sessions for one snapshot. Sources that can read both
    /// collections from a single view of their store should override this.
    async fn fetch_dataset(&self, query: &SessionQuery) -> DashboardResult<Dataset> {
        let (campaigns, sessions) =
            tokio::try_join!(self.fetch_campaigns(), self.fetch_sessions(query))?;
        Ok(Dataset::new(sessions, campaigns))
    }
}

/// Keeps active campaigns (unless `active_only` is off) and orders them by
/// creation time, newest first.
pub fn select_campaigns(mut campaigns: Vec<Campaign>, active_only: bool) -> Vec<Campaign> {
    if active_only {
        campaigns.retain(|c| c.active);
    }
    campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    campaigns
}
