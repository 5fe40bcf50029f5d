use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use funnel_core::{Campaign, DashboardError, DashboardResult, Dataset, Session};
use parking_lot::Mutex;

use crate::query::SessionQuery;
use crate::{select_campaigns, SessionSource};

/// Source serving a fixed in-process dataset. Useful for tests and for
/// embedding pre-fetched data; a failure can be injected to exercise the
/// loader's error path.
pub struct InMemorySource {
    dataset: Mutex<Dataset>,
    failure: Mutex<Option<String>>,
    fetches: AtomicU64,
}

impl InMemorySource {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Mutex::new(dataset),
            failure: Mutex::new(None),
            fetches: AtomicU64::new(0),
        }
    }

    /// Replaces the served dataset; the next fetch sees the new data.
    pub fn replace(&self, dataset: Dataset) {
        *self.dataset.lock() = dataset;
    }

    /// Makes every fetch fail with `message` until cleared with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock() = message.map(String::from);
    }

    /// Number of fetch calls served or failed so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    fn check(&self) -> DashboardResult<()> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        match self.failure.lock().as_ref() {
            Some(message) => Err(DashboardError::Source(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SessionSource for InMemorySource {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn fetch_campaigns(&self) -> DashboardResult<Vec<Campaign>> {
        self.check()?;
        let campaigns = self.dataset.lock().campaigns.clone();
        Ok(select_campaigns(campaigns, false))
    }

    async fn fetch_sessions(&self, query: &SessionQuery) -> DashboardResult<Vec<Session>> {
        self.check()?;
        let sessions = self.dataset.lock().sessions.clone();
        Ok(query.apply(sessions))
    }

    async fn fetch_dataset(&self, query: &SessionQuery) -> DashboardResult<Dataset> {
        self.check()?;
        let Dataset {
            sessions,
            campaigns,
        } = self.dataset.lock().clone();
        Ok(Dataset::new(
            query.apply(sessions),
            select_campaigns(campaigns, false),
        ))
    }
}
