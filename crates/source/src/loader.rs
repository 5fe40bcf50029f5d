//! Dataset loader — fetches a snapshot from a session source, computes its
//! report once, and tracks whether the dashboard currently has usable data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use funnel_core::config::SourceConfig;
use funnel_core::{DashboardResult, Dataset};
use funnel_reporting::{AnalyticsReport, FunnelAnalytics};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::query::SessionQuery;
use crate::SessionSource;

/// One successfully fetched dataset and the report computed from it.
#[derive(Debug)]
pub struct Snapshot {
    pub dataset: Dataset,
    pub report: AnalyticsReport,
    pub last_updated: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(dataset: Dataset, last_updated: DateTime<Utc>) -> Self {
        let report = FunnelAnalytics::from_dataset(&dataset).report();
        Self {
            dataset,
            report,
            last_updated,
        }
    }

    /// Drill-down queries over this snapshot.
    pub fn analytics(&self) -> FunnelAnalytics<'_> {
        FunnelAnalytics::from_dataset(&self.dataset)
    }
}

#[derive(Debug, Clone)]
pub enum LoadState {
    /// No fetch has completed yet.
    Loading,
    Ready(Arc<Snapshot>),
    /// The latest fetch failed; no data is served until a refresh succeeds.
    Failed {
        message: String,
        failed_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct LoaderStatus {
    pub source: String,
    pub state: &'static str,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub sessions: usize,
    pub campaigns: usize,
}

pub struct DatasetLoader {
    source: Arc<dyn SessionSource>,
    days_back: u32,
    session_limit: usize,
    state: RwLock<LoadState>,
    /// Held for the whole fetch so refreshes apply in the order they start.
    refresh_lock: Mutex<()>,
}

impl DatasetLoader {
    pub fn new(source: Arc<dyn SessionSource>, config: &SourceConfig) -> Self {
        Self {
            source,
            days_back: config.days_back,
            session_limit: config.session_limit,
            state: RwLock::new(LoadState::Loading),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Fetches campaigns and sessions and replaces the current state.
    ///
    /// On failure the previous snapshot is dropped and the state becomes
    /// `Failed`, so callers never see stale data presented as current.
    /// Concurrent calls queue behind each other; each one fetches afresh.
    pub async fn refresh(&self) -> DashboardResult<Arc<Snapshot>> {
        let _guard = self.refresh_lock.lock().await;

        match self.fetch().await {
            Ok(dataset) => {
                let snapshot = Arc::new(Snapshot::new(dataset, Utc::now()));
                info!(
                    source = self.source.name(),
                    sessions = snapshot.dataset.sessions.len(),
                    campaigns = snapshot.dataset.campaigns.len(),
                    conversions = snapshot.report.total_conversions,
                    "Dataset refreshed"
                );
                metrics::counter!("dataset.refreshes", "outcome" => "ok").increment(1);
                metrics::gauge!("dataset.sessions")
                    .set(snapshot.dataset.sessions.len() as f64);
                *self.state.write() = LoadState::Ready(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                error!(source = self.source.name(), error = %e, "Dataset refresh failed");
                metrics::counter!("dataset.refreshes", "outcome" => "error").increment(1);
                *self.state.write() = LoadState::Failed {
                    message: e.to_string(),
                    failed_at: Utc::now(),
                };
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> DashboardResult<Dataset> {
        let query = SessionQuery::last_days(Utc::now(), self.days_back, self.session_limit)?;
        self.source.fetch_dataset(&query).await
    }

    pub fn state(&self) -> LoadState {
        self.state.read().clone()
    }

    /// Current snapshot, if the last fetch succeeded.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        match &*self.state.read() {
            LoadState::Ready(snapshot) => Some(snapshot.clone()),
            _ => None,
        }
    }

    pub fn status(&self) -> LoaderStatus {
        let source = self.source.name().to_string();
        match self.state() {
            LoadState::Loading => LoaderStatus {
                source,
                state: "loading",
                error: None,
                last_updated: None,
                sessions: 0,
                campaigns: 0,
            },
            LoadState::Ready(snapshot) => LoaderStatus {
                source,
                state: "ready",
                error: None,
                last_updated: Some(snapshot.last_updated),
                sessions: snapshot.dataset.sessions.len(),
                campaigns: snapshot.dataset.campaigns.len(),
            },
            LoadState::Failed { message, .. } => LoaderStatus {
                source,
                state: "failed",
                error: Some(message),
                last_updated: None,
                sessions: 0,
                campaigns: 0,
            },
        }
    }
}
