//! Session source backed by a JSON export of the tracking and campaign
//! collections.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use funnel_core::config::SourceConfig;
use funnel_core::{Campaign, DashboardError, DashboardResult, Dataset, Session};
use tracing::{debug, warn};

use crate::geo::{BoundingBoxResolver, GeoResolver};
use crate::query::SessionQuery;
use crate::record::{DatasetFile, RawCampaignRecord, RawSessionRecord};
use crate::{select_campaigns, SessionSource};

pub struct JsonFileSource {
    path: PathBuf,
    active_campaigns_only: bool,
    geo: Option<Box<dyn GeoResolver>>,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active_campaigns_only: true,
            geo: Some(Box::new(BoundingBoxResolver)),
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        let source = Self::new(&config.data_path)
            .active_campaigns_only(config.active_campaigns_only);
        if config.enrich_geo {
            source
        } else {
            source.without_geo()
        }
    }

    pub fn active_campaigns_only(mut self, active_only: bool) -> Self {
        self.active_campaigns_only = active_only;
        self
    }

    pub fn with_geo(mut self, resolver: impl GeoResolver + 'static) -> Self {
        self.geo = Some(Box::new(resolver));
        self
    }

    pub fn without_geo(mut self) -> Self {
        self.geo = None;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> DashboardResult<DatasetFile> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DashboardError::Source(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let file: DatasetFile = serde_json::from_str(&raw)?;
        debug!(
            path = %self.path.display(),
            sessions = file.sessions.len(),
            campaigns = file.utm_urls.len(),
            "Read dataset file"
        );
        Ok(file)
    }

    fn campaigns(&self, records: Vec<RawCampaignRecord>) -> Vec<Campaign> {
        let campaigns = records.into_iter().map(Campaign::from).collect();
        select_campaigns(campaigns, self.active_campaigns_only)
    }

    fn sessions(&self, records: Vec<RawSessionRecord>, query: &SessionQuery) -> Vec<Session> {
        let fetched_at = Utc::now().timestamp_millis();

        let mut sessions = Vec::with_capacity(records.len());
        let mut rejected = 0u64;
        let mut out_of_order = 0u64;
        for record in records {
            let mut session = match record.into_session(fetched_at) {
                Ok(session) => session,
                Err(e) => {
                    warn!(error = %e, "Skipping tracking record");
                    rejected += 1;
                    continue;
                }
            };
            // Kept as-is; ordering problems are an upstream data issue.
            if let Err(e) = session.timeline.validate() {
                debug!(session_id = %session.session_id, error = %e, "Out-of-order timeline");
                out_of_order += 1;
            }
            if let Some(geo) = &self.geo {
                geo.enrich(&mut session);
            }
            sessions.push(session);
        }

        if rejected > 0 {
            metrics::counter!("source.records_rejected").increment(rejected);
        }
        if out_of_order > 0 {
            warn!(count = out_of_order, "Sessions with out-of-order timelines");
            metrics::counter!("source.timelines_out_of_order").increment(out_of_order);
        }

        query.apply(sessions)
    }
}

#[async_trait]
impl SessionSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn fetch_campaigns(&self) -> DashboardResult<Vec<Campaign>> {
        let file = self.read().await?;
        Ok(self.campaigns(file.utm_urls))
    }

    async fn fetch_sessions(&self, query: &SessionQuery) -> DashboardResult<Vec<Session>> {
        let file = self.read().await?;
        Ok(self.sessions(file.sessions, query))
    }

    /// Both collections from a single read, so a snapshot never mixes two
    /// versions of the file.
    async fn fetch_dataset(&self, query: &SessionQuery) -> DashboardResult<Dataset> {
        let file = self.read().await?;
        let campaigns = self.campaigns(file.utm_urls);
        let sessions = self.sessions(file.sessions, query);
        Ok(Dataset::new(sessions, campaigns))
    }
}
