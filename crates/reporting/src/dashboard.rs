//! Dashboard aggregation — the full metric set for one session snapshot plus
//! the drill-down queries behind it.

use funnel_core::{Campaign, Dataset, Session, Stage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::behavior::{self, UserBehavior};
use crate::campaign_urls::{self, CampaignUrlMetrics, SessionSort, UrlSession};
use crate::funnel::{compute_funnel, FunnelStage};
use crate::percent;
use crate::rollup::{self, DeviceMetrics, GeoMetrics, UtmMetrics};
use crate::time_metrics::{extract_time_metrics, TimeMetrics, TimeMetricsSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub funnel_stages: Vec<FunnelStage>,
    pub time_metrics: Vec<TimeMetrics>,
    pub time_summary: TimeMetricsSummary,
    pub device_metrics: Vec<DeviceMetrics>,
    pub utm_metrics: Vec<UtmMetrics>,
    pub geo_metrics: Vec<GeoMetrics>,
    pub total_sessions: usize,
    pub total_conversions: usize,
    pub overall_conversion_rate: f64,
}

/// Read-only view over a session/campaign snapshot. Every call recomputes
/// from the borrowed collections; nothing is cached between calls.
#[derive(Debug, Clone, Copy)]
pub struct FunnelAnalytics<'a> {
    sessions: &'a [Session],
    campaigns: &'a [Campaign],
}

impl<'a> FunnelAnalytics<'a> {
    pub fn new(sessions: &'a [Session], campaigns: &'a [Campaign]) -> Self {
        Self {
            sessions,
            campaigns,
        }
    }

    pub fn from_dataset(dataset: &'a Dataset) -> Self {
        Self::new(&dataset.sessions, &dataset.campaigns)
    }

    pub fn report(&self) -> AnalyticsReport {
        let funnel_stages = compute_funnel(self.sessions);
        let total_sessions = self.sessions.len();
        let total_conversions = funnel_stages
            .get(Stage::PaymentSuccess.index())
            .map_or(0, |s| s.count);
        let time_metrics = extract_time_metrics(self.sessions);
        let time_summary = TimeMetricsSummary::from_metrics(&time_metrics);

        debug!(
            sessions = total_sessions,
            campaigns = self.campaigns.len(),
            conversions = total_conversions,
            timed = time_metrics.len(),
            "Computed funnel report"
        );

        AnalyticsReport {
            funnel_stages,
            time_metrics,
            time_summary,
            device_metrics: rollup::device_metrics(self.sessions),
            utm_metrics: rollup::utm_metrics(self.sessions, self.campaigns),
            geo_metrics: rollup::geo_metrics(self.sessions),
            total_sessions,
            total_conversions,
            overall_conversion_rate: percent(total_conversions, total_sessions),
        }
    }

    pub fn campaign_url_breakdown(&self, campaign_label: &str) -> Vec<CampaignUrlMetrics> {
        campaign_urls::campaign_url_breakdown(campaign_label, self.sessions, self.campaigns)
    }

    pub fn user_behavior(&self, session_id: &str) -> Option<UserBehavior> {
        behavior::user_behavior(session_id, self.sessions)
    }

    pub fn url_sessions(&self, url: &str, sort: SessionSort) -> Vec<UrlSession> {
        campaign_urls::url_sessions(url, self.sessions, self.campaigns, sort)
    }
}
