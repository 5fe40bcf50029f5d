//! Funnel reporting: turns a snapshot of tracked sessions and UTM campaigns
//! into funnel, timing, rollup and drill-down metrics.

pub mod behavior;
pub mod campaign_urls;
pub mod dashboard;
pub mod funnel;
pub mod rollup;
pub mod time_metrics;

pub use behavior::{DeviceInfo, StageTiming, UserBehavior};
pub use campaign_urls::{CampaignUrlMetrics, ConversionStatus, SessionSort, UrlSession};
pub use dashboard::{AnalyticsReport, FunnelAnalytics};
pub use funnel::FunnelStage;
pub use rollup::{DeviceMetrics, GeoMetrics, UtmMetrics};
pub use time_metrics::{TimeMetrics, TimeMetricsSummary};

/// `numerator / denominator * 100`, or 0 when the denominator is zero.
pub(crate) fn percent(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

#[cfg(test)]
pub(crate) mod test_support;
