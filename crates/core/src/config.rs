use serde::Deserialize;

use crate::error::{DashboardError, DashboardResult};

/// Root application configuration. Loaded from environment variables
/// with the prefix `FUNNEL_DASHBOARD__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Where sessions and campaigns come from and how much of them to load.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// JSON dataset holding `sessions` and `utm_urls` collections.
    #[serde(default = "default_data_path")]
    pub data_path: String,
    /// Only sessions that landed within this many days are loaded.
    #[serde(default = "default_days_back")]
    pub days_back: u32,
    /// Upper bound on sessions per fetch.
    #[serde(default = "default_session_limit")]
    pub session_limit: usize,
    #[serde(default = "default_active_campaigns_only")]
    pub active_campaigns_only: bool,
    /// Resolve country/city from raw coordinates when a record lacks them.
    #[serde(default = "default_enrich_geo")]
    pub enrich_geo: bool,
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_data_path() -> String {
    "data/analytics.json".to_string()
}
fn default_days_back() -> u32 {
    7
}
fn default_session_limit() -> usize {
    1000
}
fn default_active_campaigns_only() -> bool {
    true
}
fn default_enrich_geo() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            days_back: default_days_back(),
            session_limit: default_session_limit(),
            active_campaigns_only: default_active_campaigns_only(),
            enrich_geo: default_enrich_geo(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> DashboardResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("FUNNEL_DASHBOARD")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| DashboardError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.http_port, 8080);
        assert_eq!(config.source.days_back, 7);
        assert_eq!(config.source.session_limit, 1000);
        assert!(config.source.active_campaigns_only);
    }

    #[test]
    fn test_empty_sources_fall_back_to_defaults() {
        let config: AppConfig = config::Config::builder()
            .build()
            .and_then(|c| c.try_deserialize())
            .unwrap();
        assert_eq!(config.metrics.port, 9091);
        assert_eq!(config.source.data_path, "data/analytics.json");
    }
}
