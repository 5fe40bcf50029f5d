//! Dashboard REST API endpoints: the report and its drill-down queries.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use funnel_reporting::rollup::utm_metrics_by_conversions;
use funnel_reporting::{
    AnalyticsReport, CampaignUrlMetrics, FunnelStage, SessionSort, UrlSession, UserBehavior,
    UtmMetrics,
};
use serde::{Deserialize, Serialize};

use crate::rest::{ApiError, AppState};

#[derive(Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub report: AnalyticsReport,
    pub last_updated: DateTime<Utc>,
}

/// GET /v1/dashboard — Full report for the current snapshot.
pub async fn handle_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let snapshot = state.snapshot()?;
    metrics::counter!("api.dashboard").increment(1);
    Ok(Json(DashboardResponse {
        report: snapshot.report.clone(),
        last_updated: snapshot.last_updated,
    }))
}

/// GET /v1/funnel — The six funnel stages.
pub async fn handle_funnel(
    State(state): State<AppState>,
) -> Result<Json<Vec<FunnelStage>>, ApiError> {
    let snapshot = state.snapshot()?;
    Ok(Json(snapshot.report.funnel_stages.clone()))
}

/// GET /v1/campaigns — Campaign table, most conversions first.
pub async fn handle_campaigns(
    State(state): State<AppState>,
) -> Result<Json<Vec<UtmMetrics>>, ApiError> {
    let snapshot = state.snapshot()?;
    Ok(Json(utm_metrics_by_conversions(
        snapshot.report.utm_metrics.clone(),
    )))
}

/// GET /v1/campaigns/:label/urls — Per-URL breakdown for a campaign label.
/// Unknown labels yield an empty list.
pub async fn handle_campaign_urls(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<Json<Vec<CampaignUrlMetrics>>, ApiError> {
    let snapshot = state.snapshot()?;
    metrics::counter!("api.campaign_urls").increment(1);
    Ok(Json(snapshot.analytics().campaign_url_breakdown(&label)))
}

#[derive(Debug, Deserialize)]
pub struct UrlSessionsParams {
    pub url: String,
    #[serde(default)]
    pub sort: SessionSort,
}

/// GET /v1/urls/sessions?url=..&sort=duration|conversion — Sessions behind a URL.
pub async fn handle_url_sessions(
    State(state): State<AppState>,
    Query(params): Query<UrlSessionsParams>,
) -> Result<Json<Vec<UrlSession>>, ApiError> {
    let snapshot = state.snapshot()?;
    Ok(Json(
        snapshot.analytics().url_sessions(&params.url, params.sort),
    ))
}

/// GET /v1/sessions/:session_id/behavior — Stage timeline for one session.
pub async fn handle_user_behavior(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<UserBehavior>, ApiError> {
    let snapshot = state.snapshot()?;
    metrics::counter!("api.user_behavior").increment(1);
    snapshot
        .analytics()
        .user_behavior(&session_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no session with id '{session_id}'")))
}
