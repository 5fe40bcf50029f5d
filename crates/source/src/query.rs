use chrono::{DateTime, TimeDelta, Utc};
use funnel_core::{DashboardError, DashboardResult, Session};
use serde::{Deserialize, Serialize};

/// Filter applied when fetching sessions. Bounds are landing timestamps in
/// milliseconds since epoch, both inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionQuery {
    pub since: Option<i64>,
    pub until: Option<i64>,
    pub utm_id: Option<String>,
    pub limit: Option<usize>,
}

impl SessionQuery {
    /// Sessions that landed within `days` before `now`, capped at `limit`.
    ///
    /// Fails with a `Config` error when the cutoff falls outside the
    /// representable date range.
    pub fn last_days(now: DateTime<Utc>, days: u32, limit: usize) -> DashboardResult<Self> {
        let cutoff = TimeDelta::try_days(i64::from(days))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                DashboardError::Config(format!(
                    "days_back {days} reaches past the supported date range"
                ))
            })?;
        Ok(Self {
            since: Some(cutoff.timestamp_millis()),
            until: None,
            utm_id: None,
            limit: Some(limit),
        })
    }

    /// Every session attributed to one campaign.
    pub fn for_campaign(utm_id: impl Into<String>) -> Self {
        Self {
            utm_id: Some(utm_id.into()),
            ..Default::default()
        }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            since: Some(start.timestamp_millis()),
            until: Some(end.timestamp_millis()),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, session: &Session) -> bool {
        let landing = session.timeline.landing;
        if self.since.is_some_and(|since| landing < since) {
            return false;
        }
        if self.until.is_some_and(|until| landing > until) {
            return false;
        }
        match &self.utm_id {
            Some(id) => session.utm_campaign_id.as_deref() == Some(id.as_str()),
            None => true,
        }
    }

    /// Filters `sessions`, orders them by landing (newest first) and applies
    /// the limit.
    pub fn apply(&self, mut sessions: Vec<Session>) -> Vec<Session> {
        sessions.retain(|s| self.matches(s));
        sessions.sort_by(|a, b| b.timeline.landing.cmp(&a.timeline.landing));
        if let Some(limit) = self.limit {
            sessions.truncate(limit);
        }
        sessions
    }
}
