//! Campaign drill-down: per-URL performance for one campaign label, and the
//! sessions behind a single URL.

use std::collections::BTreeMap;

use funnel_core::types::{DIRECT_LABEL, DIRECT_TRAFFIC_URL};
use funnel_core::{Campaign, Session, Stage};
use serde::{Deserialize, Serialize};

use crate::percent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignUrlMetrics {
    pub url: String,
    pub sessions: usize,
    pub conversions: usize,
    pub conversion_rate: f64,
    /// Mean landing-to-last-activity span, in minutes.
    pub avg_session_time: f64,
    /// Share of sessions that never started the form.
    pub bounce_rate: f64,
}

/// Synthetic URL a session arrived through.
pub fn session_url(session: &Session, campaigns: &[Campaign]) -> String {
    session
        .utm_campaign_id
        .as_deref()
        .and_then(|id| campaigns.iter().find(|c| c.utm_id == id))
        .map(Campaign::url)
        .unwrap_or_else(|| DIRECT_TRAFFIC_URL.to_string())
}

/// First campaign whose source and name both occur in `label`.
pub fn resolve_label<'a>(label: &str, campaigns: &'a [Campaign]) -> Option<&'a Campaign> {
    campaigns.iter().find(|c| c.matches_label(label))
}

/// Per-URL metrics for the campaign named by a dashboard label.
///
/// `"Direct"` selects sessions without a campaign. Any other label that
/// matches no campaign yields an empty list, as does a campaign with no
/// sessions.
pub fn campaign_url_breakdown(
    label: &str,
    sessions: &[Session],
    campaigns: &[Campaign],
) -> Vec<CampaignUrlMetrics> {
    let resolved = resolve_label(label, campaigns);
    if resolved.is_none() && label != DIRECT_LABEL {
        return Vec::new();
    }

    let mut groups: BTreeMap<String, Vec<&Session>> = BTreeMap::new();
    for session in sessions {
        let belongs = match resolved {
            Some(campaign) => {
                session.utm_campaign_id.as_deref() == Some(campaign.utm_id.as_str())
            }
            None => session.utm_campaign_id.is_none(),
        };
        if belongs {
            groups
                .entry(session_url(session, campaigns))
                .or_default()
                .push(session);
        }
    }

    groups
        .into_iter()
        .map(|(url, members)| url_metrics(url, &members))
        .collect()
}

fn url_metrics(url: String, members: &[&Session]) -> CampaignUrlMetrics {
    let sessions = members.len();
    let conversions = members.iter().filter(|s| s.is_converted()).count();
    let bounces = members
        .iter()
        .filter(|s| !s.timeline.reached(Stage::FormStart))
        .count();
    let total_minutes: f64 = members.iter().map(|s| s.timeline.duration_minutes()).sum();

    CampaignUrlMetrics {
        url,
        sessions,
        conversions,
        conversion_rate: percent(conversions, sessions),
        avg_session_time: if sessions == 0 {
            0.0
        } else {
            total_minutes / sessions as f64
        },
        bounce_rate: percent(bounces, sessions),
    }
}

/// Furthest checkpoint a session reached, as shown in user lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    LandedOnly,
    FormStarted,
    FormFilled,
    UnderReview,
    PaymentStarted,
    Converted,
}

impl ConversionStatus {
    pub fn of(session: &Session) -> Self {
        match session.timeline.furthest_stage() {
            Stage::Landing => Self::LandedOnly,
            Stage::FormStart => Self::FormStarted,
            Stage::FormFilled => Self::FormFilled,
            Stage::UnderReview => Self::UnderReview,
            Stage::PaymentStarted => Self::PaymentStarted,
            Stage::PaymentSuccess => Self::Converted,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LandedOnly => "Landed Only",
            Self::FormStarted => "Form Started",
            Self::FormFilled => "Form Filled",
            Self::UnderReview => "Under Review",
            Self::PaymentStarted => "Payment Started",
            Self::Converted => "Converted",
        }
    }
}

/// Ordering for the sessions behind a campaign URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSort {
    /// Longest sessions first.
    #[default]
    Duration,
    /// Converted sessions first, otherwise input order.
    Conversion,
}

/// One row of a URL's user list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlSession {
    pub session_id: String,
    pub landed_at: i64,
    pub device_type: String,
    pub location: String,
    pub duration_minutes: f64,
    pub status: ConversionStatus,
    pub status_label: String,
}

impl UrlSession {
    fn from_session(session: &Session) -> Self {
        let status = ConversionStatus::of(session);
        Self {
            session_id: session.session_id.clone(),
            landed_at: session.timeline.landing,
            device_type: session.device_type.clone(),
            location: session.location_label(),
            duration_minutes: session.timeline.duration_minutes(),
            status,
            status_label: status.label().to_string(),
        }
    }
}

/// Sessions that arrived through `url`; `"Direct Traffic"` selects sessions
/// without a campaign.
pub fn url_sessions(
    url: &str,
    sessions: &[Session],
    campaigns: &[Campaign],
    sort: SessionSort,
) -> Vec<UrlSession> {
    let mut rows: Vec<UrlSession> = sessions
        .iter()
        .filter(|s| {
            if url == DIRECT_TRAFFIC_URL {
                return s.utm_campaign_id.is_none();
            }
            s.utm_campaign_id
                .as_deref()
                .and_then(|id| campaigns.iter().find(|c| c.utm_id == id))
                .is_some_and(|c| c.url() == url)
        })
        .map(UrlSession::from_session)
        .collect();

    match sort {
        SessionSort::Duration => {
            rows.sort_by(|a, b| b.duration_minutes.total_cmp(&a.duration_minutes))
        }
        SessionSort::Conversion => rows.sort_by_key(|r| r.status != ConversionStatus::Converted),
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn fixture() -> (Vec<Session>, Vec<Campaign>) {
        let campaigns = vec![
            campaign("utm-1", "google", "summer", "cpc"),
            campaign("utm-2", "google", "summer", "display"),
            campaign("utm-3", "facebook", "launch", "social"),
        ];
        let sessions = vec![
            with_campaign(through(session("a"), Stage::PaymentSuccess), "utm-1"),
            with_campaign(session("b"), "utm-1"),
            with_campaign(through(session("c"), Stage::FormStart), "utm-2"),
            with_campaign(through(session("d"), Stage::UnderReview), "utm-3"),
            session("e"),
            through(session("f"), Stage::PaymentSuccess),
        ];
        (sessions, campaigns)
    }

    #[test]
    fn test_breakdown_for_first_matching_campaign() {
        let (sessions, campaigns) = fixture();
        let urls = campaign_url_breakdown("google - summer", &sessions, &campaigns);
        // resolution stops at utm-1; utm-2 shares the label but is not included
        assert_eq!(urls.len(), 1);
        let url = &urls[0];
        assert_eq!(url.url, "google.com/summer-cpc");
        assert_eq!(url.sessions, 2);
        assert_eq!(url.conversions, 1);
        assert!((url.conversion_rate - 50.0).abs() < 1e-9);
        assert!((url.bounce_rate - 50.0).abs() < 1e-9);
        // 50 minutes and 0 minutes
        assert!((url.avg_session_time - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_direct_breakdown() {
        let (sessions, campaigns) = fixture();
        let urls = campaign_url_breakdown("Direct", &sessions, &campaigns);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].url, "Direct Traffic");
        assert_eq!(urls[0].sessions, 2);
        assert_eq!(urls[0].conversions, 1);
    }

    #[test]
    fn test_unknown_label_is_empty() {
        let (sessions, campaigns) = fixture();
        // direct sessions exist, but an unrecognised label does not fall back to them
        assert!(
            campaign_url_breakdown("nonexistent - campaign", &sessions, &campaigns).is_empty()
        );
        assert!(campaign_url_breakdown("google - summer", &[], &campaigns).is_empty());
    }

    #[test]
    fn test_conversion_status() {
        assert_eq!(ConversionStatus::of(&session("x")), ConversionStatus::LandedOnly);
        let s = through(session("y"), Stage::UnderReview);
        assert_eq!(ConversionStatus::of(&s), ConversionStatus::UnderReview);
        assert_eq!(ConversionStatus::of(&s).label(), "Under Review");
    }

    #[test]
    fn test_url_sessions_sorted_by_duration() {
        let (sessions, campaigns) = fixture();
        let rows = url_sessions(
            "google.com/summer-cpc",
            &sessions,
            &campaigns,
            SessionSort::Duration,
        );
        let ids: Vec<_> = rows.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(rows[0].status, ConversionStatus::Converted);
    }

    #[test]
    fn test_url_sessions_direct_converted_first() {
        let (sessions, campaigns) = fixture();
        let rows = url_sessions(
            "Direct Traffic",
            &sessions,
            &campaigns,
            SessionSort::Conversion,
        );
        let ids: Vec<_> = rows.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, vec!["f", "e"]);
        assert_eq!(rows[1].location, "Unknown, Unknown");
    }
}
