use crate::error::{DashboardError, DashboardResult};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};

/// Milliseconds in one minute; all derived durations are reported in minutes.
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Placeholder for a location part that upstream enrichment did not resolve.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Campaign label assigned to sessions without UTM attribution.
pub const DIRECT_LABEL: &str = "Direct";

/// Synthetic URL assigned to sessions without UTM attribution.
pub const DIRECT_TRAFFIC_URL: &str = "Direct Traffic";

/// Converts a millisecond span to fractional minutes.
pub fn ms_to_minutes(ms: i64) -> f64 {
    ms as f64 / MS_PER_MINUTE
}

/// Per-stage timestamps (milliseconds since epoch) for one session.
///
/// Every stage after `landing` is optional: `None` means the visitor never
/// reached it. A timestamp of zero is a real timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub landing: i64,
    #[serde(default)]
    pub form_start: Option<i64>,
    #[serde(default)]
    pub form_filled_without_login: Option<i64>,
    #[serde(default)]
    pub under_review: Option<i64>,
    #[serde(default)]
    pub payment_started: Option<i64>,
    #[serde(default)]
    pub payment_successful: Option<i64>,
    /// Last observed activity.
    pub updated_at: i64,
}

impl Timeline {
    /// Timestamp recorded for `stage`, if the visitor reached it.
    pub fn at(&self, stage: Stage) -> Option<i64> {
        match stage {
            Stage::Landing => Some(self.landing),
            Stage::FormStart => self.form_start,
            Stage::FormFilled => self.form_filled_without_login,
            Stage::UnderReview => self.under_review,
            Stage::PaymentStarted => self.payment_started,
            Stage::PaymentSuccess => self.payment_successful,
        }
    }

    pub fn reached(&self, stage: Stage) -> bool {
        self.at(stage).is_some()
    }

    /// Reached stages with their timestamps, in funnel order.
    pub fn reached_stages(&self) -> impl Iterator<Item = (Stage, i64)> + '_ {
        Stage::ALL
            .iter()
            .filter_map(move |&stage| self.at(stage).map(|ts| (stage, ts)))
    }

    /// Furthest stage along the funnel that has a timestamp.
    pub fn furthest_stage(&self) -> Stage {
        Stage::ALL
            .iter()
            .rev()
            .copied()
            .find(|&stage| self.reached(stage))
            .unwrap_or(Stage::Landing)
    }

    /// Wall-clock span from landing to last activity, in minutes.
    pub fn duration_minutes(&self) -> f64 {
        ms_to_minutes(self.updated_at - self.landing)
    }

    /// Checks that reached stages are non-decreasing in time and that
    /// `updated_at` is not before `landing`.
    pub fn validate(&self) -> DashboardResult<()> {
        let mut previous: Option<(Stage, i64)> = None;
        for (stage, ts) in self.reached_stages() {
            if let Some((prev_stage, prev_ts)) = previous {
                if ts < prev_ts {
                    return Err(DashboardError::Validation(format!(
                        "stage '{}' at {} precedes '{}' at {}",
                        stage, ts, prev_stage, prev_ts
                    )));
                }
            }
            previous = Some((stage, ts));
        }
        if self.updated_at < self.landing {
            return Err(DashboardError::Validation(format!(
                "updated_at {} precedes landing {}",
                self.updated_at, self.landing
            )));
        }
        Ok(())
    }
}

/// One visitor's tracked journey through the funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub device_type: String,
    #[serde(default)]
    pub ip_address: String,
    /// Opaque `"lat,lng"` string as captured by the tracker.
    #[serde(default)]
    pub raw_location: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub utm_campaign_id: Option<String>,
    pub timeline: Timeline,
}

impl Session {
    /// A session converts when it reaches the payment success stage.
    pub fn is_converted(&self) -> bool {
        self.timeline.reached(Stage::PaymentSuccess)
    }

    pub fn country_or_unknown(&self) -> &str {
        self.country.as_deref().unwrap_or(UNKNOWN_LOCATION)
    }

    pub fn city_or_unknown(&self) -> &str {
        self.city.as_deref().unwrap_or(UNKNOWN_LOCATION)
    }

    /// `"{city}, {country}"` with unresolved parts shown as "Unknown".
    pub fn location_label(&self) -> String {
        format!("{}, {}", self.city_or_unknown(), self.country_or_unknown())
    }
}

/// A UTM campaign record referenced by `Session::utm_campaign_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub utm_id: String,
    pub source: String,
    pub campaign: String,
    pub medium: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub phone_number: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Campaign {
    /// Dashboard label, `"{source} - {campaign}"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.source, self.campaign)
    }

    /// Synthetic landing URL, `"{source}.com/{campaign}-{medium}"`.
    pub fn url(&self) -> String {
        format!("{}.com/{}-{}", self.source, self.campaign, self.medium)
    }

    /// Whether a dashboard label refers to this campaign. Matching is by
    /// substring on both `source` and `campaign`, so overlapping names can
    /// match more than one record.
    pub fn matches_label(&self, label: &str) -> bool {
        label.contains(&self.source) && label.contains(&self.campaign)
    }
}

/// A resolved snapshot of sessions and campaigns handed to the reporting engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub sessions: Vec<Session>,
    pub campaigns: Vec<Campaign>,
}

impl Dataset {
    pub fn new(sessions: Vec<Session>, campaigns: Vec<Campaign>) -> Self {
        Self {
            sessions,
            campaigns,
        }
    }

    pub fn campaign_by_id(&self, utm_id: &str) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| c.utm_id == utm_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline() -> Timeline {
        Timeline {
            landing: 1_000,
            form_start: Some(61_000),
            form_filled_without_login: None,
            under_review: None,
            payment_started: None,
            payment_successful: None,
            updated_at: 121_000,
        }
    }

    #[test]
    fn test_zero_timestamp_counts_as_reached() {
        let t = Timeline {
            landing: 0,
            form_start: Some(0),
            updated_at: 0,
            ..Default::default()
        };
        assert!(t.reached(Stage::FormStart));
        assert!(!t.reached(Stage::FormFilled));
    }

    #[test]
    fn test_reached_stages_in_order() {
        let stages: Vec<_> = timeline().reached_stages().map(|(s, _)| s).collect();
        assert_eq!(stages, vec![Stage::Landing, Stage::FormStart]);
        assert_eq!(timeline().furthest_stage(), Stage::FormStart);
    }

    #[test]
    fn test_duration_minutes() {
        assert!((timeline().duration_minutes() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_out_of_order() {
        let mut t = timeline();
        assert!(t.validate().is_ok());
        t.form_filled_without_login = Some(10_000);
        assert!(matches!(t.validate(), Err(DashboardError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_updated_before_landing() {
        let mut t = timeline();
        t.form_start = None;
        t.updated_at = 0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_campaign_label_and_url() {
        let c = Campaign {
            utm_id: "utm-1".into(),
            source: "google".into(),
            campaign: "summer_sale".into(),
            medium: "cpc".into(),
            active: true,
            created_at: 0,
            phone_number: None,
        };
        assert_eq!(c.label(), "google - summer_sale");
        assert_eq!(c.url(), "google.com/summer_sale-cpc");
        assert!(c.matches_label("google - summer_sale"));
        assert!(!c.matches_label("facebook - summer_sale"));
    }

    #[test]
    fn test_location_label_defaults_unknown() {
        let s = Session {
            session_id: "s1".into(),
            device_type: "mobile".into(),
            ip_address: String::new(),
            raw_location: String::new(),
            country: Some("India".into()),
            city: None,
            utm_campaign_id: None,
            timeline: timeline(),
        };
        assert_eq!(s.location_label(), "Unknown, India");
        assert!(!s.is_converted());
    }
}
