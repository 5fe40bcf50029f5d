//! Wire shapes of the tracking (`user_tracking`) and campaign (`utmurl`)
//! collections, and their conversion into the shared data model.

use funnel_core::{Campaign, DashboardError, DashboardResult, Session, Timeline};
use serde::{Deserialize, Serialize};

/// Stage timestamps as the tracker writes them. Field names (including the
/// `payment_succesfull` spelling) are fixed by the collection schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTimeline {
    #[serde(default)]
    pub landing: Option<i64>,
    #[serde(default)]
    pub form_start: Option<i64>,
    #[serde(default)]
    pub form_filled_without_login: Option<i64>,
    #[serde(default)]
    pub user_application_under_review: Option<i64>,
    #[serde(default)]
    pub application_paythrough_bank_payment_started: Option<i64>,
    #[serde(default)]
    pub payment_succesfull: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSessionRecord {
    pub session_id: String,
    pub device_type: String,
    #[serde(default)]
    pub ip_address: String,
    /// Top-level landing time, used when the timeline omits it.
    #[serde(default)]
    pub landing: Option<i64>,
    /// `"lat,lng"` captured by the tracker.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub timeline: RawTimeline,
    #[serde(default)]
    pub utmid: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl RawSessionRecord {
    /// Normalises the record. A missing `updated_at` becomes `fetched_at`;
    /// a record with no landing time anywhere is rejected.
    pub fn into_session(self, fetched_at: i64) -> DashboardResult<Session> {
        let landing = self.timeline.landing.or(self.landing).ok_or_else(|| {
            DashboardError::Validation(format!(
                "session '{}' has no landing time",
                self.session_id
            ))
        })?;

        Ok(Session {
            session_id: self.session_id,
            device_type: self.device_type,
            ip_address: self.ip_address,
            raw_location: self.location,
            country: self.country.filter(|c| !c.is_empty()),
            city: self.city.filter(|c| !c.is_empty()),
            utm_campaign_id: self.utmid.filter(|id| !id.is_empty()),
            timeline: Timeline {
                landing,
                form_start: self.timeline.form_start,
                form_filled_without_login: self.timeline.form_filled_without_login,
                under_review: self.timeline.user_application_under_review,
                payment_started: self.timeline.application_paythrough_bank_payment_started,
                payment_successful: self.timeline.payment_succesfull,
                updated_at: self.timeline.updated_at.unwrap_or(fetched_at),
            },
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCampaignRecord {
    pub utmid: String,
    pub utm_source: String,
    pub utm_campaign: String,
    pub utm_medium: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, rename = "createdAt")]
    pub created_at: i64,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl From<RawCampaignRecord> for Campaign {
    fn from(raw: RawCampaignRecord) -> Self {
        Campaign {
            utm_id: raw.utmid,
            source: raw.utm_source,
            campaign: raw.utm_campaign,
            medium: raw.utm_medium,
            active: raw.active,
            created_at: raw.created_at,
            phone_number: raw.phone_number,
        }
    }
}

/// On-disk export holding both collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetFile {
    #[serde(default)]
    pub sessions: Vec<RawSessionRecord>,
    #[serde(default)]
    pub utm_urls: Vec<RawCampaignRecord>,
}
