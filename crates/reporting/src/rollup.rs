//! Categorical rollups: sessions and conversions grouped by device, campaign
//! and country.

use std::collections::BTreeMap;

use funnel_core::types::{DIRECT_LABEL, UNKNOWN_LOCATION};
use funnel_core::{Campaign, Session};
use serde::{Deserialize, Serialize};

use crate::percent;

/// Sessions and conversions collected for one group key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupTally {
    pub sessions: usize,
    pub conversions: usize,
}

impl GroupTally {
    pub fn conversion_rate(&self) -> f64 {
        percent(self.conversions, self.sessions)
    }
}

/// Groups sessions by the key `key_of` extracts and tallies each group.
/// Groups come back in ascending key order.
pub fn group_sessions<'a, F>(
    sessions: &'a [Session],
    mut key_of: F,
) -> BTreeMap<String, GroupTally>
where
    F: FnMut(&'a Session) -> String,
{
    let mut groups: BTreeMap<String, GroupTally> = BTreeMap::new();
    for session in sessions {
        let tally = groups.entry(key_of(session)).or_default();
        tally.sessions += 1;
        if session.is_converted() {
            tally.conversions += 1;
        }
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetrics {
    pub device: String,
    pub count: usize,
    pub conversions: usize,
    pub percentage: f64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtmMetrics {
    pub campaign: String,
    pub sessions: usize,
    pub conversions: usize,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMetrics {
    pub country: String,
    pub sessions: usize,
    pub conversions: usize,
    pub conversion_rate: f64,
}

pub fn device_metrics(sessions: &[Session]) -> Vec<DeviceMetrics> {
    let total = sessions.len();
    group_sessions(sessions, |s| s.device_type.clone())
        .into_iter()
        .map(|(device, tally)| DeviceMetrics {
            device,
            count: tally.sessions,
            conversions: tally.conversions,
            percentage: percent(tally.sessions, total),
            conversion_rate: tally.conversion_rate(),
        })
        .collect()
}

/// Dashboard label for the campaign a session is attributed to, or
/// `"Direct"` when it has none or references an unknown campaign.
pub fn campaign_label(session: &Session, campaigns: &[Campaign]) -> String {
    session
        .utm_campaign_id
        .as_deref()
        .and_then(|id| campaigns.iter().find(|c| c.utm_id == id))
        .map(Campaign::label)
        .unwrap_or_else(|| DIRECT_LABEL.to_string())
}

pub fn utm_metrics(sessions: &[Session], campaigns: &[Campaign]) -> Vec<UtmMetrics> {
    group_sessions(sessions, |s| campaign_label(s, campaigns))
        .into_iter()
        .map(|(campaign, tally)| UtmMetrics {
            campaign,
            sessions: tally.sessions,
            conversions: tally.conversions,
            conversion_rate: tally.conversion_rate(),
        })
        .collect()
}

pub fn geo_metrics(sessions: &[Session]) -> Vec<GeoMetrics> {
    group_sessions(sessions, |s| {
        s.country.clone().unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
    })
    .into_iter()
    .map(|(country, tally)| GeoMetrics {
        country,
        sessions: tally.sessions,
        conversions: tally.conversions,
        conversion_rate: tally.conversion_rate(),
    })
    .collect()
}

/// Campaign table order: most conversions first, label as tie-breaker.
pub fn utm_metrics_by_conversions(mut metrics: Vec<UtmMetrics>) -> Vec<UtmMetrics> {
    metrics.sort_by(|a, b| {
        b.conversions
            .cmp(&a.conversions)
            .then_with(|| a.campaign.cmp(&b.campaign))
    });
    metrics
}

/// Geo table order: busiest countries first, truncated to `top`.
pub fn geo_metrics_by_sessions(mut metrics: Vec<GeoMetrics>, top: usize) -> Vec<GeoMetrics> {
    metrics.sort_by(|a, b| {
        b.sessions
            .cmp(&a.sessions)
            .then_with(|| a.country.cmp(&b.country))
    });
    metrics.truncate(top);
    metrics
}
