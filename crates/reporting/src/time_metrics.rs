//! Per-stage timing for sessions that went all the way through review and payment.

use funnel_core::types::ms_to_minutes;
use funnel_core::Session;
use serde::{Deserialize, Serialize};

/// Timing breakdown of one converted session, in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeMetrics {
    pub session_id: String,
    pub time_on_form: f64,
    pub time_review_underway: f64,
    /// Zero when the session skipped the payment-started checkpoint.
    pub time_to_payment: f64,
    pub session_duration: f64,
}

impl TimeMetrics {
    /// Timing for a session that reached form start, form filled, review and
    /// payment success. Partial journeys yield `None` and contribute nothing.
    pub fn from_session(session: &Session) -> Option<Self> {
        let t = &session.timeline;
        let form_start = t.form_start?;
        let form_filled = t.form_filled_without_login?;
        let under_review = t.under_review?;
        let payment_successful = t.payment_successful?;

        Some(Self {
            session_id: session.session_id.clone(),
            time_on_form: ms_to_minutes(form_filled - form_start),
            time_review_underway: ms_to_minutes(under_review - form_filled),
            time_to_payment: t
                .payment_started
                .map(|started| ms_to_minutes(payment_successful - started))
                .unwrap_or(0.0),
            session_duration: t.duration_minutes(),
        })
    }
}

pub fn extract_time_metrics(sessions: &[Session]) -> Vec<TimeMetrics> {
    sessions.iter().filter_map(TimeMetrics::from_session).collect()
}

/// Mean of each timing field; all zero for an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeMetricsSummary {
    pub samples: usize,
    pub avg_time_on_form: f64,
    pub avg_time_review_underway: f64,
    pub avg_time_to_payment: f64,
    pub avg_session_duration: f64,
}

impl TimeMetricsSummary {
    pub fn from_metrics(metrics: &[TimeMetrics]) -> Self {
        if metrics.is_empty() {
            return Self::default();
        }
        let n = metrics.len() as f64;
        let mean = |f: fn(&TimeMetrics) -> f64| metrics.iter().map(f).sum::<f64>() / n;
        Self {
            samples: metrics.len(),
            avg_time_on_form: mean(|m| m.time_on_form),
            avg_time_review_underway: mean(|m| m.time_review_underway),
            avg_time_to_payment: mean(|m| m.time_to_payment),
            avg_session_duration: mean(|m| m.session_duration),
        }
    }
}
