//! Per-session behavior timeline for the user detail view.

use funnel_core::types::ms_to_minutes;
use funnel_core::{Session, Stage};
use serde::{Deserialize, Serialize};

use crate::percent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub stage_name: String,
    pub timestamp: i64,
    /// Minutes until the next reached stage; absent on the last entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "type")]
    pub device_type: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBehavior {
    pub session: Session,
    pub stage_timings: Vec<StageTiming>,
    pub total_duration: f64,
    /// Reached stages as a share of the whole funnel.
    pub completion_rate: f64,
    pub device_info: DeviceInfo,
}

impl UserBehavior {
    pub fn from_session(session: &Session) -> Self {
        let reached: Vec<(Stage, i64)> = session.timeline.reached_stages().collect();
        let stage_timings = reached
            .iter()
            .enumerate()
            .map(|(i, &(stage, timestamp))| StageTiming {
                stage,
                stage_name: stage.label().to_string(),
                timestamp,
                duration: reached
                    .get(i + 1)
                    .map(|&(_, next)| ms_to_minutes(next - timestamp)),
            })
            .collect();

        Self {
            session: session.clone(),
            stage_timings,
            total_duration: session.timeline.duration_minutes(),
            completion_rate: percent(reached.len(), Stage::COUNT),
            device_info: DeviceInfo {
                device_type: session.device_type.clone(),
                location: session.location_label(),
            },
        }
    }
}

/// Behavior timeline for the session with exactly this id.
pub fn user_behavior(session_id: &str, sessions: &[Session]) -> Option<UserBehavior> {
    sessions
        .iter()
        .find(|s| s.session_id == session_id)
        .map(UserBehavior::from_session)
}
