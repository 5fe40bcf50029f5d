//! Funnel analysis — how many sessions reached each stage and how many were
//! lost between consecutive stages.

use funnel_core::{Session, Stage};
use serde::{Deserialize, Serialize};

use crate::percent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub stage: Stage,
    pub name: String,
    pub count: usize,
    /// Share of all sessions that reached this stage.
    pub percentage: f64,
    /// Share of the previous stage's sessions that did not reach this one.
    pub drop_off_rate: f64,
}

/// Counts sessions per stage and derives percentages and drop-off rates.
/// Always returns one entry per stage, in funnel order.
pub fn compute_funnel(sessions: &[Session]) -> Vec<FunnelStage> {
    let mut counts = [0usize; Stage::COUNT];
    for session in sessions {
        for (stage, _) in session.timeline.reached_stages() {
            counts[stage.index()] += 1;
        }
    }

    let total = sessions.len();
    Stage::ALL
        .iter()
        .map(|&stage| {
            let count = counts[stage.index()];
            let drop_off_rate = match stage.previous() {
                // Malformed timelines can skip a stage, so the difference may be negative.
                Some(prev) => match counts[prev.index()] {
                    0 => 0.0,
                    entered => (entered as f64 - count as f64) / entered as f64 * 100.0,
                },
                None => 0.0,
            };
            FunnelStage {
                stage,
                name: stage.label().to_string(),
                count,
                percentage: percent(count, total),
                drop_off_rate,
            }
        })
        .collect()
}
