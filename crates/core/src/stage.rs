//! The fixed six-step conversion funnel.

use serde::{Deserialize, Serialize};

/// A checkpoint in the application funnel, declared in funnel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Landing,
    FormStart,
    FormFilled,
    UnderReview,
    PaymentStarted,
    PaymentSuccess,
}

impl Stage {
    /// Every stage, in the order a visitor moves through them.
    pub const ALL: [Stage; 6] = [
        Stage::Landing,
        Stage::FormStart,
        Stage::FormFilled,
        Stage::UnderReview,
        Stage::PaymentStarted,
        Stage::PaymentSuccess,
    ];

    /// Total number of stages in the funnel model.
    pub const COUNT: usize = Self::ALL.len();

    /// Human-readable name shown on dashboards.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Landing => "Landing",
            Stage::FormStart => "Form Start",
            Stage::FormFilled => "Form Filled",
            Stage::UnderReview => "Under Review",
            Stage::PaymentStarted => "Payment Started",
            Stage::PaymentSuccess => "Payment Success",
        }
    }

    /// Zero-based position in the funnel.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn previous(self) -> Option<Stage> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
