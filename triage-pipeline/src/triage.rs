//! Maps a severity score onto the response unit to dispatch.
//!
//! Rules are ordered and the first match wins:
//! a score strictly above [`HIGH_SEVERITY_THRESHOLD`] sends the mobile
//! resuscitation unit, a score at or above [`MEDIUM_SEVERITY_THRESHOLD`]
//! sends a first-responder vehicle, anything else an ambulance.

use serde::Serialize;

pub const HIGH_SEVERITY_THRESHOLD: f64 = 30.0;
pub const MEDIUM_SEVERITY_THRESHOLD: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Action {
    pub label: &'static str,
    pub tier: Tier,
}

pub fn classify(score: f64) -> Action {
    if score > HIGH_SEVERITY_THRESHOLD {
        Action {
            label: "Send emergency mobile resuscitation unit",
            tier: Tier::High,
        }
    } else if score >= MEDIUM_SEVERITY_THRESHOLD {
        Action {
            label: "Send first-responder emergency vehicle",
            tier: Tier::Medium,
        }
    } else {
        Action {
            label: "Send ambulance",
            tier: Tier::Low,
        }
    }
}
