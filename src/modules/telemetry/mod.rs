//! Boundary value types exchanged with the scraping loop.
//!
//! The engine never touches the page; the caller performs the actual
//! wait/scroll/extract cycle and reports one [`TelemetrySample`] per step.
//! Hints and verdicts are fresh, immutable values on every call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step's observed outcome, built by the caller after a
/// wait+scroll+extract cycle. Consumed exactly once; only derived rolling
/// counters outlive the step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub fetched_this_batch: u32,
    pub fetched_total: u64,
    pub latency_ms: u32,
    pub xhr_errors: u32,
    pub captcha_seen: bool,
    pub rate_limit_seen: bool,
    pub empty_response: bool,
    pub timestamp: DateTime<Utc>,
}

impl TelemetrySample {
    /// A clean sample reporting healthy progress, useful as a baseline.
    pub fn healthy(fetched_this_batch: u32, fetched_total: u64, latency_ms: u32) -> Self {
        Self {
            fetched_this_batch,
            fetched_total,
            latency_ms,
            xhr_errors: 0,
            captcha_seen: false,
            rate_limit_seen: false,
            empty_response: false,
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Pacing instruction for the caller's next wait+scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepHints {
    pub delay_ms: u64,
    pub scroll_px: u32,
}

/// Why a session stopped issuing work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The planned item count was reached.
    PlanComplete,
    /// Accumulated risk crossed the hard stop threshold.
    RiskExceeded,
    /// A second captcha was observed; the session is flagged.
    CaptchaRepeated,
    /// Consecutive empty responses with no progress; the feed is cut off.
    Stalled,
    /// The hard step ceiling was hit before the plan completed.
    StepCeiling,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::PlanComplete => "plan_complete",
            StopReason::RiskExceeded => "risk_exceeded",
            StopReason::CaptchaRepeated => "captcha_repeated",
            StopReason::Stalled => "stalled",
            StopReason::StepCeiling => "step_ceiling",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of absorbing one telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryVerdict {
    pub needs_cooldown: bool,
    pub cooldown_ms: u64,
    pub should_stop: bool,
    pub reason: Option<StopReason>,
}

impl TelemetryVerdict {
    pub(crate) fn running() -> Self {
        Self {
            needs_cooldown: false,
            cooldown_ms: 0,
            should_stop: false,
            reason: None,
        }
    }

    pub(crate) fn cooldown(cooldown_ms: u64) -> Self {
        Self {
            needs_cooldown: true,
            cooldown_ms,
            should_stop: false,
            reason: None,
        }
    }

    pub(crate) fn stop(reason: StopReason) -> Self {
        Self {
            needs_cooldown: false,
            cooldown_ms: 0,
            should_stop: true,
            reason: Some(reason),
        }
    }
}
