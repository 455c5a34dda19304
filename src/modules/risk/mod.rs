//! Telemetry risk scoring.
//!
//! Converts one telemetry sample into a bounded risk delta. Signals are
//! weighted by how strongly each correlates with an imminent block (captcha
//! highest, pure slowness lowest) and are summed rather than take-max, so
//! compounding symptoms escalate faster than any single one would.

use serde::{Deserialize, Serialize};

use super::metrics::LatencyWindow;
use super::telemetry::TelemetrySample;

/// Signal weights. Defaults follow the starting policy; all values are
/// overridable through the engine configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub captcha: i32,
    pub rate_limit: i32,
    pub xhr_error: i32,
    pub xhr_error_cap: i32,
    pub empty_response: i32,
    pub stall_bonus: i32,
    pub stall_streak: u32,
    pub latency_spike: i32,
    pub healthy_reward: i32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            captcha: 3,
            rate_limit: 2,
            xhr_error: 1,
            xhr_error_cap: 3,
            empty_response: 1,
            stall_bonus: 2,
            stall_streak: 3,
            latency_spike: 1,
            healthy_reward: -1,
        }
    }
}

/// Rolling state the scorer reads but never owns. `consecutive_empty`
/// already includes the sample being scored; the latency window does not.
#[derive(Debug)]
pub struct RiskContext<'a> {
    pub consecutive_empty: u32,
    pub latency: &'a LatencyWindow,
}

#[derive(Debug, Clone)]
pub struct RiskScorer {
    weights: RiskWeights,
}

impl RiskScorer {
    pub fn new(weights: RiskWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RiskWeights {
        &self.weights
    }

    /// Score one sample. Each condition is independent and additive; the
    /// healthy reward only applies when nothing else triggered, which is
    /// what lets accumulated risk decay and profiles de-escalate.
    pub fn score(&self, sample: &TelemetrySample, ctx: &RiskContext<'_>) -> i32 {
        let w = &self.weights;
        let mut delta = 0;

        if sample.captcha_seen {
            delta += w.captcha;
        }
        if sample.rate_limit_seen {
            delta += w.rate_limit;
        }
        if sample.xhr_errors > 0 {
            let errors = sample.xhr_errors.min(i32::MAX as u32) as i32;
            delta += (errors * w.xhr_error).min(w.xhr_error_cap);
        }
        if sample.empty_response {
            delta += w.empty_response;
            if ctx.consecutive_empty >= w.stall_streak {
                // A stalled feed means the stream was cut, not merely slow.
                delta += w.stall_bonus;
            }
        }
        if ctx.latency.is_regression(sample.latency_ms) {
            log::debug!(
                "latency spike: {}ms vs rolling avg {:?}",
                sample.latency_ms,
                ctx.latency.rolling_average()
            );
            delta += w.latency_spike;
        }

        if delta == 0 && sample.fetched_this_batch > 0 {
            delta += w.healthy_reward;
        }

        delta
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(RiskWeights::default())
    }
}
