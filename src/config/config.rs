//! Threshold configuration for the engine.
//!
//! Every knob has a default tuned as a reasonable starting policy; callers
//! override through the builder or a JSON document. Validation happens once,
//! at build time, so the engine itself never re-checks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::modules::risk::RiskWeights;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_risk must be positive, got {0}")]
    NonPositiveMaxRisk(i32),
    #[error("hard_stop_risk ({hard_stop}) must not exceed max_risk ({max})")]
    HardStopAboveMax { hard_stop: i32, max: i32 },
    #[error("jitter must lie in [0.0, 0.5], got {0}")]
    JitterOutOfRange(f32),
    #[error("surcharge_cap must be at least 1.0, got {0}")]
    SurchargeCapTooLow(f32),
    #[error("stall_streak must be at least 1")]
    ZeroStallStreak,
    #[error("step_ceiling_factor must be at least 1")]
    ZeroStepCeilingFactor,
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine thresholds. See `EngineConfigBuilder` for construction with
/// validation; `Default` yields the starting policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper clamp for accumulated risk.
    pub max_risk: i32,
    /// Accumulated risk at which the session aborts outright.
    pub hard_stop_risk: i32,
    /// Fractional perturbation applied to every hint.
    pub jitter: f32,
    /// Cap on the risk surcharge, as a multiple of the base delay.
    pub surcharge_cap: f32,
    /// Cooldown floor when risk crosses a profile ceiling.
    pub cooldown_base_ms: u64,
    /// Extra cooldown per point of risk above the ceiling.
    pub cooldown_per_point_ms: u64,
    /// Healthy steps required since the last profile change before a
    /// promotion is considered.
    pub min_healthy_steps: u32,
    /// Consecutive empty responses treated as a dead feed.
    pub stall_streak: u32,
    /// Step ceiling is `planned_items * step_ceiling_factor`, floored at
    /// `step_ceiling_floor`. Guards against extraction failing silently
    /// with payloads that are malformed but never empty.
    pub step_ceiling_factor: u32,
    pub step_ceiling_floor: u64,
    /// Bounded window feeding the latency-regression signal.
    pub latency_window: usize,
    /// Risk scoring weights.
    pub risk_weights: RiskWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_risk: 15,
            hard_stop_risk: 12,
            jitter: 0.15,
            surcharge_cap: 5.0,
            cooldown_base_ms: 10_000,
            cooldown_per_point_ms: 5_000,
            min_healthy_steps: 4,
            stall_streak: 3,
            step_ceiling_factor: 3,
            step_ceiling_floor: 30,
            latency_window: 32,
            risk_weights: RiskWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load from a JSON document; absent fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn max_steps(&self, planned_items: u64) -> u64 {
        planned_items
            .saturating_mul(self.step_ceiling_factor as u64)
            .max(self.step_ceiling_floor)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_risk <= 0 {
            return Err(ConfigError::NonPositiveMaxRisk(self.max_risk));
        }
        if self.hard_stop_risk > self.max_risk {
            return Err(ConfigError::HardStopAboveMax {
                hard_stop: self.hard_stop_risk,
                max: self.max_risk,
            });
        }
        if !(0.0..=0.5).contains(&self.jitter) {
            return Err(ConfigError::JitterOutOfRange(self.jitter));
        }
        if self.surcharge_cap < 1.0 {
            return Err(ConfigError::SurchargeCapTooLow(self.surcharge_cap));
        }
        if self.stall_streak == 0 {
            return Err(ConfigError::ZeroStallStreak);
        }
        if self.step_ceiling_factor == 0 {
            return Err(ConfigError::ZeroStepCeilingFactor);
        }
        Ok(())
    }
}

/// Builder with per-field overrides on top of the defaults.
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn max_risk(mut self, value: i32) -> Self {
        self.config.max_risk = value;
        self
    }

    pub fn hard_stop_risk(mut self, value: i32) -> Self {
        self.config.hard_stop_risk = value;
        self
    }

    pub fn jitter(mut self, value: f32) -> Self {
        self.config.jitter = value;
        self
    }

    pub fn surcharge_cap(mut self, value: f32) -> Self {
        self.config.surcharge_cap = value;
        self
    }

    pub fn cooldown_base_ms(mut self, value: u64) -> Self {
        self.config.cooldown_base_ms = value;
        self
    }

    pub fn cooldown_per_point_ms(mut self, value: u64) -> Self {
        self.config.cooldown_per_point_ms = value;
        self
    }

    pub fn min_healthy_steps(mut self, value: u32) -> Self {
        self.config.min_healthy_steps = value;
        self
    }

    pub fn stall_streak(mut self, value: u32) -> Self {
        self.config.stall_streak = value;
        self
    }

    pub fn step_ceiling_factor(mut self, value: u32) -> Self {
        self.config.step_ceiling_factor = value;
        self
    }

    pub fn step_ceiling_floor(mut self, value: u64) -> Self {
        self.config.step_ceiling_floor = value;
        self
    }

    pub fn latency_window(mut self, value: usize) -> Self {
        self.config.latency_window = value;
        self
    }

    pub fn risk_weights(mut self, value: RiskWeights) -> Self {
        self.config.risk_weights = value;
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
