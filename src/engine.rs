//! High level session orchestration.
//!
//! Wires together the profile catalog, risk scorer, cadence planner, and
//! event hooks into the state machine that paces one scraping session. The
//! engine performs no I/O and never blocks; the caller owns the page, does
//! the actual waiting and scrolling, and reports one telemetry sample per
//! step. One engine instance per session, strictly sequential use.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::modules::cadence::CadencePlanner;
use crate::modules::events::{
    CooldownEnteredEvent, EventDispatcher, EventHandler, LoggingHandler, ProfileChangedEvent,
    SessionEvent, StepPlannedEvent, TelemetryScoredEvent, TerminatedEvent,
};
use crate::modules::metrics::LatencyWindow;
use crate::modules::profiles::{self, PacingProfile, ProfileName, UnknownProfile};
use crate::modules::risk::{RiskContext, RiskScorer};
use crate::modules::telemetry::{StepHints, StopReason, TelemetrySample, TelemetryVerdict};

/// Result alias used across the orchestration layer.
pub type EngineResult<T> = Result<T, EngineError>;

/// Construction-time errors. Degraded telemetry is never an error; it only
/// moves the state machine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("planned item count must be greater than zero")]
    InvalidPlan,
    #[error(transparent)]
    UnknownProfile(#[from] UnknownProfile),
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Session phase. The tagged representation keeps illegal combinations
/// (cooling down and stopped at once) unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Cooldown { until: DateTime<Utc> },
    Terminated { reason: StopReason },
}

/// Options for a new session.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub planned_items: u64,
    /// Optional profile name; unknown names fail construction. Absent means
    /// a weighted draw across the catalog.
    pub initial_profile: Option<String>,
    pub session_id: Option<String>,
}

impl EngineOptions {
    pub fn new(planned_items: u64) -> Self {
        Self {
            planned_items,
            ..Self::default()
        }
    }

    pub fn initial_profile(mut self, name: impl Into<String>) -> Self {
        self.initial_profile = Some(name.into());
        self
    }

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }
}

/// Read-only snapshot of a session, callable at any point including
/// mid-session diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub profile_history: Vec<ProfileName>,
    pub final_risk: i32,
    pub steps_taken: u64,
    pub items_fetched: u64,
    pub items_planned: u64,
    pub terminated_reason: Option<StopReason>,
}

/// Adaptive scroll/telemetry engine for one scraping session.
#[derive(Debug)]
pub struct ScrollEngine<R: Rng = StdRng> {
    config: EngineConfig,
    rng: R,
    session_id: String,
    profile: &'static PacingProfile,
    profile_history: Vec<ProfileName>,
    phase: Phase,
    accumulated_risk: i32,
    consecutive_empty: u32,
    consecutive_errors: u32,
    captcha_count: u32,
    healthy_steps: u32,
    steps_taken: u64,
    items_planned: u64,
    items_fetched: u64,
    max_steps: u64,
    latency: LatencyWindow,
    scorer: RiskScorer,
    planner: CadencePlanner,
    dispatcher: EventDispatcher,
}

impl ScrollEngine<StdRng> {
    /// New session with default thresholds and an entropy-seeded rng.
    pub fn new(options: EngineOptions) -> EngineResult<Self> {
        Self::with_rng(options, EngineConfig::default(), StdRng::from_entropy())
    }

    pub fn with_config(options: EngineOptions, config: EngineConfig) -> EngineResult<Self> {
        Self::with_rng(options, config, StdRng::from_entropy())
    }
}

impl<R: Rng> ScrollEngine<R> {
    /// New session with a caller-supplied rng. Tests pin a seeded `StdRng`
    /// here to make every hint reproducible.
    pub fn with_rng(options: EngineOptions, config: EngineConfig, mut rng: R) -> EngineResult<Self> {
        if options.planned_items == 0 {
            return Err(EngineError::InvalidPlan);
        }
        let hint = options
            .initial_profile
            .as_deref()
            .map(str::parse::<ProfileName>)
            .transpose()?;
        let profile = profiles::select_initial_profile(hint, &mut rng);

        let session_id = options
            .session_id
            .unwrap_or_else(|| format!("sess-{}", Utc::now().timestamp_millis()));
        let max_steps = config.max_steps(options.planned_items);

        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_handler(Arc::new(LoggingHandler));

        log::info!(
            "[{}] session start: {} items planned, profile {}",
            session_id,
            options.planned_items,
            profile.name
        );

        Ok(Self {
            latency: LatencyWindow::new(config.latency_window),
            scorer: RiskScorer::new(config.risk_weights),
            planner: CadencePlanner::new(config.jitter, config.surcharge_cap),
            config,
            rng,
            session_id,
            profile,
            profile_history: vec![profile.name],
            phase: Phase::Running,
            accumulated_risk: 0,
            consecutive_empty: 0,
            consecutive_errors: 0,
            captcha_count: 0,
            healthy_steps: 0,
            steps_taken: 0,
            items_planned: options.planned_items,
            items_fetched: 0,
            max_steps,
            dispatcher,
        })
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.dispatcher.register_handler(handler);
    }

    /// Pacing for the caller's next step, measured against the wall clock.
    pub fn get_next_hints(&mut self) -> StepHints {
        self.hints_at(Utc::now())
    }

    /// Clock-explicit variant of [`get_next_hints`](Self::get_next_hints);
    /// deterministic callers and tests supply `now` themselves.
    pub fn hints_at(&mut self, now: DateTime<Utc>) -> StepHints {
        match self.phase {
            Phase::Terminated { .. } => {
                log::warn!("[{}] hints requested after termination", self.session_id);
                return StepHints {
                    delay_ms: 0,
                    scroll_px: 0,
                };
            }
            Phase::Cooldown { until } if now < until => {
                // The caller still owns the sleeping; the hint just covers
                // the remaining window, scrolling as gently as the posture
                // allows.
                let remaining = (until - now).num_milliseconds().max(0) as u64;
                let hints = StepHints {
                    delay_ms: remaining,
                    scroll_px: self.profile.scroll_range_px.min,
                };
                self.emit_step_planned(&hints, now);
                return hints;
            }
            Phase::Cooldown { .. } => {
                log::debug!("[{}] cooldown elapsed, resuming", self.session_id);
                self.phase = Phase::Running;
            }
            Phase::Running => {}
        }

        let hints = self
            .planner
            .plan(self.profile, self.accumulated_risk, &mut self.rng);
        self.emit_step_planned(&hints, now);
        hints
    }

    /// Absorb one step's outcome and evaluate the transition rules.
    ///
    /// Never fails: degraded telemetry only adjusts pacing or moves the
    /// session into cooldown/termination. Calling after termination is a
    /// no-op that repeats the stop verdict. Time is measured from the
    /// sample's own timestamp.
    pub fn process_telemetry(&mut self, sample: TelemetrySample) -> TelemetryVerdict {
        if let Phase::Terminated { reason } = self.phase {
            log::warn!("[{}] telemetry after termination ignored", self.session_id);
            return TelemetryVerdict::stop(reason);
        }

        let now = sample.timestamp;
        if let Phase::Cooldown { until } = self.phase
            && now >= until
        {
            self.phase = Phase::Running;
        }

        self.steps_taken += 1;
        if sample.empty_response {
            self.consecutive_empty += 1;
        } else {
            self.consecutive_empty = 0;
        }
        if sample.xhr_errors > 0 {
            self.consecutive_errors += 1;
        } else {
            self.consecutive_errors = 0;
        }
        if sample.captcha_seen {
            self.captcha_count += 1;
        }

        // The caller's running total is authoritative when it runs ahead of
        // our per-batch tally (batches can land between steps).
        let tallied = self.items_fetched + sample.fetched_this_batch as u64;
        self.items_fetched = tallied.max(sample.fetched_total);

        let delta = self.scorer.score(
            &sample,
            &RiskContext {
                consecutive_empty: self.consecutive_empty,
                latency: &self.latency,
            },
        );
        self.latency.record(sample.latency_ms);
        self.accumulated_risk = (self.accumulated_risk + delta).clamp(0, self.config.max_risk);

        if delta < 0 {
            self.healthy_steps += 1;
        } else if delta > 0 {
            self.healthy_steps = 0;
        }

        self.dispatcher
            .dispatch(SessionEvent::TelemetryScored(TelemetryScoredEvent {
                session_id: self.session_id.clone(),
                step: self.steps_taken,
                risk_delta: delta,
                accumulated_risk: self.accumulated_risk,
                timestamp: now,
            }));

        // Transition rules, in order. Earlier rules are the unambiguous
        // block signals and are never argued away by later ones.
        if self.accumulated_risk >= self.config.hard_stop_risk {
            return self.terminate(StopReason::RiskExceeded, now);
        }
        if sample.captcha_seen && self.captcha_count >= 2 {
            return self.terminate(StopReason::CaptchaRepeated, now);
        }
        if self.consecutive_empty >= self.config.stall_streak
            && sample.fetched_this_batch == 0
            && self.items_fetched < self.items_planned
        {
            return self.terminate(StopReason::Stalled, now);
        }
        if self.items_fetched >= self.items_planned {
            return self.terminate(StopReason::PlanComplete, now);
        }
        if self.steps_taken >= self.max_steps {
            return self.terminate(StopReason::StepCeiling, now);
        }
        if self.accumulated_risk >= self.profile.risk_ceiling {
            return self.enter_cooldown(now);
        }
        if matches!(self.phase, Phase::Running)
            && self.accumulated_risk <= self.profile.risk_floor
            && self.healthy_steps >= self.config.min_healthy_steps
            && let Some(faster) = profiles::promoted(self.profile.name)
        {
            self.switch_profile(faster, now);
        }

        TelemetryVerdict::running()
    }

    /// False once the session terminated, the plan completed, or the step
    /// ceiling was hit. Pure read.
    pub fn should_continue(&self) -> bool {
        match self.phase {
            Phase::Terminated { .. } => false,
            _ => self.items_fetched < self.items_planned && self.steps_taken < self.max_steps,
        }
    }

    /// Side-effect-free snapshot; callable any number of times.
    pub fn get_summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            profile_history: self.profile_history.clone(),
            final_risk: self.accumulated_risk,
            steps_taken: self.steps_taken,
            items_fetched: self.items_fetched,
            items_planned: self.items_planned,
            terminated_reason: match self.phase {
                Phase::Terminated { reason } => Some(reason),
                _ => None,
            },
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn accumulated_risk(&self) -> i32 {
        self.accumulated_risk
    }

    /// Steps in a row whose telemetry carried XHR errors.
    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn current_profile(&self) -> &'static PacingProfile {
        self.profile
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn emit_step_planned(&self, hints: &StepHints, now: DateTime<Utc>) {
        self.dispatcher
            .dispatch(SessionEvent::StepPlanned(StepPlannedEvent {
                session_id: self.session_id.clone(),
                step: self.steps_taken + 1,
                delay_ms: hints.delay_ms,
                scroll_px: hints.scroll_px,
                timestamp: now,
            }));
    }

    fn enter_cooldown(&mut self, now: DateTime<Utc>) -> TelemetryVerdict {
        let overshoot = (self.accumulated_risk - self.profile.risk_ceiling).max(0) as u64;
        let cooldown_ms =
            self.config.cooldown_base_ms + self.config.cooldown_per_point_ms * overshoot;
        self.phase = Phase::Cooldown {
            until: now + Duration::milliseconds(cooldown_ms as i64),
        };
        self.dispatcher
            .dispatch(SessionEvent::CooldownEntered(CooldownEnteredEvent {
                session_id: self.session_id.clone(),
                cooldown_ms,
                accumulated_risk: self.accumulated_risk,
                timestamp: now,
            }));
        if let Some(safer) = profiles::demoted(self.profile.name) {
            self.switch_profile(safer, now);
        }
        TelemetryVerdict::cooldown(cooldown_ms)
    }

    fn switch_profile(&mut self, next: &'static PacingProfile, now: DateTime<Utc>) {
        self.dispatcher
            .dispatch(SessionEvent::ProfileChanged(ProfileChangedEvent {
                session_id: self.session_id.clone(),
                from: self.profile.name,
                to: next.name,
                accumulated_risk: self.accumulated_risk,
                timestamp: now,
            }));
        self.profile = next;
        self.profile_history.push(next.name);
        self.healthy_steps = 0;
    }

    fn terminate(&mut self, reason: StopReason, now: DateTime<Utc>) -> TelemetryVerdict {
        // Termination is monotonic; the first reason wins.
        if let Phase::Terminated { reason: existing } = self.phase {
            return TelemetryVerdict::stop(existing);
        }
        self.phase = Phase::Terminated { reason };
        self.dispatcher
            .dispatch(SessionEvent::Terminated(TerminatedEvent {
                session_id: self.session_id.clone(),
                reason,
                steps_taken: self.steps_taken,
                items_fetched: self.items_fetched,
                timestamp: now,
            }));
        TelemetryVerdict::stop(reason)
    }
}
