//! # scrollpacer
//!
//! A risk-aware pacing engine for long-lived infinite-scroll scraping
//! sessions against rate-limited, bot-detecting services.
//!
//! The engine decides, at each step of a session, how long to wait and how
//! far to scroll, absorbs per-step telemetry (items fetched, latency,
//! captcha/rate-limit flags), and escalates or de-escalates pacing through a
//! small catalog of postures. It performs no I/O of its own: the scraping
//! loop owns the browser page, sleeps and scrolls on the engine's hints, and
//! reports back counts and flags.
//!
//! ## Features
//!
//! - Weighted initial-profile selection so fleets avoid a shared fingerprint
//! - Additive risk scoring with captcha, rate-limit, error-burst, stall, and
//!   latency-regression signals
//! - Risk-surcharged, jittered delay/scroll hints
//! - Cooldown and profile demotion on ceiling breach, bounded promotion on
//!   sustained health
//! - Hard stops: risk threshold, repeated captcha, stalled feed, step ceiling
//! - Injectable randomness and clock-explicit calls for deterministic tests
//!
//! ## Example
//!
//! ```no_run
//! use scrollpacer::{EngineOptions, ScrollEngine, TelemetrySample};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = ScrollEngine::new(EngineOptions::new(40))?;
//!     while engine.should_continue() {
//!         let hints = engine.get_next_hints();
//!         // caller waits hints.delay_ms, scrolls hints.scroll_px, extracts…
//!         let verdict = engine.process_telemetry(TelemetrySample::healthy(10, 10, 300));
//!         if verdict.should_stop {
//!             break;
//!         }
//!     }
//!     println!("{:?}", engine.get_summary());
//!     Ok(())
//! }
//! ```

mod engine;

pub mod config;
pub mod modules;

pub use crate::engine::{
    EngineError,
    EngineOptions,
    EngineResult,
    Phase,
    ScrollEngine,
    SessionSummary,
};

pub use crate::config::{ConfigError, EngineConfig, EngineConfigBuilder};

pub use crate::modules::{
    CadencePlanner,
    EventDispatcher,
    EventHandler,
    LatencyWindow,
    LoggingHandler,
    PacingProfile,
    ProfileName,
    RiskContext,
    RiskScorer,
    RiskWeights,
    SessionEvent,
    Span,
    StepHints,
    StopReason,
    TelemetrySample,
    TelemetryVerdict,
    UnknownProfile,
    select_initial_profile,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
