//! Engine building blocks
//!
//! Leaf components the session controller composes: profiles, scoring,
//! pacing, telemetry types, latency tracking, and lifecycle events.

pub mod cadence;
pub mod events;
pub mod metrics;
pub mod profiles;
pub mod risk;
pub mod telemetry;

// Re-export commonly used types
pub use cadence::CadencePlanner;
pub use events::{
    CooldownEnteredEvent, EventDispatcher, EventHandler, LoggingHandler, ProfileChangedEvent,
    SessionEvent, StepPlannedEvent, TelemetryScoredEvent, TerminatedEvent,
};
pub use metrics::LatencyWindow;
pub use profiles::{
    PacingProfile, ProfileName, Span, UnknownProfile, catalog, demoted, profile, promoted,
    select_initial_profile,
};
pub use risk::{RiskContext, RiskScorer, RiskWeights};
pub use telemetry::{StepHints, StopReason, TelemetrySample, TelemetryVerdict};
