//! Session lifecycle events.
//!
//! Provides hooks for logging and custom reactions around engine activity:
//! planned steps, scored telemetry, profile changes, cooldowns, and
//! termination.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::profiles::ProfileName;
use super::telemetry::StopReason;

#[derive(Debug, Clone)]
pub struct StepPlannedEvent {
    pub session_id: String,
    pub step: u64,
    pub delay_ms: u64,
    pub scroll_px: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TelemetryScoredEvent {
    pub session_id: String,
    pub step: u64,
    pub risk_delta: i32,
    pub accumulated_risk: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProfileChangedEvent {
    pub session_id: String,
    pub from: ProfileName,
    pub to: ProfileName,
    pub accumulated_risk: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CooldownEnteredEvent {
    pub session_id: String,
    pub cooldown_ms: u64,
    pub accumulated_risk: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TerminatedEvent {
    pub session_id: String,
    pub reason: StopReason,
    pub steps_taken: u64,
    pub items_fetched: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    StepPlanned(StepPlannedEvent),
    TelemetryScored(TelemetryScoredEvent),
    ProfileChanged(ProfileChangedEvent),
    CooldownEntered(CooldownEnteredEvent),
    Terminated(TerminatedEvent),
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &SessionEvent);
}

/// Dispatcher that broadcasts events to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn dispatch(&self, event: SessionEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

/// Logs events using the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &SessionEvent) {
        match event {
            SessionEvent::StepPlanned(step) => {
                log::debug!(
                    "[{}] step {} -> wait {}ms, scroll {}px",
                    step.session_id,
                    step.step,
                    step.delay_ms,
                    step.scroll_px
                );
            }
            SessionEvent::TelemetryScored(scored) => {
                log::debug!(
                    "[{}] step {} scored {:+} (risk {})",
                    scored.session_id,
                    scored.step,
                    scored.risk_delta,
                    scored.accumulated_risk
                );
            }
            SessionEvent::ProfileChanged(change) => {
                log::info!(
                    "[{}] profile {} -> {} at risk {}",
                    change.session_id,
                    change.from,
                    change.to,
                    change.accumulated_risk
                );
            }
            SessionEvent::CooldownEntered(cooldown) => {
                log::info!(
                    "[{}] cooldown {}ms at risk {}",
                    cooldown.session_id,
                    cooldown.cooldown_ms,
                    cooldown.accumulated_risk
                );
            }
            SessionEvent::Terminated(end) => {
                log::warn!(
                    "[{}] terminated: {} after {} steps, {} items",
                    end.session_id,
                    end.reason,
                    end.steps_taken,
                    end.items_fetched
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl EventHandler for Recorder {
        fn handle(&self, event: &SessionEvent) {
            let label = match event {
                SessionEvent::StepPlanned(_) => "step",
                SessionEvent::TelemetryScored(_) => "scored",
                SessionEvent::ProfileChanged(_) => "profile",
                SessionEvent::CooldownEntered(_) => "cooldown",
                SessionEvent::Terminated(_) => "terminated",
            };
            self.seen.lock().unwrap().push(label.to_string());
        }
    }

    #[test]
    fn broadcasts_to_registered_handlers() {
        let recorder = Arc::new(Recorder::default());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_handler(recorder.clone());

        dispatcher.dispatch(SessionEvent::Terminated(TerminatedEvent {
            session_id: "sess-1".into(),
            reason: StopReason::PlanComplete,
            steps_taken: 4,
            items_fetched: 40,
            timestamp: Utc::now(),
        }));

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["terminated"]);
    }
}
