// ABOUTME: Structured logging collaborator — one sum-type event covering every emission the core makes
// ABOUTME: TracingLogger is the default sink; tests can swap in a collecting logger without touching call sites

use crate::types::ConstraintId;
use chrono::{DateTime, Utc};

/// Every structured event the core can emit. Closed on purpose: a new kind
/// of event means a new variant, not a stringly-typed field.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    ResolveOk {
        id: ConstraintId,
        duration_nanos: u64,
        cache_hit: bool,
    },
    ResolveCycle {
        chain: Vec<ConstraintId>,
    },
    ResolveNotFound {
        id: ConstraintId,
    },
    MatchError {
        id: ConstraintId,
        reason: String,
    },
    ActivationSummary {
        session_id: String,
        fired_count: usize,
        duration_millis: u64,
        deadline_exceeded: bool,
    },
}

impl LogEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Sink for structured events. Kept as a trait so tests can assert on
/// emitted events instead of scraping log output.
pub trait StructuredLogger: Send + Sync {
    fn log(&self, event: LogEvent);
}

/// Default logger: routes every event through `tracing` at a severity that
/// matches the event's nature.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl StructuredLogger for TracingLogger {
    fn log(&self, event: LogEvent) {
        match event {
            LogEvent::ResolveOk {
                id,
                duration_nanos,
                cache_hit,
            } => {
                tracing::debug!(id = %id, duration_nanos, cache_hit, "resolved constraint");
            }
            LogEvent::ResolveCycle { chain } => {
                let rendered = chain.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(" -> ");
                tracing::error!(chain = %rendered, "circular reference detected during resolution");
            }
            LogEvent::ResolveNotFound { id } => {
                tracing::warn!(id = %id, "resolution referenced unknown constraint id");
            }
            LogEvent::MatchError { id, reason } => {
                tracing::warn!(id = %id, reason = %reason, "trigger evaluation failed for constraint");
            }
            LogEvent::ActivationSummary {
                session_id,
                fired_count,
                duration_millis,
                deadline_exceeded,
            } => {
                tracing::info!(
                    session_id = %session_id,
                    fired_count,
                    duration_millis,
                    deadline_exceeded,
                    "activation pass complete"
                );
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{LogEvent, StructuredLogger};
    use parking_lot::Mutex;

    /// Collects every event logged, for assertions in tests elsewhere in
    /// the crate.
    #[derive(Default)]
    pub struct CollectingLogger {
        pub events: Mutex<Vec<LogEvent>>,
    }

    impl StructuredLogger for CollectingLogger {
        fn log(&self, event: LogEvent) {
            self.events.lock().push(event);
        }
    }
}
