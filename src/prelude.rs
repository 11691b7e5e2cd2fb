// ABOUTME: Convenience re-exports for downstream callers of the constraint activation core

pub use crate::activator::{ActivationResult, Activator};
pub use crate::clock::{Clock, FakeClock, SystemClock};
pub use crate::composition::{CompositionEngine, CompositionState};
pub use crate::config::{Config, MatchWeights};
pub use crate::context::{ContextAnalyzer, RawContext, TriggerContext};
pub use crate::error::{CoreError, CoreResult};
pub use crate::formatter::InjectionFormatter;
pub use crate::library::{ConstraintLibrary, LibraryStats};
pub use crate::loader::{LibraryLoader, StaticLoader};
pub use crate::logging::{LogEvent, StructuredLogger, TracingLogger};
pub use crate::matcher::{MatchOutcome, TriggerMatcher};
pub use crate::resolver::{Plan, Resolver, ResolverMetrics};
pub use crate::types::{
    activation_order, AtomicConstraint, ComponentsSpec, CompositeConstraint, CompositionType,
    ConstraintId, ConstraintReference, ConstraintRecord, Metadata, Priority, TriggerConfiguration,
};
