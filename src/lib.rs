// ABOUTME: Main entry point for the constraint-core crate
// ABOUTME: Exports the library store, resolver, matcher, composition engine, and activator that make up the activation pipeline

//! # constraint-core
//!
//! A methodology-agnostic constraint activation core: a library of
//! user-authored atomic and composite constraints, a resolver that expands
//! composites into ordered atomic plans, a trigger matcher that scores a
//! live tool-call context against each constraint's triggers, a composition
//! engine that tracks multi-turn progression through composites, and an
//! injection formatter that renders the final selection deterministically.
//!
//! ## Example
//!
//! ```rust,no_run
//! use constraint_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> CoreResult<()> {
//! let library = Arc::new(ConstraintLibrary::new());
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
//! let logger: Arc<dyn StructuredLogger> = Arc::new(TracingLogger);
//! let resolver = Arc::new(Resolver::new(Arc::clone(&library), Arc::clone(&clock), Arc::clone(&logger)));
//! let activator = Activator::new(library, resolver, logger, clock, Config::default());
//!
//! let raw = RawContext {
//!     user_input: Some("let's write a test first".to_string()),
//!     ..Default::default()
//! };
//! let result = activator.activate(&raw, "session-1", 1).await;
//! println!("{}", result.payload);
//! # Ok(())
//! # }
//! ```

pub mod activator;
pub mod clock;
pub mod composition;
pub mod config;
pub mod context;
pub mod error;
pub mod formatter;
pub mod library;
pub mod loader;
pub mod logging;
pub mod matcher;
pub mod resolver;
pub mod types;

pub mod prelude;
