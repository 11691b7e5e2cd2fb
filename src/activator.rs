// ABOUTME: Activator — orchestrates analyzer, matcher, resolver, composition engine, and formatter into one activation pass
// ABOUTME: Soft-deadlines the matching sweep and isolates per-constraint failures so one bad composite never sinks the pass

use crate::clock::Clock;
use crate::composition::CompositionEngine;
use crate::config::Config;
use crate::context::{ContextAnalyzer, RawContext};
use crate::error::CoreError;
use crate::formatter::InjectionFormatter;
use crate::library::ConstraintLibrary;
use crate::logging::{LogEvent, StructuredLogger};
use crate::matcher::TriggerMatcher;
use crate::resolver::Resolver;
use crate::types::{activation_order, AtomicConstraint, ConstraintId, ConstraintRecord};
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of one activation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationResult {
    pub payload: String,
    pub fired_ids: Vec<ConstraintId>,
    pub deadline_exceeded: bool,
}

/// Ties every collaborator together into the end-to-end activation
/// pipeline: raw context in, rendered injection payload out.
pub struct Activator {
    library: Arc<ConstraintLibrary>,
    resolver: Arc<Resolver>,
    matcher: TriggerMatcher,
    analyzer: ContextAnalyzer,
    composition: CompositionEngine,
    formatter: InjectionFormatter,
    logger: Arc<dyn StructuredLogger>,
    clock: Arc<dyn Clock>,
    config: Config,
}

impl Activator {
    pub fn new(
        library: Arc<ConstraintLibrary>,
        resolver: Arc<Resolver>,
        logger: Arc<dyn StructuredLogger>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        Self {
            library,
            resolver,
            matcher: TriggerMatcher::new(config.match_weights),
            analyzer: ContextAnalyzer::new(),
            composition: CompositionEngine::new(),
            formatter: InjectionFormatter::new(),
            logger,
            clock,
            config,
        }
    }

    pub async fn activate(
        &self,
        raw: &RawContext,
        session_id: &str,
        interaction_number: u64,
    ) -> ActivationResult {
        let context = self.analyzer.analyze(raw);
        let deadline_nanos = self.config.soft_deadline_millis.saturating_mul(1_000_000);
        let start = self.clock.now_nanos();

        let mut records = self.library.iter_all();
        records.sort_by(|a, b| a.id().cmp(b.id()));

        // Trigger matching (atomic and composite alike) always runs to
        // completion: the soft deadline never interrupts this sweep.
        let mut fired: Vec<ConstraintRecord> = Vec::new();
        for record in records {
            let outcome = self.matcher.evaluate(record.triggers(), &context);
            if outcome.fired {
                fired.push(record);
            }
        }

        // Composite resolution is the part the soft deadline gates: once
        // approached, only already-cached composites are still resolved;
        // uncached ones are skipped with a structured log entry.
        let mut deadline_exceeded = false;
        let mut collected: Vec<AtomicConstraint> = Vec::new();
        for record in &fired {
            match record {
                ConstraintRecord::Atomic(atom) => collected.push(atom.clone()),
                ConstraintRecord::Composite(composite) => {
                    let elapsed = self.clock.now_nanos().saturating_sub(start);
                    if elapsed > deadline_nanos && !self.resolver.is_cached(&composite.id) {
                        deadline_exceeded = true;
                        self.logger.log(LogEvent::MatchError {
                            id: composite.id.clone(),
                            reason: "soft deadline approached; skipped uncached composite resolution"
                                .to_string(),
                        });
                        continue;
                    }

                    match self.resolver.resolve(&composite.id).await {
                        Ok(plan) => {
                            let active = self.composition.active_components(
                                &session_id.to_string(),
                                composite,
                                &plan,
                            );
                            collected.extend(active);
                        }
                        Err(CoreError::CircularReference { chain }) => {
                            self.logger.log(LogEvent::ResolveCycle { chain });
                        }
                        Err(CoreError::NotFound { id }) => {
                            self.logger.log(LogEvent::ResolveNotFound { id });
                        }
                        Err(other) => {
                            self.logger.log(LogEvent::MatchError {
                                id: composite.id.clone(),
                                reason: other.to_string(),
                            });
                        }
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        let mut deduped: Vec<AtomicConstraint> = Vec::new();
        for atom in collected {
            if seen.insert(atom.id.clone()) {
                deduped.push(atom);
            }
        }
        deduped.sort_by(|a, b| activation_order(&(a.priority, &a.id), &(b.priority, &b.id)));

        let fired_ids: Vec<ConstraintId> = deduped.iter().map(|a| a.id.clone()).collect();
        let payload = self.formatter.render(&deduped, interaction_number);

        let duration_millis = self.clock.now_nanos().saturating_sub(start) / 1_000_000;
        self.logger.log(LogEvent::ActivationSummary {
            session_id: session_id.to_string(),
            fired_count: fired_ids.len(),
            duration_millis,
            deadline_exceeded,
        });

        ActivationResult {
            payload,
            fired_ids,
            deadline_exceeded,
        }
    }
}
