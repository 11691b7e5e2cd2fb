// ABOUTME: Resolver — expands a constraint id into its ordered atomic-leaf plan, with cycle detection and caching
// ABOUTME: Caches resolved plans in a concurrent map and de-duplicates concurrent first-time resolutions of the same id

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::library::ConstraintLibrary;
use crate::logging::{LogEvent, StructuredLogger};
use crate::types::{AtomicConstraint, ComponentsSpec, ConstraintId, ConstraintRecord};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

/// The flattened sequence of atomic leaves obtained by resolving a
/// constraint id.
pub type Plan = Vec<AtomicConstraint>;

#[derive(Debug, Default)]
struct ResolverMetricsInner {
    total_resolutions: u64,
    cache_hits: u64,
    total_duration_nanos: u64,
    peak_duration_nanos: u64,
}

/// Point-in-time snapshot of resolver metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverMetrics {
    pub total_resolutions: u64,
    pub cache_hit_rate: f64,
    pub average_resolution_nanos: f64,
    pub peak_resolution_nanos: u64,
}

/// Resolves constraint ids into atomic plans, caching results and
/// de-duplicating concurrent first-time resolutions of the same id.
pub struct Resolver {
    library: Arc<ConstraintLibrary>,
    clock: Arc<dyn Clock>,
    logger: Arc<dyn StructuredLogger>,
    cache: DashMap<ConstraintId, Plan>,
    in_flight: DashMap<ConstraintId, Arc<Notify>>,
    metrics: Mutex<ResolverMetricsInner>,
}

impl Resolver {
    pub fn new(
        library: Arc<ConstraintLibrary>,
        clock: Arc<dyn Clock>,
        logger: Arc<dyn StructuredLogger>,
    ) -> Self {
        Self {
            library,
            clock,
            logger,
            cache: DashMap::new(),
            in_flight: DashMap::new(),
            metrics: Mutex::new(ResolverMetricsInner::default()),
        }
    }

    /// Resolve a single id into its atomic plan.
    pub async fn resolve(self: &Arc<Self>, id: &ConstraintId) -> CoreResult<Plan> {
        if let Some(plan) = self.cache.get(id) {
            self.record_hit();
            self.logger.log(LogEvent::ResolveOk {
                id: id.clone(),
                duration_nanos: 0,
                cache_hit: true,
            });
            return Ok(plan.clone());
        }

        loop {
            // Either join an in-flight computation for this id, or become
            // the one computing it.
            let maybe_existing = {
                let entry = self.in_flight.entry(id.clone());
                match entry {
                    dashmap::mapref::entry::Entry::Occupied(o) => Some(o.get().clone()),
                    dashmap::mapref::entry::Entry::Vacant(v) => {
                        v.insert(Arc::new(Notify::new()));
                        None
                    }
                }
            };

            if let Some(existing) = maybe_existing {
                existing.notified().await;
                if let Some(plan) = self.cache.get(id) {
                    self.record_hit();
                    self.logger.log(LogEvent::ResolveOk {
                        id: id.clone(),
                        duration_nanos: 0,
                        cache_hit: true,
                    });
                    return Ok(plan.clone());
                }
                // The computation that finished failed (nothing cached);
                // loop around and attempt the computation ourselves.
                continue;
            }

            // We are the sole computer for this id.
            let start = self.clock.now_nanos();
            let mut in_progress = Vec::new();
            let result = self.resolve_inner(id, &mut in_progress);
            let elapsed = self.clock.now_nanos().saturating_sub(start);
            self.record_miss(elapsed);

            if let Ok(plan) = &result {
                self.cache.insert(id.clone(), plan.clone());
                self.logger.log(LogEvent::ResolveOk {
                    id: id.clone(),
                    duration_nanos: elapsed,
                    cache_hit: false,
                });
            }

            if let Some((_, notify)) = self.in_flight.remove(id) {
                notify.notify_waiters();
            }
            return result;
        }
    }

    /// True if `id` already has a cached plan, without triggering resolution.
    /// Used by the Activator to decide whether a composite can still be
    /// resolved once the soft deadline has been approached.
    pub fn is_cached(&self, id: &ConstraintId) -> bool {
        self.cache.contains_key(id)
    }

    /// Resolve a set of ids concurrently. Per-id failures surface as
    /// per-id entries rather than failing the whole batch.
    pub async fn resolve_many(
        self: &Arc<Self>,
        ids: &[ConstraintId],
    ) -> Vec<(ConstraintId, CoreResult<Plan>)> {
        let mut handles = Vec::with_capacity(ids.len());
        for id in ids {
            let resolver = Arc::clone(self);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let result = resolver.resolve(&id).await;
                (id, result)
            }));
        }

        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(pair) => out.push(pair),
                Err(_) => {
                    // The task panicked; surface it as a resolution
                    // failure rather than propagating the panic.
                }
            }
        }
        out
    }

    /// Recursive, cache-aware expansion. `in_progress` is the current
    /// recursion path, used for cycle detection.
    fn resolve_inner(&self, id: &ConstraintId, in_progress: &mut Vec<ConstraintId>) -> CoreResult<Plan> {
        if let Some(plan) = self.cache.get(id) {
            return Ok(plan.clone());
        }

        if in_progress.contains(id) {
            let mut chain = in_progress.clone();
            chain.push(id.clone());
            return Err(CoreError::CircularReference { chain });
        }

        let record = self.library.get(id)?;
        in_progress.push(id.clone());

        let plan = match record {
            ConstraintRecord::Atomic(atom) => vec![atom],
            ConstraintRecord::Composite(composite) => match &composite.components {
                ComponentsSpec::Inline(atoms) => atoms.clone(),
                ComponentsSpec::References(refs) => {
                    let mut flattened = Vec::new();
                    for reference in refs {
                        let sub_plan = self.resolve_inner(&reference.constraint_id, in_progress)?;
                        for atom in sub_plan {
                            let overlaid = atom.with_overlay(
                                reference.sequence_order,
                                reference.hierarchy_level,
                                reference.metadata.as_ref(),
                            );
                            flattened.push(overlaid);
                        }
                    }
                    flattened
                }
            },
        };

        in_progress.pop();
        self.cache.insert(id.clone(), plan.clone());
        Ok(plan)
    }

    fn record_hit(&self) {
        let mut m = self.metrics.lock();
        m.total_resolutions += 1;
        m.cache_hits += 1;
    }

    fn record_miss(&self, duration_nanos: u64) {
        let mut m = self.metrics.lock();
        m.total_resolutions += 1;
        m.total_duration_nanos += duration_nanos;
        if duration_nanos > m.peak_duration_nanos {
            m.peak_duration_nanos = duration_nanos;
        }
    }

    pub fn metrics(&self) -> ResolverMetrics {
        let m = self.metrics.lock();
        let cache_hit_rate = if m.total_resolutions == 0 {
            0.0
        } else {
            m.cache_hits as f64 / m.total_resolutions as f64
        };
        let misses = m.total_resolutions - m.cache_hits;
        let average_resolution_nanos = if misses == 0 {
            0.0
        } else {
            m.total_duration_nanos as f64 / misses as f64
        };
        ResolverMetrics {
            total_resolutions: m.total_resolutions,
            cache_hit_rate,
            average_resolution_nanos,
            peak_resolution_nanos: m.peak_duration_nanos,
        }
    }

    /// Drop every cached plan. Used when the library is mutated in a way
    /// that would invalidate prior resolutions.
    pub fn invalidate_cache(&self) {
        self.cache.clear();
    }
}
