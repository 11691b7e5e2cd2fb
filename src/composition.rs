// ABOUTME: Composition Engine — per-(session, composite) progression state for the five composition types
// ABOUTME: Sessions are registered on first use, keyed by a mutex per entry rather than a single global lock

use crate::resolver::Plan;
use crate::types::{AtomicConstraint, CompositeConstraint, CompositionType};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;

pub type SessionId = String;

/// Lifecycle state of one composite's progression within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionState {
    NotStarted,
    InProgress,
    Completed,
}

/// Per-(session, composite) progression state. A fresh context is created
/// the first time a composite fires in a session; there is no inheritance
/// across sessions or across distinct composite ids.
///
/// `sequence_step` and `hierarchy_level`/`progression_level` are the
/// literal counters the spec describes, not array indices: `advance`
/// always moves them by exactly one unit, even across gaps in the
/// underlying `sequence_order`/`hierarchy_level` values. Every "advance"
/// here is expressed as building a new `CompositionContext` value and
/// swapping it in under the per-entry lock — no field of an existing
/// context is ever written through.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionContext {
    pub state: CompositionState,
    /// The `sequence_order` value currently being sought (Sequential).
    pub sequence_step: u32,
    /// The `hierarchy_level` value currently being sought (Hierarchical/Layered).
    pub hierarchy_level: i64,
    /// Sentinel `i64::MIN` until seeded from the plan's minimum level on
    /// first use (Progressive only, whose starting level depends on the
    /// plan rather than being fixed at construction).
    pub progression_level: i64,
    /// Components a caller has explicitly confirmed complete (Layered).
    pub completed_component_ids: HashSet<String>,
}

impl CompositionContext {
    fn fresh() -> Self {
        Self {
            state: CompositionState::NotStarted,
            sequence_step: 1,
            hierarchy_level: 0,
            progression_level: i64::MIN,
            completed_component_ids: HashSet::new(),
        }
    }
}

fn atoms_at_level(plan: &Plan, level: i64) -> Vec<AtomicConstraint> {
    plan.iter()
        .filter(|a| a.hierarchy_level.map(|l| l as i64).unwrap_or(0) == level)
        .cloned()
        .collect()
}

/// Coordinates progression state for composite constraints across
/// sessions. Each session/composite pair gets its own lock so unrelated
/// sessions never contend.
#[derive(Default)]
pub struct CompositionEngine {
    sessions: DashMap<(SessionId, String), Mutex<CompositionContext>>,
}

impl CompositionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Components that should be active on this call, given the
    /// composite's type and the session's current progression. Advances
    /// the session's internal state as a side effect (except for Layered,
    /// which requires an explicit `mark_completed` call to advance).
    pub fn active_components(
        &self,
        session_id: &SessionId,
        composite: &CompositeConstraint,
        plan: &Plan,
    ) -> Vec<AtomicConstraint> {
        let key = (session_id.clone(), composite.id.to_string());
        let entry = self
            .sessions
            .entry(key)
            .or_insert_with(|| Mutex::new(CompositionContext::fresh()));
        let mut guard = entry.lock();

        if guard.state == CompositionState::Completed {
            return Vec::new();
        }

        let (next, active) = match composite.composition_type {
            CompositionType::Sequential => Self::advance_sequential(&guard, plan),
            CompositionType::Parallel => Self::advance_parallel(&guard, plan),
            CompositionType::Hierarchical => Self::advance_hierarchical(&guard, plan),
            CompositionType::Progressive => Self::advance_progressive(&guard, plan),
            CompositionType::Layered => {
                let active = Self::active_layered(&guard, plan);
                (guard.clone(), active)
            }
        };
        *guard = next;
        active
    }

    /// Explicit confirmation that the currently active layer of a Layered
    /// composite is done; unblocks the next layer. No-op for other
    /// composition types.
    pub fn mark_completed(&self, session_id: &SessionId, composite: &CompositeConstraint, plan: &Plan) {
        if composite.composition_type != CompositionType::Layered {
            return;
        }
        let key = (session_id.clone(), composite.id.to_string());
        let entry = self
            .sessions
            .entry(key)
            .or_insert_with(|| Mutex::new(CompositionContext::fresh()));
        let mut guard = entry.lock();

        let max_level = plan
            .iter()
            .map(|a| a.hierarchy_level.map(|l| l as i64).unwrap_or(0))
            .max()
            .unwrap_or(0);

        let mut completed_component_ids = guard.completed_component_ids.clone();
        for atom in atoms_at_level(plan, guard.hierarchy_level) {
            completed_component_ids.insert(atom.id.to_string());
        }

        let next_level = guard.hierarchy_level + 1;
        let state = if next_level > max_level {
            CompositionState::Completed
        } else {
            CompositionState::InProgress
        };

        let next = CompositionContext {
            state,
            hierarchy_level: next_level,
            completed_component_ids,
            ..guard.clone()
        };
        *guard = next;
    }

    /// Current lifecycle state for a session/composite pair, if it exists.
    pub fn state(&self, session_id: &SessionId, composite_id: &str) -> Option<CompositionState> {
        self.sessions
            .get(&(session_id.clone(), composite_id.to_string()))
            .map(|e| e.lock().state)
    }

    /// Returns atoms whose `sequence_order` equals `ctx.sequence_step`, then
    /// advances `sequence_step` by exactly one. Non-contiguous
    /// `sequence_order` values (legal under I3, which requires only
    /// uniqueness) are walked one step at a time, surfacing empty calls for
    /// the gaps rather than jumping to the next populated step.
    fn advance_sequential(ctx: &CompositionContext, plan: &Plan) -> (CompositionContext, Vec<AtomicConstraint>) {
        let max_order = plan
            .iter()
            .filter_map(|a| a.sequence_order.map(|n| n.get()))
            .max()
            .unwrap_or(0);

        let active: Vec<AtomicConstraint> = plan
            .iter()
            .filter(|a| a.sequence_order.map(|n| n.get()) == Some(ctx.sequence_step))
            .cloned()
            .collect();

        let next_step = ctx.sequence_step + 1;
        let state = if next_step > max_order {
            CompositionState::Completed
        } else {
            CompositionState::InProgress
        };
        let next = CompositionContext {
            state,
            sequence_step: next_step,
            ..ctx.clone()
        };
        (next, active)
    }

    fn advance_parallel(ctx: &CompositionContext, plan: &Plan) -> (CompositionContext, Vec<AtomicConstraint>) {
        let next = CompositionContext {
            state: CompositionState::InProgress,
            ..ctx.clone()
        };
        (next, plan.clone())
    }

    /// Returns atoms whose `hierarchy_level` equals `ctx.hierarchy_level`,
    /// then advances `hierarchy_level` by exactly one. Mirrors
    /// `advance_sequential`'s one-unit walk so gaps in `hierarchy_level`
    /// are visited (and surface empty) rather than skipped.
    fn advance_hierarchical(ctx: &CompositionContext, plan: &Plan) -> (CompositionContext, Vec<AtomicConstraint>) {
        let max_level = plan
            .iter()
            .map(|a| a.hierarchy_level.map(|l| l as i64).unwrap_or(0))
            .max()
            .unwrap_or(0);

        let active = atoms_at_level(plan, ctx.hierarchy_level);

        let next_level = ctx.hierarchy_level + 1;
        let state = if next_level > max_level {
            CompositionState::Completed
        } else {
            CompositionState::InProgress
        };
        let next = CompositionContext {
            state,
            hierarchy_level: next_level,
            ..ctx.clone()
        };
        (next, active)
    }

    /// Steps through every integer level from the plan's minimum to its
    /// maximum, one per call, accumulating: each call returns every atom at
    /// or below the current progression level. A level is never skipped,
    /// even when it has no atoms of its own. Atoms with no explicit
    /// `hierarchy_level` default to level 1 (the spec's Progressive-only
    /// default).
    fn advance_progressive(ctx: &CompositionContext, plan: &Plan) -> (CompositionContext, Vec<AtomicConstraint>) {
        let mut levels: Vec<i64> = plan
            .iter()
            .map(|a| a.hierarchy_level.map(|l| l as i64).unwrap_or(1))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        levels.sort_unstable();
        let (min_level, max_level) = match (levels.first(), levels.last()) {
            (Some(min), Some(max)) => (*min, *max),
            _ => (1, 1),
        };

        let current = if ctx.progression_level == i64::MIN {
            min_level
        } else {
            ctx.progression_level
        };

        let active: Vec<AtomicConstraint> = plan
            .iter()
            .filter(|a| a.hierarchy_level.map(|l| l as i64).unwrap_or(1) <= current)
            .cloned()
            .collect();

        let (next_level, state) = if current >= max_level {
            (current, CompositionState::Completed)
        } else {
            (current + 1, CompositionState::InProgress)
        };

        let next = CompositionContext {
            state,
            progression_level: next_level,
            ..ctx.clone()
        };
        (next, active)
    }

    /// Layered never auto-advances: a layer stays active until the caller
    /// explicitly confirms it with `mark_completed`.
    fn active_layered(ctx: &CompositionContext, plan: &Plan) -> Vec<AtomicConstraint> {
        atoms_at_level(plan, ctx.hierarchy_level)
    }
}
