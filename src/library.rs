// ABOUTME: Library Store — the single source of truth for constraints
// ABOUTME: Enforces id uniqueness and reference integrity on insert; read-write locked, no lock upgrade

use crate::error::{CoreError, CoreResult};
use crate::types::{
    AtomicConstraint, ComponentsSpec, CompositeConstraint, CompositionType, ConstraintId,
    ConstraintRecord,
};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Read-only snapshot of library size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryStats {
    pub atomic_count: usize,
    pub composite_count: usize,
}

#[derive(Debug, Default)]
struct LibraryInner {
    atomics: HashMap<ConstraintId, AtomicConstraint>,
    composites: HashMap<ConstraintId, CompositeConstraint>,
}

impl LibraryInner {
    fn contains(&self, id: &ConstraintId) -> bool {
        self.atomics.contains_key(id) || self.composites.contains_key(id)
    }

    fn get(&self, id: &ConstraintId) -> Option<ConstraintRecord> {
        if let Some(a) = self.atomics.get(id) {
            return Some(ConstraintRecord::Atomic(a.clone()));
        }
        self.composites.get(id).map(|c| ConstraintRecord::Composite(c.clone()))
    }
}

/// Thread-safe store of atomic and composite constraints. Activation paths
/// take read locks only; mutation operations take the write lock. No lock
/// upgrade is ever attempted.
#[derive(Debug, Default)]
pub struct ConstraintLibrary {
    inner: RwLock<LibraryInner>,
}

impl ConstraintLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an atomic constraint. Fails if the id already exists.
    pub fn add_atomic(&self, atomic: AtomicConstraint) -> CoreResult<()> {
        let mut inner = self.inner.write();
        if inner.contains(&atomic.id) {
            return Err(CoreError::DuplicateId { id: atomic.id });
        }
        inner.atomics.insert(atomic.id.clone(), atomic);
        Ok(())
    }

    /// Insert a composite constraint. Fails if the id already exists, or
    /// if any referenced id is absent from the library at insert time
    /// (I2), or if the composition-type-specific invariants I3/I4 do not
    /// hold over the currently-resolvable referenced atoms.
    ///
    /// Forward references (a composite referencing an id added later) are
    /// permitted — cycles are only detected at resolve time.
    pub fn add_composite(&self, composite: CompositeConstraint) -> CoreResult<()> {
        let mut inner = self.inner.write();
        if inner.contains(&composite.id) {
            return Err(CoreError::DuplicateId { id: composite.id });
        }

        let refs = composite.references();

        // Inline atoms are always present by construction; only
        // ComponentsSpec::References needs an I2 check.
        if let ComponentsSpec::References(_) = &composite.components {
            let missing: Vec<ConstraintId> = refs
                .iter()
                .filter(|r| !inner.contains(&r.constraint_id))
                .map(|r| r.constraint_id.clone())
                .collect();
            if !missing.is_empty() {
                return Err(CoreError::ReferenceValidation { missing });
            }
        }

        if composite.composition_type == CompositionType::Sequential {
            let mut seen = std::collections::HashSet::new();
            for r in &refs {
                let effective = r.sequence_order.or_else(|| {
                    inner
                        .atomics
                        .get(&r.constraint_id)
                        .and_then(|a| a.sequence_order)
                });
                if let Some(order) = effective {
                    if !seen.insert(order) {
                        return Err(CoreError::Validation {
                            field: "sequence_order".to_string(),
                            reason: format!(
                                "duplicate sequence_order {} among references of composite `{}`",
                                order, composite.id
                            ),
                        });
                    }
                }
            }
        }

        inner.composites.insert(composite.id.clone(), composite);
        Ok(())
    }

    /// Fetch a constraint record by id.
    pub fn get(&self, id: &ConstraintId) -> CoreResult<ConstraintRecord> {
        self.inner
            .read()
            .get(id)
            .ok_or_else(|| CoreError::NotFound { id: id.clone() })
    }

    pub fn contains(&self, id: &ConstraintId) -> bool {
        self.inner.read().contains(id)
    }

    /// Remove a constraint. Fails if any composite still references it.
    pub fn remove(&self, id: &ConstraintId) -> CoreResult<()> {
        let mut inner = self.inner.write();
        if !inner.contains(id) {
            return Err(CoreError::NotFound { id: id.clone() });
        }

        let referenced_by: Vec<ConstraintId> = inner
            .composites
            .values()
            .filter(|c| c.references().iter().any(|r| &r.constraint_id == id))
            .map(|c| c.id.clone())
            .collect();

        if !referenced_by.is_empty() {
            return Err(CoreError::ConstraintInUse {
                id: id.clone(),
                referenced_by,
            });
        }

        inner.atomics.remove(id);
        inner.composites.remove(id);
        Ok(())
    }

    pub fn iter_atomic(&self) -> Vec<AtomicConstraint> {
        self.inner.read().atomics.values().cloned().collect()
    }

    pub fn iter_composite(&self) -> Vec<CompositeConstraint> {
        self.inner.read().composites.values().cloned().collect()
    }

    /// Snapshot of every record in the library (atomic and composite).
    pub fn iter_all(&self) -> Vec<ConstraintRecord> {
        let inner = self.inner.read();
        inner
            .atomics
            .values()
            .cloned()
            .map(ConstraintRecord::Atomic)
            .chain(inner.composites.values().cloned().map(ConstraintRecord::Composite))
            .collect()
    }

    pub fn stats(&self) -> LibraryStats {
        let inner = self.inner.read();
        LibraryStats {
            atomic_count: inner.atomics.len(),
            composite_count: inner.composites.len(),
        }
    }

    /// Build a library from a complete batch of atomics and composites, as
    /// a `LibraryLoader` reading a whole file would. Unlike `add_composite`
    /// (which enforces reference integrity against the library *as it
    /// exists so far*, one call at a time), a batch load checks every
    /// reference against the *full* id universe being loaded — so mutual
    /// references between two composites in the same batch are permitted.
    /// Cycles are still only ever caught by the Resolver at resolve time.
    pub fn load_batch(
        atomics: Vec<AtomicConstraint>,
        composites: Vec<CompositeConstraint>,
    ) -> CoreResult<Self> {
        let lib = Self::new();
        let mut inner = lib.inner.write();

        for atomic in atomics {
            if inner.contains(&atomic.id) {
                return Err(CoreError::DuplicateId { id: atomic.id });
            }
            inner.atomics.insert(atomic.id.clone(), atomic);
        }

        let mut universe: std::collections::HashSet<ConstraintId> =
            inner.atomics.keys().cloned().collect();
        for composite in &composites {
            if universe.contains(&composite.id) {
                return Err(CoreError::DuplicateId {
                    id: composite.id.clone(),
                });
            }
            universe.insert(composite.id.clone());
        }

        for composite in &composites {
            let refs = composite.references();
            if let ComponentsSpec::References(_) = &composite.components {
                let missing: Vec<ConstraintId> = refs
                    .iter()
                    .filter(|r| !universe.contains(&r.constraint_id))
                    .map(|r| r.constraint_id.clone())
                    .collect();
                if !missing.is_empty() {
                    return Err(CoreError::ReferenceValidation { missing });
                }
            }

            if composite.composition_type == CompositionType::Sequential {
                let mut seen = std::collections::HashSet::new();
                for r in &refs {
                    let effective = r.sequence_order.or_else(|| {
                        inner
                            .atomics
                            .get(&r.constraint_id)
                            .and_then(|a| a.sequence_order)
                    });
                    if let Some(order) = effective {
                        if !seen.insert(order) {
                            return Err(CoreError::Validation {
                                field: "sequence_order".to_string(),
                                reason: format!(
                                    "duplicate sequence_order {} among references of composite `{}`",
                                    order, composite.id
                                ),
                            });
                        }
                    }
                }
            }
        }

        for composite in composites {
            inner.composites.insert(composite.id.clone(), composite);
        }

        drop(inner);
        Ok(lib)
    }

    /// Build a new library from `self` and `other`. Any `DuplicateId`
    /// aborts the whole merge and no partial result is returned.
    pub fn merge(&self, other: &ConstraintLibrary) -> CoreResult<ConstraintLibrary> {
        let merged = ConstraintLibrary::new();
        for atomic in self.iter_atomic() {
            merged.add_atomic(atomic)?;
        }
        for composite in self.iter_composite() {
            merged.add_composite(composite)?;
        }
        for atomic in other.iter_atomic() {
            merged.add_atomic(atomic)?;
        }
        for composite in other.iter_composite() {
            merged.add_composite(composite)?;
        }
        Ok(merged)
    }

    /// Deep-clone the library into a new, independent instance.
    pub fn clone_library(&self) -> ConstraintLibrary {
        let inner = self.inner.read();
        let cloned = LibraryInner {
            atomics: inner.atomics.clone(),
            composites: inner.composites.clone(),
        };
        ConstraintLibrary {
            inner: RwLock::new(cloned),
        }
    }
}
