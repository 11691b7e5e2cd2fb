// ABOUTME: LibraryLoader — turns a whole-file definition of atomics/composites into a ConstraintLibrary
// ABOUTME: No concrete file-format loader ships here (out of scope); StaticLoader wraps an in-memory batch for tests and embedding

use crate::error::CoreResult;
use crate::library::ConstraintLibrary;
use crate::types::{AtomicConstraint, CompositeConstraint};

/// Builds a complete `ConstraintLibrary` from some external definition.
/// Implementations see the whole set of records at once, which is what
/// lets `ConstraintLibrary::load_batch` validate references across the
/// full id universe instead of one record at a time.
pub trait LibraryLoader {
    fn load(&self) -> CoreResult<ConstraintLibrary>;
}

/// Loads a library from an in-memory batch. Used by tests and by callers
/// embedding a fixed set of constraints directly instead of reading them
/// from a file.
pub struct StaticLoader {
    atomics: Vec<AtomicConstraint>,
    composites: Vec<CompositeConstraint>,
}

impl StaticLoader {
    pub fn new(atomics: Vec<AtomicConstraint>, composites: Vec<CompositeConstraint>) -> Self {
        Self { atomics, composites }
    }
}

impl LibraryLoader for StaticLoader {
    fn load(&self) -> CoreResult<ConstraintLibrary> {
        ConstraintLibrary::load_batch(self.atomics.clone(), self.composites.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConstraintId, Priority, TriggerConfiguration};

    fn atomic(id: &str) -> AtomicConstraint {
        let triggers =
            TriggerConfiguration::with_default_threshold(vec!["x".to_string()], vec![], vec![], vec![])
                .unwrap();
        AtomicConstraint::new(
            ConstraintId::new(id).unwrap(),
            "title",
            Priority::new(0.5).unwrap(),
            triggers,
            vec!["reminder".to_string()],
            None,
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn static_loader_builds_a_library() {
        let loader = StaticLoader::new(vec![atomic("a"), atomic("b")], vec![]);
        let lib = loader.load().unwrap();
        assert_eq!(lib.stats().atomic_count, 2);
    }

    #[test]
    fn static_loader_surfaces_duplicate_id_error() {
        let loader = StaticLoader::new(vec![atomic("a"), atomic("a")], vec![]);
        assert!(loader.load().is_err());
    }
}
