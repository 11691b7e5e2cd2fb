// ABOUTME: Error taxonomy for the constraint activation core
// ABOUTME: Every fallible operation returns a concrete CoreError variant, never an opaque anyhow::Error

use crate::types::ConstraintId;
use thiserror::Error;

/// Core error taxonomy. One variant per error kind named in the spec's
/// error table; each carries the fields needed to act on it without
/// re-parsing a message string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A constructor was given structurally invalid input.
    #[error("validation error on field `{field}`: {reason}")]
    Validation { field: String, reason: String },

    /// `add_atomic`/`add_composite` was called with an id already present.
    #[error("duplicate constraint id `{id}`")]
    DuplicateId { id: ConstraintId },

    /// A composite referenced one or more ids absent from the library.
    #[error("reference validation failed, missing ids: {missing:?}")]
    ReferenceValidation { missing: Vec<ConstraintId> },

    /// Resolution walked into an id already on the in-progress path.
    #[error("circular reference detected: {chain:?}")]
    CircularReference { chain: Vec<ConstraintId> },

    /// `remove` was called on an id still referenced by a composite.
    #[error("constraint `{id}` is still referenced by: {referenced_by:?}")]
    ConstraintInUse {
        id: ConstraintId,
        referenced_by: Vec<ConstraintId>,
    },

    /// `get`/`resolve` was called on an unknown id.
    #[error("constraint `{id}` not found")]
    NotFound { id: ConstraintId },

    /// The activation soft deadline was hit before completion.
    #[error("activation budget exceeded")]
    ActivationBudgetExceeded,

    /// The `LibraryLoader` collaborator failed.
    #[error("failed to load library: {reason}")]
    LoadError { reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
