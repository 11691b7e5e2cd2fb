// ABOUTME: Core data model for the constraint activation core
// ABOUTME: ConstraintId, Priority, trigger configuration, atomic/composite constraints, and the closed ConstraintRecord sum type

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

/// Opaque, case-sensitive constraint identifier.
///
/// Non-empty, at most 128 bytes, matching `[A-Za-z0-9._-]+`. Equality and
/// ordering are by byte value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintId(String);

impl ConstraintId {
    pub fn new(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::Validation {
                field: "id".to_string(),
                reason: "constraint id must not be empty".to_string(),
            });
        }
        if id.len() > 128 {
            return Err(CoreError::Validation {
                field: "id".to_string(),
                reason: "constraint id must be at most 128 characters".to_string(),
            });
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
        {
            return Err(CoreError::Validation {
                field: "id".to_string(),
                reason: "constraint id must match [A-Za-z0-9._-]+".to_string(),
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finite real value in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(f64);

impl Priority {
    pub fn new(value: f64) -> CoreResult<Self> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(CoreError::Validation {
                field: "priority".to_string(),
                reason: "priority must be a finite value in [0.0, 1.0]".to_string(),
            });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Compares two `(Priority, ConstraintId)` pairs using the activation
/// order: descending priority, ascending id on ties.
pub fn activation_order(
    a: &(Priority, &ConstraintId),
    b: &(Priority, &ConstraintId),
) -> std::cmp::Ordering {
    b.0
        .0
        .partial_cmp(&a.0 .0)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.1.cmp(b.1))
}

/// Per-constraint trigger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfiguration {
    /// Case-insensitive keyword set; stored lowercased.
    keywords: HashSet<String>,
    /// Ordered glob-style file patterns.
    file_patterns: Vec<String>,
    /// Activity/context tags.
    context_patterns: HashSet<String>,
    /// Tags that veto a match if present in the live context.
    anti_patterns: HashSet<String>,
    /// Minimum weighted score required to fire.
    confidence_threshold: f64,
}

impl TriggerConfiguration {
    pub fn new(
        keywords: impl IntoIterator<Item = String>,
        file_patterns: impl IntoIterator<Item = String>,
        context_patterns: impl IntoIterator<Item = String>,
        anti_patterns: impl IntoIterator<Item = String>,
        confidence_threshold: f64,
    ) -> CoreResult<Self> {
        if confidence_threshold.is_nan() || !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(CoreError::Validation {
                field: "confidence_threshold".to_string(),
                reason: "confidence_threshold must be in [0.0, 1.0]".to_string(),
            });
        }

        let mut kw = HashSet::new();
        for k in keywords {
            let trimmed = k.trim();
            if trimmed.is_empty() {
                return Err(CoreError::Validation {
                    field: "keywords".to_string(),
                    reason: "keyword entries must be non-empty after trim".to_string(),
                });
            }
            kw.insert(trimmed.to_lowercase());
        }

        Ok(Self {
            keywords: kw,
            file_patterns: file_patterns.into_iter().collect(),
            context_patterns: context_patterns.into_iter().collect(),
            anti_patterns: anti_patterns.into_iter().collect(),
            confidence_threshold,
        })
    }

    /// Construct with the spec's default confidence threshold (0.7).
    pub fn with_default_threshold(
        keywords: impl IntoIterator<Item = String>,
        file_patterns: impl IntoIterator<Item = String>,
        context_patterns: impl IntoIterator<Item = String>,
        anti_patterns: impl IntoIterator<Item = String>,
    ) -> CoreResult<Self> {
        Self::new(keywords, file_patterns, context_patterns, anti_patterns, 0.7)
    }

    pub fn keywords(&self) -> &HashSet<String> {
        &self.keywords
    }

    pub fn file_patterns(&self) -> &[String] {
        &self.file_patterns
    }

    pub fn context_patterns(&self) -> &HashSet<String> {
        &self.context_patterns
    }

    pub fn anti_patterns(&self) -> &HashSet<String> {
        &self.anti_patterns
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// A configuration with all four positive sets empty never fires.
    pub fn is_inert(&self) -> bool {
        self.keywords.is_empty()
            && self.file_patterns.is_empty()
            && self.context_patterns.is_empty()
            && self.anti_patterns.is_empty()
    }
}

/// Opaque user-supplied metadata value.
pub type Metadata = HashMap<String, serde_json::Value>;

/// A single atomic constraint: a reminder rule with triggers and reminder
/// text, not built from other constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicConstraint {
    pub id: ConstraintId,
    title: String,
    pub priority: Priority,
    pub triggers: TriggerConfiguration,
    reminders: Vec<String>,
    pub sequence_order: Option<NonZeroU32>,
    pub hierarchy_level: Option<u32>,
    pub metadata: Option<Metadata>,
}

impl AtomicConstraint {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ConstraintId,
        title: impl Into<String>,
        priority: Priority,
        triggers: TriggerConfiguration,
        reminders: Vec<String>,
        sequence_order: Option<NonZeroU32>,
        hierarchy_level: Option<u32>,
        metadata: Option<Metadata>,
    ) -> CoreResult<Self> {
        let title = title.into();
        let trimmed_title = title.trim();
        if trimmed_title.is_empty() {
            return Err(CoreError::Validation {
                field: "title".to_string(),
                reason: "title must not be empty".to_string(),
            });
        }
        if reminders.is_empty() {
            return Err(CoreError::Validation {
                field: "reminders".to_string(),
                reason: "reminders must contain at least one entry".to_string(),
            });
        }
        if reminders.iter().any(|r| r.trim().is_empty()) {
            return Err(CoreError::Validation {
                field: "reminders".to_string(),
                reason: "reminder entries must be non-empty".to_string(),
            });
        }

        Ok(Self {
            id,
            title: trimmed_title.to_string(),
            priority,
            triggers,
            reminders,
            sequence_order,
            hierarchy_level,
            metadata,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn reminders(&self) -> &[String] {
        &self.reminders
    }

    /// Returns a shadow copy with the given overlay fields applied; the
    /// original record is never mutated. Reference metadata is merged with
    /// on-key-conflict the overlay winning.
    pub fn with_overlay(
        &self,
        sequence_order: Option<NonZeroU32>,
        hierarchy_level: Option<u32>,
        metadata_overlay: Option<&Metadata>,
    ) -> Self {
        let mut merged = self.clone();
        if let Some(seq) = sequence_order {
            merged.sequence_order = Some(seq);
        }
        if let Some(level) = hierarchy_level {
            merged.hierarchy_level = Some(level);
        }
        if let Some(overlay) = metadata_overlay {
            let mut base = merged.metadata.unwrap_or_default();
            for (k, v) in overlay {
                base.insert(k.clone(), v.clone());
            }
            merged.metadata = Some(base);
        }
        merged
    }
}

/// A referent inside a composite. Equality is by `constraint_id` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintReference {
    pub constraint_id: ConstraintId,
    pub sequence_order: Option<NonZeroU32>,
    pub hierarchy_level: Option<u32>,
    pub metadata: Option<Metadata>,
}

impl ConstraintReference {
    pub fn new(
        constraint_id: ConstraintId,
        sequence_order: Option<NonZeroU32>,
        hierarchy_level: Option<u32>,
        metadata: Option<Metadata>,
    ) -> Self {
        Self {
            constraint_id,
            sequence_order,
            hierarchy_level,
            metadata,
        }
    }
}

impl PartialEq for ConstraintReference {
    fn eq(&self, other: &Self) -> bool {
        self.constraint_id == other.constraint_id
    }
}
impl Eq for ConstraintReference {}

/// Closed set of composition strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositionType {
    Sequential,
    Parallel,
    Hierarchical,
    Progressive,
    Layered,
}

/// How a composite's components are specified. Library-based composites
/// always use `References`; `Inline` exists for ad hoc/test construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentsSpec {
    Inline(Vec<AtomicConstraint>),
    References(Vec<ConstraintReference>),
}

/// A constraint assembled from other constraints by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeConstraint {
    pub id: ConstraintId,
    title: String,
    pub priority: Priority,
    pub triggers: TriggerConfiguration,
    pub composition_type: CompositionType,
    pub components: ComponentsSpec,
    reminders: Vec<String>,
    pub composition_rules: Option<Metadata>,
}

impl CompositeConstraint {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ConstraintId,
        title: impl Into<String>,
        priority: Priority,
        triggers: TriggerConfiguration,
        composition_type: CompositionType,
        components: ComponentsSpec,
        reminders: Vec<String>,
        composition_rules: Option<Metadata>,
    ) -> CoreResult<Self> {
        let title = title.into();
        let trimmed_title = title.trim();
        if trimmed_title.is_empty() {
            return Err(CoreError::Validation {
                field: "title".to_string(),
                reason: "title must not be empty".to_string(),
            });
        }

        Ok(Self {
            id,
            title: trimmed_title.to_string(),
            priority,
            triggers,
            composition_type,
            components,
            reminders,
            composition_rules,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn reminders(&self) -> &[String] {
        &self.reminders
    }

    /// References this composite points at, whether inline or by id.
    /// Inline components surface as synthetic references carrying no
    /// overlay (the inline atom already carries its own ordering fields).
    pub fn references(&self) -> Vec<ConstraintReference> {
        match &self.components {
            ComponentsSpec::References(refs) => refs.clone(),
            ComponentsSpec::Inline(atoms) => atoms
                .iter()
                .map(|a| ConstraintReference::new(a.id.clone(), None, None, None))
                .collect(),
        }
    }
}

/// Closed sum type over atomic and composite constraints, dispatched by
/// pattern matching rather than virtual dispatch (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintRecord {
    Atomic(AtomicConstraint),
    Composite(CompositeConstraint),
}

impl ConstraintRecord {
    pub fn id(&self) -> &ConstraintId {
        match self {
            ConstraintRecord::Atomic(a) => &a.id,
            ConstraintRecord::Composite(c) => &c.id,
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            ConstraintRecord::Atomic(a) => a.priority,
            ConstraintRecord::Composite(c) => c.priority,
        }
    }

    pub fn triggers(&self) -> &TriggerConfiguration {
        match self {
            ConstraintRecord::Atomic(a) => &a.triggers,
            ConstraintRecord::Composite(c) => &c.triggers,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, ConstraintRecord::Composite(_))
    }
}
