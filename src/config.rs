// ABOUTME: Ambient configuration knobs — match weights, default threshold, and the soft activation deadline
// ABOUTME: Validated at construction; callers that do not care use Config::default()

use crate::error::{CoreError, CoreResult};

/// Relative weight of each trigger subscore when none of a configuration's
/// sets are empty. Renormalised per-evaluation when a set is empty (see
/// `matcher.rs`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub keyword: f64,
    pub file_pattern: f64,
    pub context: f64,
}

impl MatchWeights {
    pub fn new(keyword: f64, file_pattern: f64, context: f64) -> CoreResult<Self> {
        for (field, value) in [
            ("keyword", keyword),
            ("file_pattern", file_pattern),
            ("context", context),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(CoreError::Validation {
                    field: field.to_string(),
                    reason: "match weight must be a non-negative finite value".to_string(),
                });
            }
        }
        let sum = keyword + file_pattern + context;
        if (sum - 1.0).abs() > 1e-3 {
            return Err(CoreError::Validation {
                field: "match_weights".to_string(),
                reason: format!("match weights must sum to 1.0, got {sum}"),
            });
        }
        Ok(Self {
            keyword,
            file_pattern,
            context,
        })
    }
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            keyword: 0.4,
            file_pattern: 0.3,
            context: 0.3,
        }
    }
}

/// Crate-wide tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub match_weights: MatchWeights,
    pub default_confidence_threshold: f64,
    pub soft_deadline_millis: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_weights: MatchWeights::default(),
            default_confidence_threshold: 0.7,
            soft_deadline_millis: 45,
        }
    }
}
