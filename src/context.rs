// ABOUTME: Context Analyzer — turns a raw tool-call blob into a structured TriggerContext
// ABOUTME: No I/O and no per-call pattern compilation; keyword tokenization only, glob/regex memoisation lives in matcher.rs

use std::collections::HashSet;

/// Raw inputs describing the live interaction, as handed to the Activator
/// by the (out-of-scope) transport layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawContext {
    /// Free-text user input, if any.
    pub user_input: Option<String>,
    /// File paths the tool call touches.
    pub file_paths: Vec<String>,
    /// Caller-supplied activity hint (e.g. "testing", "refactoring").
    pub activity_hint: Option<String>,
    /// Additional context tags the caller supplies directly.
    pub extra_context_tags: Vec<String>,
    /// Anti-pattern tags the caller passes in (e.g. "hotfix", "emergency").
    pub anti_pattern_tags: Vec<String>,
}

/// Per-request view of the caller's situation. Immutable for the lifetime
/// of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerContext {
    pub keywords_present: HashSet<String>,
    pub file_patterns_present: Vec<String>,
    pub context_tags_present: HashSet<String>,
    pub anti_patterns_present: HashSet<String>,
}

/// Normalises a `RawContext` into a `TriggerContext`. Stateless; holds no
/// compiled patterns (that memoisation lives in the Trigger Matcher).
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAnalyzer;

impl ContextAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, raw: &RawContext) -> TriggerContext {
        TriggerContext {
            keywords_present: Self::extract_keywords(raw.user_input.as_deref().unwrap_or("")),
            file_patterns_present: raw.file_paths.clone(),
            context_tags_present: Self::context_tags(raw),
            anti_patterns_present: raw.anti_pattern_tags.iter().cloned().collect(),
        }
    }

    /// Lowercased Unicode-letter runs of length >= 3, deduplicated.
    fn extract_keywords(text: &str) -> HashSet<String> {
        let mut keywords = HashSet::new();
        let mut current = String::new();

        for ch in text.chars().chain(std::iter::once(' ')) {
            if ch.is_alphabetic() {
                current.push(ch);
            } else if !current.is_empty() {
                if current.chars().count() >= 3 {
                    keywords.insert(current.to_lowercase());
                }
                current.clear();
            }
        }

        keywords
    }

    fn context_tags(raw: &RawContext) -> HashSet<String> {
        let mut tags: HashSet<String> = raw.extra_context_tags.iter().cloned().collect();
        if let Some(hint) = &raw.activity_hint {
            let trimmed = hint.trim();
            if !trimmed.is_empty() {
                tags.insert(trimmed.to_lowercase());
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_lowercased_keywords_of_length_at_least_three() {
        let analyzer = ContextAnalyzer::new();
        let raw = RawContext {
            user_input: Some("TDD is great, go go!".to_string()),
            ..Default::default()
        };
        let ctx = analyzer.analyze(&raw);
        assert!(ctx.keywords_present.contains("tdd"));
        assert!(ctx.keywords_present.contains("great"));
        assert!(!ctx.keywords_present.contains("go")); // length < 3
        assert!(!ctx.keywords_present.contains("is")); // length < 3
    }

    #[test]
    fn dedups_keywords() {
        let analyzer = ContextAnalyzer::new();
        let raw = RawContext {
            user_input: Some("test test TEST".to_string()),
            ..Default::default()
        };
        let ctx = analyzer.analyze(&raw);
        assert_eq!(ctx.keywords_present.len(), 1);
    }

    #[test]
    fn merges_activity_hint_into_context_tags() {
        let analyzer = ContextAnalyzer::new();
        let raw = RawContext {
            activity_hint: Some("Testing".to_string()),
            extra_context_tags: vec!["refactoring".to_string()],
            ..Default::default()
        };
        let ctx = analyzer.analyze(&raw);
        assert!(ctx.context_tags_present.contains("testing"));
        assert!(ctx.context_tags_present.contains("refactoring"));
    }

    #[test]
    fn passes_through_file_paths_and_anti_patterns() {
        let analyzer = ContextAnalyzer::new();
        let raw = RawContext {
            file_paths: vec!["src/foo.rs".to_string()],
            anti_pattern_tags: vec!["hotfix".to_string()],
            ..Default::default()
        };
        let ctx = analyzer.analyze(&raw);
        assert_eq!(ctx.file_patterns_present, vec!["src/foo.rs".to_string()]);
        assert!(ctx.anti_patterns_present.contains("hotfix"));
    }
}
