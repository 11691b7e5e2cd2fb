// ABOUTME: Trigger Matcher — scores a TriggerContext against a TriggerConfiguration and decides fire/no-fire
// ABOUTME: Anti-patterns veto unconditionally; glob compilation is memoised in a concurrent map keyed by raw pattern text

use crate::config::MatchWeights;
use crate::context::TriggerContext;
use crate::types::TriggerConfiguration;
use dashmap::DashMap;
use glob::Pattern;

/// Outcome of scoring a single constraint's trigger configuration against
/// a live context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub score: f64,
    pub fired: bool,
}

/// Scores trigger configurations against contexts, memoising compiled glob
/// patterns so repeated evaluations never recompile the same pattern text.
pub struct TriggerMatcher {
    weights: MatchWeights,
    compiled_patterns: DashMap<String, Option<Pattern>>,
}

impl TriggerMatcher {
    pub fn new(weights: MatchWeights) -> Self {
        Self {
            weights,
            compiled_patterns: DashMap::new(),
        }
    }

    /// Score and decide in one pass.
    pub fn evaluate(&self, triggers: &TriggerConfiguration, context: &TriggerContext) -> MatchOutcome {
        if triggers.is_inert() {
            return MatchOutcome {
                score: 0.0,
                fired: false,
            };
        }

        if triggers
            .anti_patterns()
            .iter()
            .any(|p| context.anti_patterns_present.contains(p))
        {
            return MatchOutcome {
                score: 0.0,
                fired: false,
            };
        }

        let score = self.score(triggers, context);
        let fired = score >= triggers.confidence_threshold();
        MatchOutcome { score, fired }
    }

    /// Weighted subscore combination. Each subscore whose configured set is
    /// empty is excluded from scoring and its weight is redistributed
    /// proportionally across the remaining active subscores.
    fn score(&self, triggers: &TriggerConfiguration, context: &TriggerContext) -> f64 {
        let keyword_active = !triggers.keywords().is_empty();
        let file_active = !triggers.file_patterns().is_empty();
        let context_active = !triggers.context_patterns().is_empty();

        let raw_weights = [
            (keyword_active, self.weights.keyword),
            (file_active, self.weights.file_pattern),
            (context_active, self.weights.context),
        ];
        let active_total: f64 = raw_weights
            .iter()
            .filter(|(active, _)| *active)
            .map(|(_, w)| w)
            .sum();
        if active_total <= 0.0 {
            return 0.0;
        }

        let mut total = 0.0;
        if keyword_active {
            let sub = Self::set_overlap_ratio(triggers.keywords().iter(), &context.keywords_present);
            total += (self.weights.keyword / active_total) * sub;
        }
        if file_active {
            let sub = self.file_pattern_ratio(triggers.file_patterns(), &context.file_patterns_present);
            total += (self.weights.file_pattern / active_total) * sub;
        }
        if context_active {
            let sub = Self::set_overlap_ratio(triggers.context_patterns().iter(), &context.context_tags_present);
            total += (self.weights.context / active_total) * sub;
        }
        total.clamp(0.0, 1.0)
    }

    fn set_overlap_ratio<'a>(
        configured: impl Iterator<Item = &'a String>,
        present: &std::collections::HashSet<String>,
    ) -> f64 {
        let configured: Vec<&String> = configured.collect();
        if configured.is_empty() {
            return 0.0;
        }
        let matched = configured.iter().filter(|c| present.contains(c.as_str())).count();
        matched as f64 / configured.len() as f64
    }

    fn file_pattern_ratio(&self, patterns: &[String], live_paths: &[String]) -> f64 {
        if patterns.is_empty() {
            return 0.0;
        }
        let matched = patterns
            .iter()
            .filter(|pattern| {
                live_paths
                    .iter()
                    .any(|path| self.pattern_matches(pattern, path))
            })
            .count();
        matched as f64 / patterns.len() as f64
    }

    fn pattern_matches(&self, pattern: &str, path: &str) -> bool {
        let compiled = self
            .compiled_patterns
            .entry(pattern.to_string())
            .or_insert_with(|| Pattern::new(pattern).ok())
            .clone();
        match compiled {
            Some(p) => p.matches(path),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RawContext;
    use crate::context::ContextAnalyzer;
    use crate::types::TriggerConfiguration;
    use std::collections::HashSet;

    fn ctx(keywords: &[&str], files: &[&str], tags: &[&str], anti: &[&str]) -> TriggerContext {
        TriggerContext {
            keywords_present: keywords.iter().map(|s| s.to_string()).collect(),
            file_patterns_present: files.iter().map(|s| s.to_string()).collect(),
            context_tags_present: tags.iter().map(|s| s.to_string()).collect(),
            anti_patterns_present: anti.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn inert_trigger_never_fires() {
        let triggers = TriggerConfiguration::new(vec![], vec![], vec![], vec![], 0.0).unwrap();
        let matcher = TriggerMatcher::new(MatchWeights::default());
        let outcome = matcher.evaluate(&triggers, &ctx(&[], &[], &[], &[]));
        assert!(!outcome.fired);
        assert_eq!(outcome.score, 0.0);
    }

    #[test]
    fn anti_pattern_vetoes_regardless_of_score() {
        let triggers = TriggerConfiguration::new(
            vec!["tdd".to_string()],
            vec![],
            vec![],
            vec!["hotfix".to_string()],
            0.1,
        )
        .unwrap();
        let matcher = TriggerMatcher::new(MatchWeights::default());
        let outcome = matcher.evaluate(&triggers, &ctx(&["tdd"], &[], &[], &["hotfix"]));
        assert!(!outcome.fired);
        assert_eq!(outcome.score, 0.0);
    }

    #[test]
    fn keyword_only_match_renormalises_weight_to_full() {
        let triggers = TriggerConfiguration::new(
            vec!["tdd".to_string()],
            vec![],
            vec![],
            vec![],
            0.9,
        )
        .unwrap();
        let matcher = TriggerMatcher::new(MatchWeights::default());
        let outcome = matcher.evaluate(&triggers, &ctx(&["tdd"], &[], &[], &[]));
        // Keyword is the only active subscore, full match -> score 1.0.
        assert!((outcome.score - 1.0).abs() < 1e-9);
        assert!(outcome.fired);
    }

    #[test]
    fn threshold_boundary_is_closed() {
        let triggers = TriggerConfiguration::new(
            vec!["tdd".to_string()],
            vec![],
            vec![],
            vec![],
            1.0,
        )
        .unwrap();
        let matcher = TriggerMatcher::new(MatchWeights::default());
        let outcome = matcher.evaluate(&triggers, &ctx(&["tdd"], &[], &[], &[]));
        assert!(outcome.fired); // score == threshold fires
    }

    #[test]
    fn file_pattern_glob_matches_and_is_memoised() {
        let triggers = TriggerConfiguration::new(
            vec![],
            vec!["src/**/*.rs".to_string()],
            vec![],
            vec![],
            0.5,
        )
        .unwrap();
        let matcher = TriggerMatcher::new(MatchWeights::default());
        let context = ctx(&[], &["src/foo/bar.rs"], &[], &[]);
        let first = matcher.evaluate(&triggers, &context);
        let second = matcher.evaluate(&triggers, &context);
        assert_eq!(first, second);
        assert!(first.fired);
        assert_eq!(matcher.compiled_patterns.len(), 1);
    }

    #[test]
    fn invalid_glob_pattern_never_matches_but_does_not_panic() {
        let triggers = TriggerConfiguration::new(
            vec![],
            vec!["[".to_string()],
            vec![],
            vec![],
            0.1,
        )
        .unwrap();
        let matcher = TriggerMatcher::new(MatchWeights::default());
        let outcome = matcher.evaluate(&triggers, &ctx(&[], &["anything"], &[], &[]));
        assert!(!outcome.fired);
    }

    #[test]
    fn missing_subscore_sets_are_excluded_and_redistributed() {
        // Only context_patterns configured; keywords/file_patterns inactive.
        let triggers = TriggerConfiguration::new(
            vec![],
            vec![],
            vec!["testing".to_string()],
            vec![],
            0.5,
        )
        .unwrap();
        let matcher = TriggerMatcher::new(MatchWeights::default());
        let outcome = matcher.evaluate(&triggers, &ctx(&[], &[], &["testing"], &[]));
        assert!((outcome.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn analyzer_output_feeds_matcher_end_to_end() {
        let triggers = TriggerConfiguration::with_default_threshold(
            vec!["refactor".to_string()],
            vec![],
            vec![],
            vec![],
        )
        .unwrap();
        let analyzer = ContextAnalyzer::new();
        let raw = RawContext {
            user_input: Some("please refactor this module".to_string()),
            ..Default::default()
        };
        let context = analyzer.analyze(&raw);
        let matcher = TriggerMatcher::new(MatchWeights::default());
        let outcome = matcher.evaluate(&triggers, &context);
        assert!(outcome.fired);
        let _: HashSet<String> = context.keywords_present;
    }
}
