// ABOUTME: End-to-end scenario tests (S1-S6) exercising the public activation pipeline

use constraint_core::prelude::*;
use std::num::NonZeroU32;
use std::sync::Arc;

fn triggers(keywords: &[&str], confidence_threshold: f64) -> TriggerConfiguration {
    TriggerConfiguration::new(
        keywords.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        vec![],
        vec![],
        vec![],
        confidence_threshold,
    )
    .unwrap()
}

fn activator(library: ConstraintLibrary) -> Activator {
    let library = Arc::new(library);
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
    let logger: Arc<dyn StructuredLogger> = Arc::new(TracingLogger);
    let resolver = Arc::new(Resolver::new(
        Arc::clone(&library),
        Arc::clone(&clock),
        Arc::clone(&logger),
    ));
    Activator::new(library, resolver, logger, clock, Config::default())
}

fn raw(keywords: &[&str], anti_patterns: &[&str]) -> RawContext {
    RawContext {
        user_input: Some(keywords.join(" ")),
        anti_pattern_tags: anti_patterns.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn s1_atomic_matches_by_keyword() {
    let lib = ConstraintLibrary::new();
    let atom = AtomicConstraint::new(
        ConstraintId::new("testing.write-test-first").unwrap(),
        "Write the test first",
        Priority::new(0.92).unwrap(),
        triggers(&["test", "tdd"], 0.7),
        vec![
            "Start with a failing test (RED)".to_string(),
            "Ensure it fails for the right reason".to_string(),
        ],
        None,
        None,
        None,
    )
    .unwrap();
    lib.add_atomic(atom).unwrap();
    let activator = activator(lib);

    // keywords_present = {"tdd", "implementation"} -> subscore 0.5 < 0.7
    let result = activator
        .activate(&raw(&["tdd", "implementation"], &[]), "s1", 1)
        .await;
    assert!(result.fired_ids.is_empty());
    assert_eq!(result.payload, "");

    // keywords_present = {"test", "tdd"} -> subscore 1.0, matches
    let result = activator.activate(&raw(&["test", "tdd"], &[]), "s1", 2).await;
    assert_eq!(
        result.fired_ids,
        vec![ConstraintId::new("testing.write-test-first").unwrap()]
    );
}

#[tokio::test]
async fn s2_anti_pattern_veto() {
    let lib = ConstraintLibrary::new();
    let triggers = TriggerConfiguration::new(
        vec!["test".to_string(), "tdd".to_string()],
        vec![],
        vec![],
        vec!["hotfix".to_string()],
        0.7,
    )
    .unwrap();
    let atom = AtomicConstraint::new(
        ConstraintId::new("testing.write-test-first").unwrap(),
        "Write the test first",
        Priority::new(0.92).unwrap(),
        triggers,
        vec!["Start with a failing test (RED)".to_string()],
        None,
        None,
        None,
    )
    .unwrap();
    lib.add_atomic(atom).unwrap();
    let activator = activator(lib);

    let result = activator
        .activate(&raw(&["test", "tdd"], &["hotfix"]), "s1", 1)
        .await;
    assert!(result.fired_ids.is_empty());
    assert_eq!(result.payload, "");
}

fn seq_atom(id: &str, seq: u32) -> AtomicConstraint {
    AtomicConstraint::new(
        ConstraintId::new(id).unwrap(),
        format!("title-{id}"),
        Priority::new(0.5).unwrap(),
        TriggerConfiguration::with_default_threshold(vec![], vec![], vec![], vec![]).unwrap(),
        vec!["reminder".to_string()],
        NonZeroU32::new(seq),
        None,
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn s3_sequential_composite_advances_step_by_step() {
    let lib = ConstraintLibrary::new();
    let composite = CompositeConstraint::new(
        ConstraintId::new("tdd.cycle").unwrap(),
        "TDD cycle",
        Priority::new(0.9).unwrap(),
        triggers(&["tdd"], 0.5),
        CompositionType::Sequential,
        ComponentsSpec::Inline(vec![seq_atom("a1", 1), seq_atom("a2", 2), seq_atom("a3", 3)]),
        vec![],
        None,
    )
    .unwrap();
    lib.add_composite(composite).unwrap();
    let activator = activator(lib);
    let ctx = raw(&["tdd"], &[]);

    let step1 = activator.activate(&ctx, "s1", 1).await;
    assert_eq!(step1.fired_ids, vec![ConstraintId::new("a1").unwrap()]);

    let step2 = activator.activate(&ctx, "s1", 2).await;
    assert_eq!(step2.fired_ids, vec![ConstraintId::new("a2").unwrap()]);

    let step3 = activator.activate(&ctx, "s1", 3).await;
    assert_eq!(step3.fired_ids, vec![ConstraintId::new("a3").unwrap()]);

    let step4 = activator.activate(&ctx, "s1", 4).await;
    assert!(step4.fired_ids.is_empty());
}

fn level_atom(id: &str, level: u32) -> AtomicConstraint {
    AtomicConstraint::new(
        ConstraintId::new(id).unwrap(),
        format!("title-{id}"),
        Priority::new(0.5).unwrap(),
        TriggerConfiguration::with_default_threshold(vec![], vec![], vec![], vec![]).unwrap(),
        vec!["reminder".to_string()],
        None,
        Some(level),
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn s4_progressive_never_skips() {
    let lib = ConstraintLibrary::new();
    let atoms: Vec<AtomicConstraint> = (1..=6).map(|lvl| level_atom(&format!("l{lvl}"), lvl)).collect();
    let composite = CompositeConstraint::new(
        ConstraintId::new("progressive.ladder").unwrap(),
        "Progressive ladder",
        Priority::new(0.9).unwrap(),
        triggers(&["climb"], 0.5),
        CompositionType::Progressive,
        ComponentsSpec::Inline(atoms),
        vec![],
        None,
    )
    .unwrap();
    lib.add_composite(composite).unwrap();
    let activator = activator(lib);
    let ctx = raw(&["climb"], &[]);

    for expected_count in 1..=6usize {
        let result = activator.activate(&ctx, "s1", expected_count as u64).await;
        assert_eq!(result.fired_ids.len(), expected_count);
        // Never observes a jump (e.g. level set {1,3} before {1,2,3}).
        let has_l1 = result
            .fired_ids
            .iter()
            .any(|id| id.as_str() == "l1");
        if expected_count >= 1 {
            assert!(has_l1);
        }
    }

    let after_completion = activator.activate(&ctx, "s1", 7).await;
    assert!(after_completion.fired_ids.is_empty());
}

#[tokio::test]
async fn s5_cycle_is_isolated() {
    let shared_triggers = || triggers(&["go"], 0.5);
    let x = CompositeConstraint::new(
        ConstraintId::new("X").unwrap(),
        "X",
        Priority::new(0.9).unwrap(),
        shared_triggers(),
        CompositionType::Parallel,
        ComponentsSpec::References(vec![ConstraintReference::new(
            ConstraintId::new("Y").unwrap(),
            None,
            None,
            None,
        )]),
        vec![],
        None,
    )
    .unwrap();
    let y = CompositeConstraint::new(
        ConstraintId::new("Y").unwrap(),
        "Y",
        Priority::new(0.9).unwrap(),
        shared_triggers(),
        CompositionType::Parallel,
        ComponentsSpec::References(vec![ConstraintReference::new(
            ConstraintId::new("X").unwrap(),
            None,
            None,
            None,
        )]),
        vec![],
        None,
    )
    .unwrap();
    let a = AtomicConstraint::new(
        ConstraintId::new("a").unwrap(),
        "Unrelated atomic",
        Priority::new(0.5).unwrap(),
        shared_triggers(),
        vec!["reminder".to_string()],
        None,
        None,
        None,
    )
    .unwrap();

    let lib = ConstraintLibrary::load_batch(vec![a], vec![x, y]).unwrap();
    let activator = activator(lib);
    let result = activator.activate(&raw(&["go"], &[]), "s1", 1).await;

    // X and Y are dropped; the unrelated atomic still fires; no crash.
    assert_eq!(result.fired_ids, vec![ConstraintId::new("a").unwrap()]);
}

#[tokio::test]
async fn s6_determinism_under_equal_priority() {
    let lib = ConstraintLibrary::new();
    let shared = triggers(&["shared"], 0.5);
    let b = AtomicConstraint::new(
        ConstraintId::new("b.x").unwrap(),
        "B",
        Priority::new(0.5).unwrap(),
        shared.clone(),
        vec!["reminder".to_string()],
        None,
        None,
        None,
    )
    .unwrap();
    let a = AtomicConstraint::new(
        ConstraintId::new("a.x").unwrap(),
        "A",
        Priority::new(0.5).unwrap(),
        shared,
        vec!["reminder".to_string()],
        None,
        None,
        None,
    )
    .unwrap();
    lib.add_atomic(b).unwrap();
    lib.add_atomic(a).unwrap();
    let activator = activator(lib);

    let result = activator.activate(&raw(&["shared"], &[]), "s1", 1).await;
    assert_eq!(
        result.fired_ids,
        vec![ConstraintId::new("a.x").unwrap(), ConstraintId::new("b.x").unwrap()]
    );
}
