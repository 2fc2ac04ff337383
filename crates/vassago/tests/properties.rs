//! Property-based tests for mask generation and analysis.
//!
//! These verify the structural invariants that every pattern family must
//! uphold across a wide range of sequence lengths:
//! - every position attends to itself
//! - reported statistics agree with a brute-force scan
//! - seeded generation is bit-identical
//! - adding relations never decreases reachability

use proptest::prelude::*;

use vassago::{
    analyze, generate, AnalysisKind, FlowBudget, MaskBuilder, PatternFamily, PatternSpec,
};

/// Strategy over every supported family name.
fn family_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("strided"),
        Just("fixed"),
        Just("random"),
        Just("local_global"),
        Just("bigbird"),
        Just("longformer"),
        Just("linformer"),
    ]
}

/// Strategy over small sequence lengths, including awkward ones.
fn length_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1), Just(2), Just(3), 4usize..=96]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Property: the self-relation holds for every family and length.
    #[test]
    fn prop_self_attention_invariant(
        name in family_strategy(),
        n in length_strategy(),
    ) {
        let spec = PatternSpec::new(PatternFamily::from_name(name).unwrap());
        let mask = generate(&spec, n).unwrap();
        for i in 0..n {
            prop_assert!(mask.get(i, i), "{name}: mask[{i}][{i}] must be true (n={n})");
        }
    }

    /// Property: statistics always match an independent scan of the mask.
    #[test]
    fn prop_sparsity_consistency(
        name in family_strategy(),
        n in length_strategy(),
        sparsity in 0.1f64..0.99,
    ) {
        let spec = PatternSpec::new(PatternFamily::from_name(name).unwrap())
            .with_sparsity(sparsity);
        let mask = generate(&spec, n).unwrap();
        let stats = mask.statistics();

        prop_assert_eq!(stats.nonzero_elements, mask.count_nonzero());
        prop_assert_eq!(stats.total_elements, (n * n) as u64);
        let expected = 1.0 - stats.nonzero_elements as f64 / stats.total_elements as f64;
        prop_assert!((stats.memory_reduction_ratio - expected).abs() < 1e-12);
    }

    /// Property: generation is bit-identical under the same inputs.
    #[test]
    fn prop_generation_deterministic(
        name in family_strategy(),
        n in length_strategy(),
    ) {
        let spec = PatternSpec::new(PatternFamily::from_name(name).unwrap());
        let a = generate(&spec, n).unwrap();
        let b = generate(&spec, n).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Property: adding any true relation never decreases the
    /// reachability ratio.
    #[test]
    fn prop_monotonic_reachability(
        n in 2usize..=24,
        extra_edges in prop::collection::vec((0usize..24, 0usize..24), 1..8),
        new_edge in (0usize..24, 0usize..24),
    ) {
        let mut base = MaskBuilder::new(n);
        base.set_diagonal();
        for &(i, j) in &extra_edges {
            base.set(i % n, j % n);
        }

        let mut extended = base.clone();
        extended.set(new_edge.0 % n, new_edge.1 % n);

        let budget = FlowBudget::default();
        let before = analyze(&base.build(), AnalysisKind::InformationFlow, &budget)
            .unwrap()
            .information_flow
            .unwrap();
        let after = analyze(&extended.build(), AnalysisKind::InformationFlow, &budget)
            .unwrap()
            .information_flow
            .unwrap();

        prop_assert!(after.reachability_ratio >= before.reachability_ratio);
    }

    /// Property: the composite efficiency score stays within `[0, 1]`.
    #[test]
    fn prop_efficiency_bounded(
        name in family_strategy(),
        n in 4usize..=64,
    ) {
        let spec = PatternSpec::new(PatternFamily::from_name(name).unwrap());
        let mask = generate(&spec, n).unwrap();
        let analysis = analyze(&mask, AnalysisKind::Efficiency, &FlowBudget::default()).unwrap();
        let score = analysis.efficiency.unwrap().efficiency_score;
        prop_assert!((0.0..=1.0).contains(&score));
    }
}
