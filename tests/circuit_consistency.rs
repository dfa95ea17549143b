//! The lowered circuit must agree with the off-circuit computation.
//!
//! Roots computed by evaluating the synthesized circuit must equal the roots of the
//! native Merkle trees, and the uniqueness outputs must reflect the adjacent-equal pairs
//! of the sorted row hashes.

mod common;

use common::{dataset_from, evaluate_dataset};
use ff::Field;
use unique_rows::{
    api::{check_roots, outputs_from_evaluation, WitnessInput},
    circuit,
    config::RootBinding,
    prepare_dataset, CircuitSpec, Dataset, FieldElement, PoseidonContext, UniqueRowsError,
};

fn flag(value: bool) -> FieldElement {
    if value {
        FieldElement::ONE
    } else {
        FieldElement::ZERO
    }
}

#[test]
fn test_lowered_roots_equal_native_roots() {
    let ctx = PoseidonContext::new().unwrap();
    for rows in [2usize, 3, 4, 7, 8, 9] {
        let dataset = Dataset::sample(rows);
        let prepared = prepare_dataset(&ctx, &dataset).unwrap();
        let eval = evaluate_dataset(&ctx, &dataset, &CircuitSpec::new(rows, None).unwrap());

        assert!(eval.satisfied, "rows={}", rows);
        assert_eq!(eval.output("root_original"), Some(prepared.root_original()));
        assert_eq!(eval.output("root_sorted"), Some(prepared.root_sorted()));
    }
}

#[test]
fn test_example_a_one_duplicate() {
    let ctx = PoseidonContext::new().unwrap();
    let dataset = dataset_from(&["A", "B", "C", "A"]);

    let binary = evaluate_dataset(&ctx, &dataset, &CircuitSpec::new(4, None).unwrap());
    assert!(binary.satisfied);
    assert_eq!(binary.output("is_unique"), Some(FieldElement::ZERO));

    // floor(50 * 4 / 100) = 2 and one duplicate pair
    let threshold = evaluate_dataset(&ctx, &dataset, &CircuitSpec::new(4, Some(50)).unwrap());
    assert!(threshold.satisfied);
    assert_eq!(threshold.output("is_unique"), Some(FieldElement::ZERO));
    assert_eq!(threshold.output("is_below_threshold"), Some(FieldElement::ONE));
}

#[test]
fn test_example_b_all_distinct() {
    let ctx = PoseidonContext::new().unwrap();
    let dataset = dataset_from(&["A", "B", "C", "D"]);

    for percent in [1u32, 25, 50, 100] {
        let eval = evaluate_dataset(&ctx, &dataset, &CircuitSpec::new(4, Some(percent)).unwrap());
        assert!(eval.satisfied, "percent={}", percent);
        assert_eq!(eval.output("is_unique"), Some(FieldElement::ONE));
        // A zero threshold leaves nothing strictly below it
        let expected = CircuitSpec::new(4, Some(percent)).unwrap().threshold_value() > Some(0);
        assert_eq!(eval.output("is_below_threshold"), Some(flag(expected)));
    }
}

#[test]
fn test_duplicate_count_counts_adjacent_pairs() {
    let ctx = PoseidonContext::new().unwrap();
    // Three copies of A form two adjacent equal pairs once sorted
    let dataset = dataset_from(&["A", "B", "A", "A"]);

    // floor(75 * 4 / 100) = 3 > 2
    let eval = evaluate_dataset(&ctx, &dataset, &CircuitSpec::new(4, Some(75)).unwrap());
    assert_eq!(eval.output("is_below_threshold"), Some(FieldElement::ONE));

    // floor(50 * 4 / 100) = 2, and 2 < 2 is false
    let eval = evaluate_dataset(&ctx, &dataset, &CircuitSpec::new(4, Some(50)).unwrap());
    assert_eq!(eval.output("is_below_threshold"), Some(FieldElement::ZERO));
}

#[test]
fn test_padding_is_ignored_by_uniqueness() {
    let ctx = PoseidonContext::new().unwrap();
    // Five rows pad to eight leaves; the three zero leaves must not count as duplicates
    let eval = evaluate_dataset(&ctx, &Dataset::sample(5), &CircuitSpec::new(5, Some(20)).unwrap());
    assert!(eval.satisfied);
    assert_eq!(eval.output("is_unique"), Some(FieldElement::ONE));
    assert_eq!(eval.output("is_below_threshold"), Some(FieldElement::ONE));
}

#[test]
fn test_enforced_binding_rejects_wrong_expected_root() {
    let ctx = PoseidonContext::new().unwrap();
    let dataset = Dataset::sample(4);
    let prepared = prepare_dataset(&ctx, &dataset).unwrap();
    let mut inputs = WitnessInput::from_prepared(&prepared).to_signal_values().unwrap();
    inputs.insert(
        "expectedRoot_sorted".to_string(),
        vec![prepared.root_sorted() + FieldElement::ONE],
    );

    let enforced = CircuitSpec::new(4, None).unwrap();
    let eval = circuit::evaluate(&circuit::synthesize(&enforced), &ctx, &inputs).unwrap();
    assert!(!eval.satisfied, "enforced binding must reject a wrong expected root");

    let exposed = enforced.with_root_binding(RootBinding::Exposed);
    let eval = circuit::evaluate(&circuit::synthesize(&exposed), &ctx, &inputs).unwrap();
    assert!(eval.satisfied, "exposed binding leaves the check to the caller");

    // The computed roots are still honest, so the cross-check passes against the real
    // dataset but fails against a different one
    let outputs = outputs_from_evaluation(&eval).unwrap();
    assert!(check_roots(&outputs, &prepared).is_ok());
    let other = prepare_dataset(&ctx, &Dataset::sample(3)).unwrap();
    assert!(matches!(
        check_roots(&outputs, &other),
        Err(UniqueRowsError::RootMismatch { .. })
    ));
}

#[test]
fn test_swapped_sorted_leaves_change_the_sorted_root() {
    let ctx = PoseidonContext::new().unwrap();
    let dataset = Dataset::sample(4);
    let prepared = prepare_dataset(&ctx, &dataset).unwrap();
    let mut inputs = WitnessInput::from_prepared(&prepared).to_signal_values().unwrap();
    if let Some(leaves) = inputs.get_mut("leaves_sorted") {
        leaves.swap(0, 1);
    }

    let spec = CircuitSpec::new(4, None).unwrap().with_root_binding(RootBinding::Exposed);
    let eval = circuit::evaluate(&circuit::synthesize(&spec), &ctx, &inputs).unwrap();
    let outputs = outputs_from_evaluation(&eval).unwrap();
    assert_ne!(outputs.root_sorted, prepared.root_sorted());
    assert!(check_roots(&outputs, &prepared).is_err());
}

#[test]
fn test_constraint_count_grows_with_rows() {
    let ctx = PoseidonContext::new().unwrap();
    let small = evaluate_dataset(&ctx, &Dataset::sample(4), &CircuitSpec::new(4, None).unwrap());
    let large = evaluate_dataset(&ctx, &Dataset::sample(8), &CircuitSpec::new(8, None).unwrap());
    assert!(large.num_constraints > small.num_constraints);
}
