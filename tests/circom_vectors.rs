//! Reference values of the circom toolchain.
//!
//! The emitted circuits run circomlib's `Poseidon(2)` over the BN254 scalar field. Off
//! circuit hashes, roots and the witness file must agree with it value for value, or a
//! real circom/snarkjs run cannot reproduce the roots computed here.

use ff::PrimeField;
use num_bigint::BigUint;
use num_traits::Num;
use unique_rows::{
    api::WitnessInput,
    circuit,
    commit_row, prepare_dataset,
    utils::{field_from_decimal, field_to_decimal},
    CircuitSpec, Dataset, FieldElement, PoseidonContext, Row,
};

/// BN254 scalar field modulus, the prime circom compiles for by default.
const BN254_R: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

const POSEIDON_0_0: &str =
    "14744269619966411208579211824598458697587494354926760081771325075741142829156";
const POSEIDON_1_2: &str =
    "7853200120776062878684798364095072458815029376092732009249414926327459813530";

const ALICE_25: &str =
    "9824889368628266431757280030384302924925418084269462066751124459859022303558";
const BOB_30: &str =
    "14220405782091612545221562089908533584211561205641177563731493043406494243640";
// Poseidon(2)(BOB_30, ALICE_25) and Poseidon(2)(ALICE_25, BOB_30)
const ROOT_BOB_ALICE: &str =
    "19884066096169700552238728227352976029386275562457393416379136349461798014466";
const ROOT_ALICE_BOB: &str =
    "5628354785103502143012855639383182642370208587898392049231942840323067135025";

fn fe(decimal: &str) -> FieldElement {
    field_from_decimal(decimal).unwrap()
}

fn modulus() -> BigUint {
    BigUint::from_str_radix(BN254_R, 10).unwrap()
}

#[test]
fn test_field_is_bn254_scalar_field() {
    let declared = BigUint::from_str_radix(FieldElement::MODULUS.trim_start_matches("0x"), 16)
        .unwrap();
    assert_eq!(declared, modulus());
}

#[test]
fn test_poseidon_matches_circomlib() {
    let ctx = PoseidonContext::new().unwrap();
    assert_eq!(
        ctx.hash2(FieldElement::from(0u64), FieldElement::from(0u64)).unwrap(),
        fe(POSEIDON_0_0)
    );
    assert_eq!(
        ctx.hash2(FieldElement::from(1u64), FieldElement::from(2u64)).unwrap(),
        fe(POSEIDON_1_2)
    );
}

#[test]
fn test_row_commitments_match_reference() {
    let alice = Row::new(vec!["Alice".to_string(), "25".to_string()]);
    let bob = Row::new(vec!["Bob".to_string(), "30".to_string()]);
    assert_eq!(field_to_decimal(&commit_row(&alice)), ALICE_25);
    assert_eq!(field_to_decimal(&commit_row(&bob)), BOB_30);
}

#[test]
fn test_two_row_roots_match_reference() {
    let ctx = PoseidonContext::new().unwrap();
    let dataset = Dataset::parse("Name,Age\nBob,30\nAlice,25\n", ',').unwrap();
    let prepared = prepare_dataset(&ctx, &dataset).unwrap();

    assert_eq!(field_to_decimal(&prepared.root_original()), ROOT_BOB_ALICE);
    assert_eq!(field_to_decimal(&prepared.root_sorted()), ROOT_ALICE_BOB);

    // input.json carries the same decimals circom will read
    let input = WitnessInput::from_prepared(&prepared);
    assert_eq!(input.leaves_original, vec![BOB_30, ALICE_25]);
    assert_eq!(input.leaves_sorted, vec![ALICE_25, BOB_30]);
    assert_eq!(input.expected_root_original, ROOT_BOB_ALICE);
    assert_eq!(input.expected_root_sorted, ROOT_ALICE_BOB);

    // The lowered circuit computes the same roots gate for gate
    let spec = CircuitSpec::new(2, None).unwrap();
    let eval = circuit::evaluate(
        &circuit::synthesize(&spec),
        &ctx,
        &input.to_signal_values().unwrap(),
    )
    .unwrap();
    assert!(eval.satisfied);
    assert_eq!(eval.output("root_original"), Some(fe(ROOT_BOB_ALICE)));
    assert_eq!(eval.output("root_sorted"), Some(fe(ROOT_ALICE_BOB)));
    assert_eq!(eval.output("is_unique"), Some(FieldElement::from(1u64)));
}

#[test]
fn test_witness_values_are_below_circuit_modulus() {
    let ctx = PoseidonContext::new().unwrap();
    let prepared = prepare_dataset(&ctx, &Dataset::sample(200)).unwrap();
    let input = WitnessInput::from_prepared(&prepared);
    let r = modulus();

    let values = input
        .leaves_original
        .iter()
        .chain(&input.leaves_sorted)
        .chain([&input.expected_root_original, &input.expected_root_sorted]);
    for decimal in values {
        let value = BigUint::from_str_radix(decimal, 10).unwrap();
        assert!(value < r, "{} is not a BN254 scalar", decimal);
    }
}
