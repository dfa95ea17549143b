//! Poseidon permutation gadget matching circomlib's `Poseidon(2)`.
//!
//! Runs the width-3 permutation with the round constants and MDS matrix held by a
//! [`PoseidonContext`]: initial state `[0, left, right]`, output is the first state word.

use ff::PrimeField;
use nova_snark::frontend::{
    gadgets::num::AllocatedNum, ConstraintSystem, LinearCombination, SynthesisError,
};

use crate::poseidon::PoseidonContext;

/// A state word: a linear combination and its witness value.
struct Word<F: PrimeField> {
    lc: LinearCombination<F>,
    value: Option<F>,
}

impl<F: PrimeField> Word<F> {
    fn constant<CS: ConstraintSystem<F>>(value: F) -> Self {
        Self {
            lc: LinearCombination::zero() + (value, CS::one()),
            value: Some(value),
        }
    }

    fn num(num: &AllocatedNum<F>) -> Self {
        Self {
            lc: LinearCombination::zero() + num.get_variable(),
            value: num.get_value(),
        }
    }

    fn add_constant<CS: ConstraintSystem<F>>(self, constant: F) -> Self {
        Self {
            lc: self.lc + (constant, CS::one()),
            value: self.value.map(|v| v + constant),
        }
    }
}

/// `x^5`, three multiplication constraints.
fn sbox<F: PrimeField, CS: ConstraintSystem<F>>(
    mut cs: CS,
    word: Word<F>,
) -> Result<Word<F>, SynthesisError> {
    let x = word.value;
    let x2 = AllocatedNum::alloc(cs.namespace(|| "x2"), || {
        x.map(|v| v.square()).ok_or(SynthesisError::AssignmentMissing)
    })?;
    cs.enforce(
        || "x2 = x * x",
        |_| word.lc.clone(),
        |_| word.lc.clone(),
        |lc| lc + x2.get_variable(),
    );

    let x4 = x2.square(cs.namespace(|| "x4"))?;

    let x5 = AllocatedNum::alloc(cs.namespace(|| "x5"), || {
        let x = x.ok_or(SynthesisError::AssignmentMissing)?;
        let x4 = x4.get_value().ok_or(SynthesisError::AssignmentMissing)?;
        Ok(x4 * x)
    })?;
    cs.enforce(
        || "x5 = x4 * x",
        |lc| lc + x4.get_variable(),
        |_| word.lc,
        |lc| lc + x5.get_variable(),
    );

    Ok(Word::num(&x5))
}

/// Multiply the state by the MDS matrix, allocating each output word.
fn mix<F: PrimeField, CS: ConstraintSystem<F>>(
    mut cs: CS,
    state: &[Word<F>],
    mds: &[Vec<F>],
) -> Result<Vec<AllocatedNum<F>>, SynthesisError> {
    let mut mixed = Vec::with_capacity(mds.len());
    for (i, row) in mds.iter().enumerate() {
        let mut lc = LinearCombination::zero();
        let mut value = Some(F::ZERO);
        for (coeff, word) in row.iter().zip(state) {
            lc = lc + (*coeff, &word.lc);
            value = value.zip(word.value).map(|(acc, v)| acc + *coeff * v);
        }

        let num = AllocatedNum::alloc(cs.namespace(|| format!("word_{}", i)), || {
            value.ok_or(SynthesisError::AssignmentMissing)
        })?;
        cs.enforce(
            || format!("word_{} = mds row {}", i, i),
            |_| lc,
            |lc| lc + CS::one(),
            |lc| lc + num.get_variable(),
        );
        mixed.push(num);
    }
    Ok(mixed)
}

/// 2-to-1 Poseidon hash gadget. Argument order matters.
pub fn poseidon_hash2_gadget<F: PrimeField, CS: ConstraintSystem<F>>(
    mut cs: CS,
    ctx: &PoseidonContext<F>,
    left: &AllocatedNum<F>,
    right: &AllocatedNum<F>,
) -> Result<AllocatedNum<F>, SynthesisError> {
    let mut state = vec![Word::constant::<CS>(F::ZERO), Word::num(left), Word::num(right)];
    let mut output = None;

    for round in 0..ctx.total_rounds() {
        let mut round_cs = cs.namespace(|| format!("round_{}", round));
        let constants = ctx.round_constants(round);
        if constants.len() != state.len() {
            return Err(SynthesisError::Unsatisfiable);
        }

        let mut words = Vec::with_capacity(state.len());
        for (i, (word, constant)) in state.into_iter().zip(constants).enumerate() {
            let word = word.add_constant::<CS>(*constant);
            if i == 0 || ctx.is_full_round(round) {
                words.push(sbox(round_cs.namespace(|| format!("sbox_{}", i)), word)?);
            } else {
                words.push(word);
            }
        }

        let mixed = mix(round_cs.namespace(|| "mix"), &words, ctx.mds())?;
        state = mixed.iter().map(Word::num).collect();
        output = mixed.into_iter().next();
    }

    output.ok_or(SynthesisError::Unsatisfiable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::field_to_decimal;
    use crate::FieldElement;
    use ff::Field;
    use nova_snark::frontend::util_cs::test_cs::TestConstraintSystem;

    fn hash_in_circuit(
        ctx: &PoseidonContext,
        a: FieldElement,
        b: FieldElement,
    ) -> (TestConstraintSystem<FieldElement>, AllocatedNum<FieldElement>) {
        let mut cs = TestConstraintSystem::<FieldElement>::new();
        let a_alloc = AllocatedNum::alloc(cs.namespace(|| "a"), || Ok(a)).unwrap();
        let b_alloc = AllocatedNum::alloc(cs.namespace(|| "b"), || Ok(b)).unwrap();
        let out = poseidon_hash2_gadget(cs.namespace(|| "hash"), ctx, &a_alloc, &b_alloc).unwrap();
        (cs, out)
    }

    #[test]
    fn test_gadget_matches_native_hash() {
        let ctx = PoseidonContext::new().unwrap();
        let (a, b) = (FieldElement::from(3u64), FieldElement::from(9u64));

        let (cs, out) = hash_in_circuit(&ctx, a, b);
        assert!(cs.is_satisfied());
        assert_eq!(out.get_value(), Some(ctx.hash2(a, b).unwrap()));
    }

    #[test]
    fn test_gadget_matches_circomlib_vector() {
        let ctx = PoseidonContext::new().unwrap();
        let (cs, out) = hash_in_circuit(&ctx, FieldElement::ZERO, FieldElement::ZERO);

        assert!(cs.is_satisfied());
        assert_eq!(
            field_to_decimal(&out.get_value().unwrap()),
            "14744269619966411208579211824598458697587494354926760081771325075741142829156"
        );
    }

    #[test]
    fn test_output_bound_to_wrong_digest_is_unsatisfied() {
        let ctx = PoseidonContext::new().unwrap();
        let (a, b) = (FieldElement::ONE, FieldElement::from(2u64));
        let (mut cs, out) = hash_in_circuit(&ctx, a, b);
        assert!(cs.is_satisfied());

        let swapped = ctx.hash2(b, a).unwrap();
        cs.enforce(
            || "out = hash(b, a)",
            |lc| lc + out.get_variable(),
            |lc| lc + TestConstraintSystem::<FieldElement>::one(),
            |lc| lc + (swapped, TestConstraintSystem::<FieldElement>::one()),
        );
        assert!(!cs.is_satisfied());
    }
}
