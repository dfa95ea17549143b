//! Zero-test and comparison gadgets.
//!
//! Both follow the circomlib constructions the emitted circuit includes, so the
//! in-process lowering and the external compiler agree on outputs.

use ff::{PrimeField, PrimeFieldBits};
use nova_snark::frontend::{
    gadgets::{boolean::AllocatedBit, num::AllocatedNum},
    ConstraintSystem, SynthesisError,
};

/// `out = 1` if `x == 0`, else `0`.
///
/// Witnesses `inv` and enforces `x * inv = 1 - out` and `x * out = 0`.
pub fn is_zero<F: PrimeField, CS: ConstraintSystem<F>>(
    mut cs: CS,
    x: &AllocatedNum<F>,
) -> Result<AllocatedNum<F>, SynthesisError> {
    let inv = AllocatedNum::alloc(cs.namespace(|| "inv"), || {
        let value = x.get_value().ok_or(SynthesisError::AssignmentMissing)?;
        Ok(Option::from(value.invert()).unwrap_or(F::ZERO))
    })?;
    let out = AllocatedNum::alloc(cs.namespace(|| "out"), || {
        let value = x.get_value().ok_or(SynthesisError::AssignmentMissing)?;
        Ok(if bool::from(value.is_zero()) {
            F::ONE
        } else {
            F::ZERO
        })
    })?;

    cs.enforce(
        || "x_times_inv",
        |lc| lc + x.get_variable(),
        |lc| lc + inv.get_variable(),
        |lc| lc + CS::one() - out.get_variable(),
    );
    cs.enforce(
        || "x_times_out",
        |lc| lc + x.get_variable(),
        |lc| lc + out.get_variable(),
        |lc| lc,
    );

    Ok(out)
}

/// `out = 1` if `a < b`, else `0`, for operands below `2^bits`.
///
/// Decomposes `a + 2^bits - b` into `bits + 1` bits; the top bit is set exactly
/// when `a >= b`.
pub fn less_than<F: PrimeFieldBits, CS: ConstraintSystem<F>>(
    mut cs: CS,
    bits: usize,
    a: &AllocatedNum<F>,
    b: &AllocatedNum<F>,
) -> Result<AllocatedNum<F>, SynthesisError> {
    let offset = F::from(2u64).pow_vartime([bits as u64]);

    let shifted = match (a.get_value(), b.get_value()) {
        (Some(a), Some(b)) => Some(a + offset - b),
        _ => None,
    };
    let shifted_bits: Option<Vec<bool>> =
        shifted.map(|v| v.to_le_bits().iter().by_vals().take(bits + 1).collect());

    let decomposition = (0..=bits)
        .map(|i| {
            AllocatedBit::alloc(
                cs.namespace(|| format!("bit_{}", i)),
                shifted_bits.as_ref().map(|b| b[i]),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    cs.enforce(
        || "bit_decomposition",
        |lc| {
            let mut coeff = F::ONE;
            let mut lc = lc;
            for bit in &decomposition {
                lc = lc + (coeff, bit.get_variable());
                coeff = coeff.double();
            }
            lc
        },
        |lc| lc + CS::one(),
        |lc| lc + a.get_variable() + (offset, CS::one()) - b.get_variable(),
    );

    let top = &decomposition[bits];
    let out = AllocatedNum::alloc(cs.namespace(|| "out"), || {
        let top = top.get_value().ok_or(SynthesisError::AssignmentMissing)?;
        Ok(if top { F::ZERO } else { F::ONE })
    })?;
    cs.enforce(
        || "out_is_not_top_bit",
        |lc| lc + out.get_variable() + top.get_variable(),
        |lc| lc + CS::one(),
        |lc| lc + CS::one(),
    );

    Ok(out)
}
