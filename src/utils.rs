//! Stateless helper functions for field-element encoding.
//!
//! Field elements cross the process boundary as canonical decimal integers. These
//! helpers centralize the endianness assumption (little-endian `Repr`, as used by
//! the BN254 scalar field) and are covered by tests.

use ff::PrimeField;
use num_bigint::BigUint;
use num_traits::Num;
use std::cmp::Ordering;

use crate::{Result, UniqueRowsError};

/// Canonical integer value of a field element.
pub fn field_to_biguint<F: PrimeField>(element: &F) -> BigUint {
    BigUint::from_bytes_le(element.to_repr().as_ref())
}

/// Canonical decimal encoding of a field element.
pub fn field_to_decimal<F: PrimeField>(element: &F) -> String {
    field_to_biguint(element).to_str_radix(10)
}

/// Parse a canonical decimal string into a field element.
///
/// Rejects non-decimal input and values that are not below the field modulus.
pub fn field_from_decimal<F: PrimeField>(decimal: &str) -> Result<F> {
    let trimmed = decimal.trim();
    let value = BigUint::from_str_radix(trimmed, 10).map_err(|e| {
        UniqueRowsError::Serialization(format!("Invalid decimal field element {:?}: {}", decimal, e))
    })?;

    let bytes = value.to_bytes_le();
    let mut repr = F::Repr::default();
    let buf = repr.as_mut();
    if bytes.len() > buf.len() {
        return Err(UniqueRowsError::Serialization(format!(
            "Decimal value {} does not fit in a field element",
            trimmed
        )));
    }
    buf[..bytes.len()].copy_from_slice(&bytes);

    Option::<F>::from(F::from_repr(repr)).ok_or_else(|| {
        UniqueRowsError::Serialization(format!(
            "Decimal value {} is not below the field modulus",
            trimmed
        ))
    })
}

/// Interpret `bytes` as a big-endian integer and reduce it into the field.
pub fn field_from_be_bytes_mod_order<F: PrimeField>(bytes: &[u8]) -> F {
    let radix = F::from(256u64);
    bytes
        .iter()
        .fold(F::ZERO, |acc, byte| acc * radix + F::from(u64::from(*byte)))
}

/// Compare two field elements by canonical integer value.
pub fn cmp_field<F: PrimeField>(a: &F, b: &F) -> Ordering {
    let a_repr = a.to_repr();
    let b_repr = b.to_repr();
    // Little-endian repr: compare from the most significant byte down
    a_repr
        .as_ref()
        .iter()
        .rev()
        .cmp(b_repr.as_ref().iter().rev())
}
