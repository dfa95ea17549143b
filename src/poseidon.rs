//! circomlib-compatible Poseidon over the BN254 scalar field.
//!
//! The emitted circuits hash with circomlib's `Poseidon(2)`, so the off-circuit Merkle
//! builder has to produce the same field elements. Native hashing goes through
//! `light-poseidon`'s circom parameters. The in-circuit gadget reads the same round
//! constants and MDS matrix from a [`PoseidonContext`], converted into the circuit
//! field.

use ark_bn254::Fr as ArkFr;
use ark_ff::{BigInteger, PrimeField as ArkPrimeField};
use ff::PrimeField;
use light_poseidon::{parameters::bn254_x5, Poseidon, PoseidonHasher};
use std::sync::Mutex;

use crate::{FieldElement, Result, UniqueRowsError};

/// State width of the 2-to-1 permutation: the capacity element plus two inputs.
pub const POSEIDON_WIDTH: usize = 3;

/// Round constants and MDS matrix of the width-3 permutation.
///
/// `hash2` is only available over [`FieldElement`]; other fields only carry the
/// constants for constraint synthesis.
pub struct PoseidonContext<F: PrimeField = FieldElement> {
    round_constants: Vec<F>,
    mds: Vec<Vec<F>>,
    full_rounds: usize,
    partial_rounds: usize,
    hasher: Mutex<Poseidon<ArkFr>>,
}

impl<F: PrimeField> PoseidonContext<F> {
    pub fn full_rounds(&self) -> usize {
        self.full_rounds
    }

    pub fn partial_rounds(&self) -> usize {
        self.partial_rounds
    }

    pub fn total_rounds(&self) -> usize {
        self.full_rounds + self.partial_rounds
    }

    /// Whether `round` applies the S-box to the whole state.
    ///
    /// Full rounds are split evenly around the partial rounds.
    pub fn is_full_round(&self, round: usize) -> bool {
        let half = self.full_rounds / 2;
        round < half || round >= half + self.partial_rounds
    }

    /// The `POSEIDON_WIDTH` constants added at the start of `round`.
    pub fn round_constants(&self, round: usize) -> &[F] {
        let start = round * POSEIDON_WIDTH;
        self.round_constants
            .get(start..start + POSEIDON_WIDTH)
            .unwrap_or(&[])
    }

    pub fn mds(&self) -> &[Vec<F>] {
        &self.mds
    }
}

impl PoseidonContext<FieldElement> {
    /// Load circomlib's width-3 parameters.
    pub fn new() -> Result<Self> {
        let params = bn254_x5::get_poseidon_parameters::<ArkFr>(POSEIDON_WIDTH as u8)?;
        let rounds = params.full_rounds + params.partial_rounds;
        if params.ark.len() != rounds * POSEIDON_WIDTH
            || params.mds.len() != POSEIDON_WIDTH
            || params.mds.iter().any(|row| row.len() != POSEIDON_WIDTH)
        {
            return Err(UniqueRowsError::Hash(format!(
                "unexpected Poseidon parameter shape: {} constants, {} MDS rows",
                params.ark.len(),
                params.mds.len()
            )));
        }

        let round_constants = params.ark.iter().map(from_ark).collect::<Result<Vec<_>>>()?;
        let mds = params
            .mds
            .iter()
            .map(|row| row.iter().map(from_ark).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            round_constants,
            mds,
            full_rounds: params.full_rounds,
            partial_rounds: params.partial_rounds,
            hasher: Mutex::new(Poseidon::new(params)),
        })
    }

    /// circomlib `Poseidon(2)([left, right])`. Argument order matters.
    pub fn hash2(&self, left: FieldElement, right: FieldElement) -> Result<FieldElement> {
        let mut hasher = self
            .hasher
            .lock()
            .map_err(|_| UniqueRowsError::Hash("Poseidon hasher lock poisoned".to_string()))?;
        let digest = hasher.hash(&[to_ark(&left), to_ark(&right)])?;
        from_ark(&digest)
    }
}

/// Convert from the `ark` representation; both are little-endian canonical integers.
fn from_ark(value: &ArkFr) -> Result<FieldElement> {
    let bytes = value.into_bigint().to_bytes_le();
    let mut repr = <FieldElement as PrimeField>::Repr::default();
    if bytes.len() != repr.as_ref().len() {
        return Err(UniqueRowsError::Hash(format!(
            "field element encoding has {} bytes",
            bytes.len()
        )));
    }
    repr.as_mut().copy_from_slice(&bytes);
    Option::<FieldElement>::from(FieldElement::from_repr(repr))
        .ok_or_else(|| UniqueRowsError::Hash("field element is not canonical".to_string()))
}

fn to_ark(value: &FieldElement) -> ArkFr {
    ArkFr::from_le_bytes_mod_order(value.to_repr().as_ref())
}
