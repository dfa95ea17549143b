//! Core API data types.
//!
//! - PreparedDataset: both Merkle trees over a dataset's row hashes (prover-private)
//! - PublicOutputs: what the circuit reveals
//! - ProofReport: summary of a pipeline run

use nova_snark::{provider::Bn256EngineKZG, traits::Engine};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::circuit::CircuitSpec;
use crate::merkle::MerkleTree;

/// A type alias for the BN254 scalar field, the native field of circom and snarkjs.
pub type FieldElement = <Bn256EngineKZG as Engine>::Scalar;

/// A dataset committed in original and sorted row order.
///
/// The trees hold every row hash and must stay with the prover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedDataset {
    pub num_rows: usize,
    pub original: MerkleTree,
    pub sorted: MerkleTree,
}

impl PreparedDataset {
    pub fn root_original(&self) -> FieldElement {
        self.original.root()
    }

    pub fn root_sorted(&self) -> FieldElement {
        self.sorted.root()
    }

    pub fn num_leaves(&self) -> usize {
        self.original.padded_leaves().len()
    }
}

/// Public outputs of the uniqueness circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicOutputs {
    pub root_original: FieldElement,
    pub root_sorted: FieldElement,
    pub is_unique: bool,
    /// Present only for the threshold variant
    pub is_below_threshold: Option<bool>,
}

/// Result of a completed pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofReport {
    pub spec: CircuitSpec,
    pub outputs: PublicOutputs,
    pub num_constraints: u64,
    /// Parameter file used for the trusted setup; `None` on a dry run
    pub ptau: Option<PathBuf>,
    /// Whether the external verifier accepted the proof; a dry run reports whether the
    /// lowered circuit was satisfied
    pub verified: bool,
}
