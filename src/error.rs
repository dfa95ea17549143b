//! Error types for the unique-rows library

use std::fmt;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Setup,
    Synthesis,
    Compile,
    Witness,
    ConstraintCount,
    TrustedSetup,
    Prove,
    Verify,
    Summary,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Synthesis => "synthesis",
            Stage::Compile => "compile",
            Stage::Witness => "witness",
            Stage::ConstraintCount => "constraint-count",
            Stage::TrustedSetup => "trusted-setup",
            Stage::Prove => "prove",
            Stage::Verify => "verify",
            Stage::Summary => "summary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two committed orderings a root belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeKind {
    Original,
    Sorted,
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeKind::Original => f.write_str("original"),
            TreeKind::Sorted => f.write_str("sorted"),
        }
    }
}

/// Error types for the unique-rows library
#[derive(Debug, thiserror::Error)]
pub enum UniqueRowsError {
    /// The dataset could not be read or has no rows
    #[error("Data error: dataset is empty")]
    EmptyDataset,

    /// Uniqueness checking needs at least one adjacent pair
    #[error("Data error: {rows} row(s) supplied, at least {min} required")]
    TooFewRows { rows: usize, min: usize },

    /// Invalid input parameters (generic fallback)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Leaf count is not a power of two after padding
    #[error("Internal error: padded leaf count {len} is not a power of two")]
    PaddingInvariant { len: usize },

    /// Poseidon parameter loading or hashing failed
    #[error("Hash error: {0}")]
    Hash(String),

    /// Circuit IR construction or lowering failed
    #[error("Circuit error: {0}")]
    Circuit(String),

    /// An external compile/witness/setup/prove/verify step failed
    #[error("Stage {stage} failed: {details}")]
    CompilationFailure { stage: Stage, details: String },

    /// No proving-parameter file is large enough
    #[error("Capacity exceeded: {required} constraints required, largest available capacity is {max_available}")]
    CapacityExceeded { required: u64, max_available: u64 },

    /// Root exposed by the circuit differs from the off-circuit root
    #[error("Root mismatch for {tree} tree: circuit computed {circuit}, expected {expected}")]
    RootMismatch {
        tree: TreeKind,
        circuit: String,
        expected: String,
    },

    /// The verifier rejected the proof
    #[error("Proof verification failed")]
    ProofVerificationFailure,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    IO(String),
}

impl UniqueRowsError {
    /// Stage-tagged constructor for external tool failures.
    pub fn tool(stage: Stage, details: impl Into<String>) -> Self {
        UniqueRowsError::CompilationFailure {
            stage,
            details: details.into(),
        }
    }
}

impl From<std::io::Error> for UniqueRowsError {
    fn from(e: std::io::Error) -> Self {
        UniqueRowsError::IO(e.to_string())
    }
}

impl From<serde_json::Error> for UniqueRowsError {
    fn from(e: serde_json::Error) -> Self {
        UniqueRowsError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for UniqueRowsError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            UniqueRowsError::IO(e.to_string())
        } else {
            UniqueRowsError::InvalidInput(format!("Malformed dataset: {}", e))
        }
    }
}

impl From<light_poseidon::PoseidonError> for UniqueRowsError {
    fn from(e: light_poseidon::PoseidonError) -> Self {
        UniqueRowsError::Hash(e.to_string())
    }
}

impl From<nova_snark::frontend::SynthesisError> for UniqueRowsError {
    fn from(e: nova_snark::frontend::SynthesisError) -> Self {
        UniqueRowsError::Circuit(format!("synthesis failed: {:?}", e))
    }
}

/// Convenience Result type for unique-rows operations
pub type Result<T> = std::result::Result<T, UniqueRowsError>;
