//! Zero-knowledge proofs of row uniqueness for tabular datasets.
//!
//! A prover commits every row of a dataset to a field element, builds Poseidon Merkle
//! trees over the row hashes in original and sorted order, and proves with a Groth16
//! circuit that no two adjacent sorted hashes are equal (or, in the threshold variant,
//! that fewer than a given percentage of rows are duplicates). The verifier learns only
//! the two roots and the verdict.
//!
//! ## Main Components
//!
//! - [`api`]: Dataset preparation, witness input and the end-to-end `ProofPipeline`
//! - [`dataset`]: Delimited-text reader and sample dataset generators
//! - [`commit`]: SHA-256 row commitments reduced into the field
//! - [`merkle`]: Padded Poseidon Merkle trees
//! - [`circuit`]: Circuit model, circom rendering and in-process constraint lowering
//! - [`params`]: Powers-of-tau catalog and parameter selection
//! - [`tools`]: Adapters for circom, node and snarkjs
//! - [`config`]: Constants, tree shape and run configuration
//!
//! ## Error Handling
//!
//! Fallible functions return [`Result<T>`], an alias for
//! `std::result::Result<T, UniqueRowsError>`:
//!
//! - `prepare_dataset()` fails with `EmptyDataset` on a dataset without rows
//! - `CircuitSpec::new()` fails with `TooFewRows` below two rows
//! - `PtauCatalog::select()` fails with `CapacityExceeded` when no file is large enough
//! - `ProofPipeline::run()` fails with `RootMismatch` when the circuit's roots disagree
//!   with the off-circuit ones
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use unique_rows::{circuit, config::PipelineConfig, Dataset, PoseidonContext, ProofPipeline};
//!
//! // 1. Emit the circuit files for a 10-row dataset with a 20% duplicate threshold
//! let sources = circuit::emit(10, Some(20))?;
//! sources.write_to(std::path::Path::new("generated/script"))?;
//!
//! // 2. Evaluate a dataset against the circuit in process
//! let ctx = PoseidonContext::new()?;
//! let config = PipelineConfig::default();
//! let dataset = Dataset::sample_with_duplicates(10, 1, 42)?;
//! let report = ProofPipeline::dry_run(&config, &ctx).run_dataset(&dataset)?;
//! assert!(!report.outputs.is_unique);
//! # Ok::<(), unique_rows::UniqueRowsError>(())
//! ```

pub mod api;
pub mod circuit;
pub mod commit;
pub mod config;
pub mod dataset;
pub mod error;
pub mod merkle;
pub mod params;
pub mod poseidon;
pub mod tools;
pub mod utils;

// Re-export commonly used types and functions for convenience
pub use api::{prepare_dataset, FieldElement, PreparedDataset, ProofPipeline, ProofReport};
pub use circuit::{emit, CircuitSources, CircuitSpec};
pub use commit::{commit_row, commit_rows, sorted_hashes};
pub use dataset::{Dataset, Row};
pub use error::{Result, UniqueRowsError};
pub use merkle::{build_tree, MerkleTree};
pub use params::PtauCatalog;
pub use poseidon::PoseidonContext;
