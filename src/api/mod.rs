//! A high-level API for proving that a dataset has no (or few) duplicate rows.
//!
//! ## Core Workflow
//!
//! 1. **`prepare_dataset()`**: Commits every row to a field element and builds two Poseidon
//!    Merkle trees, one over the hashes in original row order and one over the hashes
//!    sorted ascending. The resulting `PreparedDataset` is private to the prover.
//! 2. **`WitnessInput::from_prepared()`**: Encodes the padded leaves and expected roots as
//!    the circuit's `input.json`.
//! 3. **`ProofPipeline`**: Emits the circuit for the dataset's row count, drives the
//!    external compiler and Groth16 prover, and cross-checks the public roots against the
//!    off-circuit ones.
//!
//! ## Security Considerations
//!
//! - **Private Data**: `PreparedDataset` contains every row hash. Row hashes of
//!   low-entropy rows can be brute-forced, so they must never leave the prover.
//! - **Root Binding**: With the default `RootBinding::Enforced`, the circuit itself rejects
//!   a witness whose computed roots differ from the expected ones. The post-proof root
//!   check runs regardless.
//!
//! ## Example
//!
//! ```rust,no_run
//! use unique_rows::api::{prepare_dataset, ProofPipeline};
//! use unique_rows::{config::PipelineConfig, Dataset, PoseidonContext};
//!
//! let dataset = Dataset::sample(10);
//! let ctx = PoseidonContext::new().unwrap();
//!
//! let prepared = prepare_dataset(&ctx, &dataset).unwrap();
//! println!("{} rows in {} leaves", prepared.num_rows, prepared.num_leaves());
//!
//! // Evaluate the emitted circuit in process, without circom or snarkjs
//! let config = PipelineConfig::default();
//! let report = ProofPipeline::dry_run(&config, &ctx).run_dataset(&dataset).unwrap();
//! assert!(report.outputs.is_unique);
//! ```

mod system;
mod types;
mod verify;
mod witness;

pub use system::{ProofPipeline, ToolAdapters};
pub use types::{FieldElement, PreparedDataset, ProofReport, PublicOutputs};
pub use verify::{check_roots, outputs_from_evaluation, parse_public_signals};
pub use witness::WitnessInput;

pub use crate::{Result, UniqueRowsError};

use crate::commit::{commit_rows, sorted_hashes};
use crate::dataset::Dataset;
use crate::merkle::build_tree;
use crate::poseidon::PoseidonContext;
use tracing::debug_span;

/// Commits a dataset's rows and builds its original-order and sorted Merkle trees.
///
/// Fails with `EmptyDataset` when the dataset has no rows. The minimum row count for
/// a provable dataset is enforced when the circuit parameters are derived.
pub fn prepare_dataset(
    ctx: &PoseidonContext<FieldElement>,
    dataset: &Dataset,
) -> Result<PreparedDataset> {
    let _span = debug_span!("prepare_dataset", rows = dataset.num_rows()).entered();

    if dataset.rows.is_empty() {
        return Err(UniqueRowsError::EmptyDataset);
    }

    // 1. Row commitments in original order
    let hashes = commit_rows(&dataset.rows);

    // 2. Same multiset, sorted so equal rows are adjacent
    let sorted = sorted_hashes(&hashes);

    // 3. Both trees share the padded shape
    let original = build_tree(ctx, &hashes)?;
    let sorted = build_tree(ctx, &sorted)?;

    Ok(PreparedDataset {
        num_rows: dataset.num_rows(),
        original,
        sorted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Row;

    #[test]
    fn test_prepare_dataset_shapes() {
        let ctx = PoseidonContext::new().unwrap();
        let prepared = prepare_dataset(&ctx, &Dataset::sample(5)).unwrap();
        assert_eq!(prepared.num_rows, 5);
        assert_eq!(prepared.num_leaves(), 8);
        assert_eq!(prepared.original.depth(), 3);
        assert_eq!(prepared.sorted.depth(), 3);
    }

    #[test]
    fn test_sorted_tree_ignores_row_order() {
        let ctx = PoseidonContext::new().unwrap();
        let dataset = Dataset::sample(6);
        let mut reversed = dataset.clone();
        reversed.rows.reverse();

        let a = prepare_dataset(&ctx, &dataset).unwrap();
        let b = prepare_dataset(&ctx, &reversed).unwrap();
        assert_eq!(a.root_sorted(), b.root_sorted());
        assert_ne!(a.root_original(), b.root_original());
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let ctx = PoseidonContext::new().unwrap();
        let dataset = Dataset {
            header: vec!["Name".to_string()],
            rows: Vec::<Row>::new(),
        };
        assert!(matches!(
            prepare_dataset(&ctx, &dataset),
            Err(UniqueRowsError::EmptyDataset)
        ));
    }
}
