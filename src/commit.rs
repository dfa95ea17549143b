//! Row commitments.
//!
//! Each row is reduced to a single field element by hashing its values with SHA-256
//! under a fixed domain prefix and reducing the digest into the field. Values are
//! length-prefixed so that `["ab", "c"]` and `["a", "bc"]` commit differently.

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::debug_span;

use crate::config::ROW_DOMAIN_TAG;
use crate::dataset::Row;
use crate::utils::{cmp_field, field_from_be_bytes_mod_order};
use crate::FieldElement;

/// SHA-256 digest of a row's serialized values.
pub fn row_digest(row: &Row) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(ROW_DOMAIN_TAG);
    for value in row.values() {
        hasher.update((value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }
    hasher.finalize().into()
}

/// Commit a single row to a field element.
///
/// Depends only on the row's values, never on its position in the dataset.
pub fn commit_row(row: &Row) -> FieldElement {
    field_from_be_bytes_mod_order(&row_digest(row))
}

/// Commit every row, in parallel, returning hashes in original row order.
pub fn commit_rows(rows: &[Row]) -> Vec<FieldElement> {
    let _span = debug_span!("commit_rows", rows = rows.len()).entered();
    rows.par_iter().map(commit_row).collect()
}

/// Sort row hashes ascending by canonical integer value.
///
/// Equal rows end up adjacent, which is what the uniqueness checker scans for.
pub fn sorted_hashes(hashes: &[FieldElement]) -> Vec<FieldElement> {
    let mut sorted = hashes.to_vec();
    sorted.sort_by(cmp_field);
    sorted
}
