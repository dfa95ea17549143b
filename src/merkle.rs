//! Padded Poseidon Merkle trees over row hashes.
//!
//! Leaves are padded with zero at the tail to the next power of two and hashed
//! pairwise, left to right, one level at a time. The circuit's `MerkleRoot` template
//! performs the identical computation, gate for gate.

use ff::Field;
use serde::{Deserialize, Serialize};
use tracing::debug_span;

use crate::config::tree_shape;
use crate::poseidon::PoseidonContext;
use crate::{FieldElement, Result, UniqueRowsError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// A Merkle tree with layers stored from leaves (layer 0) to root.
///
/// - `layers[0]` holds the padded leaves
/// - `layers[layers.len() - 1]` holds the root alone
pub struct MerkleTree {
    pub layers: Vec<Vec<FieldElement>>,
}

impl MerkleTree {
    /// Returns the root of the tree.
    pub fn root(&self) -> FieldElement {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or(FieldElement::ZERO)
    }

    /// The padded leaf layer.
    pub fn padded_leaves(&self) -> &[FieldElement] {
        self.layers.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of hashing levels above the leaves.
    pub fn depth(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }
}

/// Pad `leaves` with zero up to the next power of two.
pub fn pad_leaves(leaves: &[FieldElement]) -> Result<Vec<FieldElement>> {
    let shape = tree_shape(leaves.len())?;
    let mut padded = leaves.to_vec();
    padded.resize(shape.num_leaves, FieldElement::ZERO);

    if !padded.len().is_power_of_two() {
        return Err(UniqueRowsError::PaddingInvariant { len: padded.len() });
    }
    Ok(padded)
}

/// Hash one level into the next, pairing adjacent elements left to right.
///
/// An unpaired tail element is hashed with zero.
pub fn hash_layer(ctx: &PoseidonContext, layer: &[FieldElement]) -> Result<Vec<FieldElement>> {
    layer
        .chunks(2)
        .map(|pair| {
            let right = pair.get(1).copied().unwrap_or(FieldElement::ZERO);
            ctx.hash2(pair[0], right)
        })
        .collect()
}

/// Build a Merkle tree over `leaves`.
///
/// A single leaf is its own root; no hashing happens.
pub fn build_tree(ctx: &PoseidonContext, leaves: &[FieldElement]) -> Result<MerkleTree> {
    let _span = debug_span!("build_tree", leaves = leaves.len()).entered();
    let mut layer = pad_leaves(leaves)?;
    let mut layers = Vec::with_capacity(layer.len().trailing_zeros() as usize + 1);

    while layer.len() > 1 {
        let next = hash_layer(ctx, &layer)?;
        layers.push(std::mem::replace(&mut layer, next));
    }
    layers.push(layer);

    Ok(MerkleTree { layers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::field_to_decimal;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from(v)
    }

    #[test]
    fn test_single_leaf_is_root() {
        let ctx = PoseidonContext::new().unwrap();
        let tree = build_tree(&ctx, &[fe(7)]).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.root(), fe(7));
    }

    #[test]
    fn test_three_leaves_pad_with_zero() {
        let ctx = PoseidonContext::new().unwrap();
        let (h1, h2, h3) = (fe(11), fe(22), fe(33));
        let tree = build_tree(&ctx, &[h1, h2, h3]).unwrap();

        assert_eq!(tree.padded_leaves(), &[h1, h2, h3, FieldElement::ZERO]);
        assert_eq!(tree.depth(), 2);
        let left = ctx.hash2(h1, h2).unwrap();
        let right = ctx.hash2(h3, FieldElement::ZERO).unwrap();
        assert_eq!(tree.root(), ctx.hash2(left, right).unwrap());
    }

    #[test]
    fn test_levels_halve() {
        let ctx = PoseidonContext::new().unwrap();
        let leaves: Vec<_> = (1..=5).map(fe).collect();
        let tree = build_tree(&ctx, &leaves).unwrap();

        let sizes: Vec<usize> = tree.layers.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![8, 4, 2, 1]);
    }

    #[test]
    fn test_zero_leaves_give_circomlib_zero_roots() {
        let ctx = PoseidonContext::new().unwrap();
        let zero = FieldElement::ZERO;

        let two = build_tree(&ctx, &[zero, zero]).unwrap();
        assert_eq!(
            field_to_decimal(&two.root()),
            "14744269619966411208579211824598458697587494354926760081771325075741142829156"
        );
        let four = build_tree(&ctx, &[zero, zero, zero]).unwrap();
        assert_eq!(
            field_to_decimal(&four.root()),
            "7423237065226347324353380772367382631490014989348495481811164164159255474657"
        );
    }

    #[test]
    fn test_unpaired_tail_is_hashed_with_zero() {
        let ctx = PoseidonContext::new().unwrap();
        let (a, b, c) = (fe(1), fe(2), fe(3));

        let next = hash_layer(&ctx, &[a, b, c]).unwrap();
        assert_eq!(
            next,
            vec![
                ctx.hash2(a, b).unwrap(),
                ctx.hash2(c, FieldElement::ZERO).unwrap()
            ]
        );
        // Same result as padding the level explicitly
        assert_eq!(next, hash_layer(&ctx, &[a, b, c, FieldElement::ZERO]).unwrap());
    }

    #[test]
    fn test_empty_is_rejected() {
        let ctx = PoseidonContext::new().unwrap();
        assert!(matches!(
            build_tree(&ctx, &[]),
            Err(UniqueRowsError::EmptyDataset)
        ));
    }
}
