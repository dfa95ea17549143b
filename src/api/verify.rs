//! Public-signal interpretation and root cross-checking.
//!
//! Whatever computed the public signals (snarkjs or the in-process lowering), the roots
//! it reports must equal the roots computed off-circuit from the same dataset. A
//! mismatch is always a hard failure.

use ff::Field;
use tracing::{info, info_span, warn};

use super::types::{FieldElement, PreparedDataset, PublicOutputs};
use crate::circuit::Evaluation;
use crate::error::TreeKind;
use crate::utils::{field_from_decimal, field_to_decimal};
use crate::{Result, UniqueRowsError};

fn flag(value: FieldElement, name: &str) -> Result<bool> {
    if value == FieldElement::ONE {
        Ok(true)
    } else if value == FieldElement::ZERO {
        Ok(false)
    } else {
        Err(UniqueRowsError::Serialization(format!(
            "{} is {}, expected 0 or 1",
            name,
            field_to_decimal(&value)
        )))
    }
}

/// Interpret `public.json`.
///
/// Layout: `root_original, root_sorted, is_unique[, is_below_threshold]`, followed by
/// the public inputs.
pub fn parse_public_signals(signals: &[String], has_threshold: bool) -> Result<PublicOutputs> {
    let num_outputs = if has_threshold { 4 } else { 3 };
    if signals.len() < num_outputs {
        return Err(UniqueRowsError::Serialization(format!(
            "expected at least {} public signals, got {}",
            num_outputs,
            signals.len()
        )));
    }
    let values = signals
        .iter()
        .take(num_outputs)
        .map(|s| field_from_decimal::<FieldElement>(s))
        .collect::<Result<Vec<_>>>()?;
    outputs_from_values(&values, has_threshold)
}

/// Read the public outputs of an in-process evaluation.
pub fn outputs_from_evaluation(evaluation: &Evaluation<FieldElement>) -> Result<PublicOutputs> {
    let has_threshold = evaluation.output("is_below_threshold").is_some();
    let values: Vec<FieldElement> = evaluation.outputs.iter().map(|(_, v)| *v).collect();
    outputs_from_values(&values, has_threshold)
}

fn outputs_from_values(values: &[FieldElement], has_threshold: bool) -> Result<PublicOutputs> {
    let expected = if has_threshold { 4 } else { 3 };
    if values.len() < expected {
        return Err(UniqueRowsError::Circuit(format!(
            "expected {} outputs, got {}",
            expected,
            values.len()
        )));
    }
    Ok(PublicOutputs {
        root_original: values[0],
        root_sorted: values[1],
        is_unique: flag(values[2], "is_unique")?,
        is_below_threshold: if has_threshold {
            Some(flag(values[3], "is_below_threshold")?)
        } else {
            None
        },
    })
}

/// Fail with `RootMismatch` unless both circuit roots equal the off-circuit roots.
pub fn check_roots(outputs: &PublicOutputs, prepared: &PreparedDataset) -> Result<()> {
    let _span = info_span!("check_roots").entered();
    let pairs = [
        (TreeKind::Original, outputs.root_original, prepared.root_original()),
        (TreeKind::Sorted, outputs.root_sorted, prepared.root_sorted()),
    ];
    for (tree, circuit, expected) in pairs {
        if circuit != expected {
            warn!("Merkle root for the {} dataset does not match", tree);
            return Err(UniqueRowsError::RootMismatch {
                tree,
                circuit: field_to_decimal(&circuit),
                expected: field_to_decimal(&expected),
            });
        }
        info!(
            "Merkle root for the {} dataset matches: {}",
            tree,
            field_to_decimal(&circuit)
        );
    }
    Ok(())
}
