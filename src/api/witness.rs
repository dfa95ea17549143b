//! Witness-input artifact.
//!
//! `input.json` carries the padded leaves of both trees and the expected roots as
//! canonical decimal strings, keyed by the main template's input signal names.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, debug_span};

use super::types::{FieldElement, PreparedDataset};
use crate::circuit::lower::SignalValues;
use crate::utils::{field_from_decimal, field_to_decimal};
use crate::{Result, UniqueRowsError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessInput {
    pub leaves_original: Vec<String>,
    pub leaves_sorted: Vec<String>,
    #[serde(rename = "expectedRoot_original")]
    pub expected_root_original: String,
    #[serde(rename = "expectedRoot_sorted")]
    pub expected_root_sorted: String,
}

impl WitnessInput {
    /// Build the witness input for a prepared dataset.
    pub fn from_prepared(prepared: &PreparedDataset) -> Self {
        let _span = debug_span!("witness_input", rows = prepared.num_rows).entered();
        let encode = |leaves: &[FieldElement]| -> Vec<String> {
            leaves.iter().map(field_to_decimal).collect()
        };
        Self {
            leaves_original: encode(prepared.original.padded_leaves()),
            leaves_sorted: encode(prepared.sorted.padded_leaves()),
            expected_root_original: field_to_decimal(&prepared.root_original()),
            expected_root_sorted: field_to_decimal(&prepared.root_sorted()),
        }
    }

    /// Decode into per-signal field values for the in-process lowering.
    pub fn to_signal_values(&self) -> Result<SignalValues<FieldElement>> {
        let decode = |values: &[String]| -> Result<Vec<FieldElement>> {
            values.iter().map(|v| field_from_decimal(v)).collect()
        };

        if self.leaves_original.len() != self.leaves_sorted.len() {
            return Err(UniqueRowsError::InvalidInput(format!(
                "Leaf arrays differ in length: {} original, {} sorted",
                self.leaves_original.len(),
                self.leaves_sorted.len()
            )));
        }

        let mut values = SignalValues::new();
        values.insert("leaves_original".to_string(), decode(&self.leaves_original)?);
        values.insert("leaves_sorted".to_string(), decode(&self.leaves_sorted)?);
        values.insert(
            "expectedRoot_original".to_string(),
            vec![field_from_decimal(&self.expected_root_original)?],
        );
        values.insert(
            "expectedRoot_sorted".to_string(),
            vec![field_from_decimal(&self.expected_root_sorted)?],
        );
        Ok(values)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?).map_err(|e| {
            UniqueRowsError::IO(format!("Failed to write {}: {}", path.display(), e))
        })?;
        debug!("Wrote witness input to {}", path.display());
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            UniqueRowsError::IO(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::prepare_dataset;
    use crate::dataset::Dataset;
    use crate::poseidon::PoseidonContext;

    #[test]
    fn test_json_field_names() {
        let ctx = PoseidonContext::new().unwrap();
        let prepared = prepare_dataset(&ctx, &Dataset::sample(3)).unwrap();
        let input = WitnessInput::from_prepared(&prepared);

        let json: serde_json::Value = serde_json::from_str(&input.to_json().unwrap()).unwrap();
        assert_eq!(json["leaves_original"].as_array().unwrap().len(), 4);
        assert_eq!(json["leaves_sorted"][3], "0", "padding is zero at the tail");
        assert!(json["expectedRoot_original"].is_string());
        assert!(json["expectedRoot_sorted"].is_string());
    }

    #[test]
    fn test_file_roundtrip_and_decode() {
        let ctx = PoseidonContext::new().unwrap();
        let prepared = prepare_dataset(&ctx, &Dataset::sample(5)).unwrap();
        let input = WitnessInput::from_prepared(&prepared);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script").join("input.json");
        input.write_to(&path).unwrap();
        let read_back = WitnessInput::read_from(&path).unwrap();
        assert_eq!(read_back, input);

        let values = read_back.to_signal_values().unwrap();
        assert_eq!(values["leaves_sorted"], prepared.sorted.padded_leaves());
        assert_eq!(values["expectedRoot_original"], vec![prepared.root_original()]);
    }
}
