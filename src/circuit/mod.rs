//! Circuit synthesis for the uniqueness proof.
//!
//! This module is organized into smaller, focused sub-modules:
//!
//! - `ir`: structured circuit description (templates, signals, statements)
//! - `synth`: [`CircuitSpec`] to IR
//! - `render`: IR to circom source text
//! - `lower`: IR to R1CS constraints, evaluated in process
//! - `gadgets/`: R1CS gadgets backing the lowering (Poseidon, IsZero, LessThan)
//!
//! A [`CircuitSpec`] fully determines the generated circuit; [`emit`] is a pure function
//! of it.

pub mod gadgets;
pub mod ir;
pub mod lower;
pub mod render;
pub mod synth;

pub use ir::CircuitProgram;
pub use lower::{evaluate, Evaluation};
pub use synth::synthesize;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{self, bit_length, tree_shape, RootBinding, TreeShape};
use crate::{Result, UniqueRowsError};

/// Duplicate threshold parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThresholdSpec {
    /// Allowed duplicates as a percentage of the row count
    pub percent: u32,
    /// Width of the `LessThan` comparator
    pub comparator_bits: usize,
}

/// Everything the generated circuit depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CircuitSpec {
    pub shape: TreeShape,
    pub threshold: Option<ThresholdSpec>,
    pub root_binding: RootBinding,
}

impl CircuitSpec {
    /// Derive the spec for `num_rows` rows.
    ///
    /// The comparator width defaults to the bit length of `num_rows`, enough for both
    /// the duplicate count and the threshold.
    pub fn new(num_rows: usize, threshold_percent: Option<u32>) -> Result<Self> {
        let shape = tree_shape(num_rows)?;
        if num_rows < config::MIN_ROWS {
            return Err(UniqueRowsError::TooFewRows {
                rows: num_rows,
                min: config::MIN_ROWS,
            });
        }

        let threshold = threshold_percent
            .map(|percent| {
                if percent > 100 {
                    return Err(UniqueRowsError::InvalidInput(format!(
                        "Threshold percentage {} exceeds 100",
                        percent
                    )));
                }
                Ok(ThresholdSpec {
                    percent,
                    comparator_bits: bit_length(num_rows),
                })
            })
            .transpose()?;

        Ok(Self {
            shape,
            threshold,
            root_binding: RootBinding::default(),
        })
    }

    /// Override the comparator width.
    ///
    /// Must be wide enough for `num_rows` and no wider than circomlib's `LessThan` allows.
    /// Ignored by the binary checker.
    pub fn with_comparator_bits(mut self, bits: usize) -> Result<Self> {
        let min = bit_length(self.shape.num_rows);
        if bits < min || bits > config::MAX_COMPARATOR_BITS {
            return Err(UniqueRowsError::InvalidInput(format!(
                "Comparator width {} outside [{}, {}]",
                bits,
                min,
                config::MAX_COMPARATOR_BITS
            )));
        }
        if let Some(threshold) = self.threshold.as_mut() {
            threshold.comparator_bits = bits;
        }
        Ok(self)
    }

    pub fn with_root_binding(mut self, root_binding: RootBinding) -> Self {
        self.root_binding = root_binding;
        self
    }

    /// `floor(percent * num_rows / 100)`, the duplicate count the threshold variant
    /// must stay strictly below.
    pub fn threshold_value(&self) -> Option<u64> {
        self.threshold
            .map(|t| u64::from(t.percent) * self.shape.num_rows as u64 / 100)
    }
}

/// Rendered circuit files, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitSources {
    pub files: Vec<(String, String)>,
}

impl CircuitSources {
    /// Contents of the file named `file_name`.
    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(name, _)| name == file_name)
            .map(|(_, contents)| contents.as_str())
    }

    /// Write every file into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        self.files
            .iter()
            .map(|(name, contents)| {
                let path = dir.join(name);
                std::fs::write(&path, contents).map_err(|e| {
                    UniqueRowsError::IO(format!("Failed to write {}: {}", path.display(), e))
                })?;
                debug!("Wrote {}", path.display());
                Ok(path)
            })
            .collect()
    }
}

/// Emit the circuit for `spec`.
pub fn emit_spec(spec: &CircuitSpec) -> Result<CircuitSources> {
    let program = synthesize(spec);
    Ok(CircuitSources {
        files: render::render_program(&program)?,
    })
}

/// Emit the circuit for `num_rows` rows with the default comparator width and root
/// binding.
pub fn emit(num_rows: usize, threshold_percent: Option<u32>) -> Result<CircuitSources> {
    emit_spec(&CircuitSpec::new(num_rows, threshold_percent)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_validation() {
        assert!(matches!(
            CircuitSpec::new(1, None),
            Err(UniqueRowsError::TooFewRows { rows: 1, min: 2 })
        ));
        assert!(matches!(
            CircuitSpec::new(0, None),
            Err(UniqueRowsError::EmptyDataset)
        ));
        assert!(CircuitSpec::new(4, Some(101)).is_err());
        assert!(CircuitSpec::new(4, Some(100)).is_ok());
    }

    #[test]
    fn test_comparator_bits_bounds() {
        let spec = CircuitSpec::new(1000, Some(9)).unwrap();
        assert_eq!(spec.threshold.unwrap().comparator_bits, 10);

        assert!(spec.with_comparator_bits(9).is_err());
        assert!(spec.with_comparator_bits(253).is_err());
        let widened = spec.with_comparator_bits(32).unwrap();
        assert_eq!(widened.threshold.unwrap().comparator_bits, 32);
    }

    #[test]
    fn test_threshold_value_rounds_down() {
        assert_eq!(CircuitSpec::new(4, Some(25)).unwrap().threshold_value(), Some(1));
        assert_eq!(CircuitSpec::new(10, Some(9)).unwrap().threshold_value(), Some(0));
        assert_eq!(CircuitSpec::new(100, Some(9)).unwrap().threshold_value(), Some(9));
        assert_eq!(CircuitSpec::new(10, None).unwrap().threshold_value(), None);
    }

    #[test]
    fn test_emit_writes_three_files() {
        let sources = emit(3, None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let paths = sources.write_to(dir.path()).unwrap();
        assert_eq!(paths.len(), 3);
        for (name, contents) in &sources.files {
            let on_disk = std::fs::read_to_string(dir.path().join(name)).unwrap();
            assert_eq!(&on_disk, contents);
        }
    }
}
