//! Centralized configuration for the unique-rows system.
//!
//! This module contains constants and default parameters used throughout the
//! application, the shared tree-shape derivation used by both the Merkle builder and
//! the circuit synthesizer, and the serde-backed [`PipelineConfig`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Result, UniqueRowsError};

// --- Dataset and Circuit Parameters ---

/// Minimum number of rows for a uniqueness circuit (one adjacent pair).
pub const MIN_ROWS: usize = 2;

/// Largest comparator width accepted by circomlib's `LessThan`.
pub const MAX_COMPARATOR_BITS: usize = 252;

/// Circom language version written in every pragma.
pub const CIRCOM_VERSION: &str = "2.1.9";

/// Domain prefix mixed into every row commitment.
pub const ROW_DOMAIN_TAG: &[u8] = b"unique-rows/row/v1";

/// Default field delimiter for dataset files.
pub const DEFAULT_DELIMITER: char = ',';

/// Duplicate threshold used by the CLI's `--threshold` flag when given without a value.
pub const DEFAULT_THRESHOLD_PERCENT: u32 = 9;

/// A fixed random seed used for sample data and tests.
pub const TEST_RANDOM_SEED: u64 = 42;

// --- Generated File Names ---

pub const MAIN_CIRCUIT_FILE: &str = "circuit_main.circom";
pub const MERKLE_CIRCUIT_FILE: &str = "circuit_merkleroot.circom";
pub const UNIQUE_CIRCUIT_FILE: &str = "circuit_unique.circom";
pub const MAIN_CIRCUIT_STEM: &str = "circuit_main";
pub const WITNESS_INPUT_FILE: &str = "input.json";

/// Shape of a padded, complete binary Merkle tree for a given row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeShape {
    /// Number of real rows
    pub num_rows: usize,
    /// Leaves after padding: `2^ceil(log2(num_rows))`
    pub num_leaves: usize,
    /// `log2(num_leaves)`
    pub depth: usize,
}

/// Derive the padded tree shape for `num_rows` leaves.
///
/// This is the single place the padding rule lives; the Merkle builder and the
/// circuit synthesizer both go through it.
pub fn tree_shape(num_rows: usize) -> Result<TreeShape> {
    if num_rows == 0 {
        return Err(UniqueRowsError::EmptyDataset);
    }
    let num_leaves = num_rows.checked_next_power_of_two().ok_or_else(|| {
        UniqueRowsError::InvalidInput(format!("{} rows cannot be padded", num_rows))
    })?;
    Ok(TreeShape {
        num_rows,
        num_leaves,
        depth: num_leaves.trailing_zeros() as usize,
    })
}

/// Number of bits needed to represent `value`.
pub fn bit_length(value: usize) -> usize {
    (usize::BITS - value.leading_zeros()) as usize
}

/// How the expected roots are tied to the computed roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootBinding {
    /// The circuit asserts `root === expectedRoot`; a mismatch makes the witness unsatisfiable.
    #[default]
    Enforced,
    /// Roots are only exposed as outputs and compared by the caller afterwards.
    Exposed,
}

/// External tool locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_circom")]
    pub circom: PathBuf,
    #[serde(default = "default_snarkjs")]
    pub snarkjs: PathBuf,
    #[serde(default = "default_node")]
    pub node: PathBuf,
    /// Heap limit passed to node for `snarkjs r1cs info` on large circuits
    #[serde(default = "default_node_max_old_space_mb")]
    pub node_max_old_space_mb: u32,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            circom: default_circom(),
            snarkjs: default_snarkjs(),
            node: default_node(),
            node_max_old_space_mb: default_node_max_old_space_mb(),
        }
    }
}

/// Run configuration, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory for all generated artifacts
    #[serde(default = "default_generated_dir")]
    pub generated_dir: PathBuf,
    /// circomlib `circuits/` directory passed to the compiler with `-l`
    #[serde(default = "default_circomlib_dir")]
    pub circomlib_dir: PathBuf,
    /// Directory holding the powers-of-tau catalog
    #[serde(default = "default_ptau_dir")]
    pub ptau_dir: PathBuf,
    /// Duplicate threshold percentage; `None` emits the binary uniqueness checker
    #[serde(default)]
    pub threshold_percent: Option<u32>,
    /// Comparator width override; derived from the row count when unset
    #[serde(default)]
    pub comparator_bits: Option<usize>,
    #[serde(default)]
    pub root_binding: RootBinding,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generated_dir: default_generated_dir(),
            circomlib_dir: default_circomlib_dir(),
            ptau_dir: default_ptau_dir(),
            threshold_percent: None,
            comparator_bits: None,
            root_binding: RootBinding::default(),
            delimiter: DEFAULT_DELIMITER,
            tools: ToolsConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            UniqueRowsError::IO(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Directory receiving the generated circuit sources and `input.json`.
    pub fn script_dir(&self) -> PathBuf {
        self.generated_dir.join("script")
    }

    /// Directory receiving compiler output.
    pub fn circom_dir(&self) -> PathBuf {
        self.generated_dir.join("circom")
    }

    /// Directory receiving witness, keys and proof artifacts.
    pub fn snarkjs_dir(&self) -> PathBuf {
        self.generated_dir.join("snarkjs")
    }
}

fn default_generated_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_circomlib_dir() -> PathBuf {
    PathBuf::from("node_modules/circomlib/circuits")
}

fn default_ptau_dir() -> PathBuf {
    PathBuf::from("ptau")
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

fn default_circom() -> PathBuf {
    PathBuf::from("circom")
}

fn default_snarkjs() -> PathBuf {
    PathBuf::from("snarkjs")
}

fn default_node() -> PathBuf {
    PathBuf::from("node")
}

fn default_node_max_old_space_mb() -> u32 {
    12192
}
