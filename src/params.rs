//! Proving-parameter (powers-of-tau) selection.
//!
//! A catalog maps each available `.ptau` file to the number of constraints it can
//! support (`2^exponent`). Selection picks the smallest file that fits.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{Result, UniqueRowsError};

/// One proving-parameter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtauEntry {
    pub path: PathBuf,
    pub exponent: u32,
    /// `2^exponent`
    pub capacity: u64,
}

impl PtauEntry {
    pub fn new(path: impl Into<PathBuf>, exponent: u32) -> Result<Self> {
        let capacity = 1u64.checked_shl(exponent).ok_or_else(|| {
            UniqueRowsError::InvalidInput(format!("ptau exponent {} is too large", exponent))
        })?;
        Ok(Self {
            path: path.into(),
            exponent,
            capacity,
        })
    }
}

/// Parse `powersOfTau<N>_hez_final_<exp>.ptau` into its exponent.
pub fn parse_ptau_file_name(file_name: &str) -> Option<u32> {
    let rest = file_name.strip_prefix("powersOfTau")?;
    let rest = rest.strip_suffix(".ptau")?;
    let (ceremony, exponent) = rest.split_once("_hez_final_")?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(ceremony) || !all_digits(exponent) {
        return None;
    }
    exponent.parse().ok()
}

/// Available parameter files, sorted by capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PtauCatalog {
    entries: Vec<PtauEntry>,
}

impl PtauCatalog {
    pub fn from_entries(mut entries: Vec<PtauEntry>) -> Self {
        entries.sort_by(|a, b| a.capacity.cmp(&b.capacity).then_with(|| a.path.cmp(&b.path)));
        Self { entries }
    }

    /// Scan `dir` for ptau files. Files with other names are ignored.
    pub fn scan(dir: &Path) -> Result<Self> {
        let read_dir = std::fs::read_dir(dir).map_err(|e| {
            UniqueRowsError::IO(format!("Failed to read ptau directory {}: {}", dir.display(), e))
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let path = entry?.path();
            let Some(exponent) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_ptau_file_name)
            else {
                continue;
            };
            entries.push(PtauEntry::new(path, exponent)?);
        }
        debug!("Found {} ptau file(s) in {}", entries.len(), dir.display());
        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> &[PtauEntry] {
        &self.entries
    }

    pub fn max_capacity(&self) -> u64 {
        self.entries.last().map(|e| e.capacity).unwrap_or(0)
    }

    /// Smallest entry with `capacity >= required_constraints`.
    pub fn select(&self, required_constraints: u64) -> Result<&PtauEntry> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.capacity >= required_constraints)
            .ok_or(UniqueRowsError::CapacityExceeded {
                required: required_constraints,
                max_available: self.max_capacity(),
            })?;
        info!(
            "Selected ptau file {} (2^{} = {} >= {} constraints)",
            entry.path.display(),
            entry.exponent,
            entry.capacity,
            required_constraints
        );
        Ok(entry)
    }
}
