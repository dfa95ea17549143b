//! Common test utilities and shared infrastructure.
//!
//! - `fixtures`: datasets, a temporary workspace and honest circuit evaluations
//! - `mocks`: in-memory stand-ins for the external circuit toolchain

pub mod fixtures;
pub mod mocks;

#[allow(unused_imports)] // Not every test file uses every helper
pub use fixtures::{dataset_from, evaluate_dataset, honest_public_signals, TestWorkspace};
