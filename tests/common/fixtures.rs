//! Test fixtures: small datasets, a scratch workspace and circuit evaluations.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;
use unique_rows::{
    api::WitnessInput,
    circuit::{self, Evaluation},
    config::PipelineConfig,
    prepare_dataset,
    utils::field_to_decimal,
    CircuitSpec, Dataset, FieldElement, PoseidonContext, Row,
};

/// Single-column dataset whose rows are the given values.
pub fn dataset_from(values: &[&str]) -> Dataset {
    Dataset {
        header: vec!["Value".to_string()],
        rows: values
            .iter()
            .map(|v| Row::new(vec![v.to_string()]))
            .collect(),
    }
}

/// Evaluate the lowered circuit for `spec` on the honest witness of `dataset`.
pub fn evaluate_dataset(
    ctx: &PoseidonContext<FieldElement>,
    dataset: &Dataset,
    spec: &CircuitSpec,
) -> Evaluation<FieldElement> {
    let prepared = prepare_dataset(ctx, dataset).expect("dataset should prepare");
    let inputs = WitnessInput::from_prepared(&prepared)
        .to_signal_values()
        .expect("witness input should decode");
    circuit::evaluate(&circuit::synthesize(spec), ctx, &inputs).expect("lowering should succeed")
}

/// The `public.json` contents a correct prover would produce for `dataset`.
pub fn honest_public_signals(
    ctx: &PoseidonContext<FieldElement>,
    dataset: &Dataset,
    spec: &CircuitSpec,
) -> Vec<String> {
    evaluate_dataset(ctx, dataset, spec)
        .public_signals()
        .iter()
        .map(field_to_decimal)
        .collect()
}

/// A temporary directory laid out like a project checkout: generated output, a ptau
/// catalog and a dataset file.
pub struct TestWorkspace {
    pub dir: TempDir,
    pub config: PipelineConfig,
}

impl TestWorkspace {
    /// Workspace whose ptau catalog holds one empty file per exponent.
    pub fn new(ptau_exponents: &[u32]) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let ptau_dir = dir.path().join("ptau");
        std::fs::create_dir_all(&ptau_dir).expect("ptau dir");
        for (i, exp) in ptau_exponents.iter().enumerate() {
            let name = format!("powersOfTau28_hez_final_{:02}.ptau", exp);
            std::fs::write(ptau_dir.join(name), format!("stub {}", i)).expect("ptau file");
        }

        let config = PipelineConfig {
            generated_dir: dir.path().join("generated"),
            ptau_dir,
            ..PipelineConfig::default()
        };
        Self { dir, config }
    }

    pub fn write_dataset(&self, dataset: &Dataset) -> PathBuf {
        let path = self.dir.path().join("data.csv");
        dataset
            .write_delimited(&path, self.config.delimiter)
            .expect("dataset should write");
        path
    }
}
