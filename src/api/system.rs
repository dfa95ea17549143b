//! ProofPipeline: sequential, fail-fast orchestration of a uniqueness proof.
//!
//! Stages run in a fixed order and the first failure aborts the run. External tools are
//! reached only through the adapter traits in [`crate::tools`]; a pipeline built with
//! [`ProofPipeline::dry_run`] has no adapters and evaluates the lowered circuit in
//! process instead.

use std::path::Path;
use tracing::{info, info_span, warn};

use super::types::{FieldElement, ProofReport, PublicOutputs};
use super::verify::{check_roots, outputs_from_evaluation, parse_public_signals};
use super::witness::WitnessInput;
use crate::circuit::{self, CircuitSpec};
use crate::config::{PipelineConfig, MAIN_CIRCUIT_FILE, WITNESS_INPUT_FILE};
use crate::dataset::Dataset;
use crate::error::Stage;
use crate::params::PtauCatalog;
use crate::poseidon::PoseidonContext;
use crate::tools::{Compiler, Prover, Verifier, WitnessGenerator};
use crate::{Result, UniqueRowsError};

const TOTAL_STAGES: usize = 9;

/// The external collaborators of a full run.
#[derive(Clone, Copy)]
pub struct ToolAdapters<'a> {
    pub compiler: &'a dyn Compiler,
    pub witness: &'a dyn WitnessGenerator,
    pub prover: &'a dyn Prover,
    pub verifier: &'a dyn Verifier,
}

pub struct ProofPipeline<'a> {
    config: &'a PipelineConfig,
    ctx: &'a PoseidonContext<FieldElement>,
    tools: Option<ToolAdapters<'a>>,
}

fn stage_banner(number: usize, stage: Stage) {
    info!("Proof stage {}/{}: {}", number, TOTAL_STAGES, stage);
}

impl<'a> ProofPipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        ctx: &'a PoseidonContext<FieldElement>,
        tools: ToolAdapters<'a>,
    ) -> Self {
        Self {
            config,
            ctx,
            tools: Some(tools),
        }
    }

    /// A pipeline that never leaves the process.
    pub fn dry_run(config: &'a PipelineConfig, ctx: &'a PoseidonContext<FieldElement>) -> Self {
        Self {
            config,
            ctx,
            tools: None,
        }
    }

    /// Circuit parameters for `num_rows` rows under this pipeline's configuration.
    pub fn circuit_spec(&self, num_rows: usize) -> Result<CircuitSpec> {
        let mut spec = CircuitSpec::new(num_rows, self.config.threshold_percent)?
            .with_root_binding(self.config.root_binding);
        if let Some(bits) = self.config.comparator_bits {
            spec = spec.with_comparator_bits(bits)?;
        }
        Ok(spec)
    }

    /// Read a delimited dataset from `data` and prove it.
    pub fn run(&self, data: &Path) -> Result<ProofReport> {
        let dataset = Dataset::read_delimited(data, self.config.delimiter)?;
        self.run_dataset(&dataset)
    }

    pub fn run_dataset(&self, dataset: &Dataset) -> Result<ProofReport> {
        let _span = info_span!("proof_pipeline", rows = dataset.num_rows()).entered();

        // 1. Commit rows and build both trees
        stage_banner(1, Stage::Setup);
        let spec = self.circuit_spec(dataset.num_rows())?;
        let prepared = super::prepare_dataset(self.ctx, dataset)?;
        let input = WitnessInput::from_prepared(&prepared);
        let input_path = self.config.script_dir().join(WITNESS_INPUT_FILE);
        input.write_to(&input_path)?;

        // 2. Emit the circuit for this row count
        stage_banner(2, Stage::Synthesis);
        let sources = {
            let _span = info_span!("synthesis").entered();
            circuit::emit_spec(&spec)?
        };
        sources.write_to(&self.config.script_dir())?;

        let Some(tools) = self.tools else {
            return self.evaluate_in_process(&spec, &input, &prepared);
        };

        stage_banner(3, Stage::Compile);
        let compiled = {
            let _span = info_span!("compile").entered();
            tools.compiler.compile(
                &self.config.script_dir().join(MAIN_CIRCUIT_FILE),
                &self.config.circom_dir(),
            )?
        };

        stage_banner(4, Stage::Witness);
        let witness = {
            let _span = info_span!("witness").entered();
            tools.witness.generate(
                &compiled,
                &input_path,
                &self.config.snarkjs_dir().join("witness.wtns"),
            )?
        };

        stage_banner(5, Stage::ConstraintCount);
        let (num_constraints, ptau) = {
            let _span = info_span!("select_parameters").entered();
            let num_constraints = tools.compiler.constraint_count(&compiled)?;
            info!("Circuit has {} constraints", num_constraints);
            let catalog = PtauCatalog::scan(&self.config.ptau_dir)?;
            let entry = catalog.select(num_constraints)?;
            (num_constraints, entry.path.clone())
        };

        stage_banner(6, Stage::TrustedSetup);
        let keys = {
            let _span = info_span!("trusted_setup").entered();
            tools
                .prover
                .setup(&compiled, &ptau, &self.config.snarkjs_dir())?
        };

        stage_banner(7, Stage::Prove);
        let proof = {
            let _span = info_span!("prove").entered();
            tools
                .prover
                .prove(&keys, &witness, &self.config.snarkjs_dir())?
        };

        stage_banner(8, Stage::Verify);
        {
            let _span = info_span!("verify").entered();
            if !tools.verifier.verify(&keys, &proof)? {
                return Err(UniqueRowsError::ProofVerificationFailure);
            }
            info!("Proof verified");
        }

        stage_banner(9, Stage::Summary);
        let outputs = parse_public_signals(&proof.public_signals, spec.threshold.is_some())?;
        check_roots(&outputs, &prepared)?;
        self.log_summary(&spec, &outputs);

        Ok(ProofReport {
            spec,
            outputs,
            num_constraints,
            ptau: Some(ptau),
            verified: true,
        })
    }

    fn evaluate_in_process(
        &self,
        spec: &CircuitSpec,
        input: &WitnessInput,
        prepared: &super::types::PreparedDataset,
    ) -> Result<ProofReport> {
        let _span = info_span!("dry_run").entered();
        info!("Dry run: evaluating the lowered circuit in process");

        let program = circuit::synthesize(spec);
        let evaluation = circuit::evaluate(&program, self.ctx, &input.to_signal_values()?)?;
        if !evaluation.satisfied {
            return Err(UniqueRowsError::ProofVerificationFailure);
        }

        let outputs = outputs_from_evaluation(&evaluation)?;
        check_roots(&outputs, prepared)?;
        self.log_summary(spec, &outputs);

        Ok(ProofReport {
            spec: *spec,
            outputs,
            num_constraints: evaluation.num_constraints as u64,
            ptau: None,
            verified: evaluation.satisfied,
        })
    }

    fn log_summary(&self, spec: &CircuitSpec, outputs: &PublicOutputs) {
        if outputs.is_unique {
            info!("Uniqueness passed: no duplicate rows found");
        } else {
            warn!("Uniqueness failed: at least one duplicate row found");
        }
        if let (Some(threshold), Some(below)) = (spec.threshold, outputs.is_below_threshold) {
            if below {
                info!(
                    "Duplicate rows are below the {}% threshold",
                    threshold.percent
                );
            } else {
                warn!(
                    "Duplicate rows reach the {}% threshold",
                    threshold.percent
                );
            }
        }
    }
}
