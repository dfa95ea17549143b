//! In-memory toolchain: records every call and returns canned artifacts.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use unique_rows::{
    error::Stage,
    tools::{
        CompiledCircuit, Compiler, ProofArtifacts, Prover, ProvingKeys, Verifier,
        WitnessGenerator,
    },
    Result, UniqueRowsError,
};

/// One object standing in for circom, node and snarkjs.
pub struct MockToolchain {
    pub constraints: u64,
    pub public_signals: Vec<String>,
    pub accept_proof: bool,
    /// Stage at which to fail, if any
    pub fail_at: Option<Stage>,
    pub calls: RefCell<Vec<Stage>>,
    pub selected_ptau: RefCell<Option<PathBuf>>,
}

impl MockToolchain {
    pub fn new(constraints: u64, public_signals: Vec<String>) -> Self {
        Self {
            constraints,
            public_signals,
            accept_proof: true,
            fail_at: None,
            calls: RefCell::new(Vec::new()),
            selected_ptau: RefCell::new(None),
        }
    }

    pub fn calls(&self) -> Vec<Stage> {
        self.calls.borrow().clone()
    }

    fn record(&self, stage: Stage) -> Result<()> {
        self.calls.borrow_mut().push(stage);
        if self.fail_at == Some(stage) {
            return Err(UniqueRowsError::tool(stage, "mock failure"));
        }
        Ok(())
    }
}

impl Compiler for MockToolchain {
    fn compile(&self, main: &Path, out_dir: &Path) -> Result<CompiledCircuit> {
        self.record(Stage::Compile)?;
        assert!(main.is_file(), "main circuit should exist before compiling");
        Ok(CompiledCircuit::in_dir(out_dir, "circuit_main"))
    }

    fn constraint_count(&self, _compiled: &CompiledCircuit) -> Result<u64> {
        self.record(Stage::ConstraintCount)?;
        Ok(self.constraints)
    }
}

impl WitnessGenerator for MockToolchain {
    fn generate(&self, _compiled: &CompiledCircuit, input: &Path, out: &Path) -> Result<PathBuf> {
        self.record(Stage::Witness)?;
        assert!(input.is_file(), "input.json should exist before witness generation");
        Ok(out.to_path_buf())
    }
}

impl Prover for MockToolchain {
    fn setup(&self, _compiled: &CompiledCircuit, ptau: &Path, out_dir: &Path) -> Result<ProvingKeys> {
        self.record(Stage::TrustedSetup)?;
        *self.selected_ptau.borrow_mut() = Some(ptau.to_path_buf());
        Ok(ProvingKeys {
            zkey: out_dir.join("circuit_main.zkey"),
            verification_key: out_dir.join("verification_key.json"),
        })
    }

    fn prove(&self, _keys: &ProvingKeys, _witness: &Path, out_dir: &Path) -> Result<ProofArtifacts> {
        self.record(Stage::Prove)?;
        Ok(ProofArtifacts {
            proof: out_dir.join("proof.json"),
            public: out_dir.join("public.json"),
            public_signals: self.public_signals.clone(),
        })
    }
}

impl Verifier for MockToolchain {
    fn verify(&self, _keys: &ProvingKeys, _proof: &ProofArtifacts) -> Result<bool> {
        self.record(Stage::Verify)?;
        Ok(self.accept_proof)
    }
}
