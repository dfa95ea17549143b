//! Adapters for the external circuit toolchain.
//!
//! Each collaborator (compiler, witness generator, Groth16 prover, verifier) sits behind
//! a trait so the pipeline can be driven by mocks in tests. The process-backed
//! implementations run circom, node and snarkjs with fixed flag sets; any non-zero exit
//! status or diagnostic stderr output fails the stage.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, debug_span};

use crate::config::{ToolsConfig, MAIN_CIRCUIT_STEM};
use crate::error::Stage;
use crate::{Result, UniqueRowsError};

/// Compiler output locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCircuit {
    pub r1cs: PathBuf,
    pub wasm: PathBuf,
    pub witness_script: PathBuf,
}

impl CompiledCircuit {
    /// Paths circom writes for `<stem>.circom` compiled into `out_dir`.
    pub fn in_dir(out_dir: &Path, stem: &str) -> Self {
        let js_dir = out_dir.join(format!("{}_js", stem));
        Self {
            r1cs: out_dir.join(format!("{}.r1cs", stem)),
            wasm: js_dir.join(format!("{}.wasm", stem)),
            witness_script: js_dir.join("generate_witness.js"),
        }
    }
}

/// Groth16 proving and verification keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvingKeys {
    pub zkey: PathBuf,
    pub verification_key: PathBuf,
}

/// A proof together with its public signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofArtifacts {
    pub proof: PathBuf,
    pub public: PathBuf,
    /// Contents of `public.json`, decimal strings
    pub public_signals: Vec<String>,
}

pub trait Compiler {
    fn compile(&self, main: &Path, out_dir: &Path) -> Result<CompiledCircuit>;
    fn constraint_count(&self, compiled: &CompiledCircuit) -> Result<u64>;
}

pub trait WitnessGenerator {
    /// Compute the witness for `input` and write it to `out`.
    fn generate(&self, compiled: &CompiledCircuit, input: &Path, out: &Path) -> Result<PathBuf>;
}

pub trait Prover {
    fn setup(&self, compiled: &CompiledCircuit, ptau: &Path, out_dir: &Path) -> Result<ProvingKeys>;
    fn prove(&self, keys: &ProvingKeys, witness: &Path, out_dir: &Path) -> Result<ProofArtifacts>;
}

pub trait Verifier {
    /// `Ok(false)` when the proof is well-formed but rejected.
    fn verify(&self, keys: &ProvingKeys, proof: &ProofArtifacts) -> Result<bool>;
}

/// Run `command`, failing the stage on spawn failure, non-zero exit, or stderr output.
pub fn run_tool(stage: Stage, mut command: Command) -> Result<String> {
    let rendered = format!("{:?}", command);
    let _span = debug_span!("run_tool", stage = %stage).entered();
    debug!("Running {}", rendered);

    let output = command
        .output()
        .map_err(|e| UniqueRowsError::tool(stage, format!("failed to spawn {}: {}", rendered, e)))?;
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        return Err(UniqueRowsError::tool(
            stage,
            format!("{} exited with {}: {}", rendered, output.status, first_non_empty(&stderr, &stdout)),
        ));
    }
    if !stderr.is_empty() {
        return Err(UniqueRowsError::tool(stage, format!("stderr: {}", stderr)));
    }
    Ok(stdout)
}

fn first_non_empty<'s>(a: &'s str, b: &'s str) -> &'s str {
    if a.is_empty() {
        b
    } else {
        a
    }
}

/// Extract the count from snarkjs `r1cs info` output.
pub fn parse_constraint_count(info: &str) -> Option<u64> {
    const MARKER: &str = "# of Constraints:";
    let start = info.find(MARKER)? + MARKER.len();
    let digits: String = info[start..]
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Locate `program` on `PATH` unless it already names a path.
fn resolve_program(program: &Path) -> PathBuf {
    if program.components().count() > 1 {
        return program.to_path_buf();
    }
    std::env::var_os("PATH")
        .and_then(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join(program))
                .find(|candidate| candidate.is_file())
        })
        .unwrap_or_else(|| program.to_path_buf())
}

/// `circom` compiler adapter.
#[derive(Debug, Clone)]
pub struct CircomCompiler {
    pub tools: ToolsConfig,
    pub library_dir: PathBuf,
}

impl Compiler for CircomCompiler {
    fn compile(&self, main: &Path, out_dir: &Path) -> Result<CompiledCircuit> {
        std::fs::create_dir_all(out_dir)?;
        let mut command = Command::new(&self.tools.circom);
        command
            .arg(main)
            .args(["--r1cs", "--wasm", "--sym", "--O0", "--output"])
            .arg(out_dir)
            .arg("-l")
            .arg(&self.library_dir);
        run_tool(Stage::Compile, command)?;

        let stem = main
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or(MAIN_CIRCUIT_STEM);
        Ok(CompiledCircuit::in_dir(out_dir, stem))
    }

    fn constraint_count(&self, compiled: &CompiledCircuit) -> Result<u64> {
        // snarkjs runs out of heap on large circuits without an explicit limit
        let mut command = Command::new(&self.tools.node);
        command
            .arg(format!("--max-old-space-size={}", self.tools.node_max_old_space_mb))
            .arg(resolve_program(&self.tools.snarkjs))
            .args(["r1cs", "info"])
            .arg(&compiled.r1cs);
        let info = run_tool(Stage::ConstraintCount, command)?;
        parse_constraint_count(&info).ok_or_else(|| {
            UniqueRowsError::tool(
                Stage::ConstraintCount,
                format!("no constraint count in r1cs info output: {}", info),
            )
        })
    }
}

/// Witness generation through the compiler-emitted node script.
#[derive(Debug, Clone)]
pub struct NodeWitnessGenerator {
    pub tools: ToolsConfig,
}

impl WitnessGenerator for NodeWitnessGenerator {
    fn generate(&self, compiled: &CompiledCircuit, input: &Path, out: &Path) -> Result<PathBuf> {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut command = Command::new(&self.tools.node);
        command
            .arg(&compiled.witness_script)
            .arg(&compiled.wasm)
            .arg(input)
            .arg(out);
        run_tool(Stage::Witness, command)?;
        Ok(out.to_path_buf())
    }
}

/// `snarkjs` Groth16 setup, proving and verification.
#[derive(Debug, Clone)]
pub struct SnarkjsGroth16 {
    pub tools: ToolsConfig,
}

impl SnarkjsGroth16 {
    fn snarkjs(&self) -> Command {
        Command::new(&self.tools.snarkjs)
    }
}

impl Prover for SnarkjsGroth16 {
    fn setup(&self, compiled: &CompiledCircuit, ptau: &Path, out_dir: &Path) -> Result<ProvingKeys> {
        std::fs::create_dir_all(out_dir)?;
        let keys = ProvingKeys {
            zkey: out_dir.join(format!("{}.zkey", MAIN_CIRCUIT_STEM)),
            verification_key: out_dir.join("verification_key.json"),
        };

        let mut command = self.snarkjs();
        command
            .args(["groth16", "setup"])
            .arg(&compiled.r1cs)
            .arg(ptau)
            .arg(&keys.zkey);
        run_tool(Stage::TrustedSetup, command)?;

        let mut command = self.snarkjs();
        command
            .args(["zkey", "export", "verificationkey"])
            .arg(&keys.zkey)
            .arg(&keys.verification_key);
        run_tool(Stage::TrustedSetup, command)?;

        Ok(keys)
    }

    fn prove(&self, keys: &ProvingKeys, witness: &Path, out_dir: &Path) -> Result<ProofArtifacts> {
        std::fs::create_dir_all(out_dir)?;
        let proof = out_dir.join("proof.json");
        let public = out_dir.join("public.json");

        let mut command = self.snarkjs();
        command
            .args(["groth16", "prove"])
            .arg(&keys.zkey)
            .arg(witness)
            .arg(&proof)
            .arg(&public);
        run_tool(Stage::Prove, command)?;

        let contents = std::fs::read_to_string(&public).map_err(|e| {
            UniqueRowsError::tool(Stage::Prove, format!("cannot read {}: {}", public.display(), e))
        })?;
        let public_signals: Vec<String> = serde_json::from_str(&contents)?;

        Ok(ProofArtifacts {
            proof,
            public,
            public_signals,
        })
    }
}

impl Verifier for SnarkjsGroth16 {
    fn verify(&self, keys: &ProvingKeys, proof: &ProofArtifacts) -> Result<bool> {
        let mut command = self.snarkjs();
        command
            .args(["groth16", "verify"])
            .arg(&keys.verification_key)
            .arg(&proof.public)
            .arg(&proof.proof);

        match run_tool(Stage::Verify, command) {
            Ok(stdout) => Ok(stdout.contains("OK")),
            Err(UniqueRowsError::CompilationFailure { details, .. })
                if details.contains("Invalid proof") =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
