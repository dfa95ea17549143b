//! unique-rows command-line interface
//!
//! Proves that a delimited dataset contains no duplicate rows, or fewer duplicates than a
//! percentage threshold, and exposes the individual building blocks:
//! - `prove`: full pipeline (or an in-process dry run) for a dataset file
//! - `emit`: write the circuit files for a row count
//! - `generate`: write a sample dataset, optionally with duplicate rows
//! - `select-ptau`: pick a powers-of-tau file for a constraint count
//!
//! Run with: cargo run --release -- prove --data data.csv --threshold 9

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use unique_rows::{
    api::{ProofPipeline, ToolAdapters},
    circuit,
    config::{self, PipelineConfig, RootBinding},
    tools::{CircomCompiler, NodeWitnessGenerator, SnarkjsGroth16},
    utils::field_to_decimal,
    Dataset, PoseidonContext, ProofReport, PtauCatalog, Result,
};

/// Command-line arguments for the uniqueness prover
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase output verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prove that a dataset has no duplicate rows (or fewer than a threshold)
    Prove {
        /// Delimited dataset file; the first line is the header
        #[arg(long)]
        data: PathBuf,

        /// Duplicate threshold percentage; `--threshold` alone uses 9
        #[arg(long, num_args = 0..=1, default_missing_value = "9")]
        threshold: Option<u32>,

        /// JSON run configuration; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Evaluate the circuit in process instead of running circom and snarkjs
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Comparator width for the threshold check
        #[arg(long)]
        comparator_bits: Option<usize>,

        /// Expose the expected roots without asserting them in the circuit
        #[arg(long, default_value_t = false)]
        expose_roots: bool,
    },

    /// Write the circuit files for a given row count
    Emit {
        #[arg(long)]
        rows: usize,

        #[arg(long)]
        threshold: Option<u32>,

        #[arg(long)]
        out: PathBuf,
    },

    /// Write a sample dataset
    Generate {
        #[arg(long)]
        rows: usize,

        #[arg(long)]
        out: PathBuf,

        /// Number of rows that repeat an earlier row
        #[arg(long, default_value_t = 0)]
        duplicates: usize,

        #[arg(long, default_value_t = config::TEST_RANDOM_SEED)]
        seed: u64,
    },

    /// Select the smallest powers-of-tau file covering a constraint count
    SelectPtau {
        #[arg(long)]
        dir: PathBuf,

        #[arg(long)]
        constraints: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Prove {
            data,
            threshold,
            config,
            dry_run,
            comparator_bits,
            expose_roots,
        } => {
            let mut pipeline_config = match config {
                Some(path) => PipelineConfig::from_file(&path)?,
                None => PipelineConfig::default(),
            };
            if threshold.is_some() {
                pipeline_config.threshold_percent = threshold;
            }
            if comparator_bits.is_some() {
                pipeline_config.comparator_bits = comparator_bits;
            }
            if expose_roots {
                pipeline_config.root_binding = RootBinding::Exposed;
            }
            prove(&data, &pipeline_config, dry_run)
        }
        Command::Emit {
            rows,
            threshold,
            out,
        } => {
            let _span = info_span!("emit", rows).entered();
            let sources = circuit::emit(rows, threshold)?;
            for path in sources.write_to(&out)? {
                info!("Wrote {}", path.display());
            }
            Ok(())
        }
        Command::Generate {
            rows,
            out,
            duplicates,
            seed,
        } => {
            let dataset = if duplicates == 0 {
                Dataset::sample(rows)
            } else {
                Dataset::sample_with_duplicates(rows, duplicates, seed)?
            };
            dataset.write_delimited(&out, config::DEFAULT_DELIMITER)?;
            info!(
                "Generated dataset with {} rows ({} duplicates) at {}",
                rows,
                duplicates,
                out.display()
            );
            Ok(())
        }
        Command::SelectPtau { dir, constraints } => {
            let catalog = PtauCatalog::scan(&dir)?;
            let entry = catalog.select(constraints)?;
            println!("{}", entry.path.display());
            Ok(())
        }
    }
}

fn prove(data: &Path, pipeline_config: &PipelineConfig, dry_run: bool) -> Result<()> {
    let ctx = PoseidonContext::new()?;

    let report = if dry_run {
        ProofPipeline::dry_run(pipeline_config, &ctx).run(data)?
    } else {
        let compiler = CircomCompiler {
            tools: pipeline_config.tools.clone(),
            library_dir: pipeline_config.circomlib_dir.clone(),
        };
        let witness = NodeWitnessGenerator {
            tools: pipeline_config.tools.clone(),
        };
        let groth16 = SnarkjsGroth16 {
            tools: pipeline_config.tools.clone(),
        };
        let adapters = ToolAdapters {
            compiler: &compiler,
            witness: &witness,
            prover: &groth16,
            verifier: &groth16,
        };
        ProofPipeline::new(pipeline_config, &ctx, adapters).run(data)?
    };

    display_report(&report);
    Ok(())
}

fn display_report(report: &ProofReport) {
    info!("");
    info!("  Proof Summary:");
    info!(
        "    • Rows: {} ({} leaves, depth {})",
        report.spec.shape.num_rows, report.spec.shape.num_leaves, report.spec.shape.depth
    );
    info!("    • Constraints: {}", report.num_constraints);
    if let Some(ptau) = &report.ptau {
        info!("    • Parameters: {}", ptau.display());
    }
    info!(
        "    • Root (original): {}",
        field_to_decimal(&report.outputs.root_original)
    );
    info!(
        "    • Root (sorted): {}",
        field_to_decimal(&report.outputs.root_sorted)
    );
    info!("    • Unique: {}", report.outputs.is_unique);
    if let (Some(threshold), Some(below)) =
        (report.spec.threshold, report.outputs.is_below_threshold)
    {
        info!(
            "    • Below {}% threshold ({} rows): {}",
            threshold.percent,
            report.spec.threshold_value().unwrap_or_default(),
            below
        );
    }
    info!("    • Verified: {}", report.verified);
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info,unique_rows=info,nova_snark=warn",
        1 => "debug,unique_rows=debug,nova_snark=info",
        _ => "unique_rows=trace,nova_snark=debug",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    use tracing_tree::HierarchicalLayer;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            HierarchicalLayer::new(2)
                .with_targets(false)
                .with_bracketed_fields(true),
        )
        .init();
}
