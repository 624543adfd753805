use std::path::PathBuf;

use affinity_combine::combine::combine_sources;
use affinity_combine::io::{csv_read, csv_write};
use affinity_combine::model::{
    CandidateColumns, CombineConfig, DEFAULT_ACCEPTANCE_THRESHOLD, DEFAULT_TOLERANCE_FRACTION,
    ReferenceColumns,
};
use affinity_combine::{CombineError, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| CombineError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Combine(args) => execute_combine(args),
    }
}

fn execute_combine(args: CombineArgs) -> Result<()> {
    if !args.reference.exists() {
        return Err(CombineError::MissingInput(args.reference));
    }
    for dir in &args.candidates {
        if !dir.exists() {
            return Err(CombineError::MissingInput(dir.clone()));
        }
    }

    let reference_columns = args.reference_columns();
    let candidate_columns = args.candidate_columns();

    let reference = csv_read::read_reference(&args.reference, &reference_columns)?;
    let mut sources = Vec::new();
    for dir in &args.candidates {
        sources.extend(csv_read::read_candidate_dir(dir, &candidate_columns)?);
    }

    let mut config = CombineConfig::new(args.species);
    config.tolerance_fraction = args.tolerance;
    config.acceptance_threshold = args.threshold;

    let outcome = combine_sources(&reference, &sources, &config);
    csv_write::write_combined(&args.output, &outcome.combined)?;

    if let Some(report_path) = &args.report {
        let json = serde_json::to_string_pretty(&outcome.report)?;
        std::fs::write(report_path, json)?;
    }

    println!("{}", outcome.report);
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile candidate measurement datasets against a trusted reference."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge novel rows from candidate datasets that agree with the reference.
    Combine(CombineArgs),
}

#[derive(clap::Args)]
struct CombineArgs {
    /// Trusted reference dataset (CSV; tab-separated for .tsv/.txt).
    #[arg(long)]
    reference: PathBuf,

    /// Directories whose CSV/TSV files are candidate datasets, one per file.
    #[arg(long, required = true, num_args = 1..)]
    candidates: Vec<PathBuf>,

    /// Output path for the combined dataset.
    #[arg(long)]
    output: PathBuf,

    /// Species recorded on admitted rows, which carry none of their own.
    #[arg(long)]
    species: String,

    /// Relative tolerance for two measurements to count as agreeing.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE_FRACTION)]
    tolerance: f64,

    /// Agreement fraction a source must strictly exceed to be accepted.
    #[arg(long, default_value_t = DEFAULT_ACCEPTANCE_THRESHOLD)]
    threshold: f64,

    /// Optional path for a JSON diagnostics report.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Species column in the reference file.
    #[arg(long, default_value = "species")]
    reference_species_column: String,

    /// Allele column in the reference file.
    #[arg(long, default_value = "mhc")]
    reference_allele_column: String,

    /// Peptide column in the reference file.
    #[arg(long, default_value = "sequence")]
    reference_peptide_column: String,

    /// Peptide-length column in the reference file.
    #[arg(long, default_value = "peptide_length")]
    reference_length_column: String,

    /// Measurement column in the reference file.
    #[arg(long, default_value = "meas")]
    reference_measurement_column: String,

    /// Allele column in the candidate files.
    #[arg(long, default_value = "mhc")]
    candidate_allele_column: String,

    /// Peptide column in the candidate files.
    #[arg(long, default_value = "peptide")]
    candidate_peptide_column: String,

    /// Measurement column in the candidate files.
    #[arg(long, default_value = "value")]
    candidate_measurement_column: String,
}

impl CombineArgs {
    fn reference_columns(&self) -> ReferenceColumns {
        ReferenceColumns {
            species: self.reference_species_column.clone(),
            allele: self.reference_allele_column.clone(),
            peptide: self.reference_peptide_column.clone(),
            peptide_length: self.reference_length_column.clone(),
            measurement: self.reference_measurement_column.clone(),
        }
    }

    fn candidate_columns(&self) -> CandidateColumns {
        CandidateColumns {
            allele: self.candidate_allele_column.clone(),
            peptide: self.candidate_peptide_column.clone(),
            measurement: self.candidate_measurement_column.clone(),
        }
    }
}
