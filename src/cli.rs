use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "hivdb_etl")]
#[command(about = "Turns HIV drug-resistance curation worksheets into database tables")]
#[command(version)]
pub struct Args {
    /// Path to config YAML file (default: config.yaml in root)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Force the run directory name (default: timestamp and command)
    #[arg(long, global = true)]
    pub run_id: Option<String>,

    /// Parent directory for run directories
    /// Overrides config.yaml value if provided
    #[arg(long, global = true)]
    pub runs_dir: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    /// Overrides config.yaml value if provided
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Hide progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve in-vitro selection worksheets into per-isolate mutation lists
    GenerateIvselIsolates {
        /// Directory holding the *-ivsel.csv worksheets
        worksheet_dir: PathBuf,
        output_csv: PathBuf,
        /// Reference-sequence isolates with their mutations and aliases
        #[arg(long)]
        baseline_csv: PathBuf,
        /// Consensus sequences (Gene, AASeq) used to detect reversions
        #[arg(long)]
        consensus_csv: PathBuf,
    },
    /// One row per selection experiment with normalised passage, time and dose
    GenerateInvitroSelection {
        input_worksheet: PathBuf,
        output_csv: PathBuf,
    },
    /// Drugs used by each selection experiment
    GenerateIvselDrugs {
        input_worksheet: PathBuf,
        output_csv: PathBuf,
    },
    /// Merge regimen drugs of every worksheet into the drug table
    GenerateDrugs {
        input_dir: PathBuf,
        output_csv: PathBuf,
    },
    /// Isolate table from an isolate worksheet
    GenerateIsolates {
        input_worksheet: PathBuf,
        output_csv: PathBuf,
    },
    /// One row per mutation call of an isolate worksheet
    GenerateMutations {
        input_worksheet: PathBuf,
        output_csv: PathBuf,
    },
    /// Reference amino acid per consensus position
    GenerateRefAminoAcid {
        consensus_csv: PathBuf,
        output_csv: PathBuf,
    },
}

impl Command {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::GenerateIvselIsolates { .. } => "generate-ivsel-isolates",
            Command::GenerateInvitroSelection { .. } => "generate-invitro-selection",
            Command::GenerateIvselDrugs { .. } => "generate-ivsel-drugs",
            Command::GenerateDrugs { .. } => "generate-drugs",
            Command::GenerateIsolates { .. } => "generate-isolates",
            Command::GenerateMutations { .. } => "generate-mutations",
            Command::GenerateRefAminoAcid { .. } => "generate-ref-amino-acid",
        }
    }

    pub fn inputs(&self) -> Vec<&Path> {
        match self {
            Command::GenerateIvselIsolates {
                worksheet_dir,
                baseline_csv,
                consensus_csv,
                ..
            } => vec![worksheet_dir, baseline_csv, consensus_csv],
            Command::GenerateInvitroSelection { input_worksheet, .. }
            | Command::GenerateIvselDrugs { input_worksheet, .. }
            | Command::GenerateIsolates { input_worksheet, .. }
            | Command::GenerateMutations { input_worksheet, .. } => vec![input_worksheet],
            Command::GenerateDrugs { input_dir, .. } => vec![input_dir],
            Command::GenerateRefAminoAcid { consensus_csv, .. } => vec![consensus_csv],
        }
        .into_iter()
        .map(PathBuf::as_path)
        .collect()
    }

    pub fn output(&self) -> &Path {
        match self {
            Command::GenerateIvselIsolates { output_csv, .. }
            | Command::GenerateInvitroSelection { output_csv, .. }
            | Command::GenerateIvselDrugs { output_csv, .. }
            | Command::GenerateDrugs { output_csv, .. }
            | Command::GenerateIsolates { output_csv, .. }
            | Command::GenerateMutations { output_csv, .. }
            | Command::GenerateRefAminoAcid { output_csv, .. } => output_csv,
        }
    }
}
