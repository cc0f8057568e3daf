mod cli;

use anyhow::Result;
use clap::Parser;
use std::env;
use std::fs::OpenOptions;

use hivdb_etl::commands::{self, CommandEnv};
use hivdb_etl::config::Settings;
use hivdb_etl::log;
use hivdb_etl::logging::RunLogger;
use hivdb_etl::metrics::Metrics;
use hivdb_etl::report::{RunReport, RunStatus};
use hivdb_etl::runs::{cleanup_old_runs, RunContext};

use crate::cli::{Args, Command};

fn main() -> Result<()> {
    let args = Args::parse();

    // Load settings from YAML, with CLI overrides
    let settings = Settings::load_from_yaml(args.config.as_deref())?;
    let mut settings = settings.merge_with_cli(args.runs_dir, args.log_level, args.no_progress);

    // Resolve paths relative to current working directory (project root)
    let root = env::current_dir()?;
    settings.resolve_paths(&root);

    settings.validate()?;
    let level = settings.log_level()?;

    let command = &args.command;

    // Create run context (timestamped directory, optionally overridden)
    let run_context = if settings.runs.enabled {
        Some(RunContext::new_with_run_id(
            &settings.runs.runs_dir,
            command.name(),
            args.run_id,
        )?)
    } else {
        None
    };

    // Set up tee logging to both file and stderr
    let mut logger = match &run_context {
        Some(ctx) => {
            let log_file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(ctx.log_path())?;
            RunLogger::new(Some(log_file), level)
        }
        None => RunLogger::stderr_only(level),
    };

    if let Some(ctx) = &run_context {
        log!(logger, Info, "Run ID: {}", ctx.run_id);
        log!(logger, Info, "Run directory: {}", ctx.run_dir.display());
        settings.save_snapshot(&ctx.config_snapshot_path())?;
        log!(
            logger,
            Debug,
            "Config snapshot saved to {}",
            ctx.config_snapshot_path().display()
        );
    }
    log!(logger, Info, "Command: {}", command.name());
    for input in command.inputs() {
        log!(logger, Info, "  Input: {}", input.display());
    }
    log!(logger, Info, "  Output: {}", command.output().display());

    let metrics = Metrics::new();
    let result = {
        let mut cmd_env = CommandEnv {
            settings: &settings,
            metrics: &metrics,
            logger: &mut logger,
        };
        dispatch(command, &mut cmd_env)
    };

    if let Err(e) = &result {
        log!(logger, Error, "{:#}", e);
    }

    if let Some(ctx) = &run_context {
        // Generate report (even on error)
        let status = match &result {
            Ok(()) => RunStatus::Success,
            Err(e) => RunStatus::Error {
                message: format!("{:#}", e),
            },
        };
        let report = RunReport::generate(ctx, &metrics, &command.inputs(), command.output(), status);
        if let Err(e) = report.save_yaml(&ctx.report_path()) {
            log!(logger, Error, "Failed to save report: {}", e);
        } else {
            log!(logger, Info, "Report saved to {}", ctx.report_path().display());
        }
    }

    print_summary(&metrics, &mut logger);

    if settings.runs.enabled {
        match cleanup_old_runs(&settings.runs.runs_dir, settings.runs.keep_runs) {
            Ok(failures) => {
                for (dir, reason) in failures {
                    log!(logger, Warn, "Failed to remove old run {}: {}", dir.display(), reason);
                }
            }
            Err(e) => log!(logger, Warn, "Failed to cleanup old runs: {}", e),
        }
    }

    result
}

fn dispatch(command: &Command, env: &mut CommandEnv<'_>) -> Result<()> {
    match command {
        Command::GenerateIvselIsolates {
            worksheet_dir,
            output_csv,
            baseline_csv,
            consensus_csv,
        } => commands::ivsel_isolates::run(
            worksheet_dir,
            output_csv,
            baseline_csv,
            consensus_csv,
            env,
        ),
        Command::GenerateInvitroSelection {
            input_worksheet,
            output_csv,
        } => commands::invitro_selection::run(input_worksheet, output_csv, env),
        Command::GenerateIvselDrugs {
            input_worksheet,
            output_csv,
        } => commands::ivsel_drugs::run(input_worksheet, output_csv, env),
        Command::GenerateDrugs {
            input_dir,
            output_csv,
        } => commands::drugs::run(input_dir, output_csv, env),
        Command::GenerateIsolates {
            input_worksheet,
            output_csv,
        } => commands::isolates::run(input_worksheet, output_csv, env),
        Command::GenerateMutations {
            input_worksheet,
            output_csv,
        } => commands::mutations::run(input_worksheet, output_csv, env),
        Command::GenerateRefAminoAcid {
            consensus_csv,
            output_csv,
        } => commands::ref_amino_acid::run(consensus_csv, output_csv, env),
    }
}

fn print_summary(metrics: &Metrics, logger: &mut RunLogger) {
    logger.writeln("");
    logger.writeln("=== ETL Summary ===");
    logger.writeln(&format!("Files read:      {}", metrics.files_read()));
    logger.writeln(&format!("Rows read:       {}", metrics.rows_read()));
    logger.writeln(&format!("Rows written:    {}", metrics.rows_written()));
    logger.writeln(&format!("Mutations:       {}", metrics.mutations()));
    logger.writeln(&format!("Isolates:        {}", metrics.isolates()));
    logger.writeln(&format!("Time elapsed:    {:.2}s", metrics.elapsed_secs()));
}
