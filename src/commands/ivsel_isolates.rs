use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::commands::{file_label, find_files, CommandEnv};
use crate::error::Result as EtlResult;
use crate::isolates::{
    ivsel_to_isolates, load_baseline, load_consensus, IsolateTable, ResolverContext,
    ISOLATE_HEADERS,
};
use crate::log;
use crate::logging::Level;
use crate::mutations::norm_strain;
use crate::table::{dump_csv, load_csv};

/// Worksheets in `dir` whose names end with `suffix`, sorted by path so the
/// merge order does not depend on directory enumeration.
pub fn find_worksheets(dir: &Path, suffix: &str) -> EtlResult<Vec<PathBuf>> {
    find_files(dir, suffix, glob::MatchOptions::new())
}

pub fn run(
    worksheet_dir: &Path,
    output_csv: &Path,
    baseline_csv: &Path,
    consensus_csv: &Path,
    env: &mut CommandEnv<'_>,
) -> Result<()> {
    log!(env.logger, Info, "Writing {}", output_csv.display());

    let baseline_rows = load_csv(baseline_csv)
        .with_context(|| format!("Failed to read baseline CSV {}", baseline_csv.display()))?;
    let (refseq_mutmaps, renames) = load_baseline(&baseline_rows)
        .with_context(|| format!("Invalid baseline CSV {}", baseline_csv.display()))?;
    log!(
        env.logger,
        Info,
        "Loaded {} reference sequences and {} renames",
        refseq_mutmaps.len(),
        renames.len()
    );

    let consensus_rows = load_csv(consensus_csv)
        .with_context(|| format!("Failed to read consensus CSV {}", consensus_csv.display()))?;
    let refmap = load_consensus(&consensus_rows)
        .with_context(|| format!("Invalid consensus CSV {}", consensus_csv.display()))?;
    log!(env.logger, Debug, "Consensus covers {} sites", refmap.len());
    env.metrics.add_files(2);
    env.metrics
        .add_rows_read((baseline_rows.len() + consensus_rows.len()) as u64);

    let files = find_worksheets(worksheet_dir, &env.settings.worksheets.ivsel_suffix)?;
    if files.is_empty() {
        log!(
            env.logger,
            Warn,
            "No *{} worksheets found in {}",
            env.settings.worksheets.ivsel_suffix,
            worksheet_dir.display()
        );
    }

    let ctx = ResolverContext {
        refseq_mutmaps: &refseq_mutmaps,
        renames: &renames,
        refmap: &refmap,
    };
    let mut isolates = IsolateTable::new();
    let pb = env.progress_bar(files.len())?;
    for path in &files {
        let label = file_label(path);
        pb.set_message(label.clone());
        let rows = load_csv(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let processed = ivsel_to_isolates(&mut isolates, &label, &rows, &ctx)?;
        env.metrics.inc_files();
        env.metrics.add_rows_read(processed as u64);
        log!(env.logger, Debug, "{}: {} rows", label, processed);
        pb.inc(1);
    }
    pb.finish_and_clear();

    if env.logger.enabled(Level::Debug) {
        for record in isolates.iter().filter(|r| r.metadata.is_none()) {
            log!(
                env.logger,
                Debug,
                "Baseline isolate {}",
                norm_strain(&record.name, &record.mutations)
            );
        }
    }

    let sites: usize = isolates.iter().map(|r| r.mutations.len()).sum();
    env.metrics.add_isolates(isolates.len() as u64);
    env.metrics.add_mutations(sites as u64);

    let written = dump_csv(output_csv, &isolates.to_rows(), &ISOLATE_HEADERS)
        .with_context(|| format!("Failed to write {}", output_csv.display()))?;
    env.metrics.add_rows_written(written as u64);
    log!(
        env.logger,
        Info,
        "{} isolates from {} worksheets",
        written,
        files.len()
    );
    Ok(())
}
