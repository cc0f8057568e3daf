//! One module per subcommand. Each exposes a pure row transform (tested
//! directly) and a `run` entry point that does the file I/O around it.

use anyhow::Result;
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::Result as EtlResult;
use crate::logging::RunLogger;
use crate::metrics::Metrics;
use crate::mutations::split_mutation_list;

pub mod drugs;
pub mod invitro_selection;
pub mod isolates;
pub mod ivsel_drugs;
pub mod ivsel_isolates;
pub mod mutations;
pub mod ref_amino_acid;

/// What every command gets from the binary: settings, counters and the run log.
pub struct CommandEnv<'a> {
    pub settings: &'a Settings,
    pub metrics: &'a Metrics,
    pub logger: &'a mut RunLogger,
}

impl CommandEnv<'_> {
    /// A bar over `len` files, or a hidden one when progress display is off.
    pub fn progress_bar(&self, len: usize) -> Result<ProgressBar> {
        if !self.settings.logging.progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(ProgressStyle::with_template(
            "[{bar:30}] {pos}/{len} {msg}",
        )?);
        Ok(pb)
    }
}

/// Splits a regimen such as `EFV + FTC+TDF` into drug names, dropping blanks.
pub fn split_regimen(regimen: &str) -> Vec<&str> {
    split_mutation_list(regimen)
        .into_iter()
        .filter(|drug| !drug.is_empty())
        .collect()
}

/// Regular files directly in `dir` whose names end with `suffix`, sorted by
/// path. Both are matched literally.
fn find_files(dir: &Path, suffix: &str, options: MatchOptions) -> EtlResult<Vec<PathBuf>> {
    let pattern = Path::new(&Pattern::escape(&dir.to_string_lossy()))
        .join(format!("*{}", Pattern::escape(suffix)))
        .to_string_lossy()
        .to_string();
    let mut files = glob::glob_with(&pattern, options)?.collect::<Result<Vec<_>, _>>()?;
    files.retain(|p| p.is_file());
    files.sort();
    Ok(files)
}

fn bool_text(value: bool) -> String {
    value.to_string()
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
