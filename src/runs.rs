//! Run directories.
//!
//! Every command invocation gets `{runs_dir}/run_{timestamp}_{command}/`
//! holding `etl.log`, `config_snapshot.yaml` and `report.yaml`. Pruning keeps
//! the newest runs of each command separately, so a burst of one command
//! never evicts the last run of another.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const RUN_PREFIX: &str = "run_";

/// `%Y%m%d_%H%M%S_%3f`, e.g. `20250118_143022_125`.
const TIMESTAMP_LEN: usize = 19;

pub struct RunContext {
    pub run_dir: PathBuf,
    pub run_id: String,
    /// Subcommand name, e.g. `generate-mutations`.
    pub command: String,
    pub start_time: DateTime<Utc>,
}

impl RunContext {
    pub fn new(runs_dir: &Path, command: &str) -> Result<Self> {
        Self::new_with_run_id(runs_dir, command, None)
    }

    /// Creates the run directory. An explicit `run_id` is validated and
    /// gets the `run_` prefix if it lacks one. The directory must be new.
    pub fn new_with_run_id(
        runs_dir: &Path,
        command: &str,
        run_id: Option<String>,
    ) -> Result<Self> {
        let start_time = Utc::now();
        let run_id = match run_id {
            Some(raw) => checked_run_id(&raw)?,
            None => checked_run_id(&format!(
                "{}_{}",
                start_time.format("%Y%m%d_%H%M%S_%3f"),
                command
            ))?,
        };

        let run_dir = runs_dir.join(&run_id);
        if run_dir.exists() {
            bail!("Run directory already exists: {}", run_dir.display());
        }
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create run directory: {}", run_dir.display()))?;

        Ok(Self {
            run_dir,
            run_id,
            command: command.to_string(),
            start_time,
        })
    }

    pub fn report_path(&self) -> PathBuf {
        self.run_dir.join("report.yaml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.run_dir.join("etl.log")
    }

    pub fn config_snapshot_path(&self) -> PathBuf {
        self.run_dir.join("config_snapshot.yaml")
    }
}

fn checked_run_id(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("run_id cannot be empty");
    }
    if let Some(bad) = raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        bail!("run_id {:?} contains {:?}; only ASCII letters, digits, '_' and '-' are allowed", raw, bad);
    }
    Ok(if raw.starts_with(RUN_PREFIX) {
        raw.to_string()
    } else {
        format!("{RUN_PREFIX}{raw}")
    })
}

/// Command a generated run directory belongs to. Directories named by an
/// explicit `--run-id` have no recognisable command and are grouped under "".
fn run_command(dir_name: &str) -> &str {
    dir_name
        .strip_prefix(RUN_PREFIX)
        .filter(|rest| rest.len() > TIMESTAMP_LEN && rest.as_bytes()[TIMESTAMP_LEN] == b'_')
        .filter(|rest| rest[..TIMESTAMP_LEN].bytes().all(|b| b.is_ascii_digit() || b == b'_'))
        .map_or("", |rest| &rest[TIMESTAMP_LEN + 1..])
}

/// Removes all but the newest `keep_count` run directories of each command.
///
/// Returns the directories that could not be removed, with the reason.
pub fn cleanup_old_runs(runs_dir: &Path, keep_count: usize) -> Result<Vec<(PathBuf, String)>> {
    if !runs_dir.exists() {
        return Ok(Vec::new());
    }

    let mut by_command: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in fs::read_dir(runs_dir)
        .with_context(|| format!("Failed to read runs directory: {}", runs_dir.display()))?
    {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_dir() && name.starts_with(RUN_PREFIX) {
            by_command
                .entry(run_command(name).to_string())
                .or_default()
                .push(path.clone());
        }
    }

    let mut failures = Vec::new();
    for mut dirs in by_command.into_values() {
        dirs.sort();
        let excess = dirs.len().saturating_sub(keep_count);
        for dir in dirs.into_iter().take(excess) {
            if let Err(e) = fs::remove_dir_all(&dir) {
                failures.push((dir, e.to_string()));
            }
        }
    }
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn run_dir_is_named_after_command() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(tmp.path(), "generate-mutations").unwrap();

        assert!(ctx.run_dir.is_dir());
        assert_eq!(run_command(&ctx.run_id), "generate-mutations");
        assert_eq!(ctx.log_path(), ctx.run_dir.join("etl.log"));
        assert_eq!(ctx.report_path(), ctx.run_dir.join("report.yaml"));
    }

    #[test]
    fn explicit_run_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = RunContext::new_with_run_id(tmp.path(), "generate-drugs", Some("nightly".into()))
            .unwrap();
        assert_eq!(ctx.run_id, "run_nightly");
        assert!(
            RunContext::new_with_run_id(tmp.path(), "generate-drugs", Some("run_nightly".into()))
                .is_err()
        );
        assert!(checked_run_id("../escape").is_err());
        assert!(checked_run_id("with space").is_err());
        assert!(checked_run_id("  ").is_err());
    }

    #[test]
    fn command_is_recovered_from_dir_name() {
        assert_eq!(run_command("run_20250104_120000_000_generate-drugs"), "generate-drugs");
        assert_eq!(run_command("run_nightly"), "");
        assert_eq!(run_command("run_20250104_120000_000"), "");
    }

    #[test]
    fn pruning_is_per_command() {
        let tmp = tempfile::tempdir().unwrap();
        for day in 1..=4 {
            fs::create_dir(tmp.path().join(format!("run_2025010{day}_120000_000_generate-drugs")))
                .unwrap();
        }
        fs::create_dir(tmp.path().join("run_20241231_090000_000_generate-ivsel-isolates")).unwrap();
        fs::write(tmp.path().join("run_notes.txt"), "").unwrap();

        let failures = cleanup_old_runs(tmp.path(), 2).unwrap();
        assert!(failures.is_empty());
        assert_eq!(
            names_in(tmp.path()),
            vec![
                "run_20241231_090000_000_generate-ivsel-isolates",
                "run_20250103_120000_000_generate-drugs",
                "run_20250104_120000_000_generate-drugs",
                "run_notes.txt",
            ]
        );
    }
}
