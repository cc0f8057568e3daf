//! Run report generation and YAML serialization.
//!
//! Captures what a command read and wrote, how it ended, and the machine it
//! ran on.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;
use sysinfo::System;

use crate::metrics::Metrics;
use crate::runs::RunContext;

/// Status of a command run.
#[derive(Serialize, Clone, Debug)]
#[serde(tag = "status")]
pub enum RunStatus {
    Success,
    Error { message: String },
}

/// Complete report for a single command run.
#[derive(Serialize, Clone, Debug)]
pub struct RunReport {
    pub run_id: String,
    pub command: String,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    #[serde(flatten)]
    pub status: RunStatus,

    pub inputs: Vec<String>,
    pub output: String,
    pub counters: RunCounters,
    pub environment: EnvironmentInfo,
}

/// Counters from the run.
#[derive(Serialize, Clone, Debug)]
pub struct RunCounters {
    pub files_read: u64,
    pub rows_read: u64,
    pub rows_written: u64,
    pub mutations_parsed: u64,
    pub isolates: u64,
}

/// Environment information about the system.
#[derive(Serialize, Clone, Debug)]
pub struct EnvironmentInfo {
    pub os: String,
    pub os_version: String,
    pub host_name: String,
    pub cpu_cores: usize,
    pub total_memory_gb: f64,
    pub crate_version: String,
}

impl EnvironmentInfo {
    /// Gather environment information from the system.
    pub fn gather() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            host_name: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            total_memory_gb: sys.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl RunCounters {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        Self {
            files_read: metrics.files_read(),
            rows_read: metrics.rows_read(),
            rows_written: metrics.rows_written(),
            mutations_parsed: metrics.mutations(),
            isolates: metrics.isolates(),
        }
    }
}

impl RunReport {
    /// Generate a complete run report.
    pub fn generate(
        run_context: &RunContext,
        metrics: &Metrics,
        inputs: &[&Path],
        output: &Path,
        status: RunStatus,
    ) -> Self {
        Self {
            run_id: run_context.run_id.clone(),
            command: run_context.command.clone(),
            timestamp: run_context.start_time,
            duration_secs: metrics.elapsed_secs(),
            status,
            inputs: inputs.iter().map(|p| p.display().to_string()).collect(),
            output: output.display().to_string(),
            counters: RunCounters::from_metrics(metrics),
            environment: EnvironmentInfo::gather(),
        }
    }

    /// Save the report as YAML to the specified path.
    pub fn save_yaml(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize report to YAML")?;

        fs::write(path, yaml)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_info_gather() {
        let env_info = EnvironmentInfo::gather();
        assert!(!env_info.os.is_empty());
        assert!(env_info.cpu_cores > 0);
        assert!(env_info.total_memory_gb > 0.0);
        assert_eq!(env_info.crate_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_run_status_serialization() {
        let success = RunStatus::Success;
        let yaml = serde_yaml::to_string(&success).unwrap();
        assert!(yaml.contains("Success"));

        let error = RunStatus::Error {
            message: "Strain is empty at row 4".to_string(),
        };
        let yaml = serde_yaml::to_string(&error).unwrap();
        assert!(yaml.contains("Error"));
        assert!(yaml.contains("Strain is empty at row 4"));
    }

    #[test]
    fn test_report_written_to_run_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(temp_dir.path(), "generate-isolates").unwrap();
        let metrics = Metrics::new();
        metrics.inc_files();
        metrics.add_rows_read(7);

        let report = RunReport::generate(
            &ctx,
            &metrics,
            &[Path::new("isolates.csv")],
            Path::new("out/isolates.csv"),
            RunStatus::Success,
        );
        report.save_yaml(&ctx.report_path()).unwrap();

        let yaml = fs::read_to_string(ctx.report_path()).unwrap();
        assert!(yaml.contains("command: generate-isolates"));
        assert!(yaml.contains("rows_read: 7"));
        assert!(yaml.contains("status: Success"));
    }
}
