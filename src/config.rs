use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LevelFilter;

/// Root configuration structure with versioning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Configuration schema version for compatibility tracking
    pub version: String,
    /// Worksheet discovery
    #[serde(default)]
    pub worksheets: WorksheetConfig,
    /// Run directories (log, report, config snapshot)
    #[serde(default)]
    pub runs: RunsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Worksheet configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorksheetConfig {
    /// File-name suffix of in-vitro selection worksheets inside a worksheet directory
    #[serde(default = "default_ivsel_suffix")]
    pub ivsel_suffix: String,
    /// File-name suffix of worksheets scanned for drug regimens
    #[serde(default = "default_csv_suffix")]
    pub csv_suffix: String,
}

/// Run bookkeeping configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunsConfig {
    /// Write a run directory for every invocation
    #[serde(default = "default_runs_enabled")]
    pub enabled: bool,
    /// Parent directory of the timestamped run directories
    #[serde(default = "default_runs_dir")]
    pub runs_dir: PathBuf,
    /// Number of most recent run directories to keep
    #[serde(default = "default_keep_runs")]
    pub keep_runs: usize,
}

/// Logging configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Show a progress bar for multi-file commands
    #[serde(default = "default_progress")]
    pub progress: bool,
}

// Default value functions
fn default_ivsel_suffix() -> String {
    "-ivsel.csv".to_string()
}

fn default_csv_suffix() -> String {
    ".csv".to_string()
}

fn default_runs_enabled() -> bool {
    true
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from("runs")
}

fn default_keep_runs() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_progress() -> bool {
    true
}

impl Default for WorksheetConfig {
    fn default() -> Self {
        Self {
            ivsel_suffix: default_ivsel_suffix(),
            csv_suffix: default_csv_suffix(),
        }
    }
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            enabled: default_runs_enabled(),
            runs_dir: default_runs_dir(),
            keep_runs: default_keep_runs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            progress: default_progress(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file. Falls back to defaults if file is missing.
    /// Fails fast with clear error message if YAML parsing fails.
    pub fn load_from_yaml(config_path: Option<&Path>) -> Result<Self> {
        let path = if let Some(p) = config_path {
            p.to_path_buf()
        } else {
            PathBuf::from("config.yaml")
        };

        // Try to read file; if it doesn't exist, return defaults
        let config_str = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!(
                    "[INFO] Config file not found at {:?}, using hardcoded defaults",
                    path
                );
                return Ok(Self::default());
            }
            Err(e) => return Err(e).context(format!("Failed to read config file at {:?}", path)),
        };

        let settings = Self::from_yaml_str(&config_str)
            .with_context(|| format!("Failed to parse config at {:?}: invalid YAML structure", path))?;

        eprintln!(
            "[INFO] Loaded config from {:?} (version: {})",
            path, settings.version
        );
        Ok(settings)
    }

    /// Parse settings from YAML text, warning on an unexpected schema version.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        if settings.version != "1.0" {
            eprintln!("[WARN] Config version mismatch: expected 1.0, got {}. Continuing with current schema.", settings.version);
        }
        Ok(settings)
    }

    /// Merge CLI arguments into settings, with CLI taking precedence
    pub fn merge_with_cli(
        mut self,
        cli_runs_dir: Option<PathBuf>,
        cli_log_level: Option<String>,
        cli_no_progress: bool,
    ) -> Self {
        if let Some(runs_dir) = cli_runs_dir {
            self.runs.runs_dir = runs_dir;
            eprintln!("[INFO] CLI override: runs_dir");
        }

        if let Some(level) = cli_log_level {
            self.logging.log_level = level;
            eprintln!("[INFO] CLI override: log_level");
        }

        if cli_no_progress {
            self.logging.progress = false;
        }

        self
    }

    /// Rejects settings no command can run with.
    pub fn validate(&self) -> Result<()> {
        if self.worksheets.ivsel_suffix.is_empty() || self.worksheets.csv_suffix.is_empty() {
            bail!("worksheets: file suffixes cannot be empty");
        }
        if self.runs.enabled && self.runs.keep_runs == 0 {
            bail!("runs.keep_runs must be at least 1 when runs are enabled");
        }
        self.log_level()?;
        Ok(())
    }

    /// The configured log level.
    pub fn log_level(&self) -> Result<LevelFilter> {
        self.logging
            .log_level
            .parse()
            .with_context(|| format!("logging.log_level {:?}", self.logging.log_level))
    }

    /// Resolve paths relative to the project root
    pub fn resolve_paths(&mut self, root: &Path) {
        self.runs.runs_dir = resolve_path(&self.runs.runs_dir, root);
    }

    /// Write the effective settings as YAML, for reproducing a run.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config snapshot")?;
        fs::write(path, yaml)
            .with_context(|| format!("Failed to write config snapshot to {}", path.display()))?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            worksheets: WorksheetConfig::default(),
            runs: RunsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Resolve a path to be either relative to root or return as-is if absolute
fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let settings = Settings::from_yaml_str(
            "version: \"1.0\"\nworksheets:\n  ivsel_suffix: \"_sel.csv\"\nlogging:\n  log_level: debug\n",
        )
        .unwrap();
        assert_eq!(settings.worksheets.ivsel_suffix, "_sel.csv");
        assert_eq!(settings.worksheets.csv_suffix, ".csv");
        assert_eq!(settings.logging.log_level, "debug");
        assert!(settings.logging.progress);
        assert_eq!(settings.runs.keep_runs, 10);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(Settings::from_yaml_str("version: [unclosed").is_err());
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let settings = Settings::default().merge_with_cli(
            Some(PathBuf::from("/tmp/hivdb-runs")),
            Some("warn".to_string()),
            true,
        );
        assert_eq!(settings.runs.runs_dir, PathBuf::from("/tmp/hivdb-runs"));
        assert_eq!(settings.logging.log_level, "warn");
        assert!(!settings.logging.progress);
    }

    #[test]
    fn validation_rejects_unusable_settings() {
        assert!(Settings::default().validate().is_ok());
        assert_eq!(Settings::default().log_level().unwrap(), LevelFilter::Info);

        let mut settings = Settings::default();
        settings.logging.log_level = "chatty".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.runs.keep_runs = 0;
        assert!(settings.validate().is_err());
        settings.runs.enabled = false;
        assert!(settings.validate().is_ok());

        let mut settings = Settings::default();
        settings.worksheets.ivsel_suffix.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn relative_runs_dir_resolves_against_root() {
        let mut settings = Settings::default();
        settings.resolve_paths(Path::new("/data/project"));
        assert_eq!(settings.runs.runs_dir, PathBuf::from("/data/project/runs"));
    }
}
