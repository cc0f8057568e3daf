//! Leveled log lines, teed to stderr and the run's `etl.log`.

use std::fs::File;
use std::io::{BufWriter, Write};

pub use ::log::{Level, LevelFilter};

/// A writer that tees output to both a file and stderr.
pub struct RunLogger {
    file: Option<BufWriter<File>>,
    level: LevelFilter,
}

impl RunLogger {
    pub fn new(file: Option<File>, level: LevelFilter) -> Self {
        Self {
            file: file.map(BufWriter::new),
            level,
        }
    }

    pub fn stderr_only(level: LevelFilter) -> Self {
        Self::new(None, level)
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    /// Writes `[LEVEL] msg` if `level` passes the filter.
    pub fn log(&mut self, level: Level, msg: &str) {
        if self.enabled(level) {
            self.writeln(&format!("[{}] {}", level, msg));
        }
    }

    /// Writes a line regardless of level.
    pub fn writeln(&mut self, msg: &str) {
        eprintln!("{}", msg);
        if let Some(file) = self.file.as_mut() {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }
    }
}

/// `log!(logger, Info, "read {} rows", n)`
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:ident, $($arg:tt)*) => {
        $logger.log($crate::logging::Level::$level, &format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_levels() {
        assert_eq!("INFO".parse::<LevelFilter>().unwrap(), LevelFilter::Info);
        assert_eq!("off".parse::<LevelFilter>().unwrap(), LevelFilter::Off);
        assert!("loud".parse::<LevelFilter>().is_err());
    }

    #[test]
    fn off_silences_everything() {
        let logger = RunLogger::stderr_only(LevelFilter::Off);
        assert!(!logger.enabled(Level::Error));
        let logger = RunLogger::stderr_only(LevelFilter::Debug);
        assert!(logger.enabled(Level::Debug));
        assert!(!logger.enabled(Level::Trace));
    }

    #[test]
    fn filters_below_threshold_and_tees_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etl.log");
        let mut logger = RunLogger::new(Some(File::create(&path).unwrap()), LevelFilter::Info);

        log!(logger, Debug, "hidden {}", 1);
        log!(logger, Info, "shown {}", 2);
        log!(logger, Error, "failed");
        drop(logger);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "[INFO] shown 2\n[ERROR] failed\n");
    }
}
