//! Logging configuration
//!
//! Describes where and how verbosely log output goes. Installing the
//! subscriber is left to binaries.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Logging preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level name: "error", "warn", "info", "debug" or "trace"
    pub level: String,
    /// Write to stderr
    pub console_output: bool,
    /// Write to a file in `log_directory`
    pub file_output: bool,
    /// Directory for log files
    pub log_directory: PathBuf,
    /// Number of log files kept by [`LogConfig::cleanup_old_logs`]
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_directory: PathBuf::from("logs"),
            max_log_files: 10,
        }
    }
}

const LOG_PREFIX: &str = "inset_";
const LOG_EXTENSION: &str = "log";

impl LogConfig {
    /// Parse `level`, falling back to INFO.
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }

    /// Create the log directory if missing.
    pub fn ensure_log_directory(&self) -> io::Result<()> {
        fs::create_dir_all(&self.log_directory)
    }

    /// Log file for today.
    pub fn current_log_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y-%m-%d");
        self.log_directory
            .join(format!("{LOG_PREFIX}{stamp}.{LOG_EXTENSION}"))
    }

    /// Delete the oldest log files beyond `max_log_files`. Returns how many
    /// were removed.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if !self.log_directory.exists() {
            return Ok(0);
        }

        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_log_file(path))
            .collect();

        if logs.len() <= self.max_log_files {
            return Ok(0);
        }

        // Date stamps sort lexically.
        logs.sort();
        let excess = logs.len() - self.max_log_files;
        for path in &logs[..excess] {
            fs::remove_file(path)?;
        }
        Ok(excess)
    }
}

fn is_log_file(path: &Path) -> bool {
    let named = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(LOG_PREFIX));
    named && path.extension().is_some_and(|ext| ext == LOG_EXTENSION)
}
