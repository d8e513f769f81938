//! Read-only access to the traffic generator's output: the stats snapshot
//! and the traffic log. Nothing here writes to either file.

pub mod logs;
pub mod stats;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::DashConfig;

pub use stats::StatsSnapshot;

/// Default number of log lines returned by [`TelemetrySource::log_tail`].
pub const DEFAULT_LOG_LINES: usize = 50;

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Missing, unreadable, or empty. The producer may not have run yet or
    /// may be mid-write.
    #[error("no stats snapshot at {}", .0.display())]
    Absent(PathBuf),
    #[error("stats snapshot is not valid: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct TelemetrySource {
    stats_path: PathBuf,
    log_path: PathBuf,
}

impl TelemetrySource {
    pub fn new(stats_path: impl Into<PathBuf>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            stats_path: stats_path.into(),
            log_path: log_path.into(),
        }
    }

    pub fn from_config(cfg: &DashConfig) -> Self {
        Self::new(cfg.paths.stats_path(), cfg.paths.log_path())
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Parse the current snapshot file.
    pub fn snapshot(&self) -> Result<StatsSnapshot, SnapshotError> {
        let content = match fs::read(&self.stats_path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.stats_path.display(), error = %e, "failed to read stats");
                }
                return Err(SnapshotError::Absent(self.stats_path.clone()));
            }
        };
        if content.trim_ascii().is_empty() {
            return Err(SnapshotError::Absent(self.stats_path.clone()));
        }
        // Bytes, not a string: bad encoding is a parse failure, not absence.
        Ok(serde_json::from_slice(&content)?)
    }

    /// Last `lines` non-empty log lines, oldest first. Empty when the log is
    /// missing or unreadable.
    pub fn log_tail(&self, lines: usize) -> Vec<String> {
        match logs::tail(&self.log_path, lines) {
            Ok(tail) => tail,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.log_path.display(), error = %e, "failed to tail log");
                }
                Vec::new()
            }
        }
    }
}
