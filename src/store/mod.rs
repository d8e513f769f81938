//! File-backed store for the two config files the traffic generator reads.
//!
//! Every call goes to disk: there is no cache and no lock. A weight update is
//! a read-modify-write of the current file, so two dashboards writing at the
//! same time race and the last writer wins. By default writes truncate the
//! target in place, which lets a concurrent reader observe a partial file;
//! `atomic_writes` trades that for a temp-file-and-rename.

pub mod apps;
pub mod interfaces;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::DashConfig;

pub use apps::{AppsDocument, ApplicationRule};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    /// The file does not exist. Expected on fresh installs.
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed { path: PathBuf, source: io::Error },
    /// Empty, or contains the field separator or a line break.
    #[error("invalid domain {0:?}")]
    InvalidDomain(String),
}

/// Result of [`ConfigStore::set_application_weight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Number of rule lines rewritten. Zero means the file was left alone.
    pub matched: usize,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ConfigStore {
    apps_path: PathBuf,
    interfaces_path: PathBuf,
    atomic_writes: bool,
}

impl ConfigStore {
    pub fn new(apps_path: impl Into<PathBuf>, interfaces_path: impl Into<PathBuf>) -> Self {
        Self {
            apps_path: apps_path.into(),
            interfaces_path: interfaces_path.into(),
            atomic_writes: false,
        }
    }

    pub fn from_config(cfg: &DashConfig) -> Self {
        Self::new(cfg.paths.apps_path(), cfg.paths.interfaces_path())
            .with_atomic_writes(cfg.store.atomic_writes)
    }

    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }

    pub fn apps_path(&self) -> &Path {
        &self.apps_path
    }

    pub fn interfaces_path(&self) -> &Path {
        &self.interfaces_path
    }

    /// All rules in file order.
    pub fn list_applications(&self) -> Result<Vec<ApplicationRule>, StoreError> {
        let text = read_existing(&self.apps_path)?;
        Ok(AppsDocument::parse(&text).rules())
    }

    /// Rewrite the weight of every line for `domain`.
    ///
    /// An unknown domain is not an error: the file is not written and
    /// `matched` is 0. A domain that could not appear as a rule's first
    /// field is rejected before the file is read.
    pub fn set_application_weight(
        &self,
        domain: &str,
        weight: u64,
    ) -> Result<UpdateOutcome, StoreError> {
        if !is_valid_domain(domain) {
            return Err(StoreError::InvalidDomain(domain.to_string()));
        }
        let text = read_existing(&self.apps_path)?;
        let mut doc = AppsDocument::parse(&text);
        let matched = doc.set_weight(domain, weight);

        match matched {
            0 => {
                tracing::warn!(domain, "weight update matched no rule; file left unchanged");
                return Ok(UpdateOutcome { matched });
            }
            1 => {}
            n => tracing::warn!(domain, lines = n, "duplicate domain; updated every matching line"),
        }

        write_file(&self.apps_path, &doc.render(), self.atomic_writes)?;
        tracing::info!(domain, weight, path = %self.apps_path.display(), "updated application weight");
        Ok(UpdateOutcome { matched })
    }

    /// Interface names; empty when the file is missing or unreadable.
    pub fn list_interfaces(&self) -> Vec<String> {
        match fs::read_to_string(&self.interfaces_path) {
            Ok(text) => interfaces::parse(&text),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.interfaces_path.display(), error = %e, "failed to read interfaces");
                }
                Vec::new()
            }
        }
    }

    /// Overwrite the interfaces file with exactly `list`.
    pub fn replace_interfaces(&self, list: &[String]) -> Result<(), StoreError> {
        write_file(
            &self.interfaces_path,
            &interfaces::render(list),
            self.atomic_writes,
        )?;
        tracing::info!(count = list.len(), path = %self.interfaces_path.display(), "replaced interfaces");
        Ok(())
    }
}

/// Whether `domain` can be the first field of a rule line.
pub fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty() && !domain.contains(['|', '\n', '\r'])
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn read_existing(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::ReadFailed {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn write_file(path: &Path, content: &str, atomic: bool) -> Result<(), StoreError> {
    let result = if atomic {
        write_via_rename(path, content)
    } else {
        fs::write(path, content)
    };
    result.map_err(|source| StoreError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a sibling temp file, fsync it, then rename it over `path`.
fn write_via_rename(path: &Path, content: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp_path = path.with_file_name(tmp_name);

    let written = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}
