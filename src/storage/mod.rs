//! Persistence layer for agentctl
//!
//! Everything agentctl remembers lives as plain files under a single
//! data root: conversation sessions as per-session directories and cost
//! records as monthly JSONL buckets. Stores take the root explicitly so
//! tests can point them at a temporary directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AgentctlError, Result};

pub mod costs;
pub mod session;

pub use costs::{CostRecord, CostStore, ModelStats};
pub use session::{LogTail, SessionMessage, SessionMeta, SessionStore};

/// Environment variable overriding the data root
pub const DATA_DIR_ENV: &str = "AGENTCTL_DIR";

/// Resolved locations of everything agentctl persists
///
/// # Examples
///
/// ```
/// use agentctl::storage::StoragePaths;
///
/// let paths = StoragePaths::new("/tmp/agentctl-data");
/// assert!(paths.sessions_dir().ends_with("sessions"));
/// assert!(paths.costs_dir().ends_with("costs"));
/// ```
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    /// Creates paths rooted at an explicit directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the default data root
    ///
    /// Precedence: explicit override, then the `AGENTCTL_DIR`
    /// environment variable, then `~/.agentctl`.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when no home directory can be
    /// determined and no override is given.
    pub fn resolve(override_dir: Option<&Path>) -> Result<Self> {
        if let Some(dir) = override_dir {
            return Ok(Self::new(dir));
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return Ok(Self::new(dir));
        }
        let base = BaseDirs::new().ok_or_else(|| {
            AgentctlError::Config("Could not determine home directory".to_string())
        })?;
        Ok(Self::new(base.home_dir().join(".agentctl")))
    }

    /// The data root itself
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one subdirectory per session
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// Directory holding one JSONL bucket per month
    pub fn costs_dir(&self) -> PathBuf {
        self.root.join("costs")
    }

    /// Default config file location
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.yaml")
    }
}

/// Current local time in the ISO-8601 form used across all records
pub(crate) fn now_iso() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Current month bucket key (`YYYY-MM`)
pub(crate) fn current_month() -> String {
    chrono::Local::now().format("%Y-%m").to_string()
}

/// Current day prefix (`YYYY-MM-DD`), used to filter today's records
pub(crate) fn current_day() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Appends one record to a JSONL file, creating it as needed
pub(crate) fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Reads every parseable record from a JSONL file
///
/// A malformed line is skipped with a warning rather than failing the
/// whole read; a log file damaged by one partial write stays usable.
/// A missing file reads as empty.
pub(crate) fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping malformed line {} in {}: {}", idx + 1, path.display(), e);
            }
        }
    }
    Ok(records)
}

/// Counts non-empty lines in a file, parseable or not
///
/// The tail cursor is defined over raw lines so a malformed record can
/// never shift or duplicate later emissions.
pub(crate) fn count_lines(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(contents.lines().filter(|l| !l.trim().is_empty()).count())
}
