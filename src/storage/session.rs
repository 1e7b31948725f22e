//! Session storage
//!
//! A session is a directory under the sessions root holding a pretty
//! printed `session.json` metadata file and an append-only
//! `messages.jsonl` transcript. [`LogTail`] provides the cursor used by
//! the follow mode of the `logs` command.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AgentctlError, Result};
use crate::providers::Role;
use crate::storage::{append_jsonl, count_lines, now_iso, read_jsonl, StoragePaths};

/// Session metadata, stored as `session.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    /// Session name (doubles as the directory name)
    pub name: String,
    /// Model the session was created for
    pub model: Option<String>,
    /// System prompt applied to every exchange
    pub system: Option<String>,
    /// Creation timestamp
    pub created: String,
    /// Timestamp of the most recent append
    pub last_active: String,
}

/// One transcript line in `messages.jsonl`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    /// Who said it
    pub role: Role,
    /// What was said
    pub content: String,
    /// When it was appended
    pub timestamp: String,
}

/// Store for conversation sessions
///
/// # Examples
///
/// ```
/// use agentctl::storage::{SessionStore, StoragePaths};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = SessionStore::new(StoragePaths::new(dir.path()));
/// store.create("demo", Some("gpt-4o"), None).unwrap();
/// assert!(store.exists("demo"));
/// ```
pub struct SessionStore {
    paths: StoragePaths,
}

impl SessionStore {
    /// Creates a store rooted at the given paths
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    fn session_dir(&self, name: &str) -> PathBuf {
        self.paths.sessions_dir().join(name)
    }

    fn meta_file(&self, name: &str) -> PathBuf {
        self.session_dir(name).join("session.json")
    }

    fn messages_file(&self, name: &str) -> PathBuf {
        self.session_dir(name).join("messages.jsonl")
    }

    /// Rejects names that would escape the sessions directory
    fn validate_name(name: &str) -> Result<()> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if valid {
            Ok(())
        } else {
            Err(AgentctlError::Config(format!(
                "invalid session name '{}' (use letters, digits, '.', '_', '-')",
                name
            ))
            .into())
        }
    }

    /// Whether a session with this name exists
    pub fn exists(&self, name: &str) -> bool {
        self.meta_file(name).exists()
    }

    /// Creates a new session and its empty transcript
    ///
    /// # Errors
    ///
    /// Fails with `Config` for an invalid name and with `Io` when the
    /// directory cannot be created.
    pub fn create(
        &self,
        name: &str,
        model: Option<&str>,
        system: Option<&str>,
    ) -> Result<SessionMeta> {
        Self::validate_name(name)?;
        let dir = self.session_dir(name);
        std::fs::create_dir_all(&dir)?;

        let now = now_iso();
        let meta = SessionMeta {
            name: name.to_string(),
            model: model.map(str::to_string),
            system: system.map(str::to_string),
            created: now.clone(),
            last_active: now,
        };

        std::fs::write(self.meta_file(name), serde_json::to_string_pretty(&meta)?)?;
        // Touch the transcript so follow mode has a file to poll
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.messages_file(name))?;

        tracing::info!("Created session '{}'", name);
        Ok(meta)
    }

    /// Loads a session's metadata
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the session does not exist.
    pub fn meta(&self, name: &str) -> Result<SessionMeta> {
        Self::validate_name(name)?;
        let path = self.meta_file(name);
        if !path.exists() {
            return Err(AgentctlError::NotFound(format!("session '{}'", name)).into());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Lists all sessions with their message counts, sorted by name
    ///
    /// Directories without a readable `session.json` are skipped.
    pub fn list(&self) -> Result<Vec<(SessionMeta, usize)>> {
        let sessions_dir = self.paths.sessions_dir();
        if !sessions_dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in std::fs::read_dir(&sessions_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            match self.meta(&name) {
                Ok(meta) => {
                    let count = count_lines(&self.messages_file(&name))?;
                    sessions.push((meta, count));
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable session '{}': {}", name, e);
                }
            }
        }
        sessions.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        Ok(sessions)
    }

    /// Deletes a session and its transcript
    ///
    /// # Errors
    ///
    /// Returns `Config` for an invalid name and `NotFound` when the
    /// session does not exist. The name check matters most here: a
    /// traversal name like `..` would otherwise resolve to the data
    /// root before `remove_dir_all`.
    pub fn delete(&self, name: &str) -> Result<()> {
        Self::validate_name(name)?;
        let dir = self.session_dir(name);
        if !dir.exists() {
            return Err(AgentctlError::NotFound(format!("session '{}'", name)).into());
        }
        std::fs::remove_dir_all(dir)?;
        tracing::info!("Deleted session '{}'", name);
        Ok(())
    }

    /// Appends one message to a session's transcript and refreshes its
    /// last-active timestamp
    pub fn append(&self, name: &str, role: Role, content: &str) -> Result<SessionMessage> {
        let mut meta = self.meta(name)?;
        let message = SessionMessage {
            role,
            content: content.to_string(),
            timestamp: now_iso(),
        };
        append_jsonl(&self.messages_file(name), &message)?;

        meta.last_active = message.timestamp.clone();
        std::fs::write(self.meta_file(name), serde_json::to_string_pretty(&meta)?)?;
        Ok(message)
    }

    /// Reads a session's transcript, optionally only the last N entries
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the session does not exist.
    pub fn read(&self, name: &str, last: Option<usize>) -> Result<Vec<SessionMessage>> {
        Self::validate_name(name)?;
        if !self.exists(name) {
            return Err(AgentctlError::NotFound(format!("session '{}'", name)).into());
        }
        let mut messages: Vec<SessionMessage> = read_jsonl(&self.messages_file(name))?;
        if let Some(last) = last {
            if messages.len() > last {
                messages.drain(..messages.len() - last);
            }
        }
        Ok(messages)
    }

    /// Opens a tail cursor positioned at the current end of a session's
    /// transcript
    pub fn tail(&self, name: &str) -> Result<LogTail> {
        Self::validate_name(name)?;
        if !self.exists(name) {
            return Err(AgentctlError::NotFound(format!("session '{}'", name)).into());
        }
        LogTail::from_end(self.messages_file(name))
    }
}

/// Cursor over an append-only transcript
///
/// The cursor counts raw non-empty lines rather than parsed records, so
/// every line is considered exactly once even when some lines are
/// malformed. Callers poll [`LogTail::poll_new`] on their own schedule;
/// the follow mode of the `logs` command polls every 500ms.
pub struct LogTail {
    path: PathBuf,
    seen: usize,
}

impl LogTail {
    /// Creates a cursor positioned after the file's current lines
    pub fn from_end(path: PathBuf) -> Result<Self> {
        let seen = count_lines(&path)?;
        Ok(Self { path, seen })
    }

    /// Creates a cursor positioned at the start of the file
    pub fn from_start(path: PathBuf) -> Self {
        Self { path, seen: 0 }
    }

    /// Returns every record appended since the last poll, in file order
    ///
    /// Malformed new lines are skipped with a warning but still advance
    /// the cursor, so they are never re-inspected.
    pub fn poll_new(&mut self) -> Result<Vec<SessionMessage>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let lines: Vec<&str> = contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();

        if lines.len() <= self.seen {
            return Ok(Vec::new());
        }

        let mut fresh = Vec::new();
        for line in &lines[self.seen..] {
            match serde_json::from_str(line) {
                Ok(message) => fresh.push(message),
                Err(e) => {
                    tracing::warn!("Skipping malformed line in {}: {}", self.path.display(), e);
                }
            }
        }
        self.seen = lines.len();
        Ok(fresh)
    }
}
