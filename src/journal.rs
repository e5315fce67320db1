//! Lifecycle journal
//!
//! Appends one JSON line per lifecycle transition to `<state-dir>/journal.log`
//! and reads the tail back for `status`. Enabled by default; turn off with
//! `general.journal = false`.

use crate::config::{schema::Config, StateLayout};
use crate::error::{ShellCacheError, ShellCacheResult};
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Lifecycle transitions worth keeping across invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEvent {
    #[serde(rename = "worker.installed")]
    WorkerInstalled,
    #[serde(rename = "worker.install_failed")]
    WorkerInstallFailed,
    #[serde(rename = "worker.activated")]
    WorkerActivated,
    #[serde(rename = "cache.deleted")]
    CacheDeleted,
    #[serde(rename = "registration.cleared")]
    RegistrationCleared,
}

impl JournalEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkerInstalled => "worker.installed",
            Self::WorkerInstallFailed => "worker.install_failed",
            Self::WorkerActivated => "worker.activated",
            Self::CacheDeleted => "cache.deleted",
            Self::RegistrationCleared => "registration.cleared",
        }
    }
}

impl fmt::Display for JournalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One journal line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub event: JournalEvent,
    /// Worker version the event concerns, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl JournalEntry {
    pub fn new(event: JournalEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
            version: None,
            data: serde_json::Value::Null,
        }
    }

    pub fn version(mut self, version: &Version) -> Self {
        self.version = Some(version.clone());
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// File-based journal that appends JSON lines
pub struct EventJournal {
    enabled: bool,
    path: PathBuf,
}

impl EventJournal {
    pub fn new(config: &Config, layout: &StateLayout) -> Self {
        Self {
            enabled: config.general.journal,
            path: layout.journal_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry
    ///
    /// IO failures are logged and dropped; the journal never fails a command.
    pub async fn record(&self, entry: JournalEntry) {
        if !self.enabled {
            return;
        }

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize {} journal entry: {}", entry.event, e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write journal {}: {}", self.path.display(), e);
        }
    }

    /// The last `limit` entries, oldest first
    ///
    /// Lines that do not parse (a torn write, a hand edit) are skipped.
    pub async fn recent(&self, limit: usize) -> ShellCacheResult<Vec<JournalEntry>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(ShellCacheError::io(
                    format!("reading journal {}", self.path.display()),
                    e,
                ))
            }
        };

        let entries: Vec<JournalEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping journal line: {}", e);
                    None
                }
            })
            .collect();

        let skip = entries.len().saturating_sub(limit);
        Ok(entries.into_iter().skip(skip).collect())
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
