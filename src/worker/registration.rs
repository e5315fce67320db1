//! Worker registration persistence
//!
//! The host keeps one registration per origin. It records which version is
//! active (serving fetches) and which one is installed and waiting, so the
//! lifecycle survives across host invocations.

use crate::error::{ShellCacheError, ShellCacheResult};
use crate::worker::state::WorkerState;
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

/// One worker version as seen by the registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: Version,
    pub state: WorkerState,
    pub installed_at: Option<DateTime<Utc>>,
    pub activated_at: Option<DateTime<Utc>>,
}

/// Registration record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Unique registration ID
    pub id: Uuid,

    /// Origin the worker controls
    pub origin: String,

    /// Path prefix the worker intercepts
    pub scope: String,

    /// Script path the page registered
    pub script_path: String,

    /// Version currently serving fetch events
    pub active: Option<VersionRecord>,

    /// Most recent install that has not been activated
    pub waiting: Option<VersionRecord>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Register a worker script for an origin
    pub fn new(origin: String, scope: String, script_path: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            origin,
            scope,
            script_path,
            active: None,
            waiting: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Load a registration, `None` if the origin has never registered
    pub async fn load(path: &Path) -> ShellCacheResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            ShellCacheError::io(format!("reading registration {}", path.display()), e)
        })?;

        let registration: Registration = serde_json::from_str(&content)?;
        Ok(Some(registration))
    }

    /// Save the registration
    pub async fn save(&self, path: &Path) -> ShellCacheResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShellCacheError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await.map_err(|e| {
            ShellCacheError::io(format!("writing registration {}", path.display()), e)
        })?;

        Ok(())
    }

    /// Remove a saved registration; `false` if none existed
    pub async fn remove(path: &Path) -> ShellCacheResult<bool> {
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path).await.map_err(|e| {
            ShellCacheError::io(format!("deleting registration {}", path.display()), e)
        })?;
        Ok(true)
    }

    /// Version serving fetch events, if any
    pub fn active_version(&self) -> Option<&Version> {
        self.active
            .as_ref()
            .filter(|r| r.state == WorkerState::Active)
            .map(|r| &r.version)
    }

    /// Version installed and eligible for activation, if any
    pub fn waiting_version(&self) -> Option<&Version> {
        self.waiting
            .as_ref()
            .filter(|r| r.state == WorkerState::Installed)
            .map(|r| &r.version)
    }

    /// Record a successful install; replaces any previous waiting version
    pub fn record_installed(&mut self, version: Version) {
        let now = Utc::now();
        self.waiting = Some(VersionRecord {
            version,
            state: WorkerState::Installed,
            installed_at: Some(now),
            activated_at: None,
        });
        self.updated_at = now;
    }

    /// Record a failed install; the version can never activate
    pub fn record_install_failed(&mut self, version: Version) {
        self.waiting = Some(VersionRecord {
            version,
            state: WorkerState::Redundant,
            installed_at: None,
            activated_at: None,
        });
        self.updated_at = Utc::now();
    }

    /// Promote the waiting version to active; the previous active becomes redundant
    pub fn record_activated(&mut self, version: &Version) -> ShellCacheResult<()> {
        if self.waiting_version() != Some(version) {
            return Err(ShellCacheError::NotInstalled(version.to_string()));
        }
        let mut record = self
            .waiting
            .take()
            .ok_or_else(|| ShellCacheError::NotInstalled(version.to_string()))?;

        let now = Utc::now();
        record.state = WorkerState::Active;
        record.activated_at = Some(now);
        self.active = Some(record);
        self.updated_at = now;
        Ok(())
    }
}
