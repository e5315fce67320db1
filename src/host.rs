//! Worker host
//!
//! Plays the part of the browser around a `CacheManager`: keeps the
//! registration on disk, constructs a manager for the right version, awaits
//! each lifecycle handler and records the outcome.

use crate::cache::{CacheStorage, DiskCacheStorage, GenerationId, Generations, PartitionKind};
use crate::config::{Config, StateLayout};
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::journal::{EventJournal, JournalEntry, JournalEvent};
use crate::network::{HttpNetwork, Network};
use crate::worker::{
    ActivateOutcome, CacheManager, InstallOutcome, Registration, WorkerSettings, WorkerState,
};
use semver::Version;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// How a partition relates to the serving version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionStatus {
    /// One of the serving (or configured) version's generations
    Current,
    /// This site's generation for another version
    Stale,
    /// Not a generation name of this site
    Foreign,
}

impl std::fmt::Display for PartitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Stale => write!(f, "stale"),
            Self::Foreign => write!(f, "foreign"),
        }
    }
}

/// One cache partition as shown by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: usize,
    pub kind: Option<PartitionKind>,
    pub version: Option<Version>,
    pub status: PartitionStatus,
}

pub struct WorkerHost {
    config: Config,
    layout: StateLayout,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    journal: EventJournal,
}

impl WorkerHost {
    /// Host backed by on-disk storage and the real network
    pub async fn open(config: Config, layout: StateLayout) -> ShellCacheResult<Self> {
        layout.ensure().await?;
        let storage = Arc::new(DiskCacheStorage::new(layout.caches_dir(&config)));
        let network = Arc::new(HttpNetwork::new(&config.network));
        Ok(Self::with_capabilities(config, layout, storage, network))
    }

    pub fn with_capabilities(
        config: Config,
        layout: StateLayout,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        let journal = EventJournal::new(&config, &layout);
        Self {
            config,
            layout,
            storage,
            network,
            journal,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// Saved registration, if the origin has registered
    pub async fn registration(&self) -> ShellCacheResult<Option<Registration>> {
        Registration::load(&self.layout.registration_path()).await
    }

    async fn registration_or_new(&self) -> ShellCacheResult<Registration> {
        match self.registration().await? {
            Some(registration) => Ok(registration),
            None => {
                let site = &self.config.site;
                debug!("Registering {} for {}", site.script_path, site.origin);
                Ok(Registration::new(
                    site.origin.clone(),
                    site.scope.clone(),
                    site.script_path.clone(),
                ))
            }
        }
    }

    /// Install the configured version
    ///
    /// Returns `None` without touching storage when that version is already
    /// active or waiting, unless `force` is set.
    pub async fn install(
        &self,
        force: bool,
        on_cached: &(dyn Fn(&str) + Send + Sync),
    ) -> ShellCacheResult<Option<InstallOutcome>> {
        let mut registration = self.registration_or_new().await?;
        let version = self.config.site.version.clone();

        let known = registration.active_version() == Some(&version)
            || registration.waiting_version() == Some(&version);
        if known && !force {
            info!("Version {} is already installed", version);
            return Ok(None);
        }
        if registration
            .waiting
            .as_ref()
            .is_some_and(|r| r.version == version && r.state.is_terminal())
        {
            info!("Retrying failed install of version {}", version);
        }

        let settings = WorkerSettings::from_config(&self.config)?;
        let mut manager =
            CacheManager::new(settings, self.storage.clone(), self.network.clone());

        let path = self.layout.registration_path();
        match manager.on_install_with(on_cached).await {
            Ok(outcome) => {
                registration.record_installed(version.clone());
                registration.save(&path).await?;
                self.journal
                    .record(
                        JournalEntry::new(JournalEvent::WorkerInstalled)
                            .version(&version)
                            .data(serde_json::json!({
                                "partition": outcome.partition,
                                "assets": outcome.assets,
                            })),
                    )
                    .await;
                Ok(Some(outcome))
            }
            Err(e) => {
                registration.record_install_failed(version.clone());
                registration.save(&path).await?;
                self.journal
                    .record(
                        JournalEntry::new(JournalEvent::WorkerInstallFailed)
                            .version(&version)
                            .data(serde_json::json!({ "error": e.to_string() })),
                    )
                    .await;
                Err(e)
            }
        }
    }

    /// Activate the waiting configured version
    pub async fn activate(&self) -> ShellCacheResult<ActivateOutcome> {
        let version = self.config.site.version.clone();
        let mut registration = self
            .registration()
            .await?
            .filter(|r| r.waiting_version() == Some(&version))
            .ok_or_else(|| ShellCacheError::NotInstalled(version.to_string()))?;

        let settings = WorkerSettings::for_version(&self.config, &version)?;
        let mut manager = CacheManager::resume(
            settings,
            self.storage.clone(),
            self.network.clone(),
            WorkerState::Installed,
        );
        let outcome = manager.on_activate().await?;

        registration.record_activated(&version)?;
        registration.save(&self.layout.registration_path()).await?;

        self.journal
            .record(JournalEntry::new(JournalEvent::WorkerActivated).version(&version))
            .await;
        for name in &outcome.deleted {
            self.journal
                .record(
                    JournalEntry::new(JournalEvent::CacheDeleted)
                        .version(&version)
                        .data(serde_json::json!({ "partition": name })),
                )
                .await;
        }

        Ok(outcome)
    }

    /// Manager for the version currently serving fetches
    pub async fn active_worker(&self) -> ShellCacheResult<CacheManager> {
        let registration = self.registration().await?;
        let version = registration
            .as_ref()
            .and_then(|r| r.active_version())
            .ok_or_else(|| ShellCacheError::NoActiveWorker(self.config.site.origin.clone()))?;

        let settings = WorkerSettings::for_version(&self.config, version)?;
        Ok(CacheManager::resume(
            settings,
            self.storage.clone(),
            self.network.clone(),
            WorkerState::Active,
        ))
    }

    /// Every partition with its entry count
    pub async fn partitions(&self) -> ShellCacheResult<Vec<PartitionSummary>> {
        let registration = self.registration().await?;
        let version = registration
            .as_ref()
            .and_then(|r| r.active_version())
            .unwrap_or(&self.config.site.version);
        let generations = Generations::new(&self.config.site.name, version);

        let mut partitions = vec![];
        for name in self.storage.keys().await? {
            let entries = self.storage.entries(&name).await?.len();
            let id = GenerationId::parse(&name).filter(|id| id.site == self.config.site.name);
            let status = match &id {
                _ if generations.is_current(&name) => PartitionStatus::Current,
                Some(_) => PartitionStatus::Stale,
                None => PartitionStatus::Foreign,
            };
            partitions.push(PartitionSummary {
                kind: id.as_ref().map(|id| id.kind),
                version: id.map(|id| id.version),
                status,
                name,
                entries,
            });
        }
        Ok(partitions)
    }

    /// Most recent journal entries, oldest first
    pub async fn recent_events(&self, limit: usize) -> ShellCacheResult<Vec<JournalEntry>> {
        self.journal.recent(limit).await
    }

    /// Delete every partition and unregister
    pub async fn clear(&self) -> ShellCacheResult<Vec<String>> {
        let mut deleted = vec![];
        for name in self.storage.keys().await? {
            if self.storage.delete(&name).await? {
                deleted.push(name);
            }
        }

        let unregistered = Registration::remove(&self.layout.registration_path()).await?;
        self.journal
            .record(
                JournalEntry::new(JournalEvent::RegistrationCleared)
                    .data(serde_json::json!({ "partitions": deleted, "unregistered": unregistered })),
            )
            .await;

        info!("Cleared {} partitions", deleted.len());
        Ok(deleted)
    }
}
