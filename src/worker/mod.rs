//! Offline cache manager
//!
//! A `CacheManager` is one worker version. The host constructs it once per
//! worker startup and drives it through three lifecycle handlers, awaiting
//! each before it considers the step complete:
//!
//! - `on_install`: precache the application shell into the static partition,
//!   all-or-nothing.
//! - `on_activate`: delete every partition that is not one of this version's
//!   two generations.
//! - `on_fetch`: serve GET requests for the origin cache-first, fall back to
//!   the network, store cacheable responses in the dynamic partition, and
//!   serve the offline fallback document to navigations when the network is
//!   unreachable.
//!
//! Lifecycle transitions take `&mut self`; fetches take `&self` so an active
//! manager can be shared behind an `Arc` and serve requests concurrently.

pub mod events;
pub mod registration;
pub mod state;

pub use events::{Notification, Notifier, SyncOutcome, FORM_SUBMISSION_TAG};
pub use registration::{Registration, VersionRecord};
pub use state::WorkerState;

use crate::cache::{CacheStorage, Generations};
use crate::config::schema::NotificationsConfig;
use crate::config::Config;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::http::{Method, Origin, Request, Response};
use crate::network::Network;
use futures_util::future::try_join_all;
use semver::Version;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a worker version needs to know about the site
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub origin: Origin,
    pub scope: String,
    pub generations: Generations,
    pub static_assets: Vec<String>,
    pub offline_fallback: String,
    pub notifications: NotificationsConfig,
}

impl WorkerSettings {
    /// Settings for the configured version
    pub fn from_config(config: &Config) -> ShellCacheResult<Self> {
        Self::for_version(config, &config.site.version)
    }

    /// Settings for a specific version, e.g. the one still active while a
    /// newer configured version waits
    pub fn for_version(config: &Config, version: &Version) -> ShellCacheResult<Self> {
        Ok(Self {
            origin: Origin::parse(&config.site.origin)?,
            scope: config.site.scope.clone(),
            generations: Generations::new(&config.site.name, version),
            static_assets: config.precache.assets.clone(),
            offline_fallback: config.site.offline_fallback.clone(),
            notifications: config.notifications.clone(),
        })
    }

    pub fn version(&self) -> &Version {
        self.generations.version()
    }
}

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Static partition that now holds the shell
    pub partition: String,
    pub assets: usize,
    /// The version may activate without waiting for open pages to close
    pub skip_waiting: bool,
}

/// Result of a successful activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateOutcome {
    /// Stale partitions that were deleted
    pub deleted: Vec<String>,
    /// The version takes control of open pages immediately
    pub claim_clients: bool,
}

/// Why a request was left to the network untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    /// Only GET is intercepted; mutating requests must reach the server once
    Method(Method),
    CrossOrigin,
    OutOfScope,
}

impl fmt::Display for BypassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(method) => write!(f, "{} is not intercepted", method),
            Self::CrossOrigin => write!(f, "cross-origin"),
            Self::OutOfScope => write!(f, "outside registration scope"),
        }
    }
}

/// How a fetch event was answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host forwards the request unmodified
    Bypass(BypassReason),
    /// Served from cache storage without touching the network
    Cache(Response),
    /// Served from the network; `cached` if a copy went to the dynamic partition
    Network { response: Response, cached: bool },
    /// Network unreachable; navigation answered with the fallback document
    Offline(Response),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Bypass(_) => None,
            Self::Cache(response) | Self::Offline(response) => Some(response),
            Self::Network { response, .. } => Some(response),
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Bypass(_) => None,
            Self::Cache(response) | Self::Offline(response) => Some(response),
            Self::Network { response, .. } => Some(response),
        }
    }

    /// Short label for display
    pub fn source(&self) -> &'static str {
        match self {
            Self::Bypass(_) => "bypass",
            Self::Cache(_) => "cache",
            Self::Network { cached: true, .. } => "network+cached",
            Self::Network { cached: false, .. } => "network",
            Self::Offline(_) => "offline",
        }
    }
}

/// One worker version and its lifecycle
pub struct CacheManager {
    settings: WorkerSettings,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: WorkerState,
}

impl CacheManager {
    /// A freshly started worker that has not installed yet
    pub fn new(
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self::resume(settings, storage, network, WorkerState::Uninstalled)
    }

    /// A worker restarted by the host in a state it already reached
    pub fn resume(
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        state: WorkerState,
    ) -> Self {
        Self {
            settings,
            storage,
            network,
            state,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    fn expect_state(&self, expected: WorkerState) -> ShellCacheResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ShellCacheError::InvalidState {
                expected: expected.to_string(),
                actual: self.state.to_string(),
            })
        }
    }

    fn ensure_active(&self) -> ShellCacheResult<()> {
        if self.state.can_serve_fetch() {
            return Ok(());
        }
        Err(ShellCacheError::InvalidState {
            expected: WorkerState::Active.to_string(),
            actual: self.state.to_string(),
        })
    }

    /// Handle the install event
    pub async fn on_install(&mut self) -> ShellCacheResult<InstallOutcome> {
        self.on_install_with(&|_| {}).await
    }

    /// Handle the install event, calling `on_cached` as each asset arrives
    pub async fn on_install_with(
        &mut self,
        on_cached: &(dyn Fn(&str) + Send + Sync),
    ) -> ShellCacheResult<InstallOutcome> {
        self.expect_state(WorkerState::Uninstalled)?;
        self.state = WorkerState::Installing;
        info!("Installing version {}", self.settings.version());

        match self.precache(on_cached).await {
            Ok(assets) => {
                self.state = WorkerState::Installed;
                let partition = self.settings.generations.static_name();
                info!("Cached {} static assets in {}", assets, partition);
                Ok(InstallOutcome {
                    partition,
                    assets,
                    skip_waiting: true,
                })
            }
            Err(e) => {
                self.state = WorkerState::Redundant;
                warn!("Install of version {} failed: {}", self.settings.version(), e);
                Err(e)
            }
        }
    }

    /// Fetch every static asset, then store them; nothing is written unless
    /// every fetch succeeded
    async fn precache(&self, on_cached: &(dyn Fn(&str) + Send + Sync)) -> ShellCacheResult<usize> {
        let origin = &self.settings.origin;
        let requests = self
            .settings
            .static_assets
            .iter()
            .map(|path| {
                let url = origin.resolve(path).map_err(|e| ShellCacheError::InstallFailed {
                    asset: path.clone(),
                    reason: e.to_string(),
                })?;
                Ok((path.as_str(), Request::get(url)))
            })
            .collect::<ShellCacheResult<Vec<_>>>()?;

        let fetched = try_join_all(requests.into_iter().map(|(path, request)| async move {
            let response = self.network.fetch(&request).await.map_err(|e| {
                ShellCacheError::InstallFailed {
                    asset: path.to_string(),
                    reason: e.to_string(),
                }
            })?;
            if !response.ok() {
                return Err(ShellCacheError::InstallFailed {
                    asset: path.to_string(),
                    reason: format!("HTTP {}", response.status),
                });
            }
            on_cached(path);
            Ok::<_, ShellCacheError>((request, response))
        }))
        .await?;

        // A forced reinstall writes into the partition the active version
        // may be serving from; only a partition created here is rolled back.
        let name = self.settings.generations.static_name();
        let existed = self.storage.has(&name).await?;
        self.storage.open(&name).await?;
        for (request, response) in &fetched {
            if let Err(e) = self.storage.put(&name, request, response).await {
                if existed {
                    warn!("Keeping existing partition {} after failed write", name);
                } else if let Err(cleanup) = self.storage.delete(&name).await {
                    warn!("Failed to remove partial partition {}: {}", name, cleanup);
                }
                return Err(e);
            }
        }

        Ok(fetched.len())
    }

    /// Handle the activate event
    pub async fn on_activate(&mut self) -> ShellCacheResult<ActivateOutcome> {
        self.expect_state(WorkerState::Installed)?;
        self.state = WorkerState::Activating;
        info!("Activating version {}", self.settings.version());

        match self.prune().await {
            Ok(deleted) => {
                self.state = WorkerState::Active;
                Ok(ActivateOutcome {
                    deleted,
                    claim_clients: true,
                })
            }
            Err(e) => {
                self.state = WorkerState::Installed;
                Err(e)
            }
        }
    }

    async fn prune(&self) -> ShellCacheResult<Vec<String>> {
        let mut deleted = vec![];
        for name in self.storage.keys().await? {
            if self.settings.generations.is_current(&name) {
                continue;
            }
            info!("Deleting old cache: {}", name);
            self.storage.delete(&name).await?;
            deleted.push(name);
        }
        Ok(deleted)
    }

    fn bypass_reason(&self, request: &Request) -> Option<BypassReason> {
        if request.method != Method::Get {
            return Some(BypassReason::Method(request.method));
        }
        if !self.settings.origin.contains(&request.url) {
            return Some(BypassReason::CrossOrigin);
        }
        if !request.url.path().starts_with(&self.settings.scope) {
            return Some(BypassReason::OutOfScope);
        }
        None
    }

    /// Handle a fetch event
    pub async fn on_fetch(&self, request: &Request) -> ShellCacheResult<FetchOutcome> {
        self.ensure_active()?;

        if let Some(reason) = self.bypass_reason(request) {
            debug!("Bypassing {} {}: {}", request.method, request.url, reason);
            return Ok(FetchOutcome::Bypass(reason));
        }

        if let Some(cached) = self.storage.match_any(request).await? {
            debug!("Serving from cache: {}", request.url);
            return Ok(FetchOutcome::Cache(cached));
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if !response.is_cacheable() {
                    debug!(
                        "Not caching {} (status {}, {}, redirected: {})",
                        request.url, response.status, response.kind, response.redirected
                    );
                    return Ok(FetchOutcome::Network {
                        response,
                        cached: false,
                    });
                }

                let dynamic = self.settings.generations.dynamic_name();
                self.storage.put(&dynamic, request, &response).await?;
                Ok(FetchOutcome::Network {
                    response,
                    cached: true,
                })
            }
            Err(e) if e.is_network() && request.is_navigation() => {
                let fallback = Request::get(self.settings.origin.resolve(&self.settings.offline_fallback)?);
                match self.storage.match_any(&fallback).await? {
                    Some(page) => {
                        warn!("Offline, serving {} for {}", fallback.url, request.url);
                        Ok(FetchOutcome::Offline(page))
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}
