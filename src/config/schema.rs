//! Configuration schema for shellcache
//!
//! Configuration is stored at `~/.config/shellcache/config.toml`

use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Site identity, origin and version
    pub site: SiteConfig,

    /// Application shell precached at install
    pub precache: PrecacheConfig,

    /// Cache storage settings
    pub storage: StorageConfig,

    /// Network adapter settings
    pub network: NetworkConfig,

    /// Push notification template
    pub notifications: NotificationsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append lifecycle events to the journal
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            journal: true,
        }
    }
}

/// Site identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Prefix for cache generation names
    pub name: String,

    /// Deployed version, embedded in cache generation names
    pub version: Version,

    /// Origin the worker is registered for (scheme://host[:port])
    pub origin: String,

    /// Registration scope, a path prefix at the origin
    pub scope: String,

    /// Script path the page registers
    pub script_path: String,

    /// Document served to navigations when offline
    pub offline_fallback: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "jeressar".to_string(),
            version: Version::new(1, 0, 0),
            origin: "http://localhost:8080".to_string(),
            scope: "/".to_string(),
            script_path: "/sw.js".to_string(),
            offline_fallback: "/index.html".to_string(),
        }
    }
}

/// Static asset list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecacheConfig {
    /// Root-relative paths fetched and stored at install
    pub assets: Vec<String>,
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            assets: [
                "/",
                "/index.html",
                "/about.html",
                "/academics.html",
                "/admissions.html",
                "/student-life.html",
                "/news.html",
                "/contact.html",
                "/main.min.js",
                "/manifest.json",
                "./resources/school-crest.png",
                "./resources/hero-education.jpg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Cache storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding cache partitions (defaults to `<state-dir>/caches`)
    pub path: Option<PathBuf>,
}

/// Network adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Global request timeout in seconds (0 = disabled)
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            user_agent: format!("shellcache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Push notification template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Notification title
    pub title: String,

    /// Body used when the push carries no payload
    pub body: String,

    /// Icon path
    pub icon: String,

    /// Badge path
    pub badge: String,

    /// Vibration pattern in milliseconds
    pub vibrate: Vec<u32>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            title: "Jeressar High School".to_string(),
            body: "New update from Jeressar High School".to_string(),
            icon: "./resources/school-crest.png".to_string(),
            badge: "./resources/school-crest.png".to_string(),
            vibrate: vec![100, 50, 100],
        }
    }
}
