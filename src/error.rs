//! Error types for shellcache
//!
//! All modules use `ShellCacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shellcache operations
pub type ShellCacheResult<T> = Result<T, ShellCacheError>;

/// All errors that can occur in shellcache
#[derive(Error, Debug)]
pub enum ShellCacheError {
    // Lifecycle errors
    #[error("Install failed: could not precache {asset}: {reason}")]
    InstallFailed { asset: String, reason: String },

    #[error("Version {0} is not installed")]
    NotInstalled(String),

    #[error("No active service worker for {0}")]
    NoActiveWorker(String),

    #[error("Invalid worker state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    // Network errors
    #[error("Network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Cache storage errors
    #[error("Cache storage error in {partition}: {reason}")]
    Storage { partition: String, reason: String },

    #[error("Invalid cache partition name: {0}")]
    PartitionNameInvalid(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShellCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage error for a partition
    pub fn storage(partition: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            partition: partition.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from the network rather than local state
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InstallFailed { .. } => {
                Some("Fix the missing asset, then run: shellcache install")
            }
            Self::NotInstalled(_) => Some("Run: shellcache install"),
            Self::NoActiveWorker(_) => Some("Run: shellcache install && shellcache activate"),
            Self::ConfigInvalid { .. } => Some("Run: shellcache config init --force"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ShellCacheError::InstallFailed {
            asset: "/index.html".to_string(),
            reason: "HTTP 404".to_string(),
        };
        assert!(err.to_string().contains("could not precache /index.html"));
    }

    #[test]
    fn error_hint() {
        let err = ShellCacheError::NotInstalled("1.0.0".to_string());
        assert_eq!(err.hint(), Some("Run: shellcache install"));
        assert_eq!(ShellCacheError::Internal("x".to_string()).hint(), None);
    }

    #[test]
    fn network_classification() {
        assert!(ShellCacheError::network("http://a/", "refused").is_network());
        assert!(!ShellCacheError::storage("p", "full").is_network());
    }
}
