//! Worker lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Constructed, install not yet run
    Uninstalled,
    /// Precaching the application shell
    Installing,
    /// Shell cached, waiting to activate
    Installed,
    /// Pruning stale generations
    Activating,
    /// Serving fetch events
    Active,
    /// Install failed or superseded by a newer version
    Redundant,
}

impl WorkerState {
    /// Only an active worker receives fetch and push/sync events
    pub fn can_serve_fetch(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Redundant)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninstalled => write!(f, "uninstalled"),
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Activating => write!(f, "activating"),
            Self::Active => write!(f, "active"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}
