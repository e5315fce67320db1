//! Cache generation identifiers
//!
//! Every deployed version owns two partitions, named
//! `<site>-static-v<version>` and `<site>-dynamic-v<version>`. Bumping the
//! version yields fresh names, so a new deployment never writes into the
//! previous one's partitions.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two logical partitions of a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    /// Application shell, filled at install
    Static,
    /// Responses stored opportunistically while serving fetches
    Dynamic,
}

impl PartitionKind {
    fn all() -> &'static [Self] {
        &[Self::Static, Self::Dynamic]
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Version-qualified partition name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerationId {
    pub site: String,
    pub kind: PartitionKind,
    pub version: Version,
}

impl GenerationId {
    pub fn new(site: impl Into<String>, kind: PartitionKind, version: Version) -> Self {
        Self {
            site: site.into(),
            kind,
            version,
        }
    }

    /// Partition name in cache storage
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Parse a partition name back into an identifier.
    ///
    /// Returns `None` for names this crate did not produce.
    pub fn parse(name: &str) -> Option<Self> {
        PartitionKind::all().iter().find_map(|kind| {
            let marker = format!("-{}-v", kind);
            let (site, version) = name.split_once(&marker)?;
            if site.is_empty() {
                return None;
            }
            let version = Version::parse(version).ok()?;
            Some(Self::new(site, *kind, version))
        })
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-v{}", self.site, self.kind, self.version)
    }
}

/// The current static and dynamic identifiers of one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generations {
    pub static_id: GenerationId,
    pub dynamic_id: GenerationId,
}

impl Generations {
    pub fn new(site: &str, version: &Version) -> Self {
        Self {
            static_id: GenerationId::new(site, PartitionKind::Static, version.clone()),
            dynamic_id: GenerationId::new(site, PartitionKind::Dynamic, version.clone()),
        }
    }

    pub fn static_name(&self) -> String {
        self.static_id.name()
    }

    pub fn dynamic_name(&self) -> String {
        self.dynamic_id.name()
    }

    pub fn version(&self) -> &Version {
        &self.static_id.version
    }

    /// Whether `name` is one of this version's partitions
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_name() || name == self.dynamic_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_names() {
        let gens = Generations::new("jeressar", &Version::new(1, 0, 0));
        assert_eq!(gens.static_name(), "jeressar-static-v1.0.0");
        assert_eq!(gens.dynamic_name(), "jeressar-dynamic-v1.0.0");
    }

    #[test]
    fn parse_known_names() {
        let id = GenerationId::parse("jeressar-dynamic-v1.2.3").unwrap();
        assert_eq!(id.site, "jeressar");
        assert_eq!(id.kind, PartitionKind::Dynamic);
        assert_eq!(id.version, Version::new(1, 2, 3));
    }

    #[test]
    fn parse_prerelease_and_hyphenated_site() {
        let id = GenerationId::parse("st-marys-static-v2.0.0-beta.1").unwrap();
        assert_eq!(id.site, "st-marys");
        assert_eq!(id.kind, PartitionKind::Static);
        assert_eq!(id.version.to_string(), "2.0.0-beta.1");
    }

    #[test]
    fn parse_foreign_names() {
        assert!(GenerationId::parse("jeressar-school-v1.0.0").is_none());
        assert!(GenerationId::parse("-static-v1.0.0").is_none());
        assert!(GenerationId::parse("jeressar-static-vnext").is_none());
    }

    #[test]
    fn versions_do_not_collide() {
        let old = Generations::new("jeressar", &Version::new(1, 0, 0));
        let new = Generations::new("jeressar", &Version::new(1, 0, 1));
        assert!(!new.is_current(&old.static_name()));
        assert!(!new.is_current(&old.dynamic_name()));
        assert!(new.is_current(&new.dynamic_name()));
    }
}
