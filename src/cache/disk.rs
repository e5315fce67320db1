//! On-disk cache storage
//!
//! Each partition is a directory under the storage root. Each entry is a
//! single file named after the SHA-256 of its cache key: one line of JSON
//! metadata followed by the raw body. Entries are written to a temporary
//! file and renamed into place, so concurrent writers of the same key
//! resolve to whichever rename lands last.

use crate::cache::CacheStorage;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::http::{Request, Response, ResponseType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

const ENTRY_EXTENSION: &str = "entry";

/// Metadata line stored ahead of the body
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    status: u16,
    headers: BTreeMap<String, String>,
    kind: ResponseType,
    url: String,
    redirected: bool,
    stored_at: DateTime<Utc>,
}

impl EntryMeta {
    fn into_response(self, body: Vec<u8>) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body,
            kind: self.kind,
            url: self.url,
            redirected: self.redirected,
        }
    }
}

/// File name for a cache key: first 16 bytes of its SHA-256, hex encoded
fn entry_file_name(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{}.{}", hex::encode(&digest[..16]), ENTRY_EXTENSION)
}

fn encode_entry(meta: &EntryMeta, body: &[u8]) -> ShellCacheResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec(meta)?;
    bytes.push(b'\n');
    bytes.extend_from_slice(body);
    Ok(bytes)
}

fn decode_entry(path: &Path, bytes: Vec<u8>) -> ShellCacheResult<(EntryMeta, Vec<u8>)> {
    let split = bytes.iter().position(|b| *b == b'\n').ok_or_else(|| {
        ShellCacheError::storage(path.display().to_string(), "entry has no metadata line")
    })?;
    let meta: EntryMeta = serde_json::from_slice(&bytes[..split])?;
    let body = bytes[split + 1..].to_vec();
    Ok((meta, body))
}

/// Names that map to exactly one directory directly under the root.
///
/// Dot-prefixed names are reserved, which also keeps editor and tool
/// directories (`.git`, `.DS_Store`) out of `keys()`.
fn is_partition_name(name: &str) -> bool {
    !(name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains(".."))
}

/// Cache storage persisted under a directory
pub struct DiskCacheStorage {
    root: PathBuf,
}

impl DiskCacheStorage {
    /// Storage rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn partition_dir(&self, name: &str) -> ShellCacheResult<PathBuf> {
        if !is_partition_name(name) {
            return Err(ShellCacheError::PartitionNameInvalid(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    async fn read_entry(&self, path: &Path) -> ShellCacheResult<Option<(EntryMeta, Vec<u8>)>> {
        match fs::read(path).await {
            Ok(bytes) => decode_entry(path, bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ShellCacheError::io(
                format!("reading cache entry {}", path.display()),
                e,
            )),
        }
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> ShellCacheResult<()> {
        let dir = self.partition_dir(name)?;
        fs::create_dir_all(&dir).await.map_err(|e| {
            ShellCacheError::io(format!("creating cache partition {}", dir.display()), e)
        })
    }

    async fn keys(&self) -> ShellCacheResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(ShellCacheError::io("reading cache storage directory", e)),
        };

        let mut names = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellCacheError::io("reading cache storage entry", e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) if is_partition_name(name) => names.push(name.to_string()),
                _ => debug!("Skipping {} in cache storage", entry.path().display()),
            }
        }

        names.sort();
        Ok(names)
    }

    async fn has(&self, name: &str) -> ShellCacheResult<bool> {
        let dir = self.partition_dir(name)?;
        Ok(fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false))
    }

    async fn delete(&self, name: &str) -> ShellCacheResult<bool> {
        let dir = self.partition_dir(name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Deleted cache partition {}", dir.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ShellCacheError::io(
                format!("deleting cache partition {}", dir.display()),
                e,
            )),
        }
    }

    async fn put(
        &self,
        name: &str,
        request: &Request,
        response: &Response,
    ) -> ShellCacheResult<()> {
        self.open(name).await?;
        let dir = self.partition_dir(name)?;

        let key = request.cache_key();
        let meta = EntryMeta {
            key: key.clone(),
            status: response.status,
            headers: response.headers.clone(),
            kind: response.kind,
            url: response.url.clone(),
            redirected: response.redirected,
            stored_at: Utc::now(),
        };
        let bytes = encode_entry(&meta, &response.body)?;

        let path = dir.join(entry_file_name(&key));
        let tmp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| ShellCacheError::io(format!("writing cache entry {}", tmp.display()), e))?;
        fs::rename(&tmp, &path).await.map_err(|e| {
            ShellCacheError::io(format!("committing cache entry {}", path.display()), e)
        })?;

        debug!("Stored {} in {}", key, name);
        Ok(())
    }

    async fn match_in(
        &self,
        name: &str,
        request: &Request,
    ) -> ShellCacheResult<Option<Response>> {
        let key = request.cache_key();
        let path = self.partition_dir(name)?.join(entry_file_name(&key));

        Ok(self
            .read_entry(&path)
            .await?
            .filter(|(meta, _)| meta.key == key)
            .map(|(meta, body)| meta.into_response(body)))
    }

    async fn entries(&self, name: &str) -> ShellCacheResult<Vec<String>> {
        let dir = self.partition_dir(name)?;
        let mut dir_entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(ShellCacheError::io(
                    format!("reading cache partition {}", dir.display()),
                    e,
                ))
            }
        };

        let mut keys = vec![];
        while let Some(entry) = dir_entries
            .next_entry()
            .await
            .map_err(|e| ShellCacheError::io("reading cache partition entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                if let Some((meta, _)) = self.read_entry(&path).await? {
                    keys.push(meta.key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}
