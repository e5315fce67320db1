//! Cache storage for the offline cache manager
//!
//! Storage is a map from partition name to a collection of request/response
//! entries. The manager only reads and writes through the `CacheStorage`
//! capability; it never keeps a private copy of an entry.
//!
//! # Partitions
//!
//! | Partition | Filled | Lifetime |
//! |-----------|--------|----------|
//! | `<site>-static-v<version>` | at install, all-or-nothing | until a newer version activates |
//! | `<site>-dynamic-v<version>` | on cacheable network responses | until a newer version activates |
//!
//! Anything else found in storage is stale and removed at activation.

pub mod disk;
pub mod generation;
pub mod memory;

pub use disk::DiskCacheStorage;
pub use generation::{GenerationId, Generations, PartitionKind};
pub use memory::MemoryCacheStorage;

use crate::error::ShellCacheResult;
use crate::http::{Request, Response};
use async_trait::async_trait;

/// Persistent cache storage shared by every worker version of an origin
///
/// Writes to different partitions never conflict. Writes to the same key
/// in the same partition are last-write-wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the partition if it does not exist yet
    async fn open(&self, name: &str) -> ShellCacheResult<()>;

    /// Names of all partitions
    async fn keys(&self) -> ShellCacheResult<Vec<String>>;

    /// Whether a partition exists
    async fn has(&self, name: &str) -> ShellCacheResult<bool>;

    /// Delete a partition and all its entries; `false` if it did not exist
    async fn delete(&self, name: &str) -> ShellCacheResult<bool>;

    /// Store a copy of `response` under `request`, creating the partition if needed
    async fn put(&self, name: &str, request: &Request, response: &Response)
        -> ShellCacheResult<()>;

    /// Look up a request in one partition
    async fn match_in(&self, name: &str, request: &Request)
        -> ShellCacheResult<Option<Response>>;

    /// Cache keys stored in a partition
    async fn entries(&self, name: &str) -> ShellCacheResult<Vec<String>>;

    /// Look up a request in every partition, in `keys()` order
    async fn match_any(&self, request: &Request) -> ShellCacheResult<Option<Response>> {
        for name in self.keys().await? {
            if let Some(response) = self.match_in(&name, request).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}
