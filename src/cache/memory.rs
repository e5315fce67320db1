//! In-process cache storage
//!
//! Partitions are kept in creation order, which is the order `match_any`
//! searches them in.

use crate::cache::CacheStorage;
use crate::error::ShellCacheResult;
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Partition {
    name: String,
    entries: HashMap<String, Response>,
}

/// Cache storage held in memory, lost when the process exits
#[derive(Default)]
pub struct MemoryCacheStorage {
    partitions: RwLock<Vec<Partition>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> ShellCacheResult<()> {
        let mut partitions = self.partitions.write().await;
        if !partitions.iter().any(|p| p.name == name) {
            partitions.push(Partition {
                name: name.to_string(),
                entries: HashMap::new(),
            });
        }
        Ok(())
    }

    async fn keys(&self) -> ShellCacheResult<Vec<String>> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().map(|p| p.name.clone()).collect())
    }

    async fn has(&self, name: &str) -> ShellCacheResult<bool> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().any(|p| p.name == name))
    }

    async fn delete(&self, name: &str) -> ShellCacheResult<bool> {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|p| p.name != name);
        Ok(partitions.len() != before)
    }

    async fn put(
        &self,
        name: &str,
        request: &Request,
        response: &Response,
    ) -> ShellCacheResult<()> {
        let mut partitions = self.partitions.write().await;
        let index = match partitions.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                partitions.push(Partition {
                    name: name.to_string(),
                    entries: HashMap::new(),
                });
                partitions.len() - 1
            }
        };
        partitions[index]
            .entries
            .insert(request.cache_key(), response.clone());
        Ok(())
    }

    async fn match_in(
        &self,
        name: &str,
        request: &Request,
    ) -> ShellCacheResult<Option<Response>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.entries.get(&request.cache_key()))
            .cloned())
    }

    async fn entries(&self, name: &str) -> ShellCacheResult<Vec<String>> {
        let partitions = self.partitions.read().await;
        let mut keys: Vec<String> = partitions
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str) -> Request {
        Request::get(format!("http://localhost:8080{}", path).parse().unwrap())
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let storage = MemoryCacheStorage::new();
        storage.open("a").await.unwrap();
        storage.open("a").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn put_and_match() {
        let storage = MemoryCacheStorage::new();
        storage
            .put("a", &request("/index.html"), &Response::new(200, "home"))
            .await
            .unwrap();

        let hit = storage.match_in("a", &request("/index.html")).await.unwrap();
        assert_eq!(hit.unwrap().body, b"home");
        assert!(storage
            .match_in("a", &request("/about.html"))
            .await
            .unwrap()
            .is_none());
        assert!(storage
            .match_in("b", &request("/index.html"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn match_any_searches_in_creation_order() {
        let storage = MemoryCacheStorage::new();
        storage
            .put("first", &request("/"), &Response::new(200, "one"))
            .await
            .unwrap();
        storage
            .put("second", &request("/"), &Response::new(200, "two"))
            .await
            .unwrap();

        let hit = storage.match_any(&request("/")).await.unwrap().unwrap();
        assert_eq!(hit.body, b"one");
    }

    #[tokio::test]
    async fn put_replaces_existing_entry() {
        let storage = MemoryCacheStorage::new();
        storage
            .put("a", &request("/"), &Response::new(200, "old"))
            .await
            .unwrap();
        storage
            .put("a", &request("/"), &Response::new(200, "new"))
            .await
            .unwrap();

        assert_eq!(storage.entries("a").await.unwrap().len(), 1);
        let hit = storage.match_in("a", &request("/")).await.unwrap().unwrap();
        assert_eq!(hit.body, b"new");
    }

    #[tokio::test]
    async fn delete_partition() {
        let storage = MemoryCacheStorage::new();
        storage.open("a").await.unwrap();

        assert!(storage.delete("a").await.unwrap());
        assert!(!storage.delete("a").await.unwrap());
        assert!(!storage.has("a").await.unwrap());
    }
}
