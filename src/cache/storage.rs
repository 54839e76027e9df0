//! Cache storage abstraction
//!
//! Stands in for the host's cache storage API so the lifecycle logic can run
//! against an in-memory store in tests and an on-disk store in the CLI.

use crate::cache::entry::{CachedResponse, RequestKey};
use crate::error::SiteCacheResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Named collection of cache buckets
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of every existing bucket, sorted
    async fn bucket_names(&self) -> SiteCacheResult<Vec<String>>;

    /// Open a bucket, creating it if absent
    async fn open(&self, name: &str) -> SiteCacheResult<Arc<dyn CacheBucket>>;

    /// Look up an existing bucket without creating it
    async fn bucket(&self, name: &str) -> SiteCacheResult<Option<Arc<dyn CacheBucket>>>;

    /// Delete a bucket and all its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> SiteCacheResult<bool>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}

/// A single bucket mapping request keys to responses
#[async_trait]
pub trait CacheBucket: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, key: &RequestKey) -> SiteCacheResult<Option<CachedResponse>>;

    /// Store a response, replacing any previous entry for the key
    async fn put(&self, key: RequestKey, response: CachedResponse) -> SiteCacheResult<()>;

    /// Keys of every stored entry, sorted
    async fn keys(&self) -> SiteCacheResult<Vec<RequestKey>>;
}
