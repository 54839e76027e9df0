//! Cache buckets for offline asset serving
//!
//! A bucket is a named map from request key to stored response. Exactly one
//! bucket, named by the current generation identifier, is populated from the
//! precache manifest; buckets from older generations are swept on activation.
//!
//! # Backends
//!
//! | Backend | Type | Used by |
//! |---------|------|---------|
//! | memory | [`MemoryStorage`] | library users, tests |
//! | disk | [`DiskStorage`] | the `sitecache` CLI |

pub mod disk;
pub mod entry;
pub mod memory;
pub mod settings;
pub mod storage;

pub use disk::DiskStorage;
pub use entry::{CachedResponse, Request, RequestKey};
pub use memory::MemoryStorage;
pub use settings::{
    deployed_path, manifest_digest, CacheSettings, MatchScope, DEFAULT_GENERATION,
    DEFAULT_PRECACHE,
};
pub use storage::{CacheBucket, CacheStorage};
