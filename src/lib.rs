//! sitecache - offline cache manager for static sites
//!
//! Precaches a fixed list of site assets into a generation-named cache
//! bucket, answers requests cache-first with a network fallback, and
//! removes every other generation's bucket on activation.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod journal;
pub mod lifecycle;
pub mod network;

pub use error::{SiteCacheError, SiteCacheResult};
