//! Immutable cache settings: generation identifier and precache manifest

use crate::cache::entry::{Request, RequestKey};
use crate::error::{SiteCacheError, SiteCacheResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Generation shipped with the blog
pub const DEFAULT_GENERATION: &str = "juliocastillodev-cache-v1";

/// Assets precached by the blog
pub const DEFAULT_PRECACHE: &[&str] = &[
    "/",
    "/assets/css/main.css",
    "/assets/img/gentle.webp",
    "/assets/img/hero-lit-html.webp",
    "/assets/img/lit-html-web-components.webp",
    "/assets/img/litelement-depth.webp",
    "/assets/img/litelement.webp",
    "/assets/icons/icon-192.png",
    "/assets/icons/icon-512.png",
];

/// Which buckets a fetch interception may answer from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchScope {
    /// Only the current generation's bucket
    #[default]
    Current,
    /// First hit across every bucket, in listing order
    Any,
}

impl fmt::Display for MatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// Settings the manager is constructed with. There is no mutation path.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    generation: String,
    origin: Url,
    manifest: Vec<String>,
    precache: Vec<Url>,
    match_scope: MatchScope,
}

impl CacheSettings {
    /// Validate and build settings.
    ///
    /// The origin must be http(s). Manifest entries must be root-relative
    /// paths and unique.
    pub fn new(
        generation: impl Into<String>,
        origin: Url,
        manifest: Vec<String>,
    ) -> SiteCacheResult<Self> {
        let generation = generation.into();
        if generation.trim().is_empty() {
            return Err(SiteCacheError::InvalidSettings(
                "generation must not be empty".to_string(),
            ));
        }

        if !matches!(origin.scheme(), "http" | "https") || origin.host().is_none() {
            return Err(SiteCacheError::InvalidUrl {
                url: origin.to_string(),
                reason: "origin must be an http(s) URL with a host".to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut precache = Vec::with_capacity(manifest.len());
        for entry in &manifest {
            if !entry.starts_with('/') || entry.starts_with("//") {
                return Err(SiteCacheError::InvalidSettings(format!(
                    "precache entry {entry:?} must be a root-relative path"
                )));
            }
            let url = origin.join(entry).map_err(|e| SiteCacheError::InvalidUrl {
                url: entry.clone(),
                reason: e.to_string(),
            })?;
            // Entries that differ only by fragment share one bucket key
            if !seen.insert(RequestKey::new("GET", &url)) {
                return Err(SiteCacheError::InvalidSettings(format!(
                    "duplicate precache entry {entry:?}"
                )));
            }
            precache.push(url);
        }

        Ok(Self {
            generation,
            origin,
            manifest,
            precache,
            match_scope: MatchScope::default(),
        })
    }

    pub fn with_match_scope(mut self, scope: MatchScope) -> Self {
        self.match_scope = scope;
        self
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    pub fn match_scope(&self) -> MatchScope {
        self.match_scope
    }

    /// GET requests for every manifest entry, in manifest order
    pub fn precache_requests(&self) -> Vec<Request> {
        self.precache.iter().cloned().map(Request::get).collect()
    }

    /// Resolve a path or absolute URL against the origin
    pub fn resolve(&self, target: &str) -> SiteCacheResult<Url> {
        self.origin
            .join(target)
            .map_err(|e| SiteCacheError::InvalidUrl {
                url: target.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn manifest_digest(&self) -> String {
        manifest_digest(&self.manifest)
    }
}

/// SHA256 of the manifest entries joined by newlines (first 12 hex chars)
pub fn manifest_digest(entries: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entries.join("\n").as_bytes());
    let hash = hex::encode(hasher.finalize());
    hash[..12].to_string()
}

/// File a manifest entry is served from in a built site directory.
///
/// Directory paths map to their `index.html`. Query strings are ignored.
pub fn deployed_path(site_root: &Path, entry: &str) -> PathBuf {
    let path = entry.split(['?', '#']).next().unwrap_or(entry);
    let relative = path.trim_start_matches('/');

    let mut file = site_root.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        file.push(segment);
    }
    if relative.is_empty() || relative.ends_with('/') {
        file.push("index.html");
    }
    file
}
