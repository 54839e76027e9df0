//! On-disk cache storage
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<hex(bucket name)>/<sha256(method url)>.json   entry metadata
//! <root>/<hex(bucket name)>/<sha256(method url)>.body   raw response body
//! ```
//!
//! Bucket names are hex encoded so any generation identifier maps to a
//! valid directory name. Entries are written to a temp file and renamed
//! into place; the body is written before its metadata, so a crash never
//! leaves metadata pointing at a missing body.

use crate::cache::entry::{CachedResponse, RequestKey};
use crate::cache::storage::{CacheBucket, CacheStorage};
use crate::error::{SiteCacheError, SiteCacheResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Metadata stored next to each body file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    method: String,
    url: String,
    status: u16,
    headers: Vec<(String, String)>,
    body_sha256: String,
    body_len: u64,
    stored_at: DateTime<Utc>,
}

/// Storage rooted at a directory
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, name: &str) -> PathBuf {
        self.root.join(hex::encode(name.as_bytes()))
    }

    fn decode_name(dir_name: &str) -> Option<String> {
        let bytes = hex::decode(dir_name).ok()?;
        String::from_utf8(bytes).ok()
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn bucket_names(&self) -> SiteCacheResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(SiteCacheError::io(
                    format!("reading cache root {}", self.root.display()),
                    e,
                ))
            }
        };

        let mut names = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SiteCacheError::io("reading cache root entry", e))?
        {
            let file_type = entry.file_type().await.map_err(|e| {
                SiteCacheError::io(format!("inspecting {}", entry.path().display()), e)
            })?;
            if !file_type.is_dir() {
                continue;
            }
            match entry.file_name().to_str().and_then(Self::decode_name) {
                Some(name) => names.push(name),
                None => debug!("Skipping foreign directory {}", entry.path().display()),
            }
        }

        names.sort();
        Ok(names)
    }

    async fn open(&self, name: &str) -> SiteCacheResult<Arc<dyn CacheBucket>> {
        let dir = self.bucket_dir(name);
        fs::create_dir_all(&dir).await.map_err(|e| {
            SiteCacheError::io(format!("creating cache bucket {}", dir.display()), e)
        })?;

        Ok(Arc::new(DiskBucket {
            name: name.to_string(),
            dir,
        }))
    }

    async fn bucket(&self, name: &str) -> SiteCacheResult<Option<Arc<dyn CacheBucket>>> {
        let dir = self.bucket_dir(name);
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SiteCacheError::io(
                    format!("opening cache bucket {}", dir.display()),
                    e,
                ))
            }
        }

        Ok(Some(Arc::new(DiskBucket {
            name: name.to_string(),
            dir,
        })))
    }

    async fn delete(&self, name: &str) -> SiteCacheResult<bool> {
        let dir = self.bucket_dir(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SiteCacheError::BucketDelete {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}

/// Bucket backed by one directory
#[derive(Debug)]
pub struct DiskBucket {
    name: String,
    dir: PathBuf,
}

impl DiskBucket {
    fn meta_path(&self, key: &RequestKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.digest()))
    }

    fn body_path(&self, key: &RequestKey) -> PathBuf {
        self.dir.join(format!("{}.body", key.digest()))
    }

    async fn read_meta(path: &Path) -> SiteCacheResult<Option<EntryMeta>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SiteCacheError::io(
                    format!("reading cache entry {}", path.display()),
                    e,
                ))
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SiteCacheError::EntryCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

/// Write a file atomically via a sibling temp file
pub(crate) async fn write_atomic(path: &Path, content: &[u8]) -> SiteCacheResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, content)
        .await
        .map_err(|e| SiteCacheError::io(format!("writing {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| SiteCacheError::io(format!("renaming into {}", path.display()), e))
}

#[async_trait]
impl CacheBucket for DiskBucket {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &RequestKey) -> SiteCacheResult<Option<CachedResponse>> {
        let meta_path = self.meta_path(key);
        let Some(meta) = Self::read_meta(&meta_path).await? else {
            return Ok(None);
        };

        let body_path = self.body_path(key);
        let body = fs::read(&body_path)
            .await
            .map_err(|e| SiteCacheError::io(format!("reading {}", body_path.display()), e))?;

        let response = CachedResponse {
            status: meta.status,
            headers: meta.headers,
            body,
        };

        if response.body_digest() != meta.body_sha256 {
            return Err(SiteCacheError::EntryCorrupt {
                path: body_path,
                reason: "body does not match recorded digest".to_string(),
            });
        }

        Ok(Some(response))
    }

    async fn put(&self, key: RequestKey, response: CachedResponse) -> SiteCacheResult<()> {
        let meta = EntryMeta {
            method: key.method.clone(),
            url: key.url.clone(),
            status: response.status,
            headers: response.headers.clone(),
            body_sha256: response.body_digest(),
            body_len: response.body.len() as u64,
            stored_at: Utc::now(),
        };

        write_atomic(&self.body_path(&key), &response.body).await?;
        let json = serde_json::to_vec_pretty(&meta)?;
        write_atomic(&self.meta_path(&key), &json).await?;

        debug!("Stored {} in {}", key, self.name);
        Ok(())
    }

    async fn keys(&self) -> SiteCacheResult<Vec<RequestKey>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(SiteCacheError::io(
                    format!("reading cache bucket {}", self.dir.display()),
                    e,
                ))
            }
        };

        let mut keys = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SiteCacheError::io("reading cache bucket entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(meta) = Self::read_meta(&path).await? {
                    keys.push(RequestKey {
                        method: meta.method,
                        url: meta.url,
                    });
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
