//! File cache for downloads and paid model calls.
//!
//! Entries are never invalidated: once a key has a file, that file is the
//! answer until someone deletes it.

use crate::error::SdkResult;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the entry for `key`: the SHA-256 of the key, hex encoded.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(hex::encode(digest))
    }

    pub async fn get(&self, key: &str) -> SdkResult<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn put(&self, key: &str, bytes: &[u8]) -> SdkResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Return the cached entry for `key`, or run `fetch`, store and return its result.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> SdkResult<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SdkResult<Vec<u8>>>,
    {
        if let Some(bytes) = self.get(key).await? {
            debug!(key, "Cache hit");
            return Ok(bytes);
        }
        debug!(key, "Cache miss");
        let bytes = fetch().await?;
        self.put(key, &bytes).await?;
        Ok(bytes)
    }
}
