//! Task data resource client
//!
//! Downloads task payloads from `/data/<apikey>/<file>`, optionally through
//! the file cache.

use crate::cache::FileCache;
use crate::client::HttpClient;
use crate::error::{SdkError, SdkResult};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};

/// Client for task payload downloads (the Fetcher)
#[derive(Debug, Clone)]
pub struct DataClient {
    client: Arc<HttpClient>,
    cache: Option<FileCache>,
}

impl DataClient {
    /// Create a new data client; caching follows `SdkConfig::cache_dir`
    pub fn new(client: Arc<HttpClient>) -> Self {
        let cache = client.config().cache_dir.clone().map(FileCache::new);
        Self { client, cache }
    }

    /// Replace the cache (or disable it with `None`)
    pub fn with_cache(mut self, cache: Option<FileCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Location of a task file. Absolute URLs are used as given.
    pub fn url(&self, file: &str) -> SdkResult<String> {
        if file.starts_with("http://") || file.starts_with("https://") {
            return Ok(file.to_string());
        }
        let key = self.client.config().require_api_key()?;
        Ok(self.client.url(&format!(
            "/data/{}/{}",
            key.expose(),
            file.trim_start_matches('/')
        )))
    }

    /// Download a task file as bytes
    pub async fn bytes(&self, file: &str) -> SdkResult<Vec<u8>> {
        let url = self.url(file)?;
        info!(file, "Fetching task data");

        match &self.cache {
            Some(cache) => {
                let client = Arc::clone(&self.client);
                let fetch_url = url.clone();
                cache
                    .get_or_fetch(&url, || async move { client.get_bytes(&fetch_url).await })
                    .await
            }
            None => self.client.get_bytes(&url).await,
        }
    }

    /// Download a task file as UTF-8 text
    pub async fn text(&self, file: &str) -> SdkResult<String> {
        let bytes = self.bytes(file).await?;
        let text = String::from_utf8(bytes).map_err(|e| {
            SdkError::InvalidBody(format!("{} is not valid UTF-8: {}", file, e))
        })?;
        debug!(file, chars = text.len(), "Task text loaded");
        Ok(text)
    }

    /// Download and decode a JSON task file
    pub async fn json<T: DeserializeOwned>(&self, file: &str) -> SdkResult<T> {
        let text = self.text(file).await?;
        serde_json::from_str(&text).map_err(SdkError::SerializationError)
    }
}
