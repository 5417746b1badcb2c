//! Course SDK
//!
//! Clients for the course task server (task data, report, lookup APIs,
//! challenge endpoint) and for an OpenAI-compatible model API.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use course_core::{Answer, ApiKey};
//! use course_sdk::{CourseClient, SdkConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SdkConfig::default().with_api_key(ApiKey::new("your-key")?);
//!     let client = CourseClient::new(config)?;
//!
//!     let text = client.data().text("cenzura.txt").await?;
//!     let response = client.report().submit("CENZURA", Answer::from(text)).await?;
//!     println!("{}", response.message_text());
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! A rejected answer is not an error: [`ReportClient::submit`] returns the
//! decoded [`course_core::ReportResponse`] for accepted and rejected answers
//! alike. [`SdkError`] covers transport, configuration and decoding failures.

#![deny(unsafe_code)]

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod resources;

pub use cache::FileCache;
pub use client::{HttpClient, RawResponse};
pub use config::{
    AuthConfig, LlmConfig, SdkConfig, DEFAULT_BASE_URL, DEFAULT_LLM_API_BASE, DEFAULT_MODEL,
    DEFAULT_TRANSCRIPTION_MODEL,
};
pub use error::{SdkError, SdkResult};

pub use resources::llm::{
    image_data_url, ChatMessage, ChatOptions, ContentPart, ImageUrl, MessageContent, Role,
    TokenUsage,
};
pub use resources::{ChallengeClient, DataClient, LlmClient, LookupClient, ReportClient};

use std::sync::Arc;

/// Client for the course task server.
///
/// All sub-clients share one [`HttpClient`] and therefore one configuration.
#[derive(Debug, Clone)]
pub struct CourseClient {
    http_client: Arc<HttpClient>,
    data: DataClient,
    report: ReportClient,
    lookup: LookupClient,
}

impl CourseClient {
    /// Create a new client with the given configuration.
    pub fn new(config: SdkConfig) -> SdkResult<Self> {
        let http_client = Arc::new(HttpClient::new(config)?);

        Ok(Self {
            data: DataClient::new(Arc::clone(&http_client)),
            report: ReportClient::new(Arc::clone(&http_client)),
            lookup: LookupClient::new(Arc::clone(&http_client)),
            http_client,
        })
    }

    /// Task data downloads.
    pub fn data(&self) -> &DataClient {
        &self.data
    }

    /// Answer submission.
    pub fn report(&self) -> &ReportClient {
        &self.report
    }

    /// `people`, `places`, `gps` and `apidb`.
    pub fn lookup(&self) -> &LookupClient {
        &self.lookup
    }

    /// A challenge client for `endpoint` (absolute URL or path).
    pub fn challenge(&self, endpoint: impl Into<String>) -> ChallengeClient {
        ChallengeClient::new(Arc::clone(&self.http_client), endpoint)
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    pub fn base_url(&self) -> &str {
        &self.http_client.config().base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::ApiKey;

    #[test]
    fn test_client_new() {
        let config = SdkConfig::new("https://centrala.example.com")
            .with_api_key(ApiKey::new("test-key").unwrap());
        let client = CourseClient::new(config).unwrap();
        assert_eq!(client.base_url(), "https://centrala.example.com");
        assert_eq!(
            client.data().url("notes.json").unwrap(),
            "https://centrala.example.com/data/test-key/notes.json"
        );
    }

    #[test]
    fn test_client_rejects_bad_url() {
        assert!(CourseClient::new(SdkConfig::new("::")).is_err());
    }
}
