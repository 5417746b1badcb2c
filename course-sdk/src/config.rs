//! SDK configuration
//!
//! One configuration struct per remote service, built once at start-up and
//! handed to the clients.

use crate::error::{SdkError, SdkResult};
use course_core::ApiKey;
use std::path::PathBuf;
use std::time::Duration;

/// Default address of the course task server.
pub const DEFAULT_BASE_URL: &str = "https://c3ntrala.ag3nts.org";

/// Default address of the OpenAI-compatible model API.
pub const DEFAULT_LLM_API_BASE: &str = "https://api.openai.com/v1";

pub const DEFAULT_MODEL: &str = "gpt-4o";

pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Configuration for the task server client
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Base URL for the API
    pub base_url: String,

    /// Course API key, sent in request bodies and data URLs
    pub api_key: Option<ApiKey>,

    /// Header authentication
    pub auth: AuthConfig,

    /// Request timeout
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Maximum number of transport retries (0 = fail on first error)
    pub max_retries: u32,

    /// Initial backoff duration for retries
    pub retry_initial_backoff: Duration,

    /// Maximum backoff duration for retries
    pub retry_max_backoff: Duration,

    /// User agent string
    pub user_agent: String,

    /// Enable request/response logging
    pub enable_logging: bool,

    /// Custom headers to add to all requests
    pub custom_headers: Vec<(String, String)>,

    /// Directory for cached downloads; `None` disables caching
    pub cache_dir: Option<PathBuf>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            auth: AuthConfig::None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 0,
            retry_initial_backoff: Duration::from_millis(100),
            retry_max_backoff: Duration::from_secs(30),
            user_agent: format!("course-sdk/{}", env!("CARGO_PKG_VERSION")),
            enable_logging: false,
            custom_headers: Vec::new(),
            cache_dir: None,
        }
    }
}

impl SdkConfig {
    /// Create a new configuration with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the authentication method
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Set the course API key
    pub fn with_api_key(mut self, api_key: ApiKey) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the retry backoff configuration
    pub fn with_retry_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.retry_initial_backoff = initial;
        self.retry_max_backoff = max;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable request/response logging
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    /// Add a custom header to all requests
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// The course API key, or a configuration error naming what is missing.
    pub fn require_api_key(&self) -> SdkResult<&ApiKey> {
        self.api_key.as_ref().ok_or_else(|| {
            SdkError::ConfigurationError(
                "course API key is not set (use --api-key or CENTRALA_API_KEY)".to_string(),
            )
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> SdkResult<()> {
        if self.base_url.is_empty() {
            return Err(SdkError::ConfigurationError(
                "Base URL cannot be empty".to_string(),
            ));
        }

        url::Url::parse(&self.base_url)?;

        if self.timeout.is_zero() {
            return Err(SdkError::ConfigurationError(
                "Timeout cannot be zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Header authentication
#[derive(Debug, Clone)]
pub enum AuthConfig {
    /// No authentication
    None,

    /// Bearer token authentication (model API keys)
    BearerToken(String),
}

/// Configuration for the OpenAI-compatible model API
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    /// Chat and vision model
    pub model: String,
    pub transcription_model: String,
    /// Language hint for transcription (ISO 639-1)
    pub transcription_language: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub enable_logging: bool,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_LLM_API_BASE.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            transcription_language: Some("pl".to_string()),
            timeout: Duration::from_secs(120),
            max_retries: 0,
            enable_logging: false,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(SdkError::ConfigurationError(
                "model API key is not set (use --openai-key or OPENAI_API_KEY)".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(SdkError::ConfigurationError(
                "model name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Transport settings for the underlying HTTP client.
    pub fn to_sdk_config(&self) -> SdkConfig {
        SdkConfig::new(self.api_base.clone())
            .with_auth(AuthConfig::BearerToken(self.api_key.clone()))
            .with_timeout(self.timeout)
            .with_max_retries(self.max_retries)
            .with_logging(self.enable_logging)
    }
}
