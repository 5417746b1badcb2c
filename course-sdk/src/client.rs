//! HTTP client implementation
//!
//! The one place that talks HTTP: timeouts, optional retries, header
//! authentication, request/response logging and error mapping.

use crate::config::{AuthConfig, SdkConfig};
use crate::error::{SdkError, SdkResult};
use reqwest::multipart::Form;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Status and body of a response, returned whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP client for making API requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<SdkConfig>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: SdkConfig) -> SdkResult<Self> {
        config.validate()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        for (name, value) in &config.custom_headers {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::try_from(name.as_str()),
                header::HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, value);
            }
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(SdkError::NetworkError)?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Build the full URL for an endpoint. Absolute URLs pass through unchanged.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// GET and decode a JSON body
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> SdkResult<T> {
        let text = self.get_text(path).await?;
        serde_json::from_str(&text).map_err(SdkError::SerializationError)
    }

    /// GET a text body
    pub async fn get_text(&self, path: &str) -> SdkResult<String> {
        let response = self.execute_with_retry(Method::GET, path, |r| r).await?;
        let (status, text) = Self::read_text(response).await?;
        self.log_body(&text);
        self.ensure_success(status, text)
    }

    /// GET a binary body
    pub async fn get_bytes(&self, path: &str) -> SdkResult<Vec<u8>> {
        let response = self.execute_with_retry(Method::GET, path, |r| r).await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.map_err(SdkError::NetworkError)?;
            return Err(self.handle_error_response(status, &text));
        }
        let bytes = response.bytes().await.map_err(SdkError::NetworkError)?;
        debug!(bytes = bytes.len(), "Downloaded binary body");
        Ok(bytes.to_vec())
    }

    /// POST a JSON body and decode a JSON reply
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> SdkResult<T> {
        let (status, text) = self.send_json(path, body).await?;
        let text = self.ensure_success(status, text)?;
        serde_json::from_str(&text).map_err(SdkError::SerializationError)
    }

    /// POST a JSON body and return status and body without judging the status.
    ///
    /// The grading server answers rejected submissions with 4xx statuses and
    /// a regular JSON body, so callers need to see both.
    pub async fn post_raw<B: Serialize>(&self, path: &str, body: &B) -> SdkResult<RawResponse> {
        let (status, text) = self.send_json(path, body).await?;
        Ok(RawResponse {
            status: status.as_u16(),
            body: text,
        })
    }

    async fn send_json<B: Serialize>(&self, path: &str, body: &B) -> SdkResult<(StatusCode, String)> {
        let body_json = serde_json::to_string(body)?;
        if self.config.enable_logging {
            debug!("Request body: {}", body_json);
        }

        let response = self
            .execute_with_retry(Method::POST, path, |request| {
                request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body_json.clone())
            })
            .await?;

        let (status, text) = Self::read_text(response).await?;
        self.log_body(&text);
        Ok((status, text))
    }

    /// POST a multipart form. The form is rebuilt for every attempt.
    pub async fn post_multipart<T, F>(&self, path: &str, form: F) -> SdkResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> Form,
    {
        let response = self
            .execute_with_retry(Method::POST, path, |request| request.multipart(form()))
            .await?;

        let (status, text) = Self::read_text(response).await?;
        self.log_body(&text);
        let text = self.ensure_success(status, text)?;
        serde_json::from_str(&text).map_err(SdkError::SerializationError)
    }

    async fn read_text(response: Response) -> SdkResult<(StatusCode, String)> {
        let status = response.status();
        let text = response.text().await.map_err(SdkError::NetworkError)?;
        Ok((status, text))
    }

    fn log_body(&self, text: &str) {
        if self.config.enable_logging {
            debug!("Response body: {}", text);
        }
    }

    fn ensure_success(&self, status: StatusCode, text: String) -> SdkResult<String> {
        if status.is_success() {
            Ok(text)
        } else {
            Err(self.handle_error_response(status, &text))
        }
    }

    /// Execute a request with retry logic
    async fn execute_with_retry<F>(
        &self,
        method: Method,
        path: &str,
        prepare: F,
    ) -> SdkResult<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = self.url(path);

        let mut attempts = 0;
        let mut last_error: Option<SdkError> = None;
        let mut backoff = self.config.retry_initial_backoff;

        while attempts <= self.config.max_retries {
            if attempts > 0 {
                info!(
                    "Retrying request (attempt {}/{}), waiting {:?}",
                    attempts, self.config.max_retries, backoff
                );
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, self.config.retry_max_backoff);
            }

            let request = self.add_auth(self.client.request(method.clone(), &url));
            let request = prepare(request);

            if self.config.enable_logging {
                debug!("Request: {} {}", method, url);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS && attempts < self.config.max_retries {
                        let retry_after = response
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);

                        warn!("Rate limited, retry after {} seconds", retry_after);
                        last_error = Some(SdkError::RateLimited { retry_after });
                        backoff = Duration::from_secs(retry_after);
                        attempts += 1;
                        continue;
                    }

                    if status.is_server_error() && attempts < self.config.max_retries {
                        warn!("Server error {}, will retry", status);
                        last_error = Some(SdkError::ServerError(format!("Status: {}", status)));
                        attempts += 1;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    error!("Request to {} failed: {}", url, e);

                    if e.is_timeout() {
                        last_error = Some(SdkError::Timeout(self.config.timeout.as_secs()));
                    } else if e.is_connect() || e.is_request() {
                        last_error = Some(SdkError::NetworkError(e));
                    } else {
                        return Err(SdkError::NetworkError(e));
                    }

                    attempts += 1;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SdkError::Unknown("Request failed".to_string())))
    }

    /// Add authentication to a request
    fn add_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            AuthConfig::None => request,
            AuthConfig::BearerToken(token) => request.bearer_auth(token),
        }
    }

    /// Handle an error response
    fn handle_error_response(&self, status: StatusCode, body: &str) -> SdkError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => SdkError::RateLimited { retry_after: 60 },
            _ => SdkError::from_response(status.as_u16(), body),
        }
    }
}
