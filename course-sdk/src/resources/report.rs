//! Report resource client
//!
//! Posts `{task, apikey, answer}` to `/report` and decodes the verdict.

use crate::client::HttpClient;
use crate::error::{SdkError, SdkResult};
use async_trait::async_trait;
use course_core::{Answer, Grader, ReportEnvelope, ReportResponse};
use std::sync::Arc;
use tracing::{info, warn};

/// Client for answer submission (the Submitter)
#[derive(Debug, Clone)]
pub struct ReportClient {
    client: Arc<HttpClient>,
    path: String,
}

impl ReportClient {
    /// Create a new report client posting to `/report`
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            path: "/report".to_string(),
        }
    }

    /// Post to a different endpoint (absolute URL or path)
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Build the envelope for `task` using the configured API key
    pub fn envelope(&self, task: &str, answer: Answer) -> SdkResult<ReportEnvelope> {
        let key = self.client.config().require_api_key()?.clone();
        Ok(ReportEnvelope::new(task, key, answer)?)
    }

    /// Submit an answer. Rejections come back as `Ok` with a non-zero code.
    pub async fn submit(&self, task: &str, answer: Answer) -> SdkResult<ReportResponse> {
        let envelope = self.envelope(task, answer)?;
        self.submit_envelope(&envelope).await
    }

    pub async fn submit_envelope(&self, envelope: &ReportEnvelope) -> SdkResult<ReportResponse> {
        info!(task = %envelope.task, "Submitting answer");
        let raw = self.client.post_raw(&self.path, envelope).await?;

        // Rejections arrive with 4xx statuses but a normal body.
        match ReportResponse::parse(&raw.body) {
            Ok(response) => {
                if response.is_accepted() {
                    info!(task = %envelope.task, message = %response.message_text(), "Answer accepted");
                } else {
                    warn!(
                        task = %envelope.task,
                        code = ?response.code,
                        message = %response.message_text(),
                        "Answer rejected"
                    );
                }
                Ok(response)
            }
            Err(_) if !raw.is_success() => Err(SdkError::from_response(raw.status, &raw.body)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Grader for ReportClient {
    async fn grade(&self, task: &str, answer: Answer) -> course_core::Result<ReportResponse> {
        Ok(self.submit(task, answer).await?)
    }
}
