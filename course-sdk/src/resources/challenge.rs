//! Challenge resource client
//!
//! The three-round exchange `{password}` → `{sign}` → signed answer, plus
//! the sub-task downloads in between.

use crate::client::HttpClient;
use crate::error::SdkResult;
use course_core::{
    ChallengeGrant, ChallengeReply, ChallengeSubmission, ChallengeTask, PasswordRequest,
    ReportResponse, SignRequest,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Client for one challenge endpoint
#[derive(Debug, Clone)]
pub struct ChallengeClient {
    client: Arc<HttpClient>,
    endpoint: String,
}

impl ChallengeClient {
    /// Create a client for `endpoint` (absolute URL or path on the base URL)
    pub fn new(client: Arc<HttpClient>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Round one: trade the password for a sign hash
    pub async fn sign(&self, password: &str) -> SdkResult<String> {
        let reply: ChallengeReply = self
            .client
            .post(
                &self.endpoint,
                &PasswordRequest {
                    password: password.to_string(),
                },
            )
            .await?;
        let hash = reply.into_sign()?;
        debug!("Received sign hash");
        Ok(hash)
    }

    /// Round two: trade the hash for challenge URLs and the signature pair
    pub async fn grant(&self, sign: &str) -> SdkResult<ChallengeGrant> {
        let reply: ChallengeReply = self
            .client
            .post(
                &self.endpoint,
                &SignRequest {
                    sign: sign.to_string(),
                },
            )
            .await?;
        let grant = reply.into_grant()?;
        info!(challenges = grant.challenges.len(), timestamp = grant.timestamp, "Challenge granted");
        Ok(grant)
    }

    /// Download one sub-task
    pub async fn task(&self, url: &str) -> SdkResult<ChallengeTask> {
        self.client.get(url).await
    }

    /// Download all sub-tasks concurrently, keeping the order of `urls`
    pub async fn tasks(&self, urls: &[String]) -> SdkResult<Vec<ChallengeTask>> {
        futures::future::try_join_all(urls.iter().map(|url| self.task(url))).await
    }

    /// Round three: submit the answers with the echoed signature and timestamp
    pub async fn submit(&self, submission: &ChallengeSubmission) -> SdkResult<ReportResponse> {
        let raw = self.client.post_raw(&self.endpoint, submission).await?;
        Ok(ReportResponse::parse(&raw.body)?)
    }
}
