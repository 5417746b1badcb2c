//! Messages of the three-round challenge/response exchange:
//! `{password}` → `{sign}` → `{answer, signature, timestamp, apikey}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::answer::Answer;
use super::ids::ApiKey;
use super::report::value_text;
use crate::error::{CoreError, Result};

/// `code` the challenge endpoint sends when a sign or signature is refused.
pub const SIGNATURE_REFUSED_CODE: i64 = -301;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    pub sign: String,
}

/// Raw reply of the challenge endpoint; `message` is a hash in round one and
/// a grant object in round two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeReply {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Value,
}

/// Round-two payload: where to fetch the sub-tasks and what to echo back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeGrant {
    pub challenges: Vec<String>,
    pub signature: String,
    pub timestamp: i64,
}

impl ChallengeReply {
    /// Round one: the sign hash.
    pub fn into_sign(self) -> Result<String> {
        self.check_code()?;
        match self.message {
            Value::String(hash) if !hash.trim().is_empty() => Ok(hash.trim().to_string()),
            other => Err(CoreError::Validation(format!(
                "expected a sign hash, got {}",
                value_text(&other)
            ))),
        }
    }

    /// Round two: the grant with challenge URLs, signature and timestamp.
    pub fn into_grant(self) -> Result<ChallengeGrant> {
        self.check_code()?;
        let grant: ChallengeGrant = serde_json::from_value(self.message)?;
        if grant.challenges.is_empty() {
            return Err(CoreError::Validation(
                "grant contains no challenge URLs".to_string(),
            ));
        }
        Ok(grant)
    }

    fn check_code(&self) -> Result<()> {
        match self.code {
            Some(code) if code < 0 => Err(CoreError::InvalidState(format!(
                "challenge endpoint refused with code {}: {}",
                code,
                value_text(&self.message)
            ))),
            _ => Ok(()),
        }
    }
}

/// A sub-task fetched from one challenge URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeTask {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub data: Value,
}

/// Round-three body. Field order is the order the endpoint documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeSubmission {
    pub answer: Answer,
    pub signature: String,
    pub timestamp: i64,
    pub apikey: ApiKey,
}

impl ChallengeSubmission {
    pub fn new(grant: &ChallengeGrant, apikey: ApiKey, answers: Vec<String>) -> Self {
        Self {
            answer: Answer::from(answers),
            signature: grant.signature.clone(),
            timestamp: grant.timestamp,
            apikey,
        }
    }
}
