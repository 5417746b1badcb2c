use async_trait::async_trait;

use crate::domain::{Answer, ReportResponse};
use crate::error::Result;

/// One question handed to a model, with the feedback of earlier rounds.
#[derive(Debug, Clone, Copy)]
pub struct Question<'a> {
    pub text: &'a str,
    pub context: &'a str,
    pub previous_attempts: Option<&'a str>,
}

/// Derives an answer by delegating judgment to a model.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn answer(&self, question: Question<'_>) -> Result<String>;
}

/// Submits an answer to the grading endpoint.
///
/// A rejected answer is an `Ok` response; only transport or decoding
/// problems are errors.
#[async_trait]
pub trait Grader: Send + Sync {
    async fn grade(&self, task: &str, answer: Answer) -> Result<ReportResponse>;
}
