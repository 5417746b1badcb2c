pub mod ask;
pub mod censor;
pub mod connections;
pub mod describe;
pub mod gps;
pub mod json_fix;
pub mod loop_search;
pub mod notes;
pub mod speed;
pub mod transcribe;

pub use ask::*;
pub use censor::*;
pub use connections::*;
pub use describe::*;
pub use gps::*;
pub use json_fix::*;
pub use loop_search::*;
pub use notes::*;
pub use speed::*;
pub use transcribe::*;

use async_trait::async_trait;
use course_core::{Answer, ApiKey, CoreError, ReportResponse, Result, RunId};
use course_sdk::{CourseClient, LlmClient};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Everything a solver needs for one run.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub run_id: RunId,
    pub course: CourseClient,
    pub llm: Option<LlmClient>,
}

impl TaskContext {
    pub fn new(course: CourseClient) -> Self {
        Self {
            run_id: RunId::new(),
            course,
            llm: None,
        }
    }

    pub fn with_llm(mut self, llm: LlmClient) -> Self {
        self.llm = Some(llm);
        self
    }

    /// The model client, or a configuration error for solvers that need one.
    pub fn llm(&self) -> Result<&LlmClient> {
        self.llm.as_ref().ok_or_else(|| {
            CoreError::Configuration(
                "model API key is not set (use --openai-key or OPENAI_API_KEY)".to_string(),
            )
        })
    }

    pub fn api_key(&self) -> Result<ApiKey> {
        Ok(self.course.http_client().config().require_api_key()?.clone())
    }

    /// Submit `answer` as `task` and wrap the verdict in a result.
    pub async fn submit(&self, task: &str, answer: Answer, output: Value) -> Result<TaskResult> {
        let response = self.course.report().submit(task, answer.clone()).await?;
        Ok(TaskResult::submitted(task, answer, response, output))
    }
}

#[async_trait]
pub trait Task: Send + Sync {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult>;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub task: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<Answer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ReportResponse>,
    pub output: Value,
}

impl TaskResult {
    /// A result judged by the grading server.
    pub fn submitted(
        task: impl Into<String>,
        answer: Answer,
        response: ReportResponse,
        output: Value,
    ) -> Self {
        let task = task.into();
        let success = response.is_accepted();
        if success {
            info!(task = %task, message = %response.message_text(), "Answer accepted");
        } else {
            warn!(task = %task, code = ?response.code, message = %response.message_text(), "Answer rejected");
        }
        Self {
            task,
            success,
            answer: Some(answer),
            response: Some(response),
            output,
        }
    }

    /// A result that was only computed, not submitted.
    pub fn local(task: impl Into<String>, answer: Option<Answer>, output: Value) -> Self {
        Self {
            task: task.into(),
            success: true,
            answer,
            response: None,
            output,
        }
    }

    pub fn was_submitted(&self) -> bool {
        self.response.is_some()
    }
}
