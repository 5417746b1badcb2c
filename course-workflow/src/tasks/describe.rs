use async_trait::async_trait;
use course_core::{Answer, CoreError, Result};
use course_sdk::ChatOptions;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use super::{Task, TaskContext, TaskResult};

/// Sends local images with a prompt to the vision model.
#[derive(Debug, Clone)]
pub struct DescribeTask {
    pub prompt: String,
    pub images: Vec<PathBuf>,
    /// `"low"`, `"high"` or `"auto"`
    pub detail: String,
    pub options: ChatOptions,
}

impl DescribeTask {
    pub fn new(prompt: impl Into<String>, images: Vec<PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            images,
            detail: "high".to_string(),
            options: ChatOptions::default().with_max_tokens(1000),
        }
    }
}

#[async_trait]
impl Task for DescribeTask {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult> {
        if self.images.is_empty() {
            return Err(CoreError::Validation("no images given".to_string()));
        }
        let reply = context
            .llm()?
            .describe_images(&self.prompt, &self.images, &self.detail, self.options)
            .await?;
        info!(images = self.images.len(), chars = reply.chars().count(), "Images described");

        let images: Vec<String> = self.images.iter().map(|p| p.display().to_string()).collect();
        Ok(TaskResult::local(
            self.name(),
            Some(Answer::from(reply)),
            json!({ "images": images }),
        ))
    }

    fn name(&self) -> &str {
        "describe"
    }
}
