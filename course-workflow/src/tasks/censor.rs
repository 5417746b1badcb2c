use async_trait::async_trait;
use course_core::{Answer, Result};
use course_sdk::ChatOptions;
use serde_json::json;
use tracing::info;

use super::{Task, TaskContext, TaskResult};

pub const CENSOR_SYSTEM_PROMPT: &str = r#"You are a text censoring system. Censor personal information in the provided text by replacing it with the word "CENZURA".

Replace the following information with "CENZURA":
1. Full names (e.g., "Jan Nowak" -> "CENZURA")
2. Age (e.g., "32" -> "CENZURA" when it refers to a person's age)
3. City names (e.g., "Wrocław" -> "CENZURA")
4. Street addresses (e.g., "ul. Szeroka 18" -> "ul. CENZURA")

Rules:
- Only replace the information listed above
- Keep the original punctuation and spacing
- Do not modify any other part of the text
- For streets keep "ul." or a similar prefix and censor the street name and number together

Output only the censored text, without commentary."#;

#[derive(Debug, Clone)]
pub struct CensorTask {
    pub source_file: String,
    pub report_task: String,
    pub system_prompt: String,
}

impl Default for CensorTask {
    fn default() -> Self {
        Self {
            source_file: "cenzura.txt".to_string(),
            report_task: "CENZURA".to_string(),
            system_prompt: CENSOR_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[async_trait]
impl Task for CensorTask {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult> {
        let text = context.course.data().text(&self.source_file).await?;
        let text = text.trim();
        info!(chars = text.chars().count(), "Fetched text to censor");

        let user_prompt = format!("Original text: {}\n\nCensored text:", text);
        let censored = context
            .llm()?
            .complete(&self.system_prompt, &user_prompt, ChatOptions::deterministic())
            .await?;

        context
            .submit(
                &self.report_task,
                Answer::from(censored.clone()),
                json!({ "original": text, "censored": censored }),
            )
            .await
    }

    fn name(&self) -> &str {
        "censor"
    }
}
