use async_trait::async_trait;
use course_core::{Answer, CoreError, Extracted, Extractor, PromptTemplate, Result, TextPattern};
use course_sdk::ChatOptions;
use serde_json::json;
use tracing::{info, warn};

use super::{Task, TaskContext, TaskResult};

/// Generic fetch, prompt, extract and (optionally) submit.
#[derive(Debug, Clone)]
pub struct AskTask {
    /// Task file name or absolute URL.
    pub source: String,
    /// Prompt with a `{{payload}}` placeholder.
    pub template: PromptTemplate,
    pub system_prompt: String,
    pub pattern: Option<TextPattern>,
    pub fallback: Option<String>,
    /// Report task name; `None` only prints the answer.
    pub submit_as: Option<String>,
    pub options: ChatOptions,
}

impl AskTask {
    pub fn new(source: impl Into<String>, template: &str) -> Result<Self> {
        let template = PromptTemplate::new("ask", template)?;
        if !template.variables.iter().any(|v| v == "payload") {
            return Err(CoreError::Validation(
                "prompt template must contain {{payload}}".to_string(),
            ));
        }
        Ok(Self {
            source: source.into(),
            template,
            system_prompt: String::new(),
            pattern: None,
            fallback: None,
            submit_as: None,
            options: ChatOptions::deterministic(),
        })
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_pattern(mut self, pattern: TextPattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn submit_as(mut self, task: impl Into<String>) -> Self {
        self.submit_as = Some(task.into());
        self
    }

    fn extractor(&self) -> Extractor {
        let mut extractor = Extractor::new();
        if let Some(pattern) = &self.pattern {
            extractor = extractor.with_pattern(pattern.clone());
        }
        if let Some(fallback) = &self.fallback {
            extractor = extractor.with_default(fallback.clone());
        }
        extractor
    }
}

/// The answer to submit for an extraction result.
pub fn answer_from(extracted: Extracted) -> Result<Answer> {
    match extracted {
        Extracted::FencedJson(value) | Extracted::BracedJson(value) => Answer::from_value(value),
        Extracted::Pattern(found) => Ok(Answer::from(found.text)),
        Extracted::Default(text) => Ok(Answer::from(text)),
    }
}

#[async_trait]
impl Task for AskTask {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult> {
        let payload = context.course.data().text(&self.source).await?;
        let prompt = self.template.render(&json!({ "payload": payload }))?;
        let reply = context
            .llm()?
            .complete(&self.system_prompt, &prompt, self.options)
            .await?;

        let extracted = match self.extractor().extract(&reply) {
            Ok(extracted) => extracted,
            Err(CoreError::Extraction(_)) => {
                warn!("Nothing to extract, using the raw reply");
                Extracted::Default(reply.clone())
            }
            Err(e) => return Err(e),
        };
        let layer = extracted.layer();
        info!(layer = ?layer, "Extracted answer");
        let answer = answer_from(extracted)?;

        let output = json!({ "reply": reply, "layer": layer });
        match &self.submit_as {
            Some(task) => context.submit(task, answer, output).await,
            None => Ok(TaskResult::local(self.name(), Some(answer), output)),
        }
    }

    fn name(&self) -> &str {
        "ask"
    }
}
