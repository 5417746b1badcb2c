use async_trait::async_trait;
use course_core::{CoreError, QuestionSet, Result};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{Task, TaskContext, TaskResult};
use crate::attempt::{AttemptLoop, AttemptLoopConfig};
use crate::reasoner::LlmReasoner;

/// Answer used when the model API fails for one question.
pub const NOTES_FALLBACK_ANSWER: &str = "brak danych";

/// Answers the notebook questions with the attempt loop.
#[derive(Debug, Clone)]
pub struct NotesTask {
    pub questions_file: String,
    /// Local text of the notebook the questions are about.
    pub context_path: PathBuf,
    pub report_task: String,
    pub attempts: AttemptLoopConfig,
}

impl NotesTask {
    pub fn new(context_path: impl Into<PathBuf>) -> Self {
        Self {
            questions_file: "notes.json".to_string(),
            context_path: context_path.into(),
            report_task: "notes".to_string(),
            attempts: AttemptLoopConfig::default(),
        }
    }

    pub fn with_attempts(mut self, attempts: AttemptLoopConfig) -> Self {
        self.attempts = attempts;
        self
    }
}

#[async_trait]
impl Task for NotesTask {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult> {
        let notebook = tokio::fs::read_to_string(&self.context_path)
            .await
            .map_err(|e| {
                CoreError::Configuration(format!(
                    "cannot read notebook text {}: {}",
                    self.context_path.display(),
                    e
                ))
            })?;

        let raw: Value = context.course.data().json(&self.questions_file).await?;
        let questions = QuestionSet::from_value(&raw)?;
        info!(questions = questions.len(), context_chars = notebook.chars().count(), "Loaded notes task");

        let reasoner = LlmReasoner::new(context.llm()?.clone())?.with_fallback(NOTES_FALLBACK_ANSWER);
        let attempt_loop = AttemptLoop::new(
            Arc::new(reasoner),
            Arc::new(context.course.report().clone()),
            self.attempts.clone(),
        )?;

        let outcome = attempt_loop.run(&self.report_task, &questions, &notebook).await?;

        let output = json!({
            "rounds": outcome.rounds,
            "states": outcome.states(),
            "ledger": outcome.ledger,
        });
        let answer = outcome.answers.to_answer();
        Ok(match outcome.last_response {
            Some(response) => TaskResult::submitted(&self.report_task, answer, response, output),
            None => TaskResult::local(&self.report_task, Some(answer), output),
        })
    }

    fn name(&self) -> &str {
        "notes"
    }
}
