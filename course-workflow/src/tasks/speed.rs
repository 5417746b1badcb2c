use async_trait::async_trait;
use course_core::{Answer, ChallengeSubmission, ChallengeTask, CoreError, Result};
use course_sdk::{ChatMessage, ChatOptions};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{Task, TaskContext, TaskResult};
use crate::executor::{WorkerPool, DEFAULT_WORKERS};

pub const SPEED_DEADLINE: Duration = Duration::from_secs(6);

/// The signed three-round challenge, solved against a deadline.
#[derive(Debug, Clone)]
pub struct SpeedTask {
    pub endpoint: String,
    pub password: String,
    pub deadline: Duration,
    pub workers: usize,
    pub options: ChatOptions,
}

impl SpeedTask {
    pub fn new(endpoint: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            password: password.into(),
            deadline: SPEED_DEADLINE,
            workers: DEFAULT_WORKERS,
            options: ChatOptions::deterministic().with_max_tokens(150),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    async fn solve(&self, context: &TaskContext) -> Result<TaskResult> {
        let started = Instant::now();
        let challenge = context.course.challenge(self.endpoint.clone());

        let sign = challenge.sign(&self.password).await?;
        let grant = challenge.grant(&sign).await?;
        let tasks = challenge.tasks(&grant.challenges).await?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Sub-tasks fetched");

        let llm = context.llm()?.clone();
        let options = self.options;
        let jobs: Vec<_> = tasks
            .iter()
            .map(|task| {
                let llm = llm.clone();
                let prompt = speed_prompt(task);
                move || async move {
                    let reply = llm.chat(&[ChatMessage::user(prompt)], options).await?;
                    Ok::<_, CoreError>(reply)
                }
            })
            .collect();
        let answers = WorkerPool::new(self.workers).run_all(jobs).await?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Sub-tasks answered");

        let submission = ChallengeSubmission::new(&grant, context.api_key()?, answers.clone());
        let response = challenge.submit(&submission).await?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(elapsed_ms, accepted = response.is_accepted(), "Challenge submitted");
        Ok(TaskResult::submitted(
            self.name(),
            Answer::from(answers),
            response,
            json!({ "elapsed_ms": elapsed_ms, "challenges": grant.challenges }),
        ))
    }
}

/// Prompt for one sub-task.
pub fn speed_prompt(task: &ChallengeTask) -> String {
    let data = match &task.data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!(
        "Task: {}\nData: {}\nReturn complete answers in Polish, each on new line with number:",
        task.task, data
    )
}

#[async_trait]
impl Task for SpeedTask {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult> {
        tokio::time::timeout(self.deadline, self.solve(context))
            .await
            .map_err(|_| {
                CoreError::Transport(format!(
                    "challenge not finished within {} ms",
                    self.deadline.as_millis()
                ))
            })?
    }

    fn name(&self) -> &str {
        "speed"
    }
}
