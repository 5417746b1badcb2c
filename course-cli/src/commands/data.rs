//! Manual access to the task data and report endpoints

use anyhow::{Context as _, Result};
use clap::Args;
use course_core::Answer;
use course_workflow::TaskResult;
use serde_json::{json, Value};
use std::path::PathBuf;

use super::Outcome;
use crate::context::Context;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Task file name (e.g. cenzura.txt) or absolute URL
    pub file: String,

    /// Write the payload here instead of stdout
    #[arg(short = 'O', long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Report task name (e.g. CENZURA)
    pub task: String,

    /// Answer text; with --json a JSON list or object
    pub answer: String,

    /// Parse the answer as JSON
    #[arg(long)]
    pub json: bool,
}

impl SubmitArgs {
    pub fn answer(&self) -> Result<Answer> {
        if !self.json {
            return Ok(Answer::from(self.answer.as_str()));
        }
        let value: Value = serde_json::from_str(&self.answer).context("Answer is not valid JSON")?;
        Ok(Answer::from_value(value)?)
    }
}

pub async fn fetch(ctx: &Context, args: &FetchArgs) -> Result<Outcome> {
    let client = ctx.course_client(true)?;
    let bytes = client
        .data()
        .bytes(&args.file)
        .await
        .with_context(|| format!("Failed to fetch {}", args.file))?;

    match &args.out {
        Some(path) => {
            tokio::fs::write(path, &bytes)
                .await
                .with_context(|| format!("Failed to write {:?}", path))?;
            ctx.output
                .success(&format!("Saved {} ({} bytes) to {}", args.file, bytes.len(), path.display()));
        }
        None => {
            let text = String::from_utf8(bytes)
                .with_context(|| format!("{} is binary; use --out", args.file))?;
            print!("{}", text);
        }
    }
    Ok(Outcome::Done)
}

pub async fn submit(ctx: &Context, args: &SubmitArgs) -> Result<Outcome> {
    let answer = args.answer()?;
    let client = ctx.course_client(true)?;
    let response = client
        .report()
        .submit(&args.task, answer.clone())
        .await
        .with_context(|| format!("Failed to submit {}", args.task))?;

    let result = TaskResult::submitted(&args.task, answer, response, json!({}));
    ctx.output.write(&result)?;
    Ok(Outcome::from(&result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(answer: &str, json: bool) -> SubmitArgs {
        SubmitArgs {
            task: "TEST".to_string(),
            answer: answer.to_string(),
            json,
        }
    }

    #[test]
    fn test_plain_answer_is_text() {
        assert_eq!(args(r#"["a"]"#, false).answer().unwrap(), Answer::from(r#"["a"]"#));
    }

    #[test]
    fn test_json_answer() {
        let answer = args(r#"["a", "b"]"#, true).answer().unwrap();
        assert_eq!(answer, Answer::List(vec![json!("a"), json!("b")]));

        assert!(args("null", true).answer().is_err());
        assert!(args("{broken", true).answer().is_err());
    }
}
