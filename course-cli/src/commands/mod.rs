//! Subcommand implementations

pub mod config;
pub mod data;
pub mod tasks;

use anyhow::{Context as _, Result};
use course_workflow::{Task, TaskResult};

use crate::cli::Commands;
use crate::context::{Context, Requires};

/// How a command ended, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Finished; a submitted answer was accepted.
    Done,
    /// The grading server rejected the answer.
    Rejected,
}

impl From<&TaskResult> for Outcome {
    fn from(result: &TaskResult) -> Self {
        if result.success {
            Outcome::Done
        } else {
            Outcome::Rejected
        }
    }
}

pub async fn run(command: &Commands, ctx: &Context) -> Result<Outcome> {
    match command {
        Commands::Censor(args) => execute(ctx, &args.task(), Requires::BOTH).await,
        Commands::Json(args) => execute(ctx, &args.task(), Requires::BOTH).await,
        Commands::Notes(args) => execute(ctx, &args.task(), Requires::BOTH).await,
        Commands::Loop(args) => execute(ctx, &args.task(), Requires::COURSE).await,
        Commands::Gps(args) => execute(ctx, &args.task(), Requires::COURSE).await,
        Commands::Connections(args) => execute(ctx, &args.task(), Requires::COURSE).await,
        Commands::Speed(args) => execute(ctx, &args.task(ctx)?, Requires::BOTH).await,
        Commands::Transcribe(args) => execute(ctx, &args.task(), Requires::MODEL).await,
        Commands::Describe(args) => execute(ctx, &args.task(), Requires::MODEL).await,
        Commands::Ask(args) => {
            let task = args.task()?;
            execute(ctx, &task, Requires::BOTH).await
        }
        Commands::Fetch(args) => data::fetch(ctx, args).await,
        Commands::Submit(args) => data::submit(ctx, args).await,
        Commands::Config(cmd) => config::execute(ctx, cmd).map(|_| Outcome::Done),
    }
}

/// Run one solver with a spinner and print its result.
async fn execute(ctx: &Context, task: &dyn Task, requires: Requires) -> Result<Outcome> {
    let task_context = ctx.task_context(requires)?;
    tracing::info!(task = task.name(), run_id = %task_context.run_id, "Starting task");

    let spinner = ctx.output.spinner(&format!("Running {}", task.name()));
    let result = task.execute(&task_context).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let result = result.with_context(|| format!("Task {} failed", task.name()))?;
    ctx.output.write(&result)?;
    Ok(Outcome::from(&result))
}
