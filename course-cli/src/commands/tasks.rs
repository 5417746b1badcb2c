//! Arguments for the task solvers

use anyhow::{bail, Context as _, Result};
use clap::{ArgGroup, Args, ValueEnum};
use course_core::TextPattern;
use course_workflow::{
    AskTask, AttemptLoopConfig, CensorTask, ConnectionsTask, DescribeTask, GeneralFailurePolicy,
    GpsTask, JsonFixTask, LoopSearchTask, NotesTask, SearchConfig, SpeedTask, TranscribeTask,
    DEFAULT_MAX_ROUNDS,
};
use std::path::PathBuf;
use std::time::Duration;

use crate::context::Context;

#[derive(Debug, Args)]
pub struct CensorArgs {
    /// Task file with the report to censor
    #[arg(long, default_value = "cenzura.txt")]
    pub file: String,

    /// Report task name
    #[arg(long = "task", default_value = "CENZURA")]
    pub report_task: String,
}

impl CensorArgs {
    pub fn task(&self) -> CensorTask {
        CensorTask {
            source_file: self.file.clone(),
            report_task: self.report_task.clone(),
            ..CensorTask::default()
        }
    }
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    /// Task file with the calibration document
    #[arg(long, default_value = "json.txt")]
    pub file: String,

    /// Report task name
    #[arg(long = "task", default_value = "JSON")]
    pub report_task: String,
}

impl JsonArgs {
    pub fn task(&self) -> JsonFixTask {
        JsonFixTask {
            source_file: self.file.clone(),
            report_task: self.report_task.clone(),
        }
    }
}

/// What to do with feedback that names no question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GeneralPolicyArg {
    /// One note shown to every question
    #[default]
    SharedNote,
    /// The note recorded against every question
    AttachToAll,
}

impl From<GeneralPolicyArg> for GeneralFailurePolicy {
    fn from(arg: GeneralPolicyArg) -> Self {
        match arg {
            GeneralPolicyArg::SharedNote => GeneralFailurePolicy::SharedNote,
            GeneralPolicyArg::AttachToAll => GeneralFailurePolicy::AttachToAll,
        }
    }
}

#[derive(Debug, Args)]
pub struct NotesArgs {
    /// Text of the notebook the questions are about
    #[arg(long, value_name = "PATH")]
    pub context: PathBuf,

    /// Task file with the questions
    #[arg(long, default_value = "notes.json")]
    pub questions: String,

    /// Report task name
    #[arg(long = "task", default_value = "notes")]
    pub report_task: String,

    /// Maximum submissions
    #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS, value_parser = clap::value_parser!(u32).range(1..))]
    pub rounds: u32,

    /// Handling of feedback that names no question
    #[arg(long, value_enum, default_value_t = GeneralPolicyArg::SharedNote)]
    pub general: GeneralPolicyArg,
}

impl NotesArgs {
    pub fn task(&self) -> NotesTask {
        let mut task = NotesTask::new(self.context.clone()).with_attempts(
            AttemptLoopConfig::default()
                .with_max_rounds(self.rounds)
                .with_general_policy(self.general.into()),
        );
        task.questions_file = self.questions.clone();
        task.report_task = self.report_task.clone();
        task
    }
}

#[derive(Debug, Args)]
pub struct LoopArgs {
    /// Person to track
    #[arg(long, default_value = "BARBARA")]
    pub target: String,

    /// Starting people (repeatable; replaces the defaults)
    #[arg(long = "person", value_name = "NAME")]
    pub people: Vec<String>,

    /// Starting places (repeatable; replaces the defaults)
    #[arg(long = "place", value_name = "NAME")]
    pub places: Vec<String>,

    /// Places already known for the target (repeatable; replaces the defaults)
    #[arg(long = "known", value_name = "NAME")]
    pub known: Vec<String>,

    /// Maximum search layers
    #[arg(long)]
    pub max_layers: Option<usize>,

    /// Report task name
    #[arg(long = "task", default_value = "loop")]
    pub report_task: String,
}

impl LoopArgs {
    pub fn task(&self) -> LoopSearchTask {
        let mut search = SearchConfig {
            target: self.target.clone(),
            ..SearchConfig::default()
        };
        if !self.people.is_empty() {
            search.seed_people = self.people.clone();
        }
        if !self.places.is_empty() {
            search.seed_places = self.places.clone();
        }
        if !self.known.is_empty() {
            search.known_places = self.known.iter().cloned().collect();
        }
        if let Some(layers) = self.max_layers {
            search.max_layers = layers;
        }
        LoopSearchTask {
            search,
            report_task: self.report_task.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct GpsArgs {
    /// Place whose visitors are located
    #[arg(long, default_value = "LUBAWA")]
    pub place: String,

    /// People left out of the answer (repeatable)
    #[arg(long = "exclude", value_name = "NAME", default_values_t = [String::from("BARBARA")])]
    pub excluded: Vec<String>,

    /// Report task name
    #[arg(long = "task", default_value = "gps")]
    pub report_task: String,
}

impl GpsArgs {
    pub fn task(&self) -> GpsTask {
        GpsTask {
            place: self.place.clone(),
            excluded: self.excluded.iter().cloned().collect(),
            report_task: self.report_task.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct ConnectionsArgs {
    #[arg(long, default_value = "Rafał")]
    pub from: String,

    #[arg(long, default_value = "Barbara")]
    pub to: String,

    /// Report task name
    #[arg(long = "task", default_value = "connections")]
    pub report_task: String,
}

impl ConnectionsArgs {
    pub fn task(&self) -> ConnectionsTask {
        ConnectionsTask {
            from: self.from.clone(),
            to: self.to.clone(),
            report_task: self.report_task.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct SpeedArgs {
    /// Challenge endpoint (falls back to the speed_endpoint setting)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Password that starts the challenge
    #[arg(long, env = "COURSE_SPEED_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Time allowed for the whole exchange
    #[arg(long, value_name = "MS", default_value_t = 6000)]
    pub deadline_ms: u64,
}

impl SpeedArgs {
    pub fn task(&self, ctx: &Context) -> Result<SpeedTask> {
        let endpoint = self
            .endpoint
            .clone()
            .or_else(|| ctx.config.speed_endpoint.clone())
            .context("No challenge endpoint. Pass --endpoint or run `course config set speed_endpoint <url>`")?;
        Ok(SpeedTask::new(endpoint, self.password.clone())
            .with_deadline(Duration::from_millis(self.deadline_ms)))
    }
}

#[derive(Debug, Args)]
pub struct TranscribeArgs {
    /// Directory with audio files
    pub dir: PathBuf,

    /// Where the transcripts are written
    #[arg(long = "out", value_name = "DIR", default_value = "transcripts")]
    pub output_dir: PathBuf,
}

impl TranscribeArgs {
    pub fn task(&self) -> TranscribeTask {
        TranscribeTask::new(self.dir.clone(), self.output_dir.clone())
    }
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// Instruction sent with the images
    #[arg(short, long)]
    pub prompt: String,

    /// Image files
    #[arg(required = true, value_name = "IMAGE")]
    pub images: Vec<PathBuf>,

    /// Image detail level
    #[arg(long, default_value = "high", value_parser = ["low", "high", "auto"])]
    pub detail: String,
}

impl DescribeArgs {
    pub fn task(&self) -> DescribeTask {
        let mut task = DescribeTask::new(self.prompt.clone(), self.images.clone());
        task.detail = self.detail.clone();
        task
    }
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("template").required(true).args(["prompt", "prompt_file"])))]
pub struct AskArgs {
    /// Task file name or absolute URL
    pub source: String,

    /// Prompt template containing {{payload}}
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Read the prompt template from a file
    #[arg(long, value_name = "PATH")]
    pub prompt_file: Option<PathBuf>,

    /// System prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Regular expression tried after the JSON layers
    #[arg(long)]
    pub pattern: Option<String>,

    /// Answer used when nothing can be extracted
    #[arg(long)]
    pub fallback: Option<String>,

    /// Submit the extracted answer as this report task
    #[arg(long, value_name = "TASK")]
    pub submit: Option<String>,
}

impl AskArgs {
    pub fn task(&self) -> Result<AskTask> {
        let template = match (&self.prompt, &self.prompt_file) {
            (Some(prompt), _) => prompt.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read prompt from {:?}", path))?,
            (None, None) => bail!("Pass --prompt or --prompt-file"),
        };

        let mut task = AskTask::new(self.source.clone(), &template)?;
        if let Some(system) = &self.system {
            task = task.with_system_prompt(system.clone());
        }
        if let Some(pattern) = &self.pattern {
            task = task.with_pattern(TextPattern::new("custom", pattern)?);
        }
        if let Some(fallback) = &self.fallback {
            task = task.with_fallback(fallback.clone());
        }
        if let Some(report_task) = &self.submit {
            task = task.submit_as(report_task.clone());
        }
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::FromArgMatches;

    fn try_parse<T: Args>(args: &[&str]) -> std::result::Result<T, clap::Error> {
        let command = T::augment_args(clap::Command::new("course"));
        let matches = command.try_get_matches_from(std::iter::once("course").chain(args.iter().copied()))?;
        T::from_arg_matches(&matches)
    }

    fn parse<T: Args>(args: &[&str]) -> T {
        try_parse(args).unwrap()
    }

    #[test]
    fn test_censor_defaults() {
        let task = parse::<CensorArgs>(&[]).task();
        assert_eq!(task.source_file, "cenzura.txt");
        assert_eq!(task.report_task, "CENZURA");
    }

    #[test]
    fn test_notes_rounds_and_policy() {
        let task = parse::<NotesArgs>(&["--context", "notes.txt", "--rounds", "3", "--general", "attach-to-all"]).task();
        assert_eq!(task.attempts.max_rounds, 3);
        assert_eq!(task.attempts.general_policy, GeneralFailurePolicy::AttachToAll);
        assert_eq!(task.report_task, "notes");

        assert!(try_parse::<NotesArgs>(&["--context", "n.txt", "--rounds", "0"]).is_err());
    }

    #[test]
    fn test_loop_overrides_replace_defaults() {
        let task = parse::<LoopArgs>(&["--person", "ADAM", "--known", "GDANSK", "--max-layers", "3"]).task();
        assert_eq!(task.search.seed_people, vec!["ADAM".to_string()]);
        assert_eq!(task.search.seed_places, SearchConfig::default().seed_places);
        assert!(task.search.known_places.contains("GDANSK"));
        assert_eq!(task.search.max_layers, 3);
    }

    #[test]
    fn test_gps_excludes_barbara_by_default() {
        let task = parse::<GpsArgs>(&[]).task();
        assert!(task.is_excluded("Barbara"));

        let task = parse::<GpsArgs>(&["--exclude", "ADAM"]).task();
        assert!(!task.is_excluded("BARBARA"));
        assert!(task.is_excluded("Adam"));
    }

    #[test]
    fn test_ask_requires_payload_placeholder() {
        assert!(parse::<AskArgs>(&["data.txt", "--prompt", "no placeholder"]).task().is_err());

        let task = parse::<AskArgs>(&["data.txt", "-p", "Solve: {{payload}}", "--submit", "robotnav"])
            .task()
            .unwrap();
        assert_eq!(task.submit_as.as_deref(), Some("robotnav"));
    }

    #[test]
    fn test_ask_needs_a_template() {
        assert!(try_parse::<AskArgs>(&["data.txt"]).is_err());
    }
}
