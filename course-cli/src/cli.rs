//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::config::ConfigSubcommand;
use crate::commands::data::{FetchArgs, SubmitArgs};
use crate::commands::tasks::{
    AskArgs, CensorArgs, ConnectionsArgs, DescribeArgs, GpsArgs, JsonArgs, LoopArgs, NotesArgs,
    SpeedArgs, TranscribeArgs,
};
use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "course", version, about = "Solvers for the agent course tasks", propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to <config_dir>/config.toml)
    #[arg(long, global = true, env = "COURSE_CONFIG_FILE", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Course API key (also read from API_KEY or PERSONAL_API_KEY)
    #[arg(long, global = true, env = "CENTRALA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_key: Option<String>,

    /// Chat model
    #[arg(long, global = true, env = "OPENAI_MODEL")]
    pub model: Option<String>,

    /// Course task server URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub llm_api_base: Option<String>,

    /// Cache downloads and transcripts in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Ignore any configured cache directory
    #[arg(long, global = true, conflicts_with = "cache_dir")]
    pub no_cache: bool,

    /// Transport retries per request
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Censor personal data in a report and submit it
    Censor(CensorArgs),

    /// Repair the calibration file and submit it
    Json(JsonArgs),

    /// Answer the notebook questions with retries
    Notes(NotesArgs),

    /// Find where a person went via the people and places APIs
    Loop(LoopArgs),

    /// Locate everyone seen in a place
    Gps(GpsArgs),

    /// Shortest chain of acquaintances between two users
    Connections(ConnectionsArgs),

    /// Solve the timed challenge
    Speed(SpeedArgs),

    /// Transcribe a directory of audio files
    Transcribe(TranscribeArgs),

    /// Describe local images with the vision model
    Describe(DescribeArgs),

    /// Fetch a task file, prompt the model and optionally submit
    Ask(AskArgs),

    /// Download a task file
    Fetch(FetchArgs),

    /// Submit an answer to a task
    Submit(SubmitArgs),

    /// Show or change configuration
    #[command(subcommand)]
    Config(ConfigSubcommand),
}
