//! CLI execution context

use anyhow::{bail, Context as _, Result};
use course_core::ApiKey;
use course_sdk::{CourseClient, LlmClient, LlmConfig, SdkConfig};
use course_workflow::TaskContext;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::config::CliConfig;
use crate::output::OutputWriter;

/// Other variables the course key has been published under.
const API_KEY_ALIASES: &[&str] = &["API_KEY", "PERSONAL_API_KEY"];

/// Which credentials a command cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requires {
    pub api_key: bool,
    pub model: bool,
}

impl Requires {
    pub const COURSE: Self = Self { api_key: true, model: false };
    pub const MODEL: Self = Self { api_key: false, model: true };
    pub const BOTH: Self = Self { api_key: true, model: true };
}

/// Execution context for CLI commands
pub struct Context {
    /// Effective configuration: file, then `COURSE_*`, then flags
    pub config: CliConfig,

    /// File `config set` writes to
    pub config_path: PathBuf,

    pub output: OutputWriter,

    pub verbose: bool,
}

impl Context {
    /// Create a new context from CLI arguments
    pub fn new(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(path) => path.clone(),
            None => CliConfig::default_path()?,
        };
        let mut config = CliConfig::load(&config_path)?;

        let api_key = cli.api_key.clone().or_else(|| {
            API_KEY_ALIASES
                .iter()
                .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
        });
        if api_key.is_some() {
            config.api_key = api_key;
        }
        if let Some(key) = &cli.openai_key {
            config.openai_key = Some(key.clone());
        }
        if let Some(model) = &cli.model {
            config.model = model.clone();
        }
        if let Some(url) = &cli.api_url {
            config.set("api_url", url)?;
        }
        if let Some(url) = &cli.llm_api_base {
            config.set("llm_api_base", url)?;
        }
        if let Some(dir) = &cli.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
        if cli.no_cache {
            config.cache_dir = None;
        }
        if let Some(retries) = cli.retries {
            config.max_retries = retries;
        }

        let format = cli.output.unwrap_or(config.output_format);
        let output = OutputWriter::new(format, cli.no_color || !config.color);

        Ok(Self {
            config,
            config_path,
            output,
            verbose: cli.verbose > 0,
        })
    }

    /// The course API key. Asked for on a terminal, an error otherwise.
    pub fn api_key(&self) -> Result<ApiKey> {
        let raw = match &self.config.api_key {
            Some(key) => key.clone(),
            None => prompt_secret(
                "Course API key",
                "Course API key is not set. Pass --api-key, set CENTRALA_API_KEY, \
                 or run `course config set api_key <key>`",
            )?,
        };
        Ok(ApiKey::new(raw)?)
    }

    fn openai_key(&self) -> Result<String> {
        match &self.config.openai_key {
            Some(key) => Ok(key.clone()),
            None => prompt_secret(
                "Model API key",
                "Model API key is not set. Pass --openai-key, set OPENAI_API_KEY, \
                 or run `course config set openai_key <key>`",
            ),
        }
    }

    pub fn sdk_config(&self, with_key: bool) -> Result<SdkConfig> {
        let mut sdk = SdkConfig::new(self.config.api_url.clone())
            .with_timeout(Duration::from_secs(self.config.timeout_secs))
            .with_max_retries(self.config.max_retries)
            .with_logging(self.verbose);
        if with_key {
            sdk = sdk.with_api_key(self.api_key()?);
        } else if let Some(key) = &self.config.api_key {
            sdk = sdk.with_api_key(ApiKey::new(key.clone())?);
        }
        if let Some(dir) = &self.config.cache_dir {
            sdk = sdk.with_cache_dir(dir.clone());
        }
        sdk.validate().context("Invalid course API configuration")?;
        Ok(sdk)
    }

    pub fn course_client(&self, with_key: bool) -> Result<CourseClient> {
        CourseClient::new(self.sdk_config(with_key)?).context("Failed to create course client")
    }

    pub fn llm_client(&self) -> Result<LlmClient> {
        let config = LlmConfig::new(self.openai_key()?)
            .with_api_base(self.config.llm_api_base.clone())
            .with_model(self.config.model.clone())
            .with_logging(self.verbose);
        LlmClient::new(config).context("Failed to create model client")
    }

    /// Clients for one solver run.
    pub fn task_context(&self, requires: Requires) -> Result<TaskContext> {
        let context = TaskContext::new(self.course_client(requires.api_key)?);
        if requires.model {
            return Ok(context.with_llm(self.llm_client()?));
        }
        Ok(context)
    }
}

fn prompt_secret(prompt: &str, guidance: &str) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        bail!("{}", guidance);
    }
    let value: String = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .context("Failed to read secret")?;
    if value.trim().is_empty() {
        bail!("{}", guidance);
    }
    Ok(value)
}
