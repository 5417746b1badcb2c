//! CLI configuration management
//!
//! Values come from `<config_dir>/config.toml`, then `COURSE_*` environment
//! variables, then command-line flags (applied by [`crate::context`]).

use anyhow::{bail, Context as _, Result};
use clap::ValueEnum;
use course_sdk::{DEFAULT_BASE_URL, DEFAULT_LLM_API_BASE, DEFAULT_MODEL};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Keys accepted by `course config set`.
pub const KEYS: &[&str] = &[
    "api_url",
    "api_key",
    "openai_key",
    "llm_api_base",
    "model",
    "cache_dir",
    "speed_endpoint",
    "timeout_secs",
    "max_retries",
    "output_format",
    "color",
];

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Course task server
    pub api_url: String,

    /// Course API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_key: Option<String>,

    /// OpenAI-compatible API base
    pub llm_api_base: String,

    pub model: String,

    /// Download and transcript cache; unset disables caching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Challenge endpoint for `course speed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_endpoint: Option<String>,

    pub timeout_secs: u64,

    /// Transport retries (0 = fail on first error)
    pub max_retries: u32,

    pub output_format: OutputFormat,

    pub color: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            openai_key: None,
            llm_api_base: DEFAULT_LLM_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            cache_dir: None,
            speed_endpoint: None,
            timeout_secs: 30,
            max_retries: 0,
            output_format: OutputFormat::Table,
            color: true,
        }
    }
}

impl CliConfig {
    /// Load the file at `path` (if present) layered with `COURSE_*` variables.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(path.to_path_buf())
                    .format(::config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(::config::Environment::with_prefix("COURSE").try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Load only the file at `path`, for editing.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write config to {:?}", path))?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("org", "ag3nts", "course")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set `key` from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_url" => self.api_url = parse_url(value)?,
            "api_key" => self.api_key = non_empty(value),
            "openai_key" => self.openai_key = non_empty(value),
            "llm_api_base" => self.llm_api_base = parse_url(value)?,
            "model" => {
                if value.trim().is_empty() {
                    bail!("model cannot be empty");
                }
                self.model = value.trim().to_string();
            }
            "cache_dir" => self.cache_dir = non_empty(value).map(PathBuf::from),
            "speed_endpoint" => self.speed_endpoint = non_empty(value),
            "timeout_secs" => {
                let secs: u64 = value.parse().context("timeout_secs must be a number")?;
                if secs == 0 {
                    bail!("timeout_secs must be greater than 0");
                }
                self.timeout_secs = secs;
            }
            "max_retries" => {
                self.max_retries = value.parse().context("max_retries must be a number")?;
            }
            "output_format" => {
                self.output_format = OutputFormat::from_str(value, true).map_err(|_| {
                    anyhow::anyhow!("output_format must be table, json, yaml or compact")
                })?;
            }
            "color" => self.color = value.parse().context("color must be true or false")?,
            _ => bail!("Unknown config key: {}. Known keys: {}", key, KEYS.join(", ")),
        }
        Ok(())
    }

    /// Reset `key` to its default value.
    pub fn unset(&mut self, key: &str) -> Result<()> {
        let defaults = Self::default();
        match key {
            "api_url" => self.api_url = defaults.api_url,
            "api_key" => self.api_key = None,
            "openai_key" => self.openai_key = None,
            "llm_api_base" => self.llm_api_base = defaults.llm_api_base,
            "model" => self.model = defaults.model,
            "cache_dir" => self.cache_dir = None,
            "speed_endpoint" => self.speed_endpoint = None,
            "timeout_secs" => self.timeout_secs = defaults.timeout_secs,
            "max_retries" => self.max_retries = defaults.max_retries,
            "output_format" => self.output_format = defaults.output_format,
            "color" => self.color = defaults.color,
            _ => bail!("Unknown config key: {}. Known keys: {}", key, KEYS.join(", ")),
        }
        Ok(())
    }

    /// Display form of `key`; secrets are redacted.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "api_url" => self.api_url.clone(),
            "api_key" => course_core::redact(self.api_key.as_deref()?),
            "openai_key" => course_core::redact(self.openai_key.as_deref()?),
            "llm_api_base" => self.llm_api_base.clone(),
            "model" => self.model.clone(),
            "cache_dir" => self.cache_dir.as_ref()?.display().to_string(),
            "speed_endpoint" => self.speed_endpoint.clone()?,
            "timeout_secs" => self.timeout_secs.to_string(),
            "max_retries" => self.max_retries.to_string(),
            "output_format" => self.output_format.to_string(),
            "color" => self.color.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

fn parse_url(value: &str) -> Result<String> {
    let url = url::Url::parse(value.trim()).with_context(|| format!("Invalid URL: {}", value))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("URL must use http or https: {}", value);
    }
    Ok(value.trim().trim_end_matches('/').to_string())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
