//! Configuration commands

use anyhow::{bail, Context as _, Result};
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::IsTerminal;

use crate::config::{CliConfig, KEYS};
use crate::context::Context;
use crate::output::{print_field, print_section, TableDisplay};

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration (secrets redacted)
    Show {
        /// Show only what is saved in the config file
        #[arg(long)]
        saved: bool,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value in the config file
    Set {
        /// Configuration key (e.g. model, api_url, cache_dir)
        key: String,

        /// Value to set
        value: String,
    },

    /// Reset a configuration value to its default
    Unset {
        /// Configuration key
        key: String,
    },

    /// Show the configuration file path
    Path,

    /// Reset configuration to defaults
    Reset {
        /// Force reset without confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Execute configuration commands
pub fn execute(ctx: &Context, cmd: &ConfigSubcommand) -> Result<()> {
    match cmd {
        ConfigSubcommand::Show { saved } => show(ctx, *saved),
        ConfigSubcommand::Get { key } => get(ctx, key),
        ConfigSubcommand::Set { key, value } => set(ctx, key, value),
        ConfigSubcommand::Unset { key } => unset(ctx, key),
        ConfigSubcommand::Path => show_path(ctx),
        ConfigSubcommand::Reset { force } => reset(ctx, *force),
    }
}

#[derive(Debug, Serialize)]
struct ConfigView {
    path: String,
    values: BTreeMap<&'static str, Option<String>>,
}

impl ConfigView {
    fn new(ctx: &Context, config: &CliConfig) -> Self {
        Self {
            path: ctx.config_path.display().to_string(),
            values: KEYS.iter().map(|key| (*key, config.get(key))).collect(),
        }
    }
}

impl TableDisplay for ConfigView {
    fn display_single(&self) {
        print_section("Configuration");
        print_field("file", &self.path);
        for (key, value) in &self.values {
            match value {
                Some(value) => print_field(key, value),
                None => print_field(key, &"-".dimmed().to_string()),
            }
        }
    }

    fn display_compact(&self) {
        for (key, value) in &self.values {
            println!("{}={}", key, value.as_deref().unwrap_or_default());
        }
    }
}

fn show(ctx: &Context, saved: bool) -> Result<()> {
    let view = if saved {
        ConfigView::new(ctx, &CliConfig::load_file(&ctx.config_path)?)
    } else {
        ConfigView::new(ctx, &ctx.config)
    };
    ctx.output.write(&view)
}

fn get(ctx: &Context, key: &str) -> Result<()> {
    if !KEYS.contains(&key) {
        bail!("Unknown config key: {}. Known keys: {}", key, KEYS.join(", "));
    }
    match ctx.config.get(key) {
        Some(value) => println!("{}", value),
        None => println!("{}", "(not set)".dimmed()),
    }
    Ok(())
}

fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = CliConfig::load_file(&ctx.config_path)?;
    config.set(key, value)?;
    config
        .save(&ctx.config_path)
        .context("Failed to save configuration")?;

    let shown = config.get(key).unwrap_or_default();
    ctx.output.success(&format!("Set {} = {}", key, shown));
    Ok(())
}

fn unset(ctx: &Context, key: &str) -> Result<()> {
    let mut config = CliConfig::load_file(&ctx.config_path)?;
    config.unset(key)?;
    config
        .save(&ctx.config_path)
        .context("Failed to save configuration")?;

    ctx.output.success(&format!("Reset {}", key));
    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    let status = if ctx.config_path.exists() {
        "✓".green()
    } else {
        "✗".red()
    };
    println!("{} {}", status, ctx.config_path.display());
    Ok(())
}

fn reset(ctx: &Context, force: bool) -> Result<()> {
    if !force {
        if !std::io::stdin().is_terminal() {
            bail!("Refusing to reset configuration without --force");
        }
        let confirm = dialoguer::Confirm::new()
            .with_prompt("Reset all configuration to defaults? This cannot be undone.")
            .default(false)
            .interact()
            .context("Failed to get confirmation")?;

        if !confirm {
            ctx.output.info("Cancelled");
            return Ok(());
        }
    }

    CliConfig::default()
        .save(&ctx.config_path)
        .context("Failed to save configuration")?;

    ctx.output.success("Configuration reset to defaults");
    Ok(())
}
