//! Output formatting for CLI

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use course_workflow::TaskResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Compact format (one line per result)
    Compact,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

/// Output writer that handles different formats
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a single item
    pub fn write<T: Serialize + TableDisplay>(&self, item: &T) -> Result<()> {
        match self.format {
            OutputFormat::Table => item.display_single(),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(item)?),
            OutputFormat::Compact => item.display_compact(),
        }
        Ok(())
    }

    /// Write a success message
    pub fn success(&self, message: &str) {
        if self.format == OutputFormat::Table {
            println!("{} {}", "✓".green(), message);
        } else {
            eprintln!("{}", message);
        }
    }

    /// Write an error message
    pub fn error(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("{} {}", "✗".red(), message);
        } else {
            eprintln!("Error: {}", message);
        }
    }

    /// Write a warning message
    pub fn warning(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("{} {}", "⚠".yellow(), message);
        } else {
            eprintln!("Warning: {}", message);
        }
    }

    /// Write an info message
    pub fn info(&self, message: &str) {
        if self.format == OutputFormat::Table {
            println!("{} {}", "ℹ".blue(), message);
        } else {
            eprintln!("{}", message);
        }
    }

    /// Start a spinner for long operations. Drawn on stderr, so machine
    /// readable output on stdout stays clean.
    pub fn spinner(&self, message: &str) -> Option<indicatif::ProgressBar> {
        if self.format != OutputFormat::Table {
            return None;
        }
        let pb = indicatif::ProgressBar::new_spinner();
        let style = indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} ({elapsed})")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    }
}

/// Trait for displaying items in a table
pub trait TableDisplay {
    /// Display a single item in detail
    fn display_single(&self);

    /// Display in compact format
    fn display_compact(&self);
}

/// How a run ended, as shown to the user.
pub fn verdict_label(result: &TaskResult) -> &'static str {
    match (result.was_submitted(), result.success) {
        (true, true) => "accepted",
        (true, false) => "rejected",
        (false, _) => "computed",
    }
}

impl TableDisplay for TaskResult {
    fn display_single(&self) {
        print_section(&format!("Task {}", self.task));
        print_field("Status", &status_badge(verdict_label(self)));
        if let Some(response) = &self.response {
            let code = response
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            print_field("Code", &code);
            print_field("Message", &response.message_text());
            print_optional_field("Hint", response.hint.as_deref());
            print_optional_field("Debug", response.debug.as_deref());
        }
        if let Some(answer) = &self.answer {
            print_field("Answer", &preview(&value_text(&answer.to_value()), 400));
        }

        if let Value::Object(details) = &self.output {
            if details.is_empty() {
                return;
            }
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.apply_modifier(UTF8_ROUND_CORNERS);
            table.set_header(vec![
                Cell::new("Detail").fg(Color::Cyan),
                Cell::new("Value").fg(Color::Cyan),
            ]);
            for (key, value) in details {
                table.add_row(vec![Cell::new(key), Cell::new(preview(&value_text(value), 120))]);
            }
            println!("{table}");
        }
    }

    fn display_compact(&self) {
        let message = self
            .response
            .as_ref()
            .map(|r| r.message_text())
            .or_else(|| self.answer.as_ref().map(|a| value_text(&a.to_value())))
            .unwrap_or_default();
        println!("{}\t{}\t{}", self.task, verdict_label(self), preview(&message, 200));
    }
}

/// Print a key-value pair in detail format
pub fn print_field(key: &str, value: &str) {
    println!("  {}: {}", key.cyan(), value);
}

/// Print an optional key-value pair
pub fn print_optional_field(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        print_field(key, v);
    }
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Status badge with color
pub fn status_badge(status: &str) -> String {
    match status {
        "accepted" => status.green().to_string(),
        "rejected" => status.red().to_string(),
        "computed" => status.blue().to_string(),
        _ => status.to_string(),
    }
}

/// Strings as-is, everything else as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Cut `text` to `max` characters, marking the cut.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut)
}
