//! Terminal output for command results
//!
//! Text mode prints one tab-separated line per record followed by
//! `Label: value` totals. JSON mode prints exactly one document per command on
//! stdout; progress and diagnostics always go to stderr.

use std::fmt::Display;

use anyhow::{Context, Result};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Renders command results in the selected format
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Emits the result document of a command.
    ///
    /// JSON mode writes it compactly on one line; text mode pretty-prints it.
    pub fn document<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string(value),
            OutputFormat::Text => serde_json::to_string_pretty(value),
        }
        .context("Failed to serialize output")?;

        println!("{}", rendered);
        Ok(())
    }

    /// A status word followed by the record's fields (text only)
    pub fn record(&self, status: &str, fields: &[&str]) {
        if self.format == OutputFormat::Text {
            let mut line = status.to_string();
            for field in fields {
                line.push('\t');
                line.push_str(field);
            }
            println!("{}", line);
        }
    }

    /// `Label:<tab>value` (text only)
    pub fn field(&self, label: &str, value: &str) {
        if self.format == OutputFormat::Text {
            println!("{}:\t{}", label, value);
        }
    }

    /// `Label: value` summary line (text only)
    pub fn total(&self, label: &str, value: impl Display) {
        if self.format == OutputFormat::Text {
            println!("{}: {}", label, value);
        }
    }

    /// A free-form message; JSON mode wraps it as `{"message": ...}`
    pub fn message(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => println!("{}", serde_json::json!({ "message": message })),
        }
    }

    pub fn blank(&self) {
        if self.format == OutputFormat::Text {
            println!();
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}
