//! Human-readable run log
//!
//! Entries are timestamped and leveled, mirrored to the `log` facade as they
//! are recorded, and saved as a Markdown document at the end of a run.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity of a run log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn as_log_level(self) -> log::Level {
        match self {
            LogLevel::Info => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A single run log line
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.level,
            self.message
        )
    }
}

/// Ordered, append-only log of one run
#[derive(Debug, Clone)]
pub struct RunLog {
    title: String,
    started: DateTime<Local>,
    entries: Vec<LogEntry>,
}

impl RunLog {
    /// Starts a new log; `title` becomes the document heading
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            started: Local::now(),
            entries: Vec::new(),
        }
    }

    /// Appends an entry
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: Local::now(),
            level,
            message: message.into(),
        };
        log::log!(entry.level.as_log_level(), "{}", entry.message);
        self.entries.push(entry);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries at the given level
    pub fn count(&self, level: LogLevel) -> usize {
        self.entries.iter().filter(|e| e.level == level).count()
    }

    /// Renders the log as Markdown, stamping the completion time
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!(
            "**Started:** {}\n\n",
            self.started.format(TIMESTAMP_FORMAT)
        ));
        out.push_str(&format!(
            "**Completed:** {}\n\n",
            Local::now().format(TIMESTAMP_FORMAT)
        ));
        out.push_str("## Migration Log\n\n");

        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }

        out
    }

    /// Writes the rendered log to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path, self.render())
            .with_context(|| format!("Failed to write run log: {}", path.display()))
    }
}
