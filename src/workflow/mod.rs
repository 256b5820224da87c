//! # Workflows
//!
//! The three passes run by the CLI. Each takes a [`HostingClient`] and its
//! settings at construction, processes items strictly one after another, and
//! turns every per-item failure into a record instead of an error.
//!
//! | Pass | Type | Records |
//! |------|------|---------|
//! | Migrate posts into repositories | [`Migrator`] | [`MigrationRecord`] |
//! | Refresh repository descriptions | [`Verifier`] | [`VerificationRecord`] |
//! | Write missing titles | [`TitleFixer`] | [`TitleFixRecord`] |
//!
//! [`HostingClient`]: crate::hosting::HostingClient

mod fix_titles;
mod migrate;
mod runlog;
mod verify;

pub use fix_titles::{TitleFix, TitleFixRecord, TitleFixer, TITLE_FIX_MESSAGE};
pub use migrate::{
    creation_description, MigrateSettings, MigrationOutcome, MigrationRecord, MigrationStatus,
    MigrationSummary, Migrator, IGNORE_FILE, MIGRATION_LOG_TITLE,
};
pub use runlog::{LogEntry, LogLevel, RunLog};
pub use verify::{write_results, VerificationRecord, VerifySettings, Verifier, MISSING_TITLE};
