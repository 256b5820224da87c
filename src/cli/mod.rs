//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `migrate` | Publish each source post as its own repository |
//! | `verify` | Regenerate repository descriptions from READMEs |
//! | `fix-titles` | Write missing titles into published READMEs |
//! | `inspect` | Preview what migration derives from one post |
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! Progress is logged to stderr; `--verbose` (or `RUST_LOG=debug`) adds the
//! underlying `gh`/`git` invocations.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod fix_titles;
mod inspect;
mod migrate;
mod output;
mod verify;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
