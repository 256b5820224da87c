//! # Storage Layer
//!
//! Local inputs for every command.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Source posts | Markdown + YAML frontmatter | `<source>/_posts/*.md` |
//! | Images | Binary | `<source>/assets/images/` |
//! | Project config | TOML | `./spoke.toml` or `--config` |
//! | Global config | TOML | `~/.config/spoke/config.toml` |
//!
//! ## Key Types
//!
//! - [`PostStore`] - Lists and reads source posts
//! - [`Config`] - Project and global configuration

mod config;
mod posts;

pub use config::{
    Config, ConfigError, GlobalConfig, MigrateConfig, ProjectConfig, VerifyConfig,
    PROJECT_CONFIG_FILE,
};
pub use posts::PostStore;
