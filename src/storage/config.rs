//! Configuration handling for spoke
//!
//! Configuration is read from `spoke.toml` (project, or `--config`) and
//! `~/.config/spoke/config.toml` (global). Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::TitleFix;

/// Project config file looked up in the current directory
pub const PROJECT_CONFIG_FILE: &str = "spoke.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("No repository owner configured. Pass --owner, set SPOKE_OWNER, or add `owner` to spoke.toml")]
    MissingOwner,
}

/// Settings for `spoke migrate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Root of the Jekyll site checkout
    pub source: PathBuf,

    /// Posts directory, relative to `source`
    pub posts_dir: PathBuf,

    /// Images directory, relative to `source`
    pub images_dir: PathBuf,

    /// Where per-post checkouts are made
    pub work_dir: PathBuf,

    /// Run log destination
    pub log_file: PathBuf,

    /// Number of posts processed with `--test`
    pub test_limit: usize,

    /// Maximum length of the description passed to repository creation
    pub description_limit: usize,

    pub commit_message: String,

    /// Branch that receives the first push
    pub branch: String,

    /// `public`, `private` or `internal`
    pub visibility: String,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("/tmp/matcham89.github.io"),
            posts_dir: PathBuf::from("_posts"),
            images_dir: PathBuf::from("assets/images"),
            work_dir: PathBuf::from("/tmp/blog-migration"),
            log_file: PathBuf::from("migration-log.md"),
            test_limit: 2,
            description_limit: 350,
            commit_message: "Migrate blog post from Jekyll site".to_string(),
            branch: "main".to_string(),
            visibility: "public".to_string(),
        }
    }
}

/// Settings for `spoke verify`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Maximum description length
    pub max_length: usize,

    /// JSON results destination
    pub results_file: PathBuf,

    /// Repositories never touched by verification
    pub exclude: Vec<String>,

    /// Upper bound on listed repositories
    pub list_limit: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            max_length: 300,
            results_file: PathBuf::from("repo_verification_results.json"),
            exclude: vec!["blog-test".to_string()],
            list_limit: 50,
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Account that owns the published repositories
    pub owner: Option<String>,

    /// Topic that marks published posts
    pub topic: String,

    /// `gh` executable
    pub gh: Option<String>,

    pub migrate: MigrateConfig,

    pub verify: VerifyConfig,

    /// Titles to write into already-published posts
    pub title_fixes: Vec<TitleFix>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            owner: None,
            topic: "blog-post".to_string(),
            gh: None,
            migrate: MigrateConfig::default(),
            verify: VerifyConfig::default(),
            title_fixes: Vec::new(),
        }
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default owner when a project does not set one
    pub owner: Option<String>,

    /// Default `gh` executable
    pub gh: Option<String>,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,

    /// Project config file that was loaded, if any
    pub path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration.
    ///
    /// An explicit path must exist; otherwise `spoke.toml` in the current
    /// directory is used when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let global = Self::load_global()?;

        let (project, path) = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()).into());
                }
                (Self::load_project_file(path)?, Some(path.to_path_buf()))
            }
            None => {
                let path = PathBuf::from(PROJECT_CONFIG_FILE);
                if path.is_file() {
                    (Self::load_project_file(&path)?, Some(path))
                } else {
                    (ProjectConfig::default(), None)
                }
            }
        };

        Ok(Self {
            project,
            global,
            path,
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "spoke", "spoke").map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    fn load_project_file(path: &Path) -> Result<ProjectConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read project config: {}", path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse project config: {}", path.display()))
    }

    /// Owner from the flag/environment override, then project, then global config
    pub fn owner(&self, flag: Option<&str>) -> Result<String> {
        flag.map(str::to_string)
            .or_else(|| self.project.owner.clone())
            .or_else(|| self.global.owner.clone())
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingOwner.into())
    }

    /// `gh` executable from the flag, then project, then global config
    pub fn gh_program(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.project.gh.clone())
            .or_else(|| self.global.gh.clone())
            .unwrap_or_else(|| "gh".to_string())
    }
}
