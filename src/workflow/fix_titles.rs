//! Title repair for already-published posts
//!
//! Some posts were published without a `title` key. Each configured fix
//! rewrites the README frontmatter with the given title and pushes it back.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::parse_lenient;
use crate::hosting::{HostingClient, HostingError};

/// Commit message for title fixes
pub const TITLE_FIX_MESSAGE: &str = "Add missing title to frontmatter";

/// A title to set on a published repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleFix {
    pub name: String,
    pub title: String,
}

impl FromStr for TitleFix {
    type Err = String;

    /// Parses `NAME=TITLE`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, title) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected NAME=TITLE, got '{}'", s))?;

        let (name, title) = (name.trim(), title.trim());
        if name.is_empty() || title.is_empty() {
            return Err(format!("Expected NAME=TITLE, got '{}'", s));
        }

        Ok(Self {
            name: name.to_string(),
            title: title.to_string(),
        })
    }
}

/// Outcome for one fix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TitleFixRecord {
    Fixed { name: String, title: String },
    Failed { name: String, reason: String },
}

impl TitleFixRecord {
    pub fn name(&self) -> &str {
        match self {
            TitleFixRecord::Fixed { name, .. } | TitleFixRecord::Failed { name, .. } => name,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, TitleFixRecord::Fixed { .. })
    }
}

/// Writes titles into published READMEs
pub struct TitleFixer<'a, C: HostingClient + ?Sized> {
    client: &'a C,
    work_dir: PathBuf,
    dry_run: bool,
}

impl<'a, C: HostingClient + ?Sized> TitleFixer<'a, C> {
    pub fn new(client: &'a C, work_dir: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            client,
            work_dir: work_dir.into(),
            dry_run,
        }
    }

    pub fn run(&self, fixes: &[TitleFix]) -> Vec<TitleFixRecord> {
        fixes.iter().map(|fix| self.fix(fix)).collect()
    }

    /// Applies a single fix
    pub fn fix(&self, fix: &TitleFix) -> TitleFixRecord {
        log::info!("Processing: {}", fix.name);
        log::info!("Adding title: {}", fix.title);

        match self.try_fix(fix) {
            Ok(()) => {
                log::info!("Successfully updated {}", fix.name);
                TitleFixRecord::Fixed {
                    name: fix.name.clone(),
                    title: fix.title.clone(),
                }
            }
            Err(reason) => {
                log::error!("Failed to update {}: {}", fix.name, reason);
                TitleFixRecord::Failed {
                    name: fix.name.clone(),
                    reason,
                }
            }
        }
    }

    fn try_fix(&self, fix: &TitleFix) -> Result<(), String> {
        let bytes = self
            .client
            .read_file(&fix.name, "README.md")
            .ok_or_else(|| "Could not fetch README".to_string())?;
        let content = String::from_utf8(bytes).map_err(|_| "README is not valid UTF-8".to_string())?;

        // Rewriting on top of an unreadable block would stack a second one
        let (mut document, error) = parse_lenient(&content);
        if let Some(e) = error {
            return Err(e.to_string());
        }

        document.metadata.insert("title", fix.title.clone());
        let readme = document.render().map_err(|e| e.to_string())?;

        if self.dry_run {
            log::info!("[DRY RUN] Would push new README to {}", fix.name);
            return Ok(());
        }

        let checkout = self.work_dir.join(format!("fix-title-{}", fix.name));
        let result = self.publish(fix, &checkout, &readme);

        if checkout.exists() {
            if let Err(e) = fs::remove_dir_all(&checkout) {
                log::warn!("Could not remove {}: {}", checkout.display(), e);
            }
        }

        result.map_err(|e| e.to_string())
    }

    fn publish(&self, fix: &TitleFix, checkout: &Path, readme: &str) -> Result<(), HostingError> {
        if checkout.exists() {
            fs::remove_dir_all(checkout)?;
        }

        self.client.clone_repo(&fix.name, checkout)?;
        fs::write(checkout.join("README.md"), readme)?;
        self.client.push(checkout, TITLE_FIX_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fix_argument() {
        let fix: TitleFix = "2024-12-7-Lokalise=Lokalise Translations = Done".parse().unwrap();
        assert_eq!(fix.name, "2024-12-7-Lokalise");
        assert_eq!(fix.title, "Lokalise Translations = Done");
    }

    #[test]
    fn parse_fix_argument_rejects_malformed() {
        assert!("no-separator".parse::<TitleFix>().is_err());
        assert!("=Title".parse::<TitleFix>().is_err());
        assert!("name=".parse::<TitleFix>().is_err());
    }
}
