//! Description verification for published posts
//!
//! Re-derives each published post's description from its README and updates
//! the repository only when the text differs. A second run over unchanged
//! repositories performs no writes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{derive_description, Document};
use crate::hosting::{HostingClient, HostingError, RepoSummary};

/// Title reported when a README has none
pub const MISSING_TITLE: &str = "NO TITLE";

/// Inputs for a verification run
#[derive(Debug, Clone)]
pub struct VerifySettings {
    pub topic: String,
    pub exclude: Vec<String>,
    pub max_length: usize,

    /// Compute descriptions without editing anything
    pub dry_run: bool,
}

/// Outcome for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationRecord {
    Updated {
        name: String,
        title: String,
        old_description: Option<String>,
        new_description: String,
    },
    Unchanged {
        name: String,
        title: String,
        description: Option<String>,
    },
    Failed {
        name: String,
        reason: String,
    },
}

impl VerificationRecord {
    pub fn name(&self) -> &str {
        match self {
            VerificationRecord::Updated { name, .. }
            | VerificationRecord::Unchanged { name, .. }
            | VerificationRecord::Failed { name, .. } => name,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, VerificationRecord::Updated { .. })
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, VerificationRecord::Unchanged { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, VerificationRecord::Failed { .. })
    }
}

/// Keeps repository descriptions in line with README content
pub struct Verifier<'a, C: HostingClient + ?Sized> {
    client: &'a C,
    settings: VerifySettings,
}

impl<'a, C: HostingClient + ?Sized> Verifier<'a, C> {
    pub fn new(client: &'a C, settings: VerifySettings) -> Self {
        Self { client, settings }
    }

    /// Verifies every repository tagged with the topic, in name order.
    ///
    /// Listing failure is the only error; per-repository problems are records.
    pub fn run(&self) -> Result<Vec<VerificationRecord>, HostingError> {
        let mut repos: Vec<_> = self
            .client
            .list_by_topic(&self.settings.topic)?
            .into_iter()
            .filter(|r| !self.settings.exclude.contains(&r.name))
            .collect();
        repos.sort_by(|a, b| a.name.cmp(&b.name));

        log::info!("Found {} repositories to verify", repos.len());

        Ok(repos.iter().map(|repo| self.verify_repo(repo)).collect())
    }

    /// Verifies a single repository
    pub fn verify_repo(&self, repo: &RepoSummary) -> VerificationRecord {
        log::info!("Processing: {}", repo.name);
        log::debug!("Current description: {:?}", repo.description);

        let failed = |reason: &str| {
            log::warn!("{}: {}", repo.name, reason);
            VerificationRecord::Failed {
                name: repo.name.clone(),
                reason: reason.to_string(),
            }
        };

        let Some(bytes) = self.client.read_file(&repo.name, "README.md") else {
            return failed("Could not fetch README");
        };
        let Ok(content) = String::from_utf8(bytes) else {
            return failed("README is not valid UTF-8");
        };

        let document = Document::parse(&content);

        let title = document
            .metadata
            .title()
            .unwrap_or_else(|| MISSING_TITLE.to_string());
        let description = derive_description(&document.body, self.settings.max_length);
        log::debug!("Generated description: {}", description);

        if description.is_empty() || repo.description.as_deref() == Some(description.as_str()) {
            log::info!("Description already good: {}", repo.name);
            return VerificationRecord::Unchanged {
                name: repo.name.clone(),
                title,
                description: repo.description.clone(),
            };
        }

        if !self.settings.dry_run {
            if let Err(e) = self.client.edit_description(&repo.name, &description) {
                log::error!("Failed to update description for {}: {}", repo.name, e);
                return failed("Failed to update description");
            }
        }

        log::info!("Updated description: {}", repo.name);
        VerificationRecord::Updated {
            name: repo.name.clone(),
            title,
            old_description: repo.description.clone(),
            new_description: description,
        }
    }
}

/// Writes records as a pretty-printed JSON array
pub fn write_results(path: &Path, records: &[VerificationRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).context("Failed to serialize results")?;
    fs::write(path, json).with_context(|| format!("Failed to write results: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::{MemoryHost, MemoryRepo};
    use tempfile::TempDir;

    fn settings() -> VerifySettings {
        VerifySettings {
            topic: "blog-post".to_string(),
            exclude: vec!["blog-test".to_string()],
            max_length: 300,
            dry_run: false,
        }
    }

    fn published(readme: &str, description: &str) -> MemoryRepo {
        let mut repo = MemoryRepo {
            description: description.to_string(),
            ..Default::default()
        };
        repo.topics.insert("blog-post".to_string());
        repo.files
            .insert("README.md".to_string(), readme.as_bytes().to_vec());
        repo
    }

    #[test]
    fn records_serialize_with_status_tag() {
        let record = VerificationRecord::Failed {
            name: "x".into(),
            reason: "Could not fetch README".into(),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({"status": "failed", "name": "x", "reason": "Could not fetch README"})
        );
    }

    #[test]
    fn dry_run_reports_without_editing() {
        let host = MemoryHost::new().with_repo(
            "post",
            published("---\ntitle: T\n---\n\nFresh text here.", "stale"),
        );
        let verifier = Verifier::new(
            &host,
            VerifySettings {
                dry_run: true,
                ..settings()
            },
        );

        let records = verifier.run().unwrap();
        assert!(records[0].is_updated());
        assert_eq!(host.repo("post").unwrap().description, "stale");
        assert!(host.journal().is_empty());
    }

    #[test]
    fn excluded_repositories_are_skipped() {
        let host = MemoryHost::new()
            .with_repo("blog-test", published("Body text.", ""))
            .with_repo("real", published("Body text.", ""));

        let records = Verifier::new(&host, settings()).run().unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn write_results_produces_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let records = vec![VerificationRecord::Unchanged {
            name: "a".into(),
            title: "A".into(),
            description: Some("Hi.".into()),
        }];

        write_results(&path, &records).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["status"], "unchanged");
        assert_eq!(value[0]["description"], "Hi.");
    }
}
