//! Post migration
//!
//! Each source post ends in exactly one of three states:
//!
//! ```text
//! pending ──► conflict        name already taken, nothing touched
//!        ├──► failed          create, clone, write or push went wrong
//!        └──► success         repository created and populated
//! ```
//!
//! Posts are processed one at a time. A failure is recorded and the run moves
//! on; nothing is retried and a repository created before a later failure is
//! left in place.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{
    find_image_references, relocate_images, slug_from_filename, strip_templating, Document,
    ImageResolver, Metadata, Relocation, SourcePost, IMAGE_DIR,
};
use crate::hosting::{HostingClient, HostingError};
use crate::storage::{MigrateConfig, PostStore};

use super::runlog::RunLog;

/// Heading of the saved migration log
pub const MIGRATION_LOG_TITLE: &str = "Jekyll to Hub & Spoke Migration Log";

/// Ignore file written next to every migrated README
pub const IGNORE_FILE: &str = "# Editor files\n.DS_Store\n*.swp\n*.swo\n*~\n\n# IDE\n.vscode/\n.idea/\n";

/// Inputs for a migration run
#[derive(Debug, Clone)]
pub struct MigrateSettings {
    /// Root of the Jekyll site
    pub source: PathBuf,

    /// Directory holding site images
    pub images_dir: PathBuf,

    /// Where per-post checkouts are made
    pub work_dir: PathBuf,

    /// Topic added to every created repository
    pub topic: String,

    pub description_limit: usize,

    pub commit_message: String,

    /// Parse and transform only; no filesystem or forge writes
    pub dry_run: bool,

    /// Process at most this many posts
    pub limit: Option<usize>,
}

impl MigrateSettings {
    pub fn from_config(config: &MigrateConfig, topic: &str) -> Self {
        Self {
            source: config.source.clone(),
            images_dir: config.source.join(&config.images_dir),
            work_dir: config.work_dir.clone(),
            topic: topic.to_string(),
            description_limit: config.description_limit,
            commit_message: config.commit_message.clone(),
            dry_run: false,
            limit: None,
        }
    }
}

/// Terminal state of one post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    Success,
    Failed,
    Conflict,
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationStatus::Success => write!(f, "success"),
            MigrationStatus::Failed => write!(f, "failed"),
            MigrationStatus::Conflict => write!(f, "conflict"),
        }
    }
}

/// State-specific details of a migrated post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationOutcome {
    Success { title: String, date: String },
    Failed { reason: String },
    Conflict { reason: String },
}

/// What happened to one source post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    pub filename: String,
    pub repo_name: String,

    #[serde(flatten)]
    pub outcome: MigrationOutcome,
}

impl MigrationRecord {
    fn new(filename: &str, repo_name: &str, outcome: MigrationOutcome) -> Self {
        Self {
            filename: filename.to_string(),
            repo_name: repo_name.to_string(),
            outcome,
        }
    }

    fn failed(filename: &str, repo_name: &str, reason: impl Into<String>) -> Self {
        Self::new(
            filename,
            repo_name,
            MigrationOutcome::Failed {
                reason: reason.into(),
            },
        )
    }

    pub fn status(&self) -> MigrationStatus {
        match self.outcome {
            MigrationOutcome::Success { .. } => MigrationStatus::Success,
            MigrationOutcome::Failed { .. } => MigrationStatus::Failed,
            MigrationOutcome::Conflict { .. } => MigrationStatus::Conflict,
        }
    }

    /// Failure or conflict reason
    pub fn reason(&self) -> Option<&str> {
        match &self.outcome {
            MigrationOutcome::Failed { reason } | MigrationOutcome::Conflict { reason } => {
                Some(reason)
            }
            MigrationOutcome::Success { .. } => None,
        }
    }
}

/// Records of a run, grouped by outcome
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationSummary {
    pub success: Vec<MigrationRecord>,
    pub failed: Vec<MigrationRecord>,
    pub conflicts: Vec<MigrationRecord>,
}

impl MigrationSummary {
    pub fn push(&mut self, record: MigrationRecord) {
        match record.status() {
            MigrationStatus::Success => self.success.push(record),
            MigrationStatus::Failed => self.failed.push(record),
            MigrationStatus::Conflict => self.conflicts.push(record),
        }
    }

    pub fn total(&self) -> usize {
        self.success.len() + self.failed.len() + self.conflicts.len()
    }

    /// Appends the end-of-run summary to the log
    pub fn write_to(&self, log: &mut RunLog) {
        log.info("=".repeat(60));
        log.info("MIGRATION SUMMARY");
        log.info("=".repeat(60));
        log.info(format!("Successful: {}", self.success.len()));
        log.info(format!("Failed: {}", self.failed.len()));
        log.info(format!("Conflicts: {}", self.conflicts.len()));

        if !self.success.is_empty() {
            log.info("Successfully migrated:");
            for r in &self.success {
                log.info(format!("  - {} ({})", r.repo_name, r.filename));
            }
        }

        if !self.failed.is_empty() {
            log.info("Failed migrations:");
            for r in &self.failed {
                log.info(format!("  - {}: {}", r.repo_name, r.reason().unwrap_or_default()));
            }
        }

        if !self.conflicts.is_empty() {
            log.info("Conflicts (repos already exist):");
            for r in &self.conflicts {
                log.info(format!("  - {}", r.repo_name));
            }
        }
    }
}

/// Moves source posts into one repository each
pub struct Migrator<'a, C: HostingClient + ?Sized> {
    client: &'a C,
    settings: MigrateSettings,
    resolver: ImageResolver,

    /// Names created earlier in this run (or that a dry run would have created)
    claimed: HashSet<String>,
}

impl<'a, C: HostingClient + ?Sized> Migrator<'a, C> {
    pub fn new(client: &'a C, settings: MigrateSettings) -> Self {
        let resolver = ImageResolver::new(&settings.source, &settings.images_dir);
        Self {
            client,
            settings,
            resolver,
            claimed: HashSet::new(),
        }
    }

    pub fn settings(&self) -> &MigrateSettings {
        &self.settings
    }

    /// Migrates every post in the store, up to the configured limit.
    ///
    /// Only an unreadable posts directory or work directory is an error;
    /// per-post problems end up in the summary.
    pub fn run(&mut self, store: &PostStore, log: &mut RunLog) -> Result<MigrationSummary> {
        let mut posts = store.list()?;
        if let Some(limit) = self.settings.limit {
            posts.truncate(limit);
        }

        log.info(format!("Found {} posts to migrate", posts.len()));

        if !self.settings.dry_run {
            fs::create_dir_all(&self.settings.work_dir).with_context(|| {
                format!(
                    "Failed to create work directory: {}",
                    self.settings.work_dir.display()
                )
            })?;
        }

        let mut summary = MigrationSummary::default();

        for path in &posts {
            let record = match store.read(path) {
                Ok(post) => self.migrate_post(&post, log),
                Err(e) => {
                    let filename = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    log.error(format!("{:#}", e));
                    MigrationRecord::failed(&filename, &slug_from_filename(&filename), format!("{:#}", e))
                }
            };
            summary.push(record);
        }

        Ok(summary)
    }

    /// Migrates a single post
    pub fn migrate_post(&mut self, post: &SourcePost, log: &mut RunLog) -> MigrationRecord {
        log.info("=".repeat(60));
        log.info(format!("Processing: {}", post.filename));

        if let Some(e) = &post.frontmatter_error {
            log.error(format!("Error parsing frontmatter: {}", e));
        }

        let repo_name = post.identifier();
        let date = post.date();

        if self.claimed.contains(&repo_name) || self.client.exists(&repo_name) {
            log.warn(format!("Repository already exists: {}", repo_name));
            return MigrationRecord::new(
                &post.filename,
                &repo_name,
                MigrationOutcome::Conflict {
                    reason: "Repository already exists".to_string(),
                },
            );
        }

        // Only the title survives; the date lives in the repository history
        let title = post.title();
        let mut metadata = Metadata::new();
        metadata.insert("title", title.clone());

        let cleaned = strip_templating(&post.document.body);
        let references = find_image_references(&cleaned);
        let relocation = relocate_images(&cleaned, &references, &self.resolver);
        for missing in &relocation.missing {
            log.warn(format!("Image not found: {}", missing));
        }

        let readme = match Document::new(metadata, relocation.body.clone()).render() {
            Ok(readme) => readme,
            Err(e) => {
                log.error(format!("Failed to render README for {}: {}", repo_name, e));
                return MigrationRecord::failed(&post.filename, &repo_name, e.to_string());
            }
        };

        let description = creation_description(&title, &repo_name, self.settings.description_limit);

        if self.settings.dry_run {
            for copy in &relocation.copies {
                log.info(format!("[DRY RUN] Would copy image: {}", copy.file_name));
            }
            log.info(format!("[DRY RUN] Would create repo: {}", repo_name));
            self.claimed.insert(repo_name.clone());
            return self.success(post, &repo_name, title, date);
        }

        if let Err(e) = self.client.create(&repo_name, &description) {
            log.error(format!("Failed to create repo {}: {}", repo_name, e));
            return MigrationRecord::failed(
                &post.filename,
                &repo_name,
                "Failed to create repository",
            );
        }
        log.info(format!("Created repository: {}", repo_name));
        self.claimed.insert(repo_name.clone());

        if let Err(e) = self.client.add_topic(&repo_name, &self.settings.topic) {
            log.warn(format!(
                "Could not add topic {} to {}: {}",
                self.settings.topic, repo_name, e
            ));
        }

        if let Err(e) = self.publish(&repo_name, &readme, &relocation, log) {
            log.error(format!("Error during git operations for {}: {}", repo_name, e));
            return MigrationRecord::failed(&post.filename, &repo_name, e.to_string());
        }

        log.info(format!("Successfully migrated: {}", repo_name));
        self.success(post, &repo_name, title, date)
    }

    fn success(&self, post: &SourcePost, repo_name: &str, title: String, date: String) -> MigrationRecord {
        MigrationRecord::new(
            &post.filename,
            repo_name,
            MigrationOutcome::Success { title, date },
        )
    }

    /// Clones the new repository, fills it and pushes
    fn publish(
        &self,
        repo_name: &str,
        readme: &str,
        relocation: &Relocation,
        log: &mut RunLog,
    ) -> Result<(), HostingError> {
        let checkout = self.settings.work_dir.join(repo_name);
        self.client.clone_repo(repo_name, &checkout)?;

        relocation.copy_into(&checkout.join(IMAGE_DIR))?;
        for copy in &relocation.copies {
            log.info(format!("Copied image: {}", copy.file_name));
        }

        fs::write(checkout.join("README.md"), readme)?;
        fs::write(checkout.join(".gitignore"), IGNORE_FILE)?;

        self.client.push(&checkout, &self.settings.commit_message)
    }
}

/// Description given to a new repository: the title, cut to `limit`
/// characters, or a generic label when there is no title
pub fn creation_description(title: &str, repo_name: &str, limit: usize) -> String {
    if title.trim().is_empty() {
        format!("Blog post: {}", repo_name)
    } else {
        title.chars().take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_description_truncates_by_characters() {
        let title = "é".repeat(400);
        let description = creation_description(&title, "post", 350);
        assert_eq!(description.chars().count(), 350);
    }

    #[test]
    fn creation_description_falls_back_without_title() {
        assert_eq!(creation_description("  ", "my-post", 350), "Blog post: my-post");
    }

    #[test]
    fn summary_routes_records() {
        let mut summary = MigrationSummary::default();
        summary.push(MigrationRecord::new(
            "a.md",
            "a",
            MigrationOutcome::Success {
                title: "A".into(),
                date: "2024-01-01".into(),
            },
        ));
        summary.push(MigrationRecord::failed("b.md", "b", "boom"));
        summary.push(MigrationRecord::new(
            "c.md",
            "c",
            MigrationOutcome::Conflict {
                reason: "Repository already exists".into(),
            },
        ));

        assert_eq!(summary.success.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.conflicts.len(), 1);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.failed[0].reason(), Some("boom"));
    }

    #[test]
    fn record_serializes_with_status_tag() {
        let record = MigrationRecord::new(
            "2024-01-01-a.md",
            "a",
            MigrationOutcome::Success {
                title: "A".into(),
                date: "2024-01-01".into(),
            },
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "filename": "2024-01-01-a.md",
                "repo_name": "a",
                "status": "success",
                "title": "A",
                "date": "2024-01-01",
            })
        );
    }

    #[test]
    fn summary_is_logged() {
        let mut summary = MigrationSummary::default();
        summary.push(MigrationRecord::failed("b.md", "b", "boom"));

        let mut log = RunLog::new(MIGRATION_LOG_TITLE);
        summary.write_to(&mut log);

        let lines: Vec<_> = log.entries().iter().map(|e| e.message.as_str()).collect();
        assert!(lines.contains(&"Failed: 1"));
        assert!(lines.contains(&"  - b: boom"));
    }
}
