//! In-memory forge for tests and offline runs

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use super::{HostingClient, HostingError, RepoSummary};

/// A repository held by [`MemoryHost`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRepo {
    pub description: String,
    pub topics: BTreeSet<String>,

    /// File contents keyed by `/`-separated path
    pub files: BTreeMap<String, Vec<u8>>,
}

/// Forge double that keeps repositories in memory.
///
/// Clones are materialized on disk so workflows can write into them; a push
/// reads the checkout back into the repository. Individual operations can be
/// made to fail per repository name.
#[derive(Debug, Default)]
pub struct MemoryHost {
    repos: RefCell<BTreeMap<String, MemoryRepo>>,
    checkouts: RefCell<HashMap<PathBuf, String>>,
    failing_creates: BTreeSet<String>,
    failing_pushes: BTreeSet<String>,
    failing_edits: BTreeSet<String>,
    journal: RefCell<Vec<String>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an existing repository
    pub fn with_repo(self, name: impl Into<String>, repo: MemoryRepo) -> Self {
        self.repos.borrow_mut().insert(name.into(), repo);
        self
    }

    /// Makes `create` fail for this name
    pub fn failing_create(mut self, name: impl Into<String>) -> Self {
        self.failing_creates.insert(name.into());
        self
    }

    /// Makes `push` fail for checkouts of this name
    pub fn failing_push(mut self, name: impl Into<String>) -> Self {
        self.failing_pushes.insert(name.into());
        self
    }

    /// Makes `edit_description` fail for this name
    pub fn failing_edit(mut self, name: impl Into<String>) -> Self {
        self.failing_edits.insert(name.into());
        self
    }

    /// Snapshot of a repository
    pub fn repo(&self, name: &str) -> Option<MemoryRepo> {
        self.repos.borrow().get(name).cloned()
    }

    /// A file's content as text
    pub fn file(&self, name: &str, path: &str) -> Option<String> {
        self.repos
            .borrow()
            .get(name)
            .and_then(|r| r.files.get(path))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Names of all repositories
    pub fn names(&self) -> Vec<String> {
        self.repos.borrow().keys().cloned().collect()
    }

    /// Mutating calls in the order they were made, e.g. `create my-post`
    pub fn journal(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }

    fn record(&self, entry: String) {
        self.journal.borrow_mut().push(entry);
    }

    fn injected(operation: &str, name: &str) -> HostingError {
        HostingError::Command {
            command: format!("{} {}", operation, name),
            stderr: "injected failure".to_string(),
        }
    }
}

impl HostingClient for MemoryHost {
    fn exists(&self, name: &str) -> bool {
        self.repos.borrow().contains_key(name)
    }

    fn create(&self, name: &str, description: &str) -> Result<(), HostingError> {
        self.record(format!("create {}", name));
        if self.failing_creates.contains(name) {
            return Err(Self::injected("create", name));
        }

        let mut repos = self.repos.borrow_mut();
        if repos.contains_key(name) {
            return Err(HostingError::Command {
                command: format!("create {}", name),
                stderr: "Name already exists on this account".to_string(),
            });
        }

        repos.insert(
            name.to_string(),
            MemoryRepo {
                description: description.to_string(),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn add_topic(&self, name: &str, topic: &str) -> Result<(), HostingError> {
        self.record(format!("add_topic {} {}", name, topic));
        let mut repos = self.repos.borrow_mut();
        let repo = repos
            .get_mut(name)
            .ok_or_else(|| HostingError::NotFound(name.to_string()))?;
        repo.topics.insert(topic.to_string());
        Ok(())
    }

    fn clone_repo(&self, name: &str, destination: &Path) -> Result<(), HostingError> {
        self.record(format!("clone {}", name));
        let repos = self.repos.borrow();
        let repo = repos
            .get(name)
            .ok_or_else(|| HostingError::NotFound(name.to_string()))?;

        if destination.exists() && fs::read_dir(destination)?.next().is_some() {
            return Err(HostingError::Command {
                command: format!("clone {}", name),
                stderr: format!(
                    "destination path '{}' already exists and is not an empty directory",
                    destination.display()
                ),
            });
        }

        fs::create_dir_all(destination)?;
        for (path, bytes) in &repo.files {
            let target = destination.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(target, bytes)?;
        }

        self.checkouts
            .borrow_mut()
            .insert(destination.to_path_buf(), name.to_string());
        Ok(())
    }

    fn push(&self, checkout: &Path, message: &str) -> Result<(), HostingError> {
        let name = self
            .checkouts
            .borrow()
            .get(checkout)
            .cloned()
            .ok_or_else(|| HostingError::NotFound(checkout.display().to_string()))?;
        self.record(format!("push {} {}", name, message));

        if self.failing_pushes.contains(&name) {
            return Err(Self::injected("push", &name));
        }

        let mut files = BTreeMap::new();
        collect_files(checkout, checkout, &mut files)?;

        let mut repos = self.repos.borrow_mut();
        let repo = repos
            .get_mut(&name)
            .ok_or_else(|| HostingError::NotFound(name.clone()))?;
        repo.files = files;
        Ok(())
    }

    fn read_file(&self, name: &str, path: &str) -> Option<Vec<u8>> {
        self.repos.borrow().get(name)?.files.get(path).cloned()
    }

    fn edit_description(&self, name: &str, description: &str) -> Result<(), HostingError> {
        self.record(format!("edit_description {}", name));
        if self.failing_edits.contains(name) {
            return Err(Self::injected("edit_description", name));
        }

        let mut repos = self.repos.borrow_mut();
        let repo = repos
            .get_mut(name)
            .ok_or_else(|| HostingError::NotFound(name.to_string()))?;
        repo.description = description.to_string();
        Ok(())
    }

    fn list_by_topic(&self, topic: &str) -> Result<Vec<RepoSummary>, HostingError> {
        Ok(self
            .repos
            .borrow()
            .iter()
            .filter(|(_, repo)| repo.topics.contains(topic))
            .map(|(name, repo)| RepoSummary {
                name: name.clone(),
                url: format!("memory://{}", name),
                description: Some(repo.description.clone()).filter(|d| !d.is_empty()),
            })
            .collect())
    }
}

/// Reads every file under `dir` (skipping `.git`) keyed by its path relative to `root`
fn collect_files(
    root: &Path,
    dir: &Path,
    files: &mut BTreeMap<String, Vec<u8>>,
) -> Result<(), HostingError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.file_name().is_some_and(|n| n == ".git") {
            continue;
        }

        if path.is_dir() {
            collect_files(root, &path, files)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .map_err(|e| HostingError::Decode(e.to_string()))?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.insert(key, fs::read(&path)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_then_exists() {
        let host = MemoryHost::new();
        assert!(!host.exists("post"));

        host.create("post", "A post").unwrap();
        assert!(host.exists("post"));
        assert_eq!(host.repo("post").unwrap().description, "A post");
        assert!(host.create("post", "again").is_err());
    }

    #[test]
    fn clone_write_push_roundtrip() {
        let dir = TempDir::new().unwrap();
        let host = MemoryHost::new();
        host.create("post", "A post").unwrap();

        let checkout = dir.path().join("post");
        host.clone_repo("post", &checkout).unwrap();
        fs::create_dir_all(checkout.join("images")).unwrap();
        fs::write(checkout.join("README.md"), "hello").unwrap();
        fs::write(checkout.join("images/a.png"), b"png").unwrap();
        host.push(&checkout, "initial").unwrap();

        assert_eq!(host.file("post", "README.md").as_deref(), Some("hello"));
        assert_eq!(host.read_file("post", "images/a.png"), Some(b"png".to_vec()));
        assert_eq!(
            host.journal(),
            vec!["create post", "clone post", "push post initial"]
        );
    }

    #[test]
    fn clone_into_non_empty_directory_fails() {
        let dir = TempDir::new().unwrap();
        let host = MemoryHost::new();
        host.create("post", "A post").unwrap();

        fs::write(dir.path().join("stray.txt"), "x").unwrap();
        assert!(host.clone_repo("post", dir.path()).is_err());
    }

    #[test]
    fn list_by_topic_filters() {
        let mut tagged = MemoryRepo::default();
        tagged.topics.insert("blog-post".to_string());

        let host = MemoryHost::new()
            .with_repo("tagged", tagged)
            .with_repo("plain", MemoryRepo::default());

        let listed = host.list_by_topic("blog-post").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "tagged");
        assert_eq!(listed[0].description, None);
    }

    #[test]
    fn injected_failures() {
        let host = MemoryHost::new().failing_create("bad").failing_edit("bad");
        assert!(host.create("bad", "x").is_err());
        assert!(host.edit_description("bad", "x").is_err());
    }
}
