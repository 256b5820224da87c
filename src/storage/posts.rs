//! Source post storage
//!
//! Jekyll keeps posts as flat `*.md` files in `_posts/`. The store lists them
//! in file name order (which is date order for dated names) and reads each
//! one into a [`SourcePost`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::SourcePost;

/// Read-only view of a posts directory
pub struct PostStore {
    dir: PathBuf,
}

impl PostStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store for `<source>/<posts_dir>`
    pub fn for_site(source: &Path, posts_dir: &Path) -> Self {
        Self::new(source.join(posts_dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of all `*.md` files, sorted by file name
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut posts = Vec::new();

        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read posts directory: {}", self.dir.display()))?
        {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && path.extension().is_some_and(|e| e == "md") {
                posts.push(path);
            }
        }

        posts.sort();
        Ok(posts)
    }

    /// Reads and parses one post
    pub fn read(&self, path: &Path) -> Result<SourcePost> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("Not a file path: {}", path.display()))?;

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read post: {}", path.display()))?;

        Ok(SourcePost::from_raw(filename, &content))
    }
}
