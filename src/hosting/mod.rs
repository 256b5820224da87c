//! # Hosting
//!
//! The forge that receives migrated posts. Workflows only see the
//! [`HostingClient`] trait; [`GhClient`] drives the `gh` and `git` command-line
//! tools, and [`MemoryHost`] keeps repositories in memory for tests.
//!
//! | Operation | `gh`/`git` invocation |
//! |-----------|-----------------------|
//! | exists | `gh repo view OWNER/NAME` |
//! | create | `gh repo create OWNER/NAME --public --description D` |
//! | add_topic | `gh repo edit OWNER/NAME --add-topic T` |
//! | clone_repo | `gh repo clone OWNER/NAME DEST` |
//! | push | `git add .`, `git commit -m M`, `git push origin HEAD:BRANCH` |
//! | read_file | `gh api repos/OWNER/NAME/contents/PATH --jq .content` |
//! | edit_description | `gh repo edit OWNER/NAME --description D` |
//! | list_by_topic | `gh repo list OWNER --topic T --json name,url,description` |

mod gh;
mod memory;

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gh::GhClient;
pub use memory::{MemoryHost, MemoryRepo};

#[derive(Debug, Error)]
pub enum HostingError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("Unexpected response from forge: {0}")]
    Decode(String),

    #[error("Repository not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A repository as listed by the forge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Operations the workflows need from a repository host
pub trait HostingClient {
    /// Returns true if a repository with this name exists
    fn exists(&self, name: &str) -> bool;

    /// Creates an empty repository
    fn create(&self, name: &str, description: &str) -> Result<(), HostingError>;

    /// Tags a repository with a topic
    fn add_topic(&self, name: &str, topic: &str) -> Result<(), HostingError>;

    /// Clones a repository into `destination`
    fn clone_repo(&self, name: &str, destination: &Path) -> Result<(), HostingError>;

    /// Commits everything in a checkout and pushes it
    fn push(&self, checkout: &Path, message: &str) -> Result<(), HostingError>;

    /// Reads a file from the default branch, `None` if it cannot be fetched
    fn read_file(&self, name: &str, path: &str) -> Option<Vec<u8>>;

    /// Replaces the repository description
    fn edit_description(&self, name: &str, description: &str) -> Result<(), HostingError>;

    /// Lists repositories tagged with a topic
    fn list_by_topic(&self, topic: &str) -> Result<Vec<RepoSummary>, HostingError>;
}
