//! Forge access through the `gh` and `git` command-line tools

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{HostingClient, HostingError, RepoSummary};

/// Client that shells out to `gh` for forge calls and `git` for pushes
#[derive(Debug, Clone)]
pub struct GhClient {
    /// `gh` executable (name on PATH or full path)
    program: PathBuf,

    /// Account that owns the repositories
    owner: String,

    /// `public`, `private` or `internal`
    visibility: String,

    /// Remote branch that receives pushes
    branch: String,

    /// Upper bound for `gh repo list`
    list_limit: usize,
}

impl GhClient {
    /// Creates a client for the given owner using `gh` from PATH
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            program: PathBuf::from("gh"),
            owner: owner.into(),
            visibility: "public".to_string(),
            branch: "main".to_string(),
            list_limit: 50,
        }
    }

    /// Uses a different `gh` executable
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = visibility.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    /// `OWNER/NAME`
    pub fn full_name(&self, name: &str) -> String {
        format!("{}/{}", self.owner, name)
    }

    /// Runs `gh` and returns stdout, failing on a non-zero exit
    fn gh(&self, args: &[&str]) -> Result<String, HostingError> {
        let mut command = Command::new(&self.program);
        command.args(args);
        let output = run(&mut command, &self.program.display().to_string(), args)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs `git` inside a checkout
    fn git(&self, checkout: &Path, args: &[&str]) -> Result<(), HostingError> {
        let mut command = Command::new("git");
        command.args(args).current_dir(checkout);
        run(&mut command, "git", args)?;
        Ok(())
    }
}

fn run(command: &mut Command, program: &str, args: &[&str]) -> Result<Output, HostingError> {
    let display = format!("{} {}", program, args.join(" "));
    log::debug!("Running: {}", display);

    let output = command.output().map_err(|source| HostingError::Spawn {
        program: program.to_string(),
        source,
    })?;

    if !output.status.success() {
        return Err(HostingError::Command {
            command: display,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

impl HostingClient for GhClient {
    fn exists(&self, name: &str) -> bool {
        match self.gh(&["repo", "view", &self.full_name(name)]) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("Treating {} as absent: {}", name, e);
                false
            }
        }
    }

    fn create(&self, name: &str, description: &str) -> Result<(), HostingError> {
        let visibility = format!("--{}", self.visibility);
        self.gh(&[
            "repo",
            "create",
            &self.full_name(name),
            &visibility,
            "--description",
            description,
        ])?;
        Ok(())
    }

    fn add_topic(&self, name: &str, topic: &str) -> Result<(), HostingError> {
        self.gh(&["repo", "edit", &self.full_name(name), "--add-topic", topic])?;
        Ok(())
    }

    fn clone_repo(&self, name: &str, destination: &Path) -> Result<(), HostingError> {
        let destination = destination.to_string_lossy();
        self.gh(&["repo", "clone", &self.full_name(name), &destination])?;
        Ok(())
    }

    fn push(&self, checkout: &Path, message: &str) -> Result<(), HostingError> {
        let refspec = format!("HEAD:{}", self.branch);
        self.git(checkout, &["add", "."])?;
        self.git(checkout, &["commit", "-m", message])?;
        self.git(checkout, &["push", "origin", &refspec])?;
        Ok(())
    }

    fn read_file(&self, name: &str, path: &str) -> Option<Vec<u8>> {
        let endpoint = format!("repos/{}/contents/{}", self.full_name(name), path);
        let encoded = match self.gh(&["api", &endpoint, "--jq", ".content"]) {
            Ok(out) => out,
            Err(e) => {
                log::debug!("Could not read {} from {}: {}", path, name, e);
                return None;
            }
        };

        // The API wraps base64 content at 60 columns
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        match STANDARD.decode(compact) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::debug!("Could not decode {} from {}: {}", path, name, e);
                None
            }
        }
    }

    fn edit_description(&self, name: &str, description: &str) -> Result<(), HostingError> {
        self.gh(&[
            "repo",
            "edit",
            &self.full_name(name),
            "--description",
            description,
        ])?;
        Ok(())
    }

    fn list_by_topic(&self, topic: &str) -> Result<Vec<RepoSummary>, HostingError> {
        let limit = self.list_limit.to_string();
        let stdout = self.gh(&[
            "repo",
            "list",
            &self.owner,
            "--topic",
            topic,
            "--json",
            "name,url,description",
            "--limit",
            &limit,
        ])?;

        serde_json::from_str(&stdout).map_err(|e| HostingError::Decode(e.to_string()))
    }
}
