//! git driver.
//!
//! Mutating operations (checkout, branch creation, staging, commit, push)
//! shell out to the `git` binary so hooks, credential helpers and the user's
//! config apply as usual. Read-only queries go through libgit2.
//!
//! Failures carry git's stderr unchanged. Nothing is rolled back: a sequence
//! that fails halfway leaves the working copy where the last successful step
//! put it.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use git2::{BranchType, Repository};
use tokio::process::Command;

use crate::errors::VcsError;

/// Operations jt needs from version control.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Local branch names, ordered by name.
    async fn list_branches(&self) -> Result<Vec<String>, VcsError>;
    async fn checkout(&self, reference: &str) -> Result<(), VcsError>;
    /// Create `name` from the current HEAD and switch to it.
    async fn create_branch(&self, name: &str) -> Result<(), VcsError>;
    async fn stage_all(&self) -> Result<(), VcsError>;
    async fn commit(&self, message: &str) -> Result<(), VcsError>;
    async fn current_branch(&self) -> Result<String, VcsError>;
    /// Push `branch` to `remote` and set it as upstream.
    async fn push(&self, remote: &str, branch: &str) -> Result<(), VcsError>;
}

/// [`Vcs`] backed by the local repository containing `workdir`.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Open the repository that contains `dir` and anchor the driver at its
    /// top-level directory.
    pub fn discover(dir: &Path) -> Result<Self, VcsError> {
        let repo = Repository::discover(dir)?;
        let root = repo
            .workdir()
            .ok_or_else(|| git2::Error::from_str("bare repositories are not supported"))?;
        Ok(Self::new(root))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn open(&self) -> Result<Repository, VcsError> {
        Ok(Repository::open(&self.workdir)?)
    }

    async fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        let command = args.join(" ");
        tracing::debug!(%command, workdir = %self.workdir.display(), "git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| VcsError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(%command, code = ?output.status.code(), "git failed");
            return Err(VcsError::Failed { command, stderr });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn list_branches(&self) -> Result<Vec<String>, VcsError> {
        let repo = self.open()?;
        let mut names = Vec::new();
        for branch in repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn checkout(&self, reference: &str) -> Result<(), VcsError> {
        self.run(&["checkout", reference]).await.map(drop)
    }

    async fn create_branch(&self, name: &str) -> Result<(), VcsError> {
        self.run(&["checkout", "-b", name]).await.map(drop)
    }

    async fn stage_all(&self) -> Result<(), VcsError> {
        self.run(&["add", "."]).await.map(drop)
    }

    async fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.run(&["commit", "-m", message]).await.map(drop)
    }

    async fn current_branch(&self) -> Result<String, VcsError> {
        let repo = self.open()?;
        let head = repo.head()?;
        if !head.is_branch() {
            return Err(git2::Error::from_str("HEAD is detached; check out a branch first").into());
        }
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| git2::Error::from_str("branch name is not valid UTF-8").into())
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<(), VcsError> {
        self.run(&["push", "-u", remote, branch]).await.map(drop)
    }
}
