//! Branch, commit and push commands.
//!
//! Kinds are parsed before anything touches the network or the working copy.

use anyhow::{Context, Result};
use std::path::Path;

use jt::branch::{BranchKind, CommitKind};
use jt::git::GitCli;
use jt::settings::{self, Settings};
use jt::workflow::{self, DEFAULT_REMOTE};

use super::issue::fetch_issue;

fn open_repository(current_dir: &Path) -> Result<GitCli> {
    GitCli::discover(current_dir).context("Not a git repository")
}

pub async fn cmd_branch(
    settings: &Settings,
    current_dir: &Path,
    issue_key: &str,
    kind: &str,
) -> Result<()> {
    let kind: BranchKind = kind.parse()?;
    let git = open_repository(current_dir)?;
    let topology = settings::load_topology(git.workdir())
        .context("Failed to load branch configuration")?;

    let issue = fetch_issue(settings, issue_key).await?;
    let created =
        workflow::create_issue_branch(&git, &topology, kind, issue_key, &issue.summary).await?;

    println!("Created branch {} from {}", created.name, created.base);
    Ok(())
}

pub async fn cmd_commit(
    settings: &Settings,
    current_dir: &Path,
    issue_key: &str,
    kind: Option<&str>,
) -> Result<()> {
    let kind = match kind {
        Some(raw) => raw.parse::<CommitKind>()?,
        None => CommitKind::default(),
    };
    let git = open_repository(current_dir)?;

    let issue = fetch_issue(settings, issue_key).await?;
    let message = workflow::commit_issue_changes(&git, kind, issue_key, &issue.summary).await?;

    println!("Changes committed with message: {}", message);
    Ok(())
}

pub async fn cmd_push(current_dir: &Path) -> Result<()> {
    let git = open_repository(current_dir)?;
    let branch = workflow::push_current_branch(&git, DEFAULT_REMOTE).await?;

    println!("Successfully pushed branch {} to remote", branch);
    Ok(())
}
