//! Typed error hierarchy for jt.
//!
//! One enum per collaborator:
//! - `BranchError`: branch and commit kind parsing
//! - `JiraError`: issue tracker requests
//! - `SettingsError`: credential file and topology record
//! - `VcsError`: git invocations
//!
//! Command handlers wrap these with `anyhow::Context` and the binary prints
//! the whole chain on one line.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from branch/commit kind handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BranchError {
    #[error("unsupported branch kind '{0}' (expected one of: feature, bugfix, hotfix, release)")]
    UnsupportedKind(String),

    #[error(
        "unsupported commit kind '{0}' (expected one of: feat, fix, chore, docs, style, refactor, test)"
    )]
    UnsupportedCommitKind(String),
}

/// Errors from the Jira REST client.
#[derive(Debug, Error)]
pub enum JiraError {
    #[error("Jira rejected the credentials (HTTP {status})")]
    Auth { status: u16 },

    #[error("Jira issue {key} not found")]
    NotFound { key: String },

    #[error("Jira returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid Jira domain '{url}'")]
    InvalidUrl { url: String },

    #[error("Failed to reach Jira: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Failed to parse Jira response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Errors from the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Jira credentials not configured ({missing} missing). Run 'jt setup' first.")]
    CredentialsNotFound { missing: &'static str },

    #[error("No branch configuration at {path}. Run 'jt setup' in this repository first.")]
    TopologyNotFound { path: PathBuf },

    #[error("Production and development branches must differ (both are '{0}')")]
    SameBranches(String),

    #[error("Branch configuration has no {0} branch")]
    MissingBranch(&'static str),

    #[error("{0} cannot contain quotes or line breaks")]
    UnsupportedValue(&'static str),

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Errors from git.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("Failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("Git repository error: {0}")]
    Repository(#[from] git2::Error),
}
