//! Branch naming and base-branch selection.
//!
//! Everything here is pure: given an issue key, its summary and a kind, the
//! functions derive the branch name, the ref to branch from, and the commit
//! message. No I/O happens in this module.

use std::fmt;
use std::str::FromStr;

use crate::errors::BranchError;
use crate::settings::RepositoryTopology;
use crate::slug::slugify;

/// The kind of branch being created. Also the branch name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    Feature,
    Bugfix,
    Hotfix,
    Release,
}

impl BranchKind {
    pub const ALL: [BranchKind; 4] = [
        BranchKind::Feature,
        BranchKind::Bugfix,
        BranchKind::Hotfix,
        BranchKind::Release,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BranchKind::Feature => "feature",
            BranchKind::Bugfix => "bugfix",
            BranchKind::Hotfix => "hotfix",
            BranchKind::Release => "release",
        }
    }

    /// One-line description used in the usage text.
    pub fn description(self) -> &'static str {
        match self {
            BranchKind::Feature => "New feature branch (from development)",
            BranchKind::Bugfix => "Bug fix branch (from development)",
            BranchKind::Hotfix => "Hot fix branch (from production)",
            BranchKind::Release => "Release branch (from production)",
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BranchKind {
    type Err = BranchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feature" => Ok(BranchKind::Feature),
            "bugfix" => Ok(BranchKind::Bugfix),
            "hotfix" => Ok(BranchKind::Hotfix),
            "release" => Ok(BranchKind::Release),
            other => Err(BranchError::UnsupportedKind(other.to_string())),
        }
    }
}

/// Conventional-commit style prefix for commit messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitKind {
    Feat,
    Fix,
    #[default]
    Chore,
    Docs,
    Style,
    Refactor,
    Test,
}

impl CommitKind {
    pub const ALL: [CommitKind; 7] = [
        CommitKind::Feat,
        CommitKind::Fix,
        CommitKind::Chore,
        CommitKind::Docs,
        CommitKind::Style,
        CommitKind::Refactor,
        CommitKind::Test,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommitKind::Feat => "feat",
            CommitKind::Fix => "fix",
            CommitKind::Chore => "chore",
            CommitKind::Docs => "docs",
            CommitKind::Style => "style",
            CommitKind::Refactor => "refactor",
            CommitKind::Test => "test",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CommitKind::Feat => "New feature",
            CommitKind::Fix => "Bug fix",
            CommitKind::Chore => "Maintenance",
            CommitKind::Docs => "Documentation",
            CommitKind::Style => "Code style",
            CommitKind::Refactor => "Code refactoring",
            CommitKind::Test => "Testing",
        }
    }
}

impl fmt::Display for CommitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitKind {
    type Err = BranchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommitKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BranchError::UnsupportedCommitKind(s.to_string()))
    }
}

/// Pick the ref a new branch of `kind` is created from.
///
/// Single-branch repositories always branch off development. Two-tier
/// repositories send hotfixes and releases to production.
pub fn base_branch(kind: BranchKind, topology: &RepositoryTopology) -> &str {
    match topology {
        RepositoryTopology::Single { development } => development.as_str(),
        RepositoryTopology::TwoTier {
            production,
            development,
        } => match kind {
            BranchKind::Feature | BranchKind::Bugfix => development.as_str(),
            BranchKind::Hotfix | BranchKind::Release => production.as_str(),
        },
    }
}

/// `<kind>/<issue_key>-<slug(summary)>`
pub fn branch_name(kind: BranchKind, issue_key: &str, summary: &str) -> String {
    format!("{}/{}-{}", kind, issue_key, slugify(summary))
}

/// `<kind>(<issue_key>): <summary>`
pub fn commit_message(kind: CommitKind, issue_key: &str, summary: &str) -> String {
    format!("{}({}): {}", kind, issue_key, summary)
}
