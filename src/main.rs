use std::path::Path;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use jt::branch::{BranchKind, CommitKind};
use jt::errors::SettingsError;
use jt::settings::Settings;

mod cmd;

#[derive(Parser)]
#[command(name = "jt")]
#[command(version, about = "Create git branches and commits from Jira issues")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the setup wizard (Jira credentials and branch layout)
    Setup,
    /// Look up Jira issue details
    Lookup {
        /// Issue key, e.g. PROJ-123
        issue_key: String,
    },
    /// Create a branch named after a Jira issue
    Branch {
        /// Issue key, e.g. PROJ-123
        issue_key: String,
        /// Branch kind: feature, bugfix, hotfix or release
        kind: String,
    },
    /// Stage all changes and commit with the Jira issue summary
    Commit {
        /// Issue key, e.g. PROJ-123
        issue_key: String,
        /// Commit kind (defaults to chore)
        kind: Option<String>,
    },
    /// Push the current branch to origin
    Push,
}

/// Branch and commit kinds, appended to `--help`.
fn kinds_help() -> String {
    let mut help = String::from("Branch kinds:\n");
    for kind in BranchKind::ALL {
        help.push_str(&format!("  {:<9}{}\n", kind.as_str(), kind.description()));
    }
    help.push_str("\nCommit kinds:\n");
    for kind in CommitKind::ALL {
        help.push_str(&format!("  {:<9}{}\n", kind.as_str(), kind.description()));
    }
    help
}

fn parse_cli() -> Result<Cli, clap::Error> {
    let matches = Cli::command()
        .after_help(kinds_help())
        .try_get_matches()?;
    Cli::from_arg_matches(&matches)
}

/// Collapse a multi-line error chain (git stderr, response bodies) onto one line.
fn one_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::main]
async fn main() {
    jt::logging::init();

    let cli = match parse_cli() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            print!("{}", e.render());
            std::process::exit(1);
        }
    };

    let outcome = match std::env::current_dir().context("Failed to get current directory") {
        Ok(current_dir) => run(cli, &current_dir, Settings::from_env).await,
        Err(e) => Err(e),
    };
    if let Err(e) = outcome {
        tracing::debug!(error = ?e, "command failed");
        println!("Error: {}", one_line(&format!("{:#}", e)));
        std::process::exit(1);
    }
}

/// Dispatch `cli`. Settings are resolved only by commands that talk to Jira.
async fn run(
    cli: Cli,
    current_dir: &Path,
    resolve_settings: impl FnOnce() -> Result<Settings, SettingsError>,
) -> Result<()> {
    match cli.command {
        Commands::Push => cmd::cmd_push(current_dir).await,
        Commands::Setup => cmd::cmd_setup(&resolve_settings()?, current_dir).await,
        Commands::Lookup { issue_key } => {
            cmd::cmd_lookup(&resolve_settings()?, &issue_key).await
        }
        Commands::Branch { issue_key, kind } => {
            cmd::cmd_branch(&resolve_settings()?, current_dir, &issue_key, &kind).await
        }
        Commands::Commit { issue_key, kind } => {
            let settings = resolve_settings()?;
            cmd::cmd_commit(&settings, current_dir, &issue_key, kind.as_deref()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_commit_kind_is_optional() {
        let cli = Cli::try_parse_from(["jt", "commit", "ABC-1"]).unwrap();
        match cli.command {
            Commands::Commit { issue_key, kind } => {
                assert_eq!(issue_key, "ABC-1");
                assert!(kind.is_none());
            }
            _ => panic!("Expected Commit"),
        }
    }

    #[test]
    fn test_branch_requires_kind() {
        assert!(Cli::try_parse_from(["jt", "branch", "ABC-1"]).is_err());
    }

    #[test]
    fn test_kinds_help_lists_every_kind() {
        let help = kinds_help();
        for kind in BranchKind::ALL {
            assert!(help.contains(kind.as_str()));
        }
        for kind in CommitKind::ALL {
            assert!(help.contains(kind.description()));
        }
    }

    fn no_home() -> Result<Settings, SettingsError> {
        Err(SettingsError::NoHomeDir)
    }

    #[tokio::test]
    async fn test_push_does_not_resolve_settings() {
        let dir = tempfile::tempdir().unwrap();
        if git2::Repository::discover(dir.path()).is_ok() {
            return;
        }
        let cli = Cli::try_parse_from(["jt", "push"]).unwrap();
        let err = run(cli, dir.path(), no_home).await.unwrap_err();
        assert!(err.to_string().contains("Not a git repository"), "{err:#}");
    }

    #[tokio::test]
    async fn test_lookup_resolves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from(["jt", "lookup", "ABC-1"]).unwrap();
        let err = run(cli, dir.path(), no_home).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SettingsError>(),
            Some(SettingsError::NoHomeDir)
        ));
    }

    #[test]
    fn test_one_line_joins_stderr() {
        assert_eq!(
            one_line("Failed to push branch x: git push failed: error: denied\nhint: retry\n"),
            "Failed to push branch x: git push failed: error: denied hint: retry"
        );
    }
}
