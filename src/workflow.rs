//! Multi-step git sequences driven by issue data.
//!
//! Steps run strictly in order and stop at the first failure. There is no
//! compensation: if the base checkout succeeds and branch creation fails, the
//! working copy stays on the base branch.

use anyhow::{Context, Result};

use crate::branch::{BranchKind, CommitKind, base_branch, branch_name, commit_message};
use crate::git::Vcs;
use crate::settings::RepositoryTopology;

/// Remote used by `jt push`.
pub const DEFAULT_REMOTE: &str = "origin";

/// Outcome of [`create_issue_branch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBranch {
    pub name: String,
    pub base: String,
}

/// Check out the base for `kind` and create the issue branch on top of it.
pub async fn create_issue_branch(
    vcs: &dyn Vcs,
    topology: &RepositoryTopology,
    kind: BranchKind,
    issue_key: &str,
    summary: &str,
) -> Result<CreatedBranch> {
    let base = base_branch(kind, topology);
    let name = branch_name(kind, issue_key, summary);

    vcs.checkout(base)
        .await
        .with_context(|| format!("Failed to checkout {} branch", base))?;
    vcs.create_branch(&name)
        .await
        .with_context(|| format!("Failed to create branch {}", name))?;

    Ok(CreatedBranch {
        name,
        base: base.to_string(),
    })
}

/// Stage everything and commit with `<kind>(<issue_key>): <summary>`.
///
/// Returns the commit message.
pub async fn commit_issue_changes(
    vcs: &dyn Vcs,
    kind: CommitKind,
    issue_key: &str,
    summary: &str,
) -> Result<String> {
    vcs.stage_all().await.context("Failed to stage changes")?;

    let message = commit_message(kind, issue_key, summary);
    vcs.commit(&message)
        .await
        .context("Failed to commit changes")?;
    Ok(message)
}

/// Push the checked-out branch to `remote` with upstream tracking.
///
/// Returns the branch name.
pub async fn push_current_branch(vcs: &dyn Vcs, remote: &str) -> Result<String> {
    let branch = vcs
        .current_branch()
        .await
        .context("Failed to get current branch")?;
    vcs.push(remote, &branch)
        .await
        .with_context(|| format!("Failed to push branch {}", branch))?;
    Ok(branch)
}

/// Create `development` from `production`. Used by setup when the chosen
/// development branch does not exist yet.
pub async fn create_development_branch(
    vcs: &dyn Vcs,
    production: &str,
    development: &str,
) -> Result<()> {
    vcs.checkout(production)
        .await
        .with_context(|| format!("Failed to checkout {} branch", production))?;
    vcs.create_branch(development)
        .await
        .with_context(|| format!("Failed to create development branch {}", development))?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::recording::RecordingVcs;
    use super::*;
    use crate::errors::VcsError;

    fn two_tier() -> RepositoryTopology {
        RepositoryTopology::two_tier("main", "develop").unwrap()
    }

    #[tokio::test]
    async fn test_create_issue_branch_from_development() {
        let vcs = RecordingVcs::on_branch("main");
        let created = create_issue_branch(
            &vcs,
            &two_tier(),
            BranchKind::Feature,
            "PROJ-9",
            "Fix login bug!",
        )
        .await
        .unwrap();

        assert_eq!(
            created,
            CreatedBranch {
                name: "feature/PROJ-9-fix-login-bug".to_string(),
                base: "develop".to_string(),
            }
        );
        assert_eq!(
            vcs.calls(),
            vec![
                "checkout develop".to_string(),
                "create_branch feature/PROJ-9-fix-login-bug".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_hotfix_from_production() {
        let vcs = RecordingVcs::on_branch("develop");
        let created = create_issue_branch(&vcs, &two_tier(), BranchKind::Hotfix, "OPS-1", "Crash")
            .await
            .unwrap();
        assert_eq!(created.base, "main");
        assert_eq!(vcs.calls()[0], "checkout main");
    }

    #[tokio::test]
    async fn test_single_topology_hotfix_uses_development() {
        let vcs = RecordingVcs::on_branch("trunk");
        let topology = RepositoryTopology::single("trunk");
        let created = create_issue_branch(&vcs, &topology, BranchKind::Release, "R-1", "v2")
            .await
            .unwrap();
        assert_eq!(created.base, "trunk");
        assert_eq!(created.name, "release/R-1-v2");
    }

    #[tokio::test]
    async fn test_failed_checkout_stops_before_branch_creation() {
        let vcs = RecordingVcs::on_branch("main").failing_on("checkout");
        let err = create_issue_branch(&vcs, &two_tier(), BranchKind::Bugfix, "B-1", "x")
            .await
            .unwrap_err();

        assert_eq!(vcs.calls(), vec!["checkout develop".to_string()]);
        assert!(err.to_string().contains("Failed to checkout develop branch"));
        assert!(matches!(
            err.downcast_ref::<VcsError>(),
            Some(VcsError::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_branch_creation_leaves_checkout_in_place() {
        let vcs = RecordingVcs::on_branch("main").failing_on("create_branch");
        let err = create_issue_branch(&vcs, &two_tier(), BranchKind::Feature, "F-1", "x")
            .await
            .unwrap_err();

        // The checkout is not undone.
        assert_eq!(
            vcs.calls(),
            vec![
                "checkout develop".to_string(),
                "create_branch feature/F-1-x".to_string(),
            ]
        );
        assert!(format!("{:#}", err).contains("fatal: create_branch refused"));
    }

    #[tokio::test]
    async fn test_commit_issue_changes_default_kind() {
        let vcs = RecordingVcs::on_branch("feature/ABC-1-add-login");
        let message = commit_issue_changes(&vcs, CommitKind::default(), "ABC-1", "Add login")
            .await
            .unwrap();

        assert_eq!(message, "chore(ABC-1): Add login");
        assert_eq!(
            vcs.calls(),
            vec![
                "stage_all".to_string(),
                "commit chore(ABC-1): Add login".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_commit_not_attempted_when_staging_fails() {
        let vcs = RecordingVcs::on_branch("x").failing_on("stage_all");
        let err = commit_issue_changes(&vcs, CommitKind::Fix, "ABC-1", "y")
            .await
            .unwrap_err();
        assert_eq!(vcs.calls(), vec!["stage_all".to_string()]);
        assert!(err.to_string().contains("Failed to stage changes"));
    }

    #[tokio::test]
    async fn test_push_current_branch_to_origin() {
        let vcs = RecordingVcs::on_branch("feature/ABC-1-add-login");
        let branch = push_current_branch(&vcs, DEFAULT_REMOTE).await.unwrap();
        assert_eq!(branch, "feature/ABC-1-add-login");
        assert_eq!(
            vcs.calls(),
            vec![
                "current_branch".to_string(),
                "push origin feature/ABC-1-add-login".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_push_failure_names_branch() {
        let vcs = RecordingVcs::on_branch("topic").failing_on("push");
        let err = push_current_branch(&vcs, DEFAULT_REMOTE)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to push branch topic"));
    }

    #[tokio::test]
    async fn test_create_development_branch_from_production() {
        let vcs = RecordingVcs::on_branch("main");
        create_development_branch(&vcs, "main", "develop")
            .await
            .unwrap();
        assert_eq!(
            vcs.calls(),
            vec!["checkout main".to_string(), "create_branch develop".to_string()]
        );
    }
}
