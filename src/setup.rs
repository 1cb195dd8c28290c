//! Interactive setup wizard (`jt setup`).
//!
//! One linear pass:
//!
//! 1. Locate the repository root.
//! 2. Collect Jira credentials (offering to reuse saved ones) and validate
//!    them against the tracker. Rejected credentials are never written.
//! 3. Choose the repository topology and its branches, optionally creating
//!    the development branch from production.
//! 4. Persist the topology record and add it to `.gitignore`.
//! 5. Print a summary and the next steps.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};

use crate::errors::SettingsError;
use crate::git::{GitCli, Vcs};
use crate::jira::JiraClient;
use crate::settings::{self, Credentials, RepositoryTopology, Settings};
use crate::workflow::create_development_branch;

/// What the wizard decided about branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyPlan {
    pub topology: RepositoryTopology,
    /// The development branch does not exist yet and must be created from
    /// production.
    pub create_development: bool,
}

/// Validate `credentials` against Jira, then store them unless they came
/// from the existing file.
///
/// Returns the path written, if any.
pub async fn verify_and_store_credentials(
    settings: &Settings,
    credentials: &Credentials,
    already_saved: bool,
) -> Result<Option<PathBuf>> {
    JiraClient::new(credentials)
        .validate_credentials()
        .await
        .context("Credential validation failed")?;

    if already_saved {
        return Ok(None);
    }
    let path = settings
        .save_credentials(credentials)
        .context("Failed to save credentials")?;
    Ok(Some(path))
}

/// Preferred production branch: `main`, then `master`.
pub fn default_production_index(branches: &[String]) -> Option<usize> {
    ["main", "master"]
        .iter()
        .find_map(|name| branches.iter().position(|b| b == name))
}

/// Preferred development branch: `develop`, then `development`, then `dev`.
pub fn default_development_index(branches: &[String]) -> Option<usize> {
    ["develop", "development", "dev"]
        .iter()
        .find_map(|name| branches.iter().position(|b| b == name))
}

/// Build the topology from the chosen names.
///
/// `production` is `None` for single-branch repositories. Two-tier plans with
/// equal names are rejected.
pub fn plan_topology(
    production: Option<&str>,
    development: &str,
    branches: &[String],
) -> Result<TopologyPlan, SettingsError> {
    let development = development.trim();
    if development.is_empty() {
        return Err(SettingsError::MissingBranch("development"));
    }

    let topology = match production {
        None => RepositoryTopology::single(development),
        Some(production) => RepositoryTopology::two_tier(production.trim(), development)?,
    };
    let create_development = !branches.iter().any(|b| b == development);
    Ok(TopologyPlan {
        topology,
        create_development,
    })
}

/// Run the whole wizard from `start_dir`.
pub async fn run_setup(settings: &Settings, start_dir: &Path) -> Result<()> {
    let git = GitCli::discover(start_dir)
        .context("Not a git repository. Run 'jt setup' inside a git repository")?;
    let theme = ColorfulTheme::default();

    println!();
    println!("Welcome to Jira Tools (jt) Setup!");
    println!("=================================");

    // Credentials
    println!();
    println!("=== Jira Configuration ===");
    let (credentials, already_saved) = prompt_credentials(settings, &theme)?;

    println!();
    println!("Validating Jira credentials...");
    let written = verify_and_store_credentials(settings, &credentials, already_saved).await?;
    println!("{} Credentials validated successfully", style("✓").green());
    if let Some(path) = &written {
        println!("  Saved to {}", path.display());
    }

    // Branches
    println!();
    println!("=== Git Branch Configuration ===");
    let branches = git
        .list_branches()
        .await
        .context("Failed to get branches")?;
    if branches.is_empty() {
        bail!("No branches found in repository. Create an initial commit first.");
    }

    let plan = prompt_topology(&branches, &theme)?;
    if plan.create_development
        && let Some(production) = plan.topology.production()
    {
        let development = plan.topology.development();
        create_development_branch(&git, production, development).await?;
        println!(
            "Created development branch '{}' from '{}'",
            development, production
        );
    }

    let project_root = git.workdir();
    let config_path = settings::save_topology(project_root, &plan.topology)
        .context("Failed to save branch configuration")?;
    match settings::ensure_gitignored(project_root) {
        Ok(true) => println!("Added {} to .gitignore", settings::PROJECT_CONFIG_FILE),
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(error = %e, "could not update .gitignore");
            println!(
                "Warning: Could not add {} to .gitignore: {}",
                settings::PROJECT_CONFIG_FILE,
                e
            );
        }
    }

    print!(
        "{}",
        summary(&credentials, &plan.topology, written.as_deref(), &config_path)
    );
    Ok(())
}

fn prompt_credentials(settings: &Settings, theme: &ColorfulTheme) -> Result<(Credentials, bool)> {
    if let Some(saved) = settings.saved_credentials()? {
        let reuse = Confirm::with_theme(theme)
            .with_prompt(format!(
                "Use saved credentials for {} on {}?",
                saved.email, saved.domain
            ))
            .default(true)
            .interact()?;
        if reuse {
            return Ok((saved, true));
        }
    }

    let not_empty = |input: &String| -> Result<(), &str> {
        if input.trim().is_empty() {
            Err("Value cannot be empty")
        } else {
            Ok(())
        }
    };

    let domain: String = Input::with_theme(theme)
        .with_prompt("Jira Domain (e.g., company.atlassian.net)")
        .validate_with(not_empty)
        .interact_text()?;
    let email: String = Input::with_theme(theme)
        .with_prompt("Jira Email")
        .validate_with(not_empty)
        .interact_text()?;
    let api_token = Password::with_theme(theme)
        .with_prompt("Jira API Token")
        .interact()?;

    Ok((
        Credentials {
            domain: domain.trim().to_string(),
            email: email.trim().to_string(),
            api_token: api_token.trim().to_string(),
        },
        false,
    ))
}

fn prompt_topology(branches: &[String], theme: &ColorfulTheme) -> Result<TopologyPlan> {
    let options = &[
        "Single Branch (development only)",
        "Git Flow (production/development branches)",
    ];
    let choice = Select::with_theme(theme)
        .with_prompt("Repository setup")
        .items(options)
        .default(0)
        .interact()?;

    if choice == 0 {
        let default = default_development_index(branches)
            .or_else(|| default_production_index(branches))
            .unwrap_or(0);
        let index = Select::with_theme(theme)
            .with_prompt("Development branch")
            .items(branches)
            .default(default)
            .interact()?;
        return Ok(plan_topology(None, &branches[index], branches)?);
    }

    let index = Select::with_theme(theme)
        .with_prompt("Production branch")
        .items(branches)
        .default(default_production_index(branches).unwrap_or(0))
        .interact()?;
    let production = branches[index].as_str();

    loop {
        let development = prompt_development_branch(branches, production, theme)?;
        match plan_topology(Some(production), &development, branches) {
            Ok(plan) => return Ok(plan),
            Err(SettingsError::SameBranches(_)) => {
                println!("Development branch must be different from production branch.");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn prompt_development_branch(
    branches: &[String],
    production: &str,
    theme: &ColorfulTheme,
) -> Result<String> {
    const CREATE: &str = "(create a new branch)";

    let candidates: Vec<&str> = branches
        .iter()
        .map(String::as_str)
        .filter(|b| *b != production)
        .chain(std::iter::once(CREATE))
        .collect();
    let default = candidates
        .iter()
        .position(|b| ["develop", "development", "dev"].contains(b))
        .unwrap_or(0);

    let index = Select::with_theme(theme)
        .with_prompt("Development branch")
        .items(&candidates)
        .default(default)
        .interact()?;
    if candidates[index] != CREATE {
        return Ok(candidates[index].to_string());
    }

    let name: String = Input::with_theme(theme)
        .with_prompt(format!("New development branch (created from '{}')", production))
        .default("develop".to_string())
        .interact_text()?;
    Ok(name.trim().to_string())
}

/// Closing summary. The credential line only appears when this run wrote
/// the file.
fn summary(
    credentials: &Credentials,
    topology: &RepositoryTopology,
    credentials_written: Option<&Path>,
    config_path: &Path,
) -> String {
    let mut out = String::new();
    let mut line = |text: String| {
        out.push_str(&text);
        out.push('\n');
    };

    line(String::new());
    line("Configuration Summary".into());
    line("=====================".into());
    line(format!("Jira Domain: {}", credentials.domain));
    line(format!("Jira Email: {}", credentials.email));
    line(String::new());
    line("Git Configuration:".into());
    line(format!("Repository Type: {}", topology.label()));
    if let Some(production) = topology.production() {
        line(format!("Production Branch: {}", production));
    }
    line(format!("Development Branch: {}", topology.development()));
    line(String::new());
    if let Some(path) = credentials_written {
        line(format!("Credentials saved in: {}", path.display()));
    }
    line(format!(
        "Project configuration saved in: {}",
        config_path.display()
    ));

    line(String::new());
    line("Next Steps".into());
    line("==========".into());
    if topology.is_two_tier() {
        line("For features:".into());
        line("   jt branch PROJ-123 feature".into());
        line("For bug fixes:".into());
        line("   jt branch PROJ-123 bugfix".into());
        line("For hotfixes:".into());
        line("   jt branch PROJ-123 hotfix".into());
    } else {
        line("Create a feature branch:".into());
        line("   jt branch PROJ-123 feature".into());
    }
    line(String::new());
    line("Common commands:".into());
    line("   jt lookup PROJ-123       Look up issue details".into());
    line("   jt commit PROJ-123 feat  Commit with the issue summary".into());
    line("   jt push                  Push the current branch".into());
    out
}
