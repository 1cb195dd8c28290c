//! `jt lookup`.

use anyhow::{Context, Result};

use jt::jira::{Issue, JiraClient};
use jt::settings::Settings;

/// Fetch `issue_key` with the configured credentials.
pub async fn fetch_issue(settings: &Settings, issue_key: &str) -> Result<Issue> {
    let credentials = settings
        .credentials()
        .context("Failed to load Jira credentials")?;
    JiraClient::new(&credentials)
        .fetch_issue(issue_key)
        .await
        .with_context(|| format!("Failed to fetch issue {}", issue_key))
}

pub async fn cmd_lookup(settings: &Settings, issue_key: &str) -> Result<()> {
    let issue = fetch_issue(settings, issue_key).await?;

    println!("Issue Details:");
    println!("Key: {}", issue.key);
    println!("Summary: {}", issue.summary);
    println!("Status: {}", issue.status);
    println!(
        "Assignee: {}",
        issue.assignee_name.as_deref().unwrap_or("Unassigned")
    );
    println!("Description:");
    println!("{}", issue.description);

    Ok(())
}
