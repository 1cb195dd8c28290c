//! Jira REST client.
//!
//! Two read-only calls against the v2 API, both authenticated with Basic Auth
//! (`email:api_token`). Requests are made once; any non-success status is
//! returned to the caller as a [`JiraError`].

use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::errors::JiraError;
use crate::settings::Credentials;

const USER_AGENT: &str = concat!("jt/", env!("CARGO_PKG_VERSION"));

/// Issue record as returned by `GET /rest/api/2/issue/{key}` (subset of fields).
#[derive(Debug, Deserialize)]
pub struct JiraIssue {
    pub key: String,
    pub fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub assignee: Option<IssueAssignee>,
}

#[derive(Debug, Deserialize)]
pub struct IssueStatus {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueAssignee {
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// Flattened issue used by the commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub status: String,
    /// `None` when the issue is unassigned.
    pub assignee_name: Option<String>,
}

impl From<JiraIssue> for Issue {
    fn from(issue: JiraIssue) -> Self {
        let fields = issue.fields;
        Self {
            key: issue.key,
            summary: fields.summary,
            description: fields.description.unwrap_or_default(),
            status: fields.status.map(|s| s.name).unwrap_or_default(),
            assignee_name: fields.assignee.map(|a| a.display_name),
        }
    }
}

/// Turn a configured domain into an API base URL.
///
/// Bare hosts get `https://`; values that already carry a scheme are kept.
pub fn base_url(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    if domain.starts_with("https://") || domain.starts_with("http://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}

#[derive(Debug, Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
    email: String,
    api_token: String,
}

impl JiraClient {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url(&credentials.domain),
            email: credentials.email.clone(),
            api_token: credentials.api_token.clone(),
        }
    }

    /// Check the credentials with an authenticated read of `/myself`.
    pub async fn validate_credentials(&self) -> Result<(), JiraError> {
        let resp = self.get(&["myself"]).await?;
        match resp.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(JiraError::Auth {
                status: resp.status().as_u16(),
            }),
            status => Err(status_error(status, resp).await),
        }
    }

    /// Fetch a single issue by key.
    pub async fn fetch_issue(&self, issue_key: &str) -> Result<Issue, JiraError> {
        let resp = self.get(&["issue", issue_key]).await?;
        match resp.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(JiraError::Auth {
                    status: resp.status().as_u16(),
                });
            }
            StatusCode::NOT_FOUND => {
                return Err(JiraError::NotFound {
                    key: issue_key.to_string(),
                });
            }
            status => return Err(status_error(status, resp).await),
        }

        let issue = resp.json::<JiraIssue>().await.map_err(JiraError::Decode)?;
        Ok(issue.into())
    }

    /// Build `<base>/rest/api/2/<segments..>`, percent-encoding each segment
    /// so an issue key can never address a different resource.
    fn api_url(&self, segments: &[&str]) -> Result<Url, JiraError> {
        let invalid = || JiraError::InvalidUrl {
            url: self.base_url.clone(),
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["rest", "api", "2"])
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, segments: &[&str]) -> Result<reqwest::Response, JiraError> {
        let url = self.api_url(segments)?;
        tracing::debug!(%url, "GET");
        let resp = self
            .http
            .get(url.clone())
            .basic_auth(&self.email, Some(&self.api_token))
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(JiraError::Network)?;
        tracing::debug!(%url, status = resp.status().as_u16(), "response");
        Ok(resp)
    }
}

async fn status_error(status: StatusCode, resp: reqwest::Response) -> JiraError {
    let body = resp.text().await.unwrap_or_default();
    JiraError::Status {
        status: status.as_u16(),
        body,
    }
}
