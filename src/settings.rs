//! Settings store for jt.
//!
//! Two records are persisted:
//!
//! ```text
//! ~/.jira-tools/.env            # per-user Jira credentials (JT_CONFIG_DIR overrides the dir)
//! <repo root>/.jt-config.json   # per-repository branch topology
//! ```
//!
//! Nothing here is global: `Settings` is resolved once at startup and handed to
//! whichever command needs it.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;

/// Environment variable that relocates the per-user settings directory.
pub const CONFIG_DIR_ENV: &str = "JT_CONFIG_DIR";

/// Per-user settings directory under `$HOME`.
pub const GLOBAL_DIR: &str = ".jira-tools";

pub const CREDENTIALS_FILE: &str = ".env";

/// Per-repository topology record, stored at the repository root.
pub const PROJECT_CONFIG_FILE: &str = ".jt-config.json";

pub const DOMAIN_VAR: &str = "JIRA_DOMAIN";
pub const EMAIL_VAR: &str = "JIRA_EMAIL";
pub const TOKEN_VAR: &str = "JIRA_API_TOKEN";

/// Jira connection details.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Host such as `company.atlassian.net`, or a full base URL.
    pub domain: String,
    pub email: String,
    pub api_token: String,
}

// Keeps the token out of debug logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("domain", &self.domain)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Resolved location of the per-user settings directory.
#[derive(Debug, Clone)]
pub struct Settings {
    config_dir: PathBuf,
}

impl Settings {
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Resolve the settings directory from `JT_CONFIG_DIR`, falling back to
    /// `~/.jira-tools`.
    pub fn from_env() -> Result<Self, SettingsError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::new(PathBuf::from(dir)));
        }
        let home = dirs::home_dir().ok_or(SettingsError::NoHomeDir)?;
        Ok(Self::new(home.join(GLOBAL_DIR)))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.config_dir.join(CREDENTIALS_FILE)
    }

    pub fn has_saved_credentials(&self) -> bool {
        self.credentials_path().exists()
    }

    /// Credentials from the file, with `JIRA_*` environment variables taking
    /// precedence field by field.
    pub fn credentials(&self) -> Result<Credentials, SettingsError> {
        self.credentials_with(|key| std::env::var(key).ok())
    }

    /// Like [`Settings::credentials`] but with an explicit variable lookup.
    pub fn credentials_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Credentials, SettingsError> {
        let from_env = [DOMAIN_VAR, EMAIL_VAR, TOKEN_VAR]
            .map(|key| lookup(key).filter(|v| !v.is_empty()));

        // The file is only consulted when the environment is incomplete.
        let saved = if from_env.iter().any(Option::is_none) {
            self.read_credentials_file()?
        } else {
            HashMap::new()
        };
        let [domain, email, api_token] = from_env;
        let field = |key: &'static str, value: Option<String>| -> Result<String, SettingsError> {
            value
                .or_else(|| saved.get(key).filter(|v| !v.is_empty()).cloned())
                .ok_or(SettingsError::CredentialsNotFound { missing: key })
        };

        Ok(Credentials {
            domain: field(DOMAIN_VAR, domain)?,
            email: field(EMAIL_VAR, email)?,
            api_token: field(TOKEN_VAR, api_token)?,
        })
    }

    /// Only the values stored on disk, if the file exists, parses and is
    /// complete. An unreadable file is reported as `None` so setup can
    /// overwrite it.
    pub fn saved_credentials(&self) -> Result<Option<Credentials>, SettingsError> {
        if !self.has_saved_credentials() {
            return Ok(None);
        }
        match self.credentials_with(|_| None) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(SettingsError::CredentialsNotFound { .. }) => Ok(None),
            Err(e @ SettingsError::Parse { .. }) => {
                tracing::warn!(error = %e, "ignoring unreadable credential file");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Write the credential file (mode 0600 on unix), creating the directory
    /// if needed.
    pub fn save_credentials(&self, credentials: &Credentials) -> Result<PathBuf, SettingsError> {
        let content = format!(
            "{}={}\n{}={}\n{}={}\n",
            DOMAIN_VAR,
            quote_env_value(DOMAIN_VAR, &credentials.domain)?,
            EMAIL_VAR,
            quote_env_value(EMAIL_VAR, &credentials.email)?,
            TOKEN_VAR,
            quote_env_value(TOKEN_VAR, &credentials.api_token)?,
        );

        create_private_dir(&self.config_dir)?;
        let path = self.credentials_path();
        write_private_file(&path, content.as_bytes())?;
        tracing::info!(path = %path.display(), "saved Jira credentials");
        Ok(path)
    }

    fn read_credentials_file(&self) -> Result<HashMap<String, String>, SettingsError> {
        let path = self.credentials_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let parse_err = |e: dotenvy::Error| SettingsError::Parse {
            path: path.clone(),
            message: e.to_string(),
        };
        let mut values = HashMap::new();
        for item in dotenvy::from_path_iter(&path).map_err(parse_err)? {
            let (key, value) = item.map_err(parse_err)?;
            values.insert(key, value);
        }
        tracing::debug!(path = %path.display(), keys = values.len(), "read credential file");
        Ok(values)
    }
}

/// Single-quoted values are taken literally by the dotenv parser.
fn quote_env_value(key: &'static str, value: &str) -> Result<String, SettingsError> {
    if value.contains(['\'', '\n', '\r']) {
        return Err(SettingsError::UnsupportedValue(key));
    }
    Ok(format!("'{}'", value))
}

fn create_private_dir(dir: &Path) -> Result<(), SettingsError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|source| SettingsError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_private_file(path: &Path, content: &[u8]) -> Result<(), SettingsError> {
    let io_err = |source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(io_err)?;
    file.write_all(content).map_err(io_err)
}

/// The branching model of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryTopology {
    /// One working line; every branch starts from it.
    Single { development: String },
    /// Production and development lines. The names always differ.
    TwoTier {
        production: String,
        development: String,
    },
}

impl RepositoryTopology {
    pub fn single(development: impl Into<String>) -> Self {
        RepositoryTopology::Single {
            development: development.into(),
        }
    }

    /// Fails when both names are equal.
    pub fn two_tier(
        production: impl Into<String>,
        development: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        let production = production.into();
        let development = development.into();
        if production == development {
            return Err(SettingsError::SameBranches(production));
        }
        Ok(RepositoryTopology::TwoTier {
            production,
            development,
        })
    }

    pub fn development(&self) -> &str {
        match self {
            RepositoryTopology::Single { development }
            | RepositoryTopology::TwoTier { development, .. } => development,
        }
    }

    pub fn production(&self) -> Option<&str> {
        match self {
            RepositoryTopology::Single { .. } => None,
            RepositoryTopology::TwoTier { production, .. } => Some(production),
        }
    }

    pub fn is_two_tier(&self) -> bool {
        matches!(self, RepositoryTopology::TwoTier { .. })
    }

    /// Human-readable name used by the setup summary.
    pub fn label(&self) -> &'static str {
        match self {
            RepositoryTopology::Single { .. } => "Single Branch",
            RepositoryTopology::TwoTier { .. } => "Git Flow",
        }
    }
}

/// On-disk shape of `.jt-config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BranchConfig {
    #[serde(default)]
    project_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    production_branch: Option<String>,
    #[serde(default)]
    development_branch: String,
    #[serde(default)]
    is_monorepo: bool,
}

impl BranchConfig {
    fn from_topology(project_root: &Path, topology: &RepositoryTopology) -> Self {
        Self {
            project_path: project_root.display().to_string(),
            production_branch: topology.production().map(str::to_string),
            development_branch: topology.development().to_string(),
            is_monorepo: topology.is_two_tier(),
        }
    }

    fn into_topology(self) -> Result<RepositoryTopology, SettingsError> {
        if self.development_branch.is_empty() {
            return Err(SettingsError::MissingBranch("development"));
        }
        if !self.is_monorepo {
            return Ok(RepositoryTopology::single(self.development_branch));
        }
        match self.production_branch.filter(|p| !p.is_empty()) {
            Some(production) => RepositoryTopology::two_tier(production, self.development_branch),
            None => Err(SettingsError::MissingBranch("production")),
        }
    }
}

pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_FILE)
}

/// Read the topology recorded for the repository at `project_root`.
pub fn load_topology(project_root: &Path) -> Result<RepositoryTopology, SettingsError> {
    let path = project_config_path(project_root);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SettingsError::TopologyNotFound { path });
        }
        Err(source) => return Err(SettingsError::Io { path, source }),
    };

    let record: BranchConfig =
        serde_json::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
    record.into_topology()
}

/// Persist `topology` for the repository at `project_root`, replacing any
/// previous record.
pub fn save_topology(
    project_root: &Path,
    topology: &RepositoryTopology,
) -> Result<PathBuf, SettingsError> {
    let path = project_config_path(project_root);
    let record = BranchConfig::from_topology(project_root, topology);
    let json = serde_json::to_string_pretty(&record).map_err(|e| SettingsError::Parse {
        path: path.clone(),
        message: e.to_string(),
    })?;
    write_private_file(&path, json.as_bytes())?;
    tracing::info!(path = %path.display(), topology = topology.label(), "saved branch configuration");
    Ok(path)
}

/// Add the topology record to the repository's `.gitignore`.
///
/// Returns `false` when an entry was already present.
pub fn ensure_gitignored(project_root: &Path) -> Result<bool, SettingsError> {
    let path = project_root.join(".gitignore");
    let io_err = |source| SettingsError::Io {
        path: path.clone(),
        source,
    };

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(io_err(e)),
    };
    if content.lines().any(|line| line.trim() == PROJECT_CONFIG_FILE) {
        return Ok(false);
    }

    let mut file = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&path)
        .map_err(io_err)?;
    if !content.is_empty() && !content.ends_with('\n') {
        file.write_all(b"\n").map_err(io_err)?;
    }
    file.write_all(format!("{}\n", PROJECT_CONFIG_FILE).as_bytes())
        .map_err(io_err)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_credentials() -> Credentials {
        Credentials {
            domain: "acme.atlassian.net".to_string(),
            email: "dev@acme.test".to_string(),
            api_token: "tok_123=".to_string(),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_credentials_roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let settings = Settings::new(dir.path().join("jt"));
        settings.save_credentials(&sample_credentials()).unwrap();

        assert!(settings.has_saved_credentials());
        assert_eq!(
            settings.credentials_with(no_env).unwrap(),
            sample_credentials()
        );
    }

    #[test]
    fn test_credentials_file_uses_env_keys() {
        let dir = tempdir().unwrap();
        let settings = Settings::new(dir.path().to_path_buf());
        let path = settings.save_credentials(&sample_credentials()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("JIRA_DOMAIN='acme.atlassian.net'"));
        assert!(content.contains("JIRA_EMAIL='dev@acme.test'"));
        assert!(content.contains("JIRA_API_TOKEN='tok_123='"));
    }

    #[test]
    fn test_credentials_file_reads_unquoted_values() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CREDENTIALS_FILE),
            "JIRA_DOMAIN=x.atlassian.net\nJIRA_EMAIL=a@b.c\nJIRA_API_TOKEN=abc\n",
        )
        .unwrap();
        let settings = Settings::new(dir.path().to_path_buf());
        let creds = settings.credentials_with(no_env).unwrap();
        assert_eq!(creds.domain, "x.atlassian.net");
        assert_eq!(creds.api_token, "abc");
    }

    #[cfg(unix)]
    #[test]
    fn test_credentials_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let settings = Settings::new(dir.path().to_path_buf());
        let path = settings.save_credentials(&sample_credentials()).unwrap();
        let mode = fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_env_overrides_file_per_field() {
        let dir = tempdir().unwrap();
        let settings = Settings::new(dir.path().to_path_buf());
        settings.save_credentials(&sample_credentials()).unwrap();

        let creds = settings
            .credentials_with(|key| (key == TOKEN_VAR).then(|| "from-env".to_string()))
            .unwrap();
        assert_eq!(creds.api_token, "from-env");
        assert_eq!(creds.domain, "acme.atlassian.net");
    }

    #[test]
    fn test_env_only_credentials() {
        let dir = tempdir().unwrap();
        let settings = Settings::new(dir.path().join("missing"));
        let creds = settings
            .credentials_with(|key| Some(format!("{key}-value")))
            .unwrap();
        assert_eq!(creds.email, "JIRA_EMAIL-value");
    }

    #[test]
    fn test_missing_credentials_names_the_field() {
        let dir = tempdir().unwrap();
        let settings = Settings::new(dir.path().to_path_buf());
        let err = settings
            .credentials_with(|key| (key == DOMAIN_VAR).then(|| "d".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::CredentialsNotFound { missing: EMAIL_VAR }
        ));
        assert!(err.to_string().contains("jt setup"));
    }

    #[test]
    fn test_saved_credentials_none_without_file() {
        let dir = tempdir().unwrap();
        let settings = Settings::new(dir.path().to_path_buf());
        assert!(settings.saved_credentials().unwrap().is_none());
    }

    fn write_corrupt_credentials(dir: &Path) {
        fs::write(
            dir.join(CREDENTIALS_FILE),
            "JIRA_DOMAIN=x.atlassian.net\nJIRA_API_TOKEN=abc def\nthis is not a pair\n",
        )
        .unwrap();
    }

    #[test]
    fn test_corrupt_file_is_not_reusable() {
        let dir = tempdir().unwrap();
        write_corrupt_credentials(dir.path());
        let settings = Settings::new(dir.path().to_path_buf());

        assert!(matches!(
            settings.credentials_with(no_env),
            Err(SettingsError::Parse { .. })
        ));
        assert!(settings.saved_credentials().unwrap().is_none());

        settings.save_credentials(&sample_credentials()).unwrap();
        assert_eq!(
            settings.saved_credentials().unwrap(),
            Some(sample_credentials())
        );
    }

    #[test]
    fn test_complete_env_ignores_corrupt_file() {
        let dir = tempdir().unwrap();
        write_corrupt_credentials(dir.path());
        let settings = Settings::new(dir.path().to_path_buf());

        let creds = settings
            .credentials_with(|key| Some(format!("{key}-value")))
            .unwrap();
        assert_eq!(creds.domain, "JIRA_DOMAIN-value");
        assert_eq!(creds.api_token, "JIRA_API_TOKEN-value");
    }

    #[test]
    fn test_save_credentials_rejects_quotes() {
        let dir = tempdir().unwrap();
        let settings = Settings::new(dir.path().to_path_buf());
        let mut creds = sample_credentials();
        creds.api_token = "it's".to_string();
        assert!(matches!(
            settings.save_credentials(&creds),
            Err(SettingsError::UnsupportedValue(TOKEN_VAR))
        ));
        assert!(!settings.has_saved_credentials());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", sample_credentials());
        assert!(!rendered.contains("tok_123"));
        assert!(rendered.contains("acme.atlassian.net"));
    }

    #[test]
    fn test_two_tier_requires_distinct_names() {
        assert!(matches!(
            RepositoryTopology::two_tier("main", "main"),
            Err(SettingsError::SameBranches(name)) if name == "main"
        ));
        assert!(RepositoryTopology::two_tier("main", "develop").is_ok());
    }

    #[test]
    fn test_topology_roundtrip_single() {
        let dir = tempdir().unwrap();
        let topology = RepositoryTopology::single("trunk");
        save_topology(dir.path(), &topology).unwrap();
        assert_eq!(load_topology(dir.path()).unwrap(), topology);
    }

    #[test]
    fn test_topology_roundtrip_two_tier() {
        let dir = tempdir().unwrap();
        let topology = RepositoryTopology::two_tier("main", "develop").unwrap();
        save_topology(dir.path(), &topology).unwrap();
        assert_eq!(load_topology(dir.path()).unwrap(), topology);
    }

    #[test]
    fn test_topology_record_format() {
        let dir = tempdir().unwrap();
        let topology = RepositoryTopology::two_tier("master", "dev").unwrap();
        let path = save_topology(dir.path(), &topology).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["production_branch"], "master");
        assert_eq!(value["development_branch"], "dev");
        assert_eq!(value["is_monorepo"], true);
        assert_eq!(value["project_path"], dir.path().display().to_string());
    }

    #[test]
    fn test_single_record_omits_production() {
        let dir = tempdir().unwrap();
        let path = save_topology(dir.path(), &RepositoryTopology::single("main")).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(!content.contains("production_branch"));
        assert!(content.contains("\"is_monorepo\": false"));
    }

    #[test]
    fn test_load_topology_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_topology(dir.path()),
            Err(SettingsError::TopologyNotFound { .. })
        ));
    }

    #[test]
    fn test_load_topology_rejects_equal_two_tier_names() {
        let dir = tempdir().unwrap();
        fs::write(
            project_config_path(dir.path()),
            r#"{"project_path":"/x","production_branch":"main","development_branch":"main","is_monorepo":true}"#,
        )
        .unwrap();
        assert!(matches!(
            load_topology(dir.path()),
            Err(SettingsError::SameBranches(_))
        ));
    }

    #[test]
    fn test_load_topology_two_tier_without_production() {
        let dir = tempdir().unwrap();
        fs::write(
            project_config_path(dir.path()),
            r#"{"development_branch":"develop","is_monorepo":true}"#,
        )
        .unwrap();
        assert!(matches!(
            load_topology(dir.path()),
            Err(SettingsError::MissingBranch("production"))
        ));
    }

    #[test]
    fn test_load_topology_invalid_json() {
        let dir = tempdir().unwrap();
        fs::write(project_config_path(dir.path()), "not json").unwrap();
        assert!(matches!(
            load_topology(dir.path()),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn test_ensure_gitignored_creates_file() {
        let dir = tempdir().unwrap();
        assert!(ensure_gitignored(dir.path()).unwrap());
        let content = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(content, ".jt-config.json\n");
    }

    #[test]
    fn test_ensure_gitignored_appends_after_missing_newline() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "target").unwrap();
        assert!(ensure_gitignored(dir.path()).unwrap());
        let content = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(content, "target\n.jt-config.json\n");
    }

    #[test]
    fn test_ensure_gitignored_is_idempotent() {
        let dir = tempdir().unwrap();
        assert!(ensure_gitignored(dir.path()).unwrap());
        assert!(!ensure_gitignored(dir.path()).unwrap());
        let content = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(content.matches(PROJECT_CONFIG_FILE).count(), 1);
    }
}
