use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// GithubConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_api")]
    pub api_url: String,
    #[serde(default = "default_org")]
    pub org: String,
    #[serde(default = "default_repo")]
    pub repo: String,
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_org() -> String {
    "mozilla-releng".to_string()
}

fn default_repo() -> String {
    "OpenCloudConfig".to_string()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api(),
            org: default_org(),
            repo: default_repo(),
        }
    }
}

// ---------------------------------------------------------------------------
// TaskclusterConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskclusterConfig {
    /// Host (and optional port) of the taskcluster proxy, without scheme.
    #[serde(default = "default_proxy")]
    pub proxy: String,
    #[serde(default = "default_aws_secret")]
    pub aws_secret: String,
    #[serde(default = "default_tooltool_secret")]
    pub tooltool_secret: String,
}

fn default_proxy() -> String {
    "taskcluster".to_string()
}

fn default_aws_secret() -> String {
    "repo:github.com/mozilla-releng/OpenCloudConfig:updateworkertype".to_string()
}

fn default_tooltool_secret() -> String {
    "repo:github.com/mozilla-releng/OpenCloudConfig:updatetooltoolrepo".to_string()
}

impl Default for TaskclusterConfig {
    fn default() -> Self {
        Self {
            proxy: default_proxy(),
            aws_secret: default_aws_secret(),
            tooltool_secret: default_tooltool_secret(),
        }
    }
}

impl TaskclusterConfig {
    pub fn base_url(&self) -> String {
        if self.proxy.starts_with("http://") || self.proxy.starts_with("https://") {
            self.proxy.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", self.proxy.trim_end_matches('/'))
        }
    }
}

// ---------------------------------------------------------------------------
// AwsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,
    #[serde(default = "default_name_patterns")]
    pub image_name_patterns: Vec<String>,
    #[serde(default = "default_security_groups")]
    pub security_groups: Vec<String>,
    /// Section name looked up in the per-user credentials file.
    #[serde(default = "default_profile")]
    pub profile: String,
}

fn default_regions() -> Vec<String> {
    ["eu-central-1", "us-west-1", "us-west-2", "us-east-1", "us-east-2"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_name_patterns() -> Vec<String> {
    vec![
        "gecko-*-b-win* version *".to_string(),
        "gecko-t-win* version *".to_string(),
    ]
}

fn default_security_groups() -> Vec<String> {
    ["ssh-only", "rdp-only", "livelog-direct"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_profile() -> String {
    "occ-taskcluster".to_string()
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            image_name_patterns: default_name_patterns(),
            security_groups: default_security_groups(),
            profile: default_profile(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeployConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Globs relative to the repository root.
    #[serde(default = "default_manifest_globs")]
    pub manifest_globs: Vec<String>,
    #[serde(default = "default_tooltool_url")]
    pub tooltool_url: String,
}

fn default_manifest_globs() -> Vec<String> {
    vec![
        "userdata/Manifest/gecko-*-beta.json".to_string(),
        "userdata/Manifest/gecko-*-gpu-b.json".to_string(),
    ]
}

fn default_tooltool_url() -> String {
    "https://tooltool.mozilla-releng.net/tooltool".to_string()
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            manifest_globs: default_manifest_globs(),
            tooltool_url: default_tooltool_url(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub taskcluster: TaskclusterConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default = "default_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GithubConfig::default(),
            taskcluster: TaskclusterConfig::default(),
            aws: AwsConfig::default(),
            deploy: DeployConfig::default(),
            http_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `explicit` if given, otherwise `<root>/.occ/config.yaml` when it
    /// exists, otherwise the built-in defaults.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = paths::config_path(root);
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            return Self::load(&path);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.aws.regions.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "aws.regions is empty: no images can be enumerated".to_string(),
            });
        }
        if self.aws.security_groups.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "aws.security_groups is empty: launch specs will carry no groups"
                    .to_string(),
            });
        }
        if self.deploy.manifest_globs.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "deploy.manifest_globs is empty: deploy evaluates nothing".to_string(),
            });
        }
        if self.http_timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "http_timeout_secs must be greater than zero".to_string(),
            });
        }

        warnings
    }
}
