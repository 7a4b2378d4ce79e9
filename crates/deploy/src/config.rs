//! TOML configuration for local deployments.

use std::path::Path;
use std::time::Duration;

use localdeploy_github::GithubConfig;
use localdeploy_github::config::{DEFAULT_API_BASE_URL, DEFAULT_USER_AGENT};
use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeployConfig {
    /// Utility provider configuration.
    #[serde(default)]
    pub utils: UtilsSection,
    /// GitHub provider configuration.
    #[serde(default)]
    pub github: GithubSection,
    /// Deployment-wide settings.
    #[serde(default)]
    pub deployment: DeploymentSection,
}

impl DeployConfig {
    /// Load configuration from `path`, or use defaults if the file does not
    /// exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

/// Configuration for the `Utils` provider.
#[derive(Debug, Clone, Deserialize)]
pub struct UtilsSection {
    /// Whether the provider is registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Shell binary used to run `BashScript` resources.
    #[serde(default = "default_shell")]
    pub shell: String,
}

impl Default for UtilsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            shell: default_shell(),
        }
    }
}

/// Configuration for the `Github` provider.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubSection {
    /// Whether the provider is registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// REST API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// `User-Agent` header for API requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl GithubSection {
    /// Build the provider configuration described by this section.
    pub fn provider_config(&self) -> GithubConfig {
        GithubConfig::new()
            .with_api_base_url(&self.api_base_url)
            .with_user_agent(&self.user_agent)
            .with_timeout_secs(self.timeout_seconds)
    }
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Deployment-wide settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentSection {
    /// Overall deadline for one deployment. Unlimited when unset.
    pub timeout_seconds: Option<u64>,
}

impl DeploymentSection {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_shell() -> String {
    "bash".to_owned()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_owned()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_owned()
}

fn default_timeout_seconds() -> u64 {
    30
}
