use std::time::Duration;

use reqwest::Url;

use crate::error::GithubError;

/// Public GitHub REST API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Default `User-Agent` header; GitHub rejects requests without one.
pub const DEFAULT_USER_AGENT: &str = "localdeploy";

/// Configuration for the GitHub provider.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_base_url: String,

    /// `User-Agent` sent with every request.
    pub user_agent: String,

    /// Request timeout.
    pub timeout: Duration,
}

impl GithubConfig {
    /// Create a configuration targeting the public API.
    ///
    /// Defaults to a 30-second timeout.
    pub fn new() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the API base URL (e.g. a GitHub Enterprise endpoint).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_base_url = url.trim_end_matches('/').to_owned();
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(self, secs: u64) -> Self {
        self.with_timeout(Duration::from_secs(secs))
    }

    /// URL of the repository metadata endpoint.
    ///
    /// `owner` and `name` are each encoded as a single path segment, so `/`,
    /// `?` and `#` cannot leave the repository path. Empty, `.` and `..`
    /// segments are rejected.
    pub fn repository_url(&self, owner: &str, name: &str) -> Result<Url, GithubError> {
        for segment in [owner, name] {
            if matches!(segment, "" | "." | "..") {
                return Err(GithubError::InvalidRepository(format!(
                    "'{segment}' is not a valid owner or repository name"
                )));
            }
        }

        let mut url = Url::parse(&self.api_base_url)
            .map_err(|e| GithubError::InvalidRepository(format!("invalid API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| {
                GithubError::InvalidRepository(format!(
                    "API base URL '{}' cannot carry a path",
                    self.api_base_url
                ))
            })?
            .pop_if_empty()
            .extend(["repos", owner, name]);
        Ok(url)
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self::new()
    }
}
