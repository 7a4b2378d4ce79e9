use futures::future::BoxFuture;
use localdeploy_core::{OperationRequest, OperationResponse, ResourceData};
use localdeploy_provider::{DispatchTable, Operation, OperationResult, Provider, ProviderError};
use reqwest::Client;
use reqwest::header::ACCEPT;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::GithubConfig;
use crate::error::GithubError;
use crate::types::RepositoryRequest;

/// Import name templates use for this provider.
pub const GITHUB_PROVIDER_NAME: &str = "Github";
/// Import version templates use for this provider.
pub const GITHUB_PROVIDER_VERSION: &str = "0.0.1";

const REPOSITORY: &str = "Repository";
const TOKEN_KEY: &str = "token";
const GITHUB_JSON: &str = "application/vnd.github+json";

/// Read-only provider for GitHub `Repository` resources.
///
/// Supports `Get` only. Each call builds its own authenticated client from
/// the import's `token`, so no connection state is shared between calls.
/// API and transport failures are reported as a structured error targeting
/// `owner/name`, never as a fault.
pub struct GithubProvider {
    config: GithubConfig,
    get_table: DispatchTable<GithubProvider>,
}

impl GithubProvider {
    /// Create a provider against the public GitHub API.
    pub fn new() -> Self {
        Self::with_config(GithubConfig::new())
    }

    /// Create a provider with the given configuration.
    pub fn with_config(config: GithubConfig) -> Self {
        Self {
            config,
            get_table: DispatchTable::new(Operation::Get).on(REPOSITORY, Self::get_repository),
        }
    }

    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    fn get_repository<'a>(
        &'a self,
        request: &'a OperationRequest,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, OperationResult> {
        Box::pin(self.read_repository(request, cancel))
    }

    async fn read_repository(
        &self,
        request: &OperationRequest,
        cancel: &CancellationToken,
    ) -> OperationResult {
        let token = request.config_str(TOKEN_KEY).ok_or_else(|| {
            ProviderError::Configuration(format!(
                "import config for {GITHUB_PROVIDER_NAME} requires a string '{TOKEN_KEY}'"
            ))
        })?;
        let body: RepositoryRequest = request
            .properties()
            .map_err(|e| ProviderError::invalid_properties(&request.resource_type, e))?;
        let target = body.target();

        let result = tokio::select! {
            result = self.fetch_repository(token, &body) => result,
            () = cancel.cancelled() => {
                warn!(repository = %target, "repository fetch cancelled");
                return Err(ProviderError::Cancelled);
            }
        };

        match result {
            Ok(metadata) => {
                debug!(repository = %target, "repository fetched");
                Ok(OperationResponse::success(ResourceData::new(
                    &request.resource_type,
                    metadata,
                )))
            }
            Err(err) => {
                warn!(repository = %target, error = %err, "repository fetch failed");
                Ok(OperationResponse::failure(
                    err.into_operation_error(&request.resource_type, target),
                ))
            }
        }
    }

    /// Fetch the raw repository metadata document.
    async fn fetch_repository(
        &self,
        token: &str,
        body: &RepositoryRequest,
    ) -> Result<serde_json::Value, GithubError> {
        let client = Client::builder()
            .timeout(self.config.timeout)
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(GithubError::Client)?;

        let url = self.config.repository_url(&body.owner, &body.name)?;
        debug!(url = %url, "fetching repository");

        let response = client
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, GITHUB_JSON)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(GithubError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| GithubError::InvalidBody(e.to_string()))
    }
}

impl Default for GithubProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for GithubProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        GITHUB_PROVIDER_NAME
    }

    #[instrument(skip_all, fields(provider = GITHUB_PROVIDER_NAME, resource_type = %request.resource_type))]
    async fn get(&self, request: &OperationRequest, cancel: &CancellationToken) -> OperationResult {
        self.get_table.dispatch(self, request, cancel).await
    }
}
