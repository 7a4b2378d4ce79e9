use std::path::{Path, PathBuf};
use std::sync::Arc;

use localdeploy_core::Report;
use localdeploy_provider::ProviderRegistry;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::orchestrator::Orchestrator;
use crate::registry::default_registry;
use crate::report::build_report;
use crate::sequential::SequentialOrchestrator;

/// A request to deploy an already-compiled template.
#[derive(Debug, Clone)]
pub struct LocalDeployRequest {
    /// Path of the compiled template document.
    pub template: PathBuf,
    /// Path of the compiled parameters document, if any.
    pub parameters: Option<PathBuf>,
}

impl LocalDeployRequest {
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            parameters: None,
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: impl Into<PathBuf>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }
}

/// Runs local deployments end to end.
///
/// Each call to [`handle`](Self::handle) builds a fresh provider registry
/// from the configuration, hands the documents to the orchestrator, and maps
/// the raw result into a [`Report`].
pub struct LocalDeployHandler {
    config: DeployConfig,
    orchestrator: Arc<dyn Orchestrator>,
}

impl LocalDeployHandler {
    /// Create a handler that uses the [`SequentialOrchestrator`].
    pub fn new(config: DeployConfig) -> Self {
        Self {
            config,
            orchestrator: Arc::new(SequentialOrchestrator::new()),
        }
    }

    /// Replace the orchestrator.
    #[must_use]
    pub fn with_orchestrator(mut self, orchestrator: Arc<dyn Orchestrator>) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Build the provider registry a deployment would use.
    pub fn registry(&self) -> ProviderRegistry {
        default_registry(&self.config)
    }

    /// Run the deployment described by `request`.
    ///
    /// Structural faults are returned as [`DeployError`]; everything else,
    /// including failed resources, is reported in the returned [`Report`].
    #[instrument(skip_all, fields(template = %request.template.display(), orchestrator = self.orchestrator.name()))]
    pub async fn handle(
        &self,
        request: &LocalDeployRequest,
        cancel: CancellationToken,
    ) -> Result<Report, DeployError> {
        let template = read_document(&request.template).await?;
        let parameters = match &request.parameters {
            Some(path) => read_document(path).await?,
            None => String::new(),
        };

        let registry = Arc::new(self.registry());
        info!(providers = registry.len(), "starting local deployment");

        let deploy = self
            .orchestrator
            .deploy(registry, &template, &parameters, cancel.clone());
        let result = match self.config.deployment.timeout() {
            Some(limit) => match tokio::time::timeout(limit, deploy).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    cancel.cancel();
                    warn!(timeout = ?limit, "local deployment timed out");
                    return Err(DeployError::TimedOut(limit));
                }
            },
            None => deploy.await,
        }?;

        let report = build_report(&result);
        info!(
            state = %report.deployment.provisioning_state,
            operations = report.operations.len(),
            failed = report.failed_operations().count(),
            "local deployment finished"
        );
        Ok(report)
    }
}

async fn read_document(path: &Path) -> Result<String, DeployError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DeployError::ReadDocument {
            path: path.to_path_buf(),
            source,
        })
}
