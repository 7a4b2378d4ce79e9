use std::sync::Arc;

use async_trait::async_trait;
use localdeploy_core::DeploymentResult;
use localdeploy_provider::ProviderRegistry;
use tokio_util::sync::CancellationToken;

use crate::error::DeployError;

/// A deployment engine that runs a compiled template against a registry.
///
/// Implementations resolve the template's imports through `registry`, call
/// provider operations for each resource, and return the raw result. Only
/// structural faults (a malformed template, an import with no registered
/// provider) and cancellation are returned as errors; every per-resource
/// outcome is carried inside the [`DeploymentResult`].
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Human-readable engine name, used in logs.
    fn name(&self) -> &str;

    /// Run one deployment.
    async fn deploy(
        &self,
        registry: Arc<ProviderRegistry>,
        template: &str,
        parameters: &str,
        cancel: CancellationToken,
    ) -> Result<DeploymentResult, DeployError>;
}
