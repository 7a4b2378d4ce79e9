use std::sync::Arc;

use localdeploy_github::{GITHUB_PROVIDER_NAME, GITHUB_PROVIDER_VERSION, GithubProvider};
use localdeploy_provider::ProviderRegistry;
use localdeploy_utils::{ShellRunner, UTILS_PROVIDER_NAME, UTILS_PROVIDER_VERSION, UtilsProvider};
use tracing::debug;

use crate::config::DeployConfig;

/// Build the registry of providers this environment supports.
///
/// A fresh registry is built for every deployment; provider instances are
/// created on first resolution.
pub fn default_registry(config: &DeployConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    if config.utils.enabled {
        let shell = config.utils.shell.clone();
        registry.register(UTILS_PROVIDER_NAME, UTILS_PROVIDER_VERSION, move || {
            UtilsProvider::with_runner(Arc::new(ShellRunner::with_shell(shell.clone())))
        });
    }

    if config.github.enabled {
        let github = config.github.provider_config();
        registry.register(GITHUB_PROVIDER_NAME, GITHUB_PROVIDER_VERSION, move || {
            GithubProvider::with_config(github.clone())
        });
    }

    debug!(providers = registry.len(), "provider registry built");
    registry
}
