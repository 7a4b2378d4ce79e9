use localdeploy_provider::ProviderError;
use thiserror::Error;

/// Errors raised while running a script.
///
/// These convert into [`ProviderError`] at the provider boundary. A script
/// that runs and exits non-zero is not an error.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The shell process could not be started.
    #[error("failed to start '{shell}': {source}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the process or reading its output failed.
    #[error("failed to collect script output: {0}")]
    Wait(#[source] std::io::Error),

    /// The operation was cancelled and the process was killed.
    #[error("script cancelled")]
    Cancelled,
}

impl From<ScriptError> for ProviderError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::Cancelled => ProviderError::Cancelled,
            other => ProviderError::ExecutionFailed(other.to_string()),
        }
    }
}
