use std::path::PathBuf;
use std::time::Duration;

use localdeploy_provider::ProviderError;
use thiserror::Error;

/// Structural and setup faults of a local deployment.
///
/// Per-resource outcomes never surface here; they are carried inside the
/// deployment result. Every variant displays as a "local deployment failed"
/// notification.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The template document could not be understood.
    #[error("local deployment failed: invalid template: {0}")]
    InvalidTemplate(String),

    /// The parameters document could not be understood or does not match
    /// the template.
    #[error("local deployment failed: invalid parameters: {0}")]
    InvalidParameters(String),

    /// A referenced document could not be read.
    #[error("local deployment failed: failed to read {}: {source}", path.display())]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A provider fault that aborts the whole deployment, such as an import
    /// with no registered provider.
    #[error("local deployment failed: {0}")]
    Provider(#[from] ProviderError),

    /// The deployment was cancelled by the caller.
    #[error("local deployment failed: deployment was cancelled")]
    Cancelled,

    /// The deployment did not finish within the configured deadline.
    #[error("local deployment failed: deployment timed out after {0:?}")]
    TimedOut(Duration),

    /// Configuration error.
    #[error("local deployment failed: {0}")]
    Config(#[from] ConfigError),
}

/// A nested error envelope that could not be mapped into an
/// [`OperationError`](localdeploy_core::OperationError).
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The envelope was neither an object nor null.
    #[error("expected an error envelope object, found {0}")]
    NotAnObject(&'static str),

    /// The envelope's error object did not have the expected shape.
    #[error("malformed error envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors loading [`DeployConfig`](crate::DeployConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
