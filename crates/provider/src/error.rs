use localdeploy_core::ProviderKey;
use thiserror::Error;

use crate::provider::Operation;

/// Hard faults raised by providers and the registry.
///
/// Expected business outcomes (a failed assertion, a failed remote call) are
/// not faults; providers report those as
/// [`OperationResponse::Failed`](localdeploy_core::OperationResponse).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No factory was registered for the requested import.
    #[error("provider not found: {0}")]
    NotFound(ProviderKey),

    /// The provider does not implement the operation for this resource type.
    #[error("operation {operation} is not supported by provider {provider} for resource type '{resource_type}'")]
    OperationNotSupported {
        provider: String,
        operation: Operation,
        resource_type: String,
    },

    /// The resource properties could not be decoded.
    #[error("invalid properties for resource type '{resource_type}': {message}")]
    InvalidProperties {
        resource_type: String,
        message: String,
    },

    /// The import configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The provider failed to carry out the side effect.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The governing operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Build an [`OperationNotSupported`](Self::OperationNotSupported) fault.
    pub fn not_supported(
        provider: impl Into<String>,
        operation: Operation,
        resource_type: impl Into<String>,
    ) -> Self {
        Self::OperationNotSupported {
            provider: provider.into(),
            operation,
            resource_type: resource_type.into(),
        }
    }

    /// Build an [`InvalidProperties`](Self::InvalidProperties) fault.
    pub fn invalid_properties(resource_type: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::InvalidProperties {
            resource_type: resource_type.into(),
            message: err.to_string(),
        }
    }

    /// Returns `true` for contract mismatches between a template and the
    /// provider that serves it.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::OperationNotSupported { .. })
    }

    /// Short, stable code for the fault.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ProviderNotFound",
            Self::OperationNotSupported { .. } => "OperationNotSupported",
            Self::InvalidProperties { .. } => "InvalidProperties",
            Self::Configuration(_) => "InvalidConfiguration",
            Self::ExecutionFailed(_) => "ExecutionFailed",
            Self::Cancelled => "Cancelled",
        }
    }
}
