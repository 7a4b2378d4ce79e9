//! Raw deployment results as produced by an orchestrator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Provisioning states emitted by the bundled orchestrator.
///
/// Results from other engines carry provisioning states as free text, so the
/// raw result types below keep them as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Accepted,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl ProvisioningState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deployment output as reported by the engine, wrapped with its declared
/// type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentOutput {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl DeploymentOutput {
    #[must_use]
    pub fn new(output_type: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            output_type: Some(output_type.into()),
            value,
        }
    }
}

/// One resource operation recorded by the orchestrator, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    pub resource_symbolic_name: String,
    #[serde(default)]
    pub state: Option<String>,
    /// Status envelope for the operation; may nest an error object.
    #[serde(default)]
    pub operation_status: Option<serde_json::Value>,
}

impl OperationRecord {
    #[must_use]
    pub fn new(resource_symbolic_name: impl Into<String>, state: ProvisioningState) -> Self {
        Self {
            resource_symbolic_name: resource_symbolic_name.into(),
            state: Some(state.to_string()),
            operation_status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, operation_status: serde_json::Value) -> Self {
        self.operation_status = Some(operation_status);
        self
    }
}

/// Everything an orchestrator reports back for one deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    #[serde(default)]
    pub deployment_state: Option<String>,
    #[serde(default)]
    pub outputs: Option<BTreeMap<String, DeploymentOutput>>,
    /// Deployment-level error envelope.
    #[serde(default)]
    pub deployment_error: Option<serde_json::Value>,
    #[serde(default)]
    pub operations: Vec<OperationRecord>,
}
