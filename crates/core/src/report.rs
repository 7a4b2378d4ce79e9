//! The caller-facing deployment report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::envelope::OperationError;

/// Deployment-level section of a [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub provisioning_state: String,
    pub outputs: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

/// Per-resource section of a [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReport {
    pub resource_name: String,
    pub provisioning_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

/// Final response of a local deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub deployment: DeploymentReport,
    /// Operations in the order the orchestrator executed them.
    pub operations: Vec<OperationReport>,
}

impl Report {
    /// Operations that carry an error.
    pub fn failed_operations(&self) -> impl Iterator<Item = &OperationReport> {
        self.operations.iter().filter(|op| op.error.is_some())
    }
}
