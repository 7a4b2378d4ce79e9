use serde::{Deserialize, Serialize};

/// Properties of a `Wait` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitRequest {
    pub duration_ms: u64,
}

/// Properties of an `Assert` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertRequest {
    pub name: String,
    pub condition: bool,
}

/// Properties of a `BashScript` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunScriptRequest {
    pub script: String,
}

/// Resulting state of a `BashScript` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunScriptResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}
