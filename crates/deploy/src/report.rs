//! Mapping of raw deployment results into the caller-facing [`Report`].

use localdeploy_core::{
    DeploymentReport, DeploymentResult, OperationError, OperationRecord, OperationReport, Report,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::EnvelopeError;

/// Provisioning state reported when the engine did not supply one.
pub const DEFAULT_PROVISIONING_STATE: &str = "Failed";

/// Code of the diagnostic error emitted for an envelope that cannot be mapped.
pub const INVALID_ENVELOPE_CODE: &str = "InvalidErrorEnvelope";

/// Build the report for a deployment result.
///
/// Pure and deterministic: the same result always yields the same report.
/// Operations keep the order the orchestrator recorded them in.
pub fn build_report(result: &DeploymentResult) -> Report {
    let deployment = DeploymentReport {
        provisioning_state: state_or_default(result.deployment_state.as_deref()),
        outputs: result
            .outputs
            .iter()
            .flatten()
            .map(|(name, output)| (name.clone(), output.value.clone()))
            .collect(),
        error: result
            .deployment_error
            .as_ref()
            .and_then(|envelope| map_error("deployment", extract_error(envelope))),
    };

    let operations = result.operations.iter().map(operation_report).collect();

    Report {
        deployment,
        operations,
    }
}

fn operation_report(record: &OperationRecord) -> OperationReport {
    OperationReport {
        resource_name: record.resource_symbolic_name.clone(),
        provisioning_state: state_or_default(record.state.as_deref()),
        error: record
            .operation_status
            .as_ref()
            .and_then(|envelope| {
                map_error(
                    &record.resource_symbolic_name,
                    extract_operation_error(envelope),
                )
            }),
    }
}

fn state_or_default(state: Option<&str>) -> String {
    state.unwrap_or(DEFAULT_PROVISIONING_STATE).to_owned()
}

fn map_error(
    source: &str,
    extracted: Result<Option<OperationError>, EnvelopeError>,
) -> Option<OperationError> {
    match extracted {
        Ok(error) => error,
        Err(err) => {
            warn!(source, error = %err, "unable to map error envelope");
            Some(OperationError::new(INVALID_ENVELOPE_CODE, err.to_string(), ""))
        }
    }
}

/// An error object as engines send it; `message` and `target` may be null.
#[derive(Deserialize)]
struct WireError {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    target: Option<String>,
}

impl From<WireError> for OperationError {
    fn from(wire: WireError) -> Self {
        OperationError::new(
            wire.code,
            wire.message.unwrap_or_default(),
            wire.target.unwrap_or_default(),
        )
    }
}

/// Extract the error carried by a status envelope.
///
/// Accepts `{"error": {code, message?, target?}}` or a bare
/// `{code, message?, target?}`; a null or missing `message` or `target` reads
/// as empty. Envelopes without an error yield `None`.
pub fn extract_error(envelope: &Value) -> Result<Option<OperationError>, EnvelopeError> {
    let Some(error) = error_object(envelope)? else {
        return Ok(None);
    };
    let wire: WireError = serde_json::from_value(error.clone())?;
    Ok(Some(wire.into()))
}

/// Extract the error of an operation status envelope.
///
/// Like [`extract_error`], except that when the error's message is itself a
/// serialized envelope, the inner error is returned instead. Engines embed
/// the provider's error response this way in operation status messages.
pub fn extract_operation_error(envelope: &Value) -> Result<Option<OperationError>, EnvelopeError> {
    let Some(outer) = extract_error(envelope)? else {
        return Ok(None);
    };

    let inner = serde_json::from_str::<Value>(&outer.message)
        .ok()
        .and_then(|nested| extract_error(&nested).ok().flatten());

    Ok(Some(inner.unwrap_or(outer)))
}

/// Locate the error object inside an envelope.
fn error_object(envelope: &Value) -> Result<Option<&Value>, EnvelopeError> {
    match envelope {
        Value::Null => Ok(None),
        Value::Object(map) => match map.get("error") {
            Some(Value::Null) => Ok(None),
            Some(error) => Ok(Some(error)),
            None if map.contains_key("code") => Ok(Some(envelope)),
            None => Ok(None),
        },
        other => Err(EnvelopeError::NotAnObject(json_kind(other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
