//! Request, response, and error values exchanged between an orchestrator and
//! an extensibility provider.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A single provider operation request for one resource.
///
/// `Debug` output lists import config keys only; values such as credentials
/// are shown as `[REDACTED]`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    /// Provider-scoped resource type name (e.g. `"Wait"`).
    pub resource_type: String,
    /// Resource properties as authored in the template.
    pub resource_properties: serde_json::Value,
    /// Per-import settings such as credentials, shared by every resource
    /// that uses the same import.
    #[serde(default)]
    pub import_config: HashMap<String, serde_json::Value>,
}

impl std::fmt::Debug for OperationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRequest")
            .field("resource_type", &self.resource_type)
            .field("resource_properties", &self.resource_properties)
            .field("import_config", &redacted(&self.import_config))
            .finish()
    }
}

/// Map config keys to a `[REDACTED]` placeholder, in key order.
pub fn redacted(config: &HashMap<String, serde_json::Value>) -> BTreeMap<&str, &'static str> {
    config.keys().map(|key| (key.as_str(), "[REDACTED]")).collect()
}

impl OperationRequest {
    /// Create a request with an empty import configuration.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, resource_properties: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_properties,
            import_config: HashMap::new(),
        }
    }

    /// Replace the import configuration.
    #[must_use]
    pub fn with_import_config(mut self, import_config: HashMap<String, serde_json::Value>) -> Self {
        self.import_config = import_config;
        self
    }

    /// Add a single import configuration entry.
    #[must_use]
    pub fn with_config_value(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.import_config.insert(key.into(), value);
        self
    }

    /// Return an import configuration entry if it is present and a string.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.import_config.get(key).and_then(serde_json::Value::as_str)
    }

    /// Decode the resource properties into a typed body.
    pub fn properties<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.resource_properties)
    }
}

/// The provider's view of a resource's resulting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub properties: serde_json::Value,
}

impl ResourceData {
    #[must_use]
    pub fn new(resource_type: impl Into<String>, properties: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties,
        }
    }

    /// Resource data with an empty object as its properties.
    #[must_use]
    pub fn empty(resource_type: impl Into<String>) -> Self {
        Self::new(resource_type, serde_json::Value::Object(serde_json::Map::new()))
    }
}

/// A structured, resource-addressable operation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    pub code: String,
    pub message: String,
    /// The entity that failed (e.g. `owner/repo`). Empty when the error is
    /// not attributable to a specific entity.
    #[serde(default)]
    pub target: String,
}

impl OperationError {
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            target: target.into(),
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.target.is_empty() {
            write!(f, "{}: {}", self.code, self.message)
        } else {
            write!(f, "{}: {} ({})", self.code, self.message, self.target)
        }
    }
}

/// A non-empty list of operation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationErrors(Vec<OperationError>);

impl OperationErrors {
    /// A list holding exactly one error.
    #[must_use]
    pub fn one(error: OperationError) -> Self {
        Self(vec![error])
    }

    /// Build a list from a vector, returning `None` if it is empty.
    #[must_use]
    pub fn from_vec(errors: Vec<OperationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// The first error. Always present.
    pub fn first(&self) -> &OperationError {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[OperationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn into_vec(self) -> Vec<OperationError> {
        self.0
    }
}

/// Result of a provider operation: either resource data or at least one
/// error, never both and never neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireResponse", try_from = "WireResponse")]
pub enum OperationResponse {
    Succeeded(ResourceData),
    Failed(OperationErrors),
}

impl OperationResponse {
    #[must_use]
    pub fn success(resource: ResourceData) -> Self {
        Self::Succeeded(resource)
    }

    /// A failed response carrying exactly one error.
    #[must_use]
    pub fn failure(error: OperationError) -> Self {
        Self::Failed(OperationErrors::one(error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn resource(&self) -> Option<&ResourceData> {
        match self {
            Self::Succeeded(resource) => Some(resource),
            Self::Failed(_) => None,
        }
    }

    /// The errors carried by the response; empty on success.
    pub fn errors(&self) -> &[OperationError] {
        match self {
            Self::Succeeded(_) => &[],
            Self::Failed(errors) => errors.as_slice(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    resource: Option<ResourceData>,
    #[serde(default)]
    errors: Vec<OperationError>,
}

impl From<OperationResponse> for WireResponse {
    fn from(response: OperationResponse) -> Self {
        match response {
            OperationResponse::Succeeded(resource) => Self {
                resource: Some(resource),
                errors: Vec::new(),
            },
            OperationResponse::Failed(errors) => Self {
                resource: None,
                errors: errors.into_vec(),
            },
        }
    }
}

impl TryFrom<WireResponse> for OperationResponse {
    type Error = String;

    fn try_from(wire: WireResponse) -> Result<Self, Self::Error> {
        match (wire.resource, OperationErrors::from_vec(wire.errors)) {
            (Some(resource), None) => Ok(Self::Succeeded(resource)),
            (None, Some(errors)) => Ok(Self::Failed(errors)),
            (Some(_), Some(_)) => {
                Err("operation response carries both a resource and errors".to_owned())
            }
            (None, None) => Err("operation response carries neither a resource nor errors".to_owned()),
        }
    }
}
