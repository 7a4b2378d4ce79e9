//! Compiled template and parameters documents understood by the sequential
//! orchestrator.

use std::collections::{BTreeMap, HashMap, HashSet};

use localdeploy_core::envelope::redacted;
use serde::Deserialize;
use serde_json::Value;

use crate::error::DeployError;

/// A compiled deployment template.
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    /// Import aliases, each binding a provider name and version.
    #[serde(default)]
    pub imports: BTreeMap<String, ImportDeclaration>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterDeclaration>,
    /// Resources in declaration order.
    #[serde(default)]
    pub resources: Vec<ResourceDeclaration>,
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputDeclaration>,
}

/// `Debug` output shows config keys only; values are `[REDACTED]`.
#[derive(Clone, Deserialize)]
pub struct ImportDeclaration {
    pub provider: String,
    pub version: String,
    /// Provider-instance settings passed with every request for this import.
    #[serde(default)]
    pub config: HashMap<String, Value>,
}

impl std::fmt::Debug for ImportDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportDeclaration")
            .field("provider", &self.provider)
            .field("version", &self.version)
            .field("config", &redacted(&self.config))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDeclaration {
    #[serde(default)]
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDeclaration {
    /// Symbolic name, unique within the template.
    pub name: String,
    /// Alias of the import that provides this resource.
    pub import: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub properties: Value,
    /// Read an existing resource instead of saving it.
    #[serde(default)]
    pub existing: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputDeclaration {
    #[serde(rename = "type", default)]
    pub output_type: Option<String>,
    pub value: Value,
}

/// A parameters document: `{"parameters": {name: {"value": ...}}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParametersFile {
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterValue {
    pub value: Value,
}

impl Template {
    /// Parse and validate template text.
    pub fn parse(text: &str) -> Result<Self, DeployError> {
        let template: Self =
            serde_json::from_str(text).map_err(|e| DeployError::InvalidTemplate(e.to_string()))?;

        let mut seen = HashSet::new();
        for resource in &template.resources {
            if !seen.insert(resource.name.as_str()) {
                return Err(DeployError::InvalidTemplate(format!(
                    "duplicate resource name '{}'",
                    resource.name
                )));
            }
            if !template.imports.contains_key(&resource.import) {
                return Err(DeployError::InvalidTemplate(format!(
                    "resource '{}' references undefined import '{}'",
                    resource.name, resource.import
                )));
            }
        }
        Ok(template)
    }

    /// Combine declared defaults with supplied values.
    ///
    /// Every declared parameter must end up with a value, and the parameters
    /// document may only name declared parameters.
    pub fn bind_parameters(&self, supplied: ParametersFile) -> Result<Parameters, DeployError> {
        if let Some(unknown) = supplied
            .parameters
            .keys()
            .find(|name| !self.parameters.contains_key(*name))
        {
            return Err(DeployError::InvalidParameters(format!(
                "parameter '{unknown}' is not declared by the template"
            )));
        }

        let mut supplied = supplied.parameters;
        let mut values = BTreeMap::new();
        for (name, declaration) in &self.parameters {
            let value = match supplied.remove(name) {
                Some(given) => given.value,
                None => declaration.default_value.clone().ok_or_else(|| {
                    DeployError::InvalidParameters(format!("missing value for parameter '{name}'"))
                })?,
            };
            values.insert(name.clone(), value);
        }
        Ok(Parameters { values })
    }
}

impl ParametersFile {
    /// Parse parameters text. Blank text means no parameters.
    pub fn parse(text: &str) -> Result<Self, DeployError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(text).map_err(|e| DeployError::InvalidParameters(e.to_string()))
    }
}

/// Bound parameter values for one deployment.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    values: BTreeMap<String, Value>,
}

impl Parameters {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Replace every `[parameters('name')]` string inside `value`.
    pub fn substitute(&self, value: &Value) -> Result<Value, DeployError> {
        match value {
            Value::String(text) => match parameter_reference(text) {
                Some(name) => self.get(name).cloned().ok_or_else(|| {
                    DeployError::InvalidTemplate(format!("reference to unknown parameter '{name}'"))
                }),
                None => Ok(value.clone()),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.substitute(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => map
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.substitute(item)?)))
                .collect::<Result<serde_json::Map<_, _>, DeployError>>()
                .map(Value::Object),
            _ => Ok(value.clone()),
        }
    }
}

fn parameter_reference(text: &str) -> Option<&str> {
    text.strip_prefix("[parameters('")?.strip_suffix("')]")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const TEMPLATE: &str = r#"{
        "imports": {"utils": {"provider": "Utils", "version": "0.0.1"}},
        "parameters": {
            "message": {"defaultValue": "hello"},
            "delay": {}
        },
        "resources": [
            {"name": "pause", "import": "utils", "type": "Wait",
             "properties": {"durationMs": "[parameters('delay')]"}},
            {"name": "say", "import": "utils", "type": "BashScript",
             "properties": {"script": "[parameters('message')]"}}
        ],
        "outputs": {"said": {"type": "String", "value": "[parameters('message')]"}}
    }"#;

    #[test]
    fn parses_declarations() {
        let template = Template::parse(TEMPLATE).unwrap();
        assert_eq!(template.imports["utils"].provider, "Utils");
        assert_eq!(template.resources.len(), 2);
        assert_eq!(template.resources[0].name, "pause");
        assert_eq!(template.resources[1].resource_type, "BashScript");
        assert!(!template.resources[0].existing);
        assert_eq!(template.outputs["said"].output_type.as_deref(), Some("String"));
    }

    #[test]
    fn import_debug_redacts_config() {
        let template = Template::parse(
            r#"{"imports": {"gh": {"provider": "Github", "version": "0.0.1",
                                   "config": {"token": "ghp_secret"}}}}"#,
        )
        .unwrap();
        let debug = format!("{template:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("ghp_secret"));
    }

    #[test]
    fn binds_defaults_and_supplied_values() {
        let template = Template::parse(TEMPLATE).unwrap();
        let supplied = ParametersFile::parse(r#"{"parameters": {"delay": {"value": 25}}}"#).unwrap();
        let parameters = template.bind_parameters(supplied).unwrap();
        assert_eq!(parameters.get("delay"), Some(&json!(25)));
        assert_eq!(parameters.get("message"), Some(&json!("hello")));
    }

    #[test]
    fn missing_required_parameter_is_rejected() {
        let template = Template::parse(TEMPLATE).unwrap();
        let err = template.bind_parameters(ParametersFile::default()).unwrap_err();
        assert!(matches!(err, DeployError::InvalidParameters(msg) if msg.contains("delay")));
    }

    #[test]
    fn undeclared_parameter_is_rejected() {
        let template = Template::parse(TEMPLATE).unwrap();
        let supplied = ParametersFile::parse(
            r#"{"parameters": {"delay": {"value": 1}, "extra": {"value": 2}}}"#,
        )
        .unwrap();
        let err = template.bind_parameters(supplied).unwrap_err();
        assert!(matches!(err, DeployError::InvalidParameters(msg) if msg.contains("extra")));
    }

    #[test]
    fn blank_parameters_text_is_empty() {
        assert!(ParametersFile::parse("  \n").unwrap().parameters.is_empty());
        assert!(matches!(
            ParametersFile::parse("{not json").unwrap_err(),
            DeployError::InvalidParameters(_)
        ));
    }

    #[test]
    fn substitutes_nested_references() {
        let template = Template::parse(TEMPLATE).unwrap();
        let parameters = template
            .bind_parameters(ParametersFile::parse(r#"{"parameters": {"delay": {"value": 5}}}"#).unwrap())
            .unwrap();

        let value = json!({
            "a": "[parameters('message')]",
            "b": ["[parameters('delay')]", "literal", "[parameters('message') ]"],
            "c": {"d": true}
        });
        assert_eq!(
            parameters.substitute(&value).unwrap(),
            json!({"a": "hello", "b": [5, "literal", "[parameters('message') ]"], "c": {"d": true}})
        );
    }

    #[test]
    fn unknown_reference_is_structural() {
        let parameters = Parameters::default();
        let err = parameters.substitute(&json!("[parameters('nope')]")).unwrap_err();
        assert!(matches!(err, DeployError::InvalidTemplate(msg) if msg.contains("nope")));
    }

    #[test]
    fn undefined_import_is_rejected() {
        let err = Template::parse(
            r#"{"resources": [{"name": "r", "import": "ghost", "type": "Wait", "properties": {}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::InvalidTemplate(msg) if msg.contains("ghost")));
    }

    #[test]
    fn duplicate_resource_names_are_rejected() {
        let err = Template::parse(
            r#"{
                "imports": {"u": {"provider": "Utils", "version": "0.0.1"}},
                "resources": [
                    {"name": "r", "import": "u", "type": "Wait"},
                    {"name": "r", "import": "u", "type": "Wait"}
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::InvalidTemplate(_)));
    }

    #[test]
    fn malformed_template_is_rejected() {
        assert!(matches!(
            Template::parse("[1, 2").unwrap_err(),
            DeployError::InvalidTemplate(_)
        ));
    }
}
