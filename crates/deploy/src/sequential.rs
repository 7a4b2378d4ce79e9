use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use localdeploy_core::{
    DeploymentOutput, DeploymentResult, OperationError, OperationRecord, OperationRequest,
    OperationResponse, ProvisioningState,
};
use localdeploy_provider::{DynProvider, Operation, ProviderError, ProviderRegistry};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::DeployError;
use crate::orchestrator::Orchestrator;
use crate::template::{Parameters, ParametersFile, ResourceDeclaration, Template};

/// Code of the deployment-level error when any resource failed.
pub const DEPLOYMENT_FAILED_CODE: &str = "DeploymentFailed";

/// An in-process engine that runs resources one at a time, in declaration
/// order.
///
/// There is no dependency analysis: a resource that fails does not stop the
/// ones after it. Every import is resolved, and every parameter reference is
/// bound, before the first provider call, so structural faults never leave a
/// deployment half-applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialOrchestrator {
    preview: bool,
}

/// One resource ready to run.
struct Step {
    name: String,
    operation: Operation,
    provider: Arc<dyn DynProvider>,
    request: OperationRequest,
}

impl SequentialOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An orchestrator that calls `PreviewSave` instead of `Save`.
    pub fn preview() -> Self {
        Self { preview: true }
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    fn operation_for(&self, resource: &ResourceDeclaration) -> Operation {
        if resource.existing {
            Operation::Get
        } else if self.preview {
            Operation::PreviewSave
        } else {
            Operation::Save
        }
    }

    fn plan(
        &self,
        registry: &ProviderRegistry,
        template: &Template,
        parameters: &Parameters,
    ) -> Result<Vec<Step>, DeployError> {
        let mut imports = HashMap::with_capacity(template.imports.len());
        for (alias, import) in &template.imports {
            let provider = registry.resolve(&import.provider, &import.version)?;
            let config = import
                .config
                .iter()
                .map(|(key, value)| Ok((key.clone(), parameters.substitute(value)?)))
                .collect::<Result<HashMap<_, _>, DeployError>>()?;
            debug!(alias, provider = %import.provider, version = %import.version, "import resolved");
            imports.insert(alias.as_str(), (provider, config));
        }

        template
            .resources
            .iter()
            .map(|resource| {
                let (provider, config) = imports.get(resource.import.as_str()).ok_or_else(|| {
                    DeployError::InvalidTemplate(format!(
                        "resource '{}' references undefined import '{}'",
                        resource.name, resource.import
                    ))
                })?;
                let properties = parameters.substitute(&resource.properties)?;
                Ok(Step {
                    name: resource.name.clone(),
                    operation: self.operation_for(resource),
                    provider: Arc::clone(provider),
                    request: OperationRequest::new(&resource.resource_type, properties)
                        .with_import_config(config.clone()),
                })
            })
            .collect()
    }

    async fn run_step(&self, step: &Step, cancel: &CancellationToken) -> Result<OperationRecord, DeployError> {
        let outcome = tokio::select! {
            outcome = step.provider.invoke(step.operation, &step.request, cancel) => outcome,
            () = cancel.cancelled() => return Err(DeployError::Cancelled),
        };

        let record = match outcome {
            Ok(OperationResponse::Succeeded(_)) => {
                debug!(resource = %step.name, "resource succeeded");
                OperationRecord::new(&step.name, ProvisioningState::Succeeded)
            }
            Ok(OperationResponse::Failed(errors)) => {
                let error = errors.first();
                warn!(resource = %step.name, code = %error.code, "resource failed");
                OperationRecord::new(&step.name, ProvisioningState::Failed)
                    .with_status(json!({ "error": error }))
            }
            Err(ProviderError::Cancelled) => return Err(DeployError::Cancelled),
            Err(err) => {
                warn!(resource = %step.name, error = %err, "provider fault");
                OperationRecord::new(&step.name, ProvisioningState::Failed).with_status(json!({
                    "error": { "code": err.code(), "message": err.to_string() }
                }))
            }
        };
        Ok(record)
    }
}

#[async_trait]
impl Orchestrator for SequentialOrchestrator {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "sequential"
    }

    #[instrument(skip_all, fields(orchestrator = "sequential", preview = self.preview))]
    async fn deploy(
        &self,
        registry: Arc<ProviderRegistry>,
        template: &str,
        parameters: &str,
        cancel: CancellationToken,
    ) -> Result<DeploymentResult, DeployError> {
        let template = Template::parse(template)?;
        let parameters = template.bind_parameters(ParametersFile::parse(parameters)?)?;
        let steps = self.plan(&registry, &template, &parameters)?;
        let outputs = template
            .outputs
            .iter()
            .map(|(name, output)| {
                Ok((
                    name.clone(),
                    DeploymentOutput {
                        output_type: output.output_type.clone(),
                        value: parameters.substitute(&output.value)?,
                    },
                ))
            })
            .collect::<Result<BTreeMap<_, _>, DeployError>>()?;

        info!(resources = steps.len(), "deployment started");

        let mut operations = Vec::with_capacity(steps.len());
        for step in &steps {
            if cancel.is_cancelled() {
                return Err(DeployError::Cancelled);
            }
            operations.push(self.run_step(step, &cancel).await?);
        }

        let failed = operations
            .iter()
            .filter(|op| op.state.as_deref() != Some(ProvisioningState::Succeeded.as_str()))
            .count();

        let result = if failed == 0 {
            DeploymentResult {
                deployment_state: Some(ProvisioningState::Succeeded.to_string()),
                outputs: Some(outputs),
                deployment_error: None,
                operations,
            }
        } else {
            let error = OperationError::new(
                DEPLOYMENT_FAILED_CODE,
                format!("{failed} of {} resource operations failed", operations.len()),
                "",
            );
            DeploymentResult {
                deployment_state: Some(ProvisioningState::Failed.to_string()),
                outputs: None,
                deployment_error: Some(json!({ "error": error })),
                operations,
            }
        };

        info!(
            state = result.deployment_state.as_deref().unwrap_or_default(),
            failed, "deployment finished"
        );
        Ok(result)
    }
}


#[cfg(test)]
#[allow(clippy::unnecessary_literal_bound)]
mod tests {
    use std::sync::Mutex;

    use localdeploy_core::ResourceData;
    use localdeploy_provider::{OperationResult, Provider};
    use serde_json::Value;

    use super::*;

    /// Records every call; behaviour is chosen by resource type.
    struct ScriptedProvider {
        calls: Arc<Mutex<Vec<(Operation, OperationRequest)>>>,
    }

    impl ScriptedProvider {
        async fn handle(
            &self,
            operation: Operation,
            request: &OperationRequest,
            cancel: &CancellationToken,
        ) -> OperationResult {
            self.calls.lock().unwrap().push((operation, request.clone()));
            match request.resource_type.as_str() {
                "Ok" => Ok(OperationResponse::success(ResourceData::new(
                    "Ok",
                    request.resource_properties.clone(),
                ))),
                "Fail" => Ok(OperationResponse::failure(OperationError::new(
                    "Broken",
                    "it broke",
                    "thing",
                ))),
                "Block" => {
                    cancel.cancelled().await;
                    Err(ProviderError::Cancelled)
                }
                other => Err(ProviderError::not_supported("Scripted", operation, other)),
            }
        }
    }

    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn get(&self, request: &OperationRequest, cancel: &CancellationToken) -> OperationResult {
            self.handle(Operation::Get, request, cancel).await
        }

        async fn save(&self, request: &OperationRequest, cancel: &CancellationToken) -> OperationResult {
            self.handle(Operation::Save, request, cancel).await
        }

        async fn preview_save(
            &self,
            request: &OperationRequest,
            cancel: &CancellationToken,
        ) -> OperationResult {
            self.handle(Operation::PreviewSave, request, cancel).await
        }
    }

    type Calls = Arc<Mutex<Vec<(Operation, OperationRequest)>>>;

    fn registry() -> (Arc<ProviderRegistry>, Calls) {
        let calls: Calls = Arc::default();
        let shared = Arc::clone(&calls);
        let mut registry = ProviderRegistry::new();
        registry.register("Scripted", "1.0.0", move || ScriptedProvider {
            calls: Arc::clone(&shared),
        });
        (Arc::new(registry), calls)
    }

    fn template(resources: &Value) -> String {
        json!({
            "imports": {"s": {"provider": "Scripted", "version": "1.0.0",
                              "config": {"token": "[parameters('token')]"}}},
            "parameters": {"token": {"defaultValue": "secret"}, "greeting": {"defaultValue": "hi"}},
            "resources": resources,
            "outputs": {"greeting": {"type": "String", "value": "[parameters('greeting')]"}}
        })
        .to_string()
    }

    fn names(result: &DeploymentResult) -> Vec<&str> {
        result
            .operations
            .iter()
            .map(|op| op.resource_symbolic_name.as_str())
            .collect()
    }

    #[tokio::test]
    async fn all_resources_succeed_in_declaration_order() {
        let (registry, calls) = registry();
        let text = template(&json!([
            {"name": "second", "import": "s", "type": "Ok", "properties": {"n": 2}},
            {"name": "first", "import": "s", "type": "Ok", "properties": {"n": "[parameters('greeting')]"}}
        ]));

        let result = SequentialOrchestrator::new()
            .deploy(registry, &text, "", CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.deployment_state.as_deref(), Some("Succeeded"));
        assert!(result.deployment_error.is_none());
        assert_eq!(names(&result), vec!["second", "first"]);
        assert_eq!(result.outputs.unwrap()["greeting"].value, json!("hi"));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, Operation::Save);
        assert_eq!(calls[1].1.resource_properties, json!({"n": "hi"}));
        assert_eq!(calls[1].1.config_str("token"), Some("secret"));
    }

    #[tokio::test]
    async fn parameters_file_overrides_defaults() {
        let (registry, calls) = registry();
        let text = template(&json!([
            {"name": "r", "import": "s", "type": "Ok", "properties": {"g": "[parameters('greeting')]"}}
        ]));

        let result = SequentialOrchestrator::new()
            .deploy(
                registry,
                &text,
                r#"{"parameters": {"greeting": {"value": "hello"}}}"#,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.outputs.unwrap()["greeting"].value, json!("hello"));
        assert_eq!(calls.lock().unwrap()[0].1.resource_properties, json!({"g": "hello"}));
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_resource() {
        let (registry, calls) = registry();
        let text = template(&json!([
            {"name": "a", "import": "s", "type": "Ok"},
            {"name": "b", "import": "s", "type": "Fail"},
            {"name": "c", "import": "s", "type": "Ok"}
        ]));

        let result = SequentialOrchestrator::new()
            .deploy(registry, &text, "", CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(calls.lock().unwrap().len(), 3);
        assert_eq!(result.deployment_state.as_deref(), Some("Failed"));
        assert!(result.outputs.is_none());
        assert_eq!(
            result.deployment_error.unwrap()["error"]["code"],
            json!("DeploymentFailed")
        );

        let states: Vec<_> = result.operations.iter().map(|op| op.state.as_deref()).collect();
        assert_eq!(states, vec![Some("Succeeded"), Some("Failed"), Some("Succeeded")]);
        assert_eq!(
            result.operations[1].operation_status,
            Some(json!({"error": {"code": "Broken", "message": "it broke", "target": "thing"}}))
        );
    }

    #[tokio::test]
    async fn provider_fault_is_recorded_with_its_code() {
        let (registry, _) = registry();
        let text = template(&json!([
            {"name": "odd", "import": "s", "type": "Unknown"},
            {"name": "fine", "import": "s", "type": "Ok"}
        ]));

        let result = SequentialOrchestrator::new()
            .deploy(registry, &text, "", CancellationToken::new())
            .await
            .unwrap();

        let status = result.operations[0].operation_status.as_ref().unwrap();
        assert_eq!(status["error"]["code"], json!("OperationNotSupported"));
        assert_eq!(result.operations[1].state.as_deref(), Some("Succeeded"));
        assert_eq!(result.deployment_state.as_deref(), Some("Failed"));
    }

    #[tokio::test]
    async fn existing_resources_are_read_and_preview_skips_save() {
        let (registry, calls) = registry();
        let text = template(&json!([
            {"name": "read", "import": "s", "type": "Ok", "existing": true},
            {"name": "write", "import": "s", "type": "Ok"}
        ]));

        let orchestrator = SequentialOrchestrator::preview();
        assert!(orchestrator.is_preview());
        orchestrator
            .deploy(registry, &text, "", CancellationToken::new())
            .await
            .unwrap();

        let operations: Vec<Operation> = calls.lock().unwrap().iter().map(|(op, _)| *op).collect();
        assert_eq!(operations, vec![Operation::Get, Operation::PreviewSave]);
    }

    #[tokio::test]
    async fn unregistered_import_fails_before_any_call() {
        let (registry, calls) = registry();
        let text = json!({
            "imports": {
                "s": {"provider": "Scripted", "version": "1.0.0"},
                "k8s": {"provider": "Kubernetes", "version": "1.0.0"}
            },
            "resources": [{"name": "a", "import": "s", "type": "Ok"}]
        })
        .to_string();

        let err = SequentialOrchestrator::new()
            .deploy(registry, &text, "", CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Provider(ProviderError::NotFound(_))));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_parameter_reference_fails_before_any_call() {
        let (registry, calls) = registry();
        let text = template(&json!([
            {"name": "a", "import": "s", "type": "Ok"},
            {"name": "b", "import": "s", "type": "Ok", "properties": {"x": "[parameters('missing')]"}}
        ]));

        let err = SequentialOrchestrator::new()
            .deploy(registry, &text, "", CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::InvalidTemplate(_)));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let (registry, calls) = registry();
        let text = template(&json!([{"name": "a", "import": "s", "type": "Ok"}]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = SequentialOrchestrator::new()
            .deploy(registry, &text, "", cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Cancelled));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_during_resource_stops_deployment() {
        let (registry, calls) = registry();
        let text = template(&json!([
            {"name": "slow", "import": "s", "type": "Block"},
            {"name": "never", "import": "s", "type": "Ok"}
        ]));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = SequentialOrchestrator::new()
            .deploy(registry, &text, "", cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Cancelled));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }
}
