use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use localdeploy_core::{OperationError, OperationRequest, OperationResponse, ResourceData};
use localdeploy_provider::{DispatchTable, Operation, OperationResult, Provider, ProviderError};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::runner::{ScriptRunner, ShellRunner};
use crate::types::{AssertRequest, RunScriptRequest, RunScriptResponse, WaitRequest};

/// Import name templates use for this provider.
pub const UTILS_PROVIDER_NAME: &str = "Utils";
/// Import version templates use for this provider.
pub const UTILS_PROVIDER_VERSION: &str = "0.0.1";

const WAIT: &str = "Wait";
const ASSERT: &str = "Assert";
const BASH_SCRIPT: &str = "BashScript";

/// Error code reported when an `Assert` condition is false.
pub const ASSERTION_FAILED: &str = "AssertionFailed";

/// Provider for `Wait`, `Assert`, and `BashScript` resources.
///
/// Supports `PreviewSave` and `Save` only. `BashScript` has no preview entry:
/// its side effects are unknown, so previewing it raises
/// [`ProviderError::OperationNotSupported`] like any unknown type.
///
/// The provider holds no per-call state and can serve concurrent operations.
pub struct UtilsProvider {
    runner: Arc<dyn ScriptRunner>,
    preview_table: DispatchTable<UtilsProvider>,
    save_table: DispatchTable<UtilsProvider>,
}

impl UtilsProvider {
    /// Create a provider that runs scripts with `bash`.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(ShellRunner::new()))
    }

    /// Create a provider that runs scripts with the given runner.
    pub fn with_runner(runner: Arc<dyn ScriptRunner>) -> Self {
        Self {
            runner,
            preview_table: DispatchTable::new(Operation::PreviewSave)
                .on(WAIT, Self::preview_noop)
                .on(ASSERT, Self::preview_noop),
            save_table: DispatchTable::new(Operation::Save)
                .on(WAIT, Self::save_wait)
                .on(ASSERT, Self::save_assert)
                .on(BASH_SCRIPT, Self::save_bash_script),
        }
    }

    /// Resource types handled by `operation`, sorted.
    pub fn resource_types(&self, operation: Operation) -> Vec<&'static str> {
        match operation {
            Operation::PreviewSave => self.preview_table.resource_types(),
            Operation::Save => self.save_table.resource_types(),
            Operation::Get | Operation::Delete => Vec::new(),
        }
    }

    #[allow(clippy::unused_self)]
    fn preview_noop<'a>(
        &'a self,
        request: &'a OperationRequest,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, OperationResult> {
        let response: OperationResult = Ok(OperationResponse::success(ResourceData::empty(
            &request.resource_type,
        )));
        Box::pin(std::future::ready(response))
    }

    fn save_wait<'a>(
        &'a self,
        request: &'a OperationRequest,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, OperationResult> {
        Box::pin(self.wait(request, cancel))
    }

    #[allow(clippy::unused_self)]
    fn save_assert<'a>(
        &'a self,
        request: &'a OperationRequest,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, OperationResult> {
        Box::pin(std::future::ready(Self::check_assertion(request)))
    }

    fn save_bash_script<'a>(
        &'a self,
        request: &'a OperationRequest,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, OperationResult> {
        Box::pin(self.run_script(request, cancel))
    }

    async fn wait(&self, request: &OperationRequest, cancel: &CancellationToken) -> OperationResult {
        let body: WaitRequest = decode(request)?;
        debug!(duration_ms = body.duration_ms, "waiting");

        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(body.duration_ms)) => {}
            () = cancel.cancelled() => {
                warn!(duration_ms = body.duration_ms, "wait cancelled");
                return Err(ProviderError::Cancelled);
            }
        }

        Ok(OperationResponse::success(ResourceData::empty(
            &request.resource_type,
        )))
    }

    fn check_assertion(request: &OperationRequest) -> OperationResult {
        let body: AssertRequest = decode(request)?;

        if !body.condition {
            info!(assertion = %body.name, "assertion failed");
            return Ok(OperationResponse::failure(OperationError::new(
                ASSERTION_FAILED,
                format!("Assertion '{}' failed!", body.name),
                "",
            )));
        }

        debug!(assertion = %body.name, "assertion passed");
        Ok(OperationResponse::success(ResourceData::empty(
            &request.resource_type,
        )))
    }

    async fn run_script(
        &self,
        request: &OperationRequest,
        cancel: &CancellationToken,
    ) -> OperationResult {
        let body: RunScriptRequest = decode(request)?;
        let output = self.runner.run(&body.script, cancel).await?;

        if output.exit_code != 0 {
            info!(exit_code = output.exit_code, "script exited with non-zero code");
        }

        let response = RunScriptResponse {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        };
        let properties = serde_json::to_value(&response)
            .map_err(|e| ProviderError::ExecutionFailed(e.to_string()))?;

        Ok(OperationResponse::success(ResourceData::new(
            &request.resource_type,
            properties,
        )))
    }
}

impl Default for UtilsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for UtilsProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        UTILS_PROVIDER_NAME
    }

    #[instrument(skip_all, fields(provider = UTILS_PROVIDER_NAME, resource_type = %request.resource_type))]
    async fn preview_save(
        &self,
        request: &OperationRequest,
        cancel: &CancellationToken,
    ) -> OperationResult {
        self.preview_table.dispatch(self, request, cancel).await
    }

    #[instrument(skip_all, fields(provider = UTILS_PROVIDER_NAME, resource_type = %request.resource_type))]
    async fn save(&self, request: &OperationRequest, cancel: &CancellationToken) -> OperationResult {
        self.save_table.dispatch(self, request, cancel).await
    }
}

fn decode<T: DeserializeOwned>(request: &OperationRequest) -> Result<T, ProviderError> {
    request
        .properties()
        .map_err(|e| ProviderError::invalid_properties(&request.resource_type, e))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::ScriptError;
    use crate::runner::ScriptOutput;

    /// Runner returning canned output and recording the scripts it was given.
    struct FakeRunner {
        output: ScriptOutput,
        scripts: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn new(exit_code: i32, stdout: &str, stderr: &str) -> Arc<Self> {
            Arc::new(Self {
                output: ScriptOutput {
                    exit_code,
                    stdout: stdout.to_owned(),
                    stderr: stderr.to_owned(),
                },
                scripts: Mutex::new(Vec::new()),
            })
        }

        fn scripts(&self) -> Vec<String> {
            self.scripts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScriptRunner for FakeRunner {
        async fn run(
            &self,
            script: &str,
            _cancel: &CancellationToken,
        ) -> Result<ScriptOutput, ScriptError> {
            self.scripts.lock().unwrap().push(script.to_owned());
            Ok(self.output.clone())
        }
    }

    fn provider() -> UtilsProvider {
        UtilsProvider::with_runner(FakeRunner::new(0, "", ""))
    }

    fn wait(duration_ms: u64) -> OperationRequest {
        OperationRequest::new(WAIT, json!({ "durationMs": duration_ms }))
    }

    fn assertion(name: &str, condition: bool) -> OperationRequest {
        OperationRequest::new(ASSERT, json!({ "name": name, "condition": condition }))
    }

    fn script(script: &str) -> OperationRequest {
        OperationRequest::new(BASH_SCRIPT, json!({ "script": script }))
    }

    #[test]
    fn provider_name() {
        assert_eq!(Provider::name(&provider()), "Utils");
    }

    #[test]
    fn supported_resource_types() {
        let provider = provider();
        assert_eq!(
            provider.resource_types(Operation::PreviewSave),
            vec!["Assert", "Wait"]
        );
        assert_eq!(
            provider.resource_types(Operation::Save),
            vec!["Assert", "BashScript", "Wait"]
        );
        assert!(provider.resource_types(Operation::Get).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_save_sleeps_for_duration() {
        let started = tokio::time::Instant::now();
        let response = Provider::save(&provider(), &wait(200), &CancellationToken::new())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(response.resource().unwrap().properties, json!({}));
        assert!(response.errors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_preview_returns_immediately() {
        let started = tokio::time::Instant::now();
        let response = Provider::preview_save(&provider(), &wait(60_000), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(response.resource().unwrap().resource_type, "Wait");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waits_do_not_block_each_other() {
        let provider = provider();
        let cancel = CancellationToken::new();
        let first = wait(200);
        let second = wait(200);

        let started = tokio::time::Instant::now();
        let (a, b) = tokio::join!(
            Provider::save(&provider, &first, &cancel),
            Provider::save(&provider, &second, &cancel),
        );
        assert!(a.unwrap().is_success());
        assert!(b.unwrap().is_success());
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_is_interrupted_by_cancellation() {
        let provider = provider();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let err = Provider::save(&provider, &wait(60_000), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn assert_false_reports_structured_error() {
        let response = Provider::save(&provider(), &assertion("x", false), &CancellationToken::new())
            .await
            .unwrap();
        assert!(response.resource().is_none());
        let errors = response.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "AssertionFailed");
        assert_eq!(errors[0].message, "Assertion 'x' failed!");
        assert_eq!(errors[0].target, "");
    }

    #[tokio::test]
    async fn assert_true_succeeds() {
        let response = Provider::save(&provider(), &assertion("x", true), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.resource().unwrap().properties, json!({}));
        assert!(response.errors().is_empty());
    }

    #[tokio::test]
    async fn assert_preview_does_not_evaluate_condition() {
        let response =
            Provider::preview_save(&provider(), &assertion("x", false), &CancellationToken::new())
                .await
                .unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn bash_script_returns_output_as_data() {
        let runner = FakeRunner::new(0, "hi\n", "");
        let provider = UtilsProvider::with_runner(runner.clone());

        let response = Provider::save(&provider, &script("echo hi"), &CancellationToken::new())
            .await
            .unwrap();
        let data = response.resource().unwrap();
        assert_eq!(data.resource_type, "BashScript");
        assert_eq!(
            data.properties,
            json!({"exitCode": 0, "stdout": "hi\n", "stderr": ""})
        );
        assert_eq!(runner.scripts(), vec!["echo hi"]);
    }

    #[tokio::test]
    async fn bash_script_non_zero_exit_is_not_an_error() {
        let provider = UtilsProvider::with_runner(FakeRunner::new(3, "", "boom"));
        let response = Provider::save(&provider, &script("exit 3"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(response.errors().is_empty());
        let data = response.resource().unwrap();
        assert_eq!(data.properties["exitCode"], 3);
        assert_eq!(data.properties["stderr"], "boom");
    }

    #[tokio::test]
    async fn bash_script_preview_is_not_supported() {
        let runner = FakeRunner::new(0, "", "");
        let provider = UtilsProvider::with_runner(runner.clone());
        let err = Provider::preview_save(&provider, &script("rm -rf /tmp/x"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_not_supported());
        assert!(runner.scripts().is_empty());
    }

    #[tokio::test]
    async fn get_and_delete_are_not_supported() {
        let provider = provider();
        let cancel = CancellationToken::new();
        for request in [wait(1), assertion("x", true), script("true")] {
            let err = Provider::get(&provider, &request, &cancel).await.unwrap_err();
            assert!(err.is_not_supported());
            let err = Provider::delete(&provider, &request, &cancel).await.unwrap_err();
            assert!(err.is_not_supported());
        }
    }

    #[tokio::test]
    async fn unknown_type_is_not_supported() {
        let request = OperationRequest::new("Repository", json!({}));
        let err = Provider::save(&provider(), &request, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ProviderError::OperationNotSupported {
                provider,
                operation,
                resource_type,
            } => {
                assert_eq!(provider, "Utils");
                assert_eq!(operation, Operation::Save);
                assert_eq!(resource_type, "Repository");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_properties_are_invalid() {
        let request = OperationRequest::new(WAIT, json!({"duration": "soon"}));
        let err = Provider::save(&provider(), &request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidProperties { .. }));
    }
}
