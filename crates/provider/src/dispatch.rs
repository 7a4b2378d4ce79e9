use std::collections::HashMap;

use futures::future::BoxFuture;
use localdeploy_core::OperationRequest;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{Operation, OperationResult, Provider};

/// A resource-type handler for one operation of provider `P`.
pub type Handler<P> = for<'a> fn(
    &'a P,
    &'a OperationRequest,
    &'a CancellationToken,
) -> BoxFuture<'a, OperationResult>;

/// Maps provider-scoped resource type names to handlers for one operation.
///
/// Lookup is an exact string match evaluated at call time. Types without an
/// entry raise [`ProviderError::OperationNotSupported`].
pub struct DispatchTable<P> {
    operation: Operation,
    handlers: HashMap<&'static str, Handler<P>>,
}

impl<P: Provider> DispatchTable<P> {
    /// Create an empty table for `operation`.
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for `resource_type`, replacing any previous one.
    #[must_use]
    pub fn on(mut self, resource_type: &'static str, handler: Handler<P>) -> Self {
        self.handlers.insert(resource_type, handler);
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn supports(&self, resource_type: &str) -> bool {
        self.handlers.contains_key(resource_type)
    }

    /// Return a sorted list of the resource types this table handles.
    pub fn resource_types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Run the handler registered for the request's resource type.
    pub async fn dispatch(
        &self,
        provider: &P,
        request: &OperationRequest,
        cancel: &CancellationToken,
    ) -> OperationResult {
        let Some(handler) = self.handlers.get(request.resource_type.as_str()) else {
            debug!(
                provider = provider.name(),
                operation = self.operation.as_str(),
                resource_type = %request.resource_type,
                "no handler for resource type"
            );
            return Err(ProviderError::not_supported(
                provider.name(),
                self.operation,
                &request.resource_type,
            ));
        };
        handler(provider, request, cancel).await
    }
}

impl<P> std::fmt::Debug for DispatchTable<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&&str> = self.handlers.keys().collect();
        types.sort_unstable();
        f.debug_struct("DispatchTable")
            .field("operation", &self.operation)
            .field("resource_types", &types)
            .finish()
    }
}
