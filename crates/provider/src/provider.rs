use std::future::Future;

use async_trait::async_trait;
use localdeploy_core::{OperationRequest, OperationResponse};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ProviderError;

/// Outcome of a single provider operation.
///
/// `Ok` carries either resource data or structured errors; `Err` is a hard
/// fault that aborts processing of the resource.
pub type OperationResult = Result<OperationResponse, ProviderError>;

/// The four operations of the extensibility contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Save,
    PreviewSave,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [Self::Get, Self::Save, Self::PreviewSave, Self::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Save => "Save",
            Self::PreviewSave => "PreviewSave",
            Self::Delete => "Delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strongly-typed provider trait with native `async fn`.
///
/// Every operation defaults to raising
/// [`ProviderError::OperationNotSupported`], so a provider overrides only
/// the operations it implements. Within an implemented operation, unknown
/// resource types must raise the same fault (see
/// [`DispatchTable`](crate::DispatchTable)).
///
/// This trait is **not** object-safe. Registries store providers as
/// [`DynProvider`], which every `Provider` implements through a blanket
/// implementation.
pub trait Provider: Send + Sync {
    /// Returns the name of this provider, used in faults and logs.
    fn name(&self) -> &str;

    /// Read the current state of an existing resource.
    fn get(
        &self,
        request: &OperationRequest,
        _cancel: &CancellationToken,
    ) -> impl Future<Output = OperationResult> + Send {
        std::future::ready(Err(ProviderError::not_supported(
            self.name(),
            Operation::Get,
            &request.resource_type,
        )))
    }

    /// Create or update a resource, performing its side effect.
    fn save(
        &self,
        request: &OperationRequest,
        _cancel: &CancellationToken,
    ) -> impl Future<Output = OperationResult> + Send {
        std::future::ready(Err(ProviderError::not_supported(
            self.name(),
            Operation::Save,
            &request.resource_type,
        )))
    }

    /// Report the intended outcome of a save without committing it.
    fn preview_save(
        &self,
        request: &OperationRequest,
        _cancel: &CancellationToken,
    ) -> impl Future<Output = OperationResult> + Send {
        std::future::ready(Err(ProviderError::not_supported(
            self.name(),
            Operation::PreviewSave,
            &request.resource_type,
        )))
    }

    /// Delete a resource.
    fn delete(
        &self,
        request: &OperationRequest,
        _cancel: &CancellationToken,
    ) -> impl Future<Output = OperationResult> + Send {
        std::future::ready(Err(ProviderError::not_supported(
            self.name(),
            Operation::Delete,
            &request.resource_type,
        )))
    }
}

/// Object-safe provider trait for use behind `Arc<dyn DynProvider>`.
///
/// You generally should not implement this trait directly -- implement
/// [`Provider`] and rely on the blanket implementation. Direct
/// implementations get the same not-supported defaults.
#[async_trait]
pub trait DynProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, request: &OperationRequest, _cancel: &CancellationToken) -> OperationResult {
        Err(ProviderError::not_supported(
            self.name(),
            Operation::Get,
            &request.resource_type,
        ))
    }

    async fn save(
        &self,
        request: &OperationRequest,
        _cancel: &CancellationToken,
    ) -> OperationResult {
        Err(ProviderError::not_supported(
            self.name(),
            Operation::Save,
            &request.resource_type,
        ))
    }

    async fn preview_save(
        &self,
        request: &OperationRequest,
        _cancel: &CancellationToken,
    ) -> OperationResult {
        Err(ProviderError::not_supported(
            self.name(),
            Operation::PreviewSave,
            &request.resource_type,
        ))
    }

    async fn delete(
        &self,
        request: &OperationRequest,
        _cancel: &CancellationToken,
    ) -> OperationResult {
        Err(ProviderError::not_supported(
            self.name(),
            Operation::Delete,
            &request.resource_type,
        ))
    }

    /// Route `operation` to the matching method.
    async fn invoke(
        &self,
        operation: Operation,
        request: &OperationRequest,
        cancel: &CancellationToken,
    ) -> OperationResult {
        debug!(
            provider = self.name(),
            operation = operation.as_str(),
            resource_type = %request.resource_type,
            "invoking provider operation"
        );
        match operation {
            Operation::Get => self.get(request, cancel).await,
            Operation::Save => self.save(request, cancel).await,
            Operation::PreviewSave => self.preview_save(request, cancel).await,
            Operation::Delete => self.delete(request, cancel).await,
        }
    }
}

/// Blanket implementation: any type that implements [`Provider`] also
/// implements [`DynProvider`], bridging the static and dynamic dispatch worlds.
#[async_trait]
impl<T: Provider> DynProvider for T {
    fn name(&self) -> &str {
        Provider::name(self)
    }

    async fn get(&self, request: &OperationRequest, cancel: &CancellationToken) -> OperationResult {
        Provider::get(self, request, cancel).await
    }

    async fn save(&self, request: &OperationRequest, cancel: &CancellationToken) -> OperationResult {
        Provider::save(self, request, cancel).await
    }

    async fn preview_save(
        &self,
        request: &OperationRequest,
        cancel: &CancellationToken,
    ) -> OperationResult {
        Provider::preview_save(self, request, cancel).await
    }

    async fn delete(
        &self,
        request: &OperationRequest,
        cancel: &CancellationToken,
    ) -> OperationResult {
        Provider::delete(self, request, cancel).await
    }
}
