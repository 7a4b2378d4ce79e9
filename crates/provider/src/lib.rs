pub mod dispatch;
pub mod error;
pub mod provider;
pub mod registry;

pub use dispatch::{DispatchTable, Handler};
pub use error::ProviderError;
pub use provider::{DynProvider, Operation, OperationResult, Provider};
pub use registry::ProviderRegistry;

pub use tokio_util::sync::CancellationToken;
