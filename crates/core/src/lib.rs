pub mod deployment;
pub mod envelope;
pub mod key;
pub mod report;

pub use deployment::{DeploymentOutput, DeploymentResult, OperationRecord, ProvisioningState};
pub use envelope::{
    OperationError, OperationErrors, OperationRequest, OperationResponse, ResourceData,
};
pub use key::ProviderKey;
pub use report::{DeploymentReport, OperationReport, Report};
