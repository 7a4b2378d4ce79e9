//! Local deployment of compiled templates.
//!
//! This crate sits at the boundary between a caller holding compiled
//! template and parameters documents and the providers that carry out each
//! resource operation:
//!
//! - [`Orchestrator`] is the engine contract: run a template against a
//!   [`ProviderRegistry`](localdeploy_provider::ProviderRegistry) and return a
//!   raw [`DeploymentResult`](localdeploy_core::DeploymentResult).
//! - [`SequentialOrchestrator`] is a small in-process engine that runs
//!   resources in declaration order.
//! - [`build_report`] maps a raw result into the caller-facing
//!   [`Report`](localdeploy_core::Report).
//! - [`LocalDeployHandler`] ties them together for one request.
//!
//! # Example
//!
//! ```rust,no_run
//! use localdeploy_deploy::{DeployConfig, LocalDeployHandler, LocalDeployRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), localdeploy_deploy::DeployError> {
//! let handler = LocalDeployHandler::new(DeployConfig::default());
//! let request = LocalDeployRequest::new("main.json").with_parameters("main.parameters.json");
//! let report = handler.handle(&request, CancellationToken::new()).await?;
//! println!("{}", report.deployment.provisioning_state);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod sequential;
pub mod template;

pub use config::DeployConfig;
pub use error::{ConfigError, DeployError, EnvelopeError};
pub use handler::{LocalDeployHandler, LocalDeployRequest};
pub use orchestrator::Orchestrator;
pub use registry::default_registry;
pub use report::{build_report, extract_error, extract_operation_error};
pub use sequential::SequentialOrchestrator;
pub use template::{Parameters, ParametersFile, Template};
