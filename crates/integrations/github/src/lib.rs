//! GitHub provider for local deployments.
//!
//! This crate implements the [`Provider`](localdeploy_provider::Provider)
//! trait for a single read-only resource type, `Repository`, whose `Get`
//! fetches repository metadata from the GitHub REST API. The access token is
//! read from the import configuration (`token`).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use localdeploy_github::{GITHUB_PROVIDER_NAME, GITHUB_PROVIDER_VERSION, GithubConfig, GithubProvider};
//! use localdeploy_provider::ProviderRegistry;
//!
//! let config = GithubConfig::new()
//!     .with_user_agent("my-tool")
//!     .with_timeout_secs(15);
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register(GITHUB_PROVIDER_NAME, GITHUB_PROVIDER_VERSION, move || {
//!     GithubProvider::with_config(config.clone())
//! });
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::GithubConfig;
pub use error::GithubError;
pub use provider::{GITHUB_PROVIDER_NAME, GITHUB_PROVIDER_VERSION, GithubProvider};
pub use types::RepositoryRequest;
