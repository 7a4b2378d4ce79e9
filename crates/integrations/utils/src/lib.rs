//! Utility provider for local deployments.
//!
//! Implements the [`Provider`](localdeploy_provider::Provider) contract for
//! three resource types that need no cloud backend:
//!
//! | Type | PreviewSave | Save |
//! |---|---|---|
//! | `Wait` | no-op | sleeps for `durationMs` |
//! | `Assert` | no-op | fails with `AssertionFailed` when `condition` is false |
//! | `BashScript` | not supported | runs `script`, returns `{exitCode, stdout, stderr}` |
//!
//! ```rust,no_run
//! use localdeploy_provider::ProviderRegistry;
//! use localdeploy_utils::{UTILS_PROVIDER_NAME, UTILS_PROVIDER_VERSION, UtilsProvider};
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register(UTILS_PROVIDER_NAME, UTILS_PROVIDER_VERSION, UtilsProvider::new);
//! ```

pub mod error;
pub mod provider;
pub mod runner;
pub mod types;

pub use error::ScriptError;
pub use provider::{UTILS_PROVIDER_NAME, UTILS_PROVIDER_VERSION, UtilsProvider};
pub use runner::{ScriptOutput, ScriptRunner, ShellRunner};
pub use types::{AssertRequest, RunScriptRequest, RunScriptResponse, WaitRequest};
