use localdeploy_core::OperationError;
use thiserror::Error;

/// Errors from a GitHub API call.
///
/// These never escape the provider as faults: they are converted into a
/// structured [`OperationError`] addressed at the repository.
#[derive(Debug, Error)]
pub enum GithubError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// An HTTP-level transport error occurred.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status. `message` is the API's
    /// own error message when it sent one.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The owner or repository name cannot form a request path.
    #[error("invalid repository: {0}")]
    InvalidRepository(String),

    /// The response body was not valid JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl GithubError {
    /// Convert into the structured error reported for the resource.
    pub fn into_operation_error(self, resource_type: &str, target: impl Into<String>) -> OperationError {
        OperationError::new(resource_type, self.to_string(), target)
    }
}
