use serde::{Deserialize, Serialize};

/// Properties of a `Repository` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRequest {
    pub owner: String,
    pub name: String,
}

impl RepositoryRequest {
    /// The `owner/name` form used as the error target.
    pub fn target(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}
