use serde::{Deserialize, Serialize};

/// Identifies a registered provider factory: the `(name, version)` pair a
/// template's import declaration names.
///
/// Matching is exact and case-sensitive on both components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderKey {
    pub name: String,
    pub version: String,
}

impl ProviderKey {
    /// Create a new provider key.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
