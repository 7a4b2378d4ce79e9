use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use localdeploy_core::ProviderKey;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::provider::DynProvider;

type ProviderFactory = Box<dyn Fn() -> Arc<dyn DynProvider> + Send + Sync>;

struct Registration {
    factory: ProviderFactory,
    instance: OnceLock<Arc<dyn DynProvider>>,
}

/// A registry that maps import keys to provider factories.
///
/// Instances are created lazily on first resolution and memoized, so every
/// resolution of a key yields the same instance for the lifetime of the
/// registry. Registration requires `&mut self`; resolution takes `&self` and
/// is safe from concurrent tasks once the registry is shared behind an `Arc`.
pub struct ProviderRegistry {
    registrations: HashMap<ProviderKey, Registration>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
        }
    }

    /// Register a factory for `(name, version)`.
    ///
    /// If the key is already registered, the new factory replaces the old one
    /// and any instance the old factory produced is discarded.
    pub fn register<F, P>(&mut self, name: impl Into<String>, version: impl Into<String>, factory: F)
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: DynProvider + 'static,
    {
        let key = ProviderKey::new(name, version);
        let factory: ProviderFactory = Box::new(move || Arc::new(factory()) as Arc<dyn DynProvider>);
        let registration = Registration {
            factory,
            instance: OnceLock::new(),
        };

        if self.registrations.insert(key.clone(), registration).is_some() {
            warn!(provider = %key, "provider registered twice, last registration wins");
        } else {
            debug!(provider = %key, "provider registered");
        }
    }

    /// Resolve the provider instance for `(name, version)`.
    pub fn resolve(&self, name: &str, version: &str) -> Result<Arc<dyn DynProvider>, ProviderError> {
        let key = ProviderKey::new(name, version);
        self.resolve_key(&key)
    }

    /// Resolve the provider instance for `key`.
    pub fn resolve_key(&self, key: &ProviderKey) -> Result<Arc<dyn DynProvider>, ProviderError> {
        let registration = self
            .registrations
            .get(key)
            .ok_or_else(|| ProviderError::NotFound(key.clone()))?;

        let instance = registration.instance.get_or_init(|| {
            debug!(provider = %key, "constructing provider instance");
            (registration.factory)()
        });
        Ok(Arc::clone(instance))
    }

    pub fn contains(&self, name: &str, version: &str) -> bool {
        self.registrations.contains_key(&ProviderKey::new(name, version))
    }

    /// Return a sorted list of all registered keys.
    pub fn keys(&self) -> Vec<&ProviderKey> {
        let mut keys: Vec<&ProviderKey> = self.registrations.keys().collect();
        keys.sort_unstable();
        keys
    }

    /// Return the number of registered providers.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Return `true` if no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
