//! Validation seam for TTS model ids

use dashmap::DashSet;

/// Answers whether a TTS model id is known to the platform.
///
/// The model registry lives outside this crate. Writes are checked through
/// this seam before they touch the store, so a stale client cannot attach
/// a timbre to a model that no longer exists.
pub trait ModelCatalog: Send + Sync {
    fn contains(&self, model_id: &str) -> bool;
}

/// Accepts every model id, the default when no registry is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveCatalog;

impl ModelCatalog for PermissiveCatalog {
    fn contains(&self, _model_id: &str) -> bool {
        true
    }
}

/// In-process registry backed by a concurrent set.
///
/// Registration can happen while lookups are in flight, matching how model
/// onboarding runs next to catalog traffic.
#[derive(Debug, Default)]
pub struct RegistryCatalog {
    models: DashSet<String>,
}

impl RegistryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry from an iterator of model ids.
    pub fn with_models<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for model in models {
            registry.models.insert(model.into());
        }
        registry
    }

    pub fn register(&self, model_id: impl Into<String>) {
        self.models.insert(model_id.into());
    }

    /// Remove a model id, reporting whether it was present.
    pub fn deregister(&self, model_id: &str) -> bool {
        self.models.remove(model_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelCatalog for RegistryCatalog {
    fn contains(&self, model_id: &str) -> bool {
        self.models.contains(model_id)
    }
}
