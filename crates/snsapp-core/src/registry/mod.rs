//! Plugin-based platform API registry
//!
//! Backends register a [`PlatformApiFactory`] under a type name; the caller
//! then builds the API named by its [`ProviderConfig`] without hardcoding
//! which backends exist.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use snsapp_core::{ApiRegistry, ProviderConfig};
//!
//! let registry = ApiRegistry::new();
//! snsapp_provider_aws::register(&registry);
//!
//! let api = registry.create_api(&ProviderConfig::default()).await?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{PlatformApi, PlatformApiFactory};

/// Registry of platform API factories
///
/// Uses interior mutability so registration can happen through a shared
/// reference.
#[derive(Default)]
pub struct ApiRegistry {
    factories: RwLock<HashMap<String, Arc<dyn PlatformApiFactory>>>,
}

impl ApiRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a platform API factory
    ///
    /// Registering the same name twice replaces the earlier factory.
    pub fn register_api(&self, name: impl Into<String>, factory: Box<dyn PlatformApiFactory>) {
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        factories.insert(name.into(), Arc::from(factory));
    }

    /// Create a platform API from configuration
    ///
    /// # Errors
    ///
    /// `Error::Config` if no factory is registered under the provider's type
    /// name, or whatever the factory reports.
    pub async fn create_api(&self, config: &ProviderConfig) -> Result<Box<dyn PlatformApi>> {
        let api_type = config.type_name();

        // Release the lock before calling async create
        let factory = self
            .factory(api_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", api_type)))?;

        factory.create(config).await
    }

    /// List all registered provider types, sorted
    pub fn list_apis(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_api(&self, name: &str) -> bool {
        self.factory(name).is_some()
    }

    fn factory(&self, name: &str) -> Option<Arc<dyn PlatformApiFactory>> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories.get(name).cloned()
    }
}
