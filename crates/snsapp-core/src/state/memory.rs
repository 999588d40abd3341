// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Keeps snapshots for the lifetime of the process only. Useful for tests
// and for embedding the handler in a tool that persists state itself.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::resource::ApplicationState;
use crate::traits::state_store::{StateRecord, StateStore};

/// In-memory state store implementation
///
/// # Example
///
/// ```rust,no_run
/// use snsapp_core::state::MemoryStateStore;
/// use snsapp_core::traits::StateStore;
/// use snsapp_core::ApplicationState;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///
///     let state = ApplicationState::from_id("arn:aws:sns:us-east-1:123456789012:app/GCM/app1");
///     store.put("android", &state).await?;
///
///     let record = store.get("android").await?;
///     assert_eq!(record.map(|r| r.state), Some(state));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<HashMap<String, StateRecord>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, label: &str) -> Result<Option<StateRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(label).cloned())
    }

    async fn put(&self, label: &str, state: &ApplicationState) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(label.to_string(), StateRecord::new(state.clone()));
        Ok(())
    }

    async fn remove(&self, label: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(label);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        let mut labels: Vec<String> = guard.keys().cloned().collect();
        labels.sort();
        Ok(labels)
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}
