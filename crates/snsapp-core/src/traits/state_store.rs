// # State Store Trait
//
// Defines the interface for persisting resource state snapshots between
// invocations.
//
// ## Purpose
//
// The handler itself keeps nothing between calls. Whatever drives it
// (the `snsappctl` binary, an embedding tool) hands it the prior snapshot
// and stores the one it returns. Snapshots are keyed by a caller-chosen
// resource label.
//
// ## Implementations
//
// - In-memory: `MemoryStateStore`
// - File-based: `FileStateStore` (JSON, atomic writes, backup recovery)

use async_trait::async_trait;

use crate::resource::ApplicationState;

/// Stored snapshot plus bookkeeping
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateRecord {
    /// The snapshot returned by the last successful operation
    pub state: ApplicationState,
    /// When the snapshot was written
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl StateRecord {
    /// Wrap a snapshot, stamped with the current time
    pub fn new(state: ApplicationState) -> Self {
        Self {
            state,
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Trait for state store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Cache state in memory (with explicit flush)
///
/// ## Forbidden Capabilities
/// - ❌ Call the remote platform API
/// - ❌ Store raw secrets (snapshots only carry hashes)
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the stored record for a resource
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StateRecord))`: The stored record
    /// - `Ok(None)`: No record found
    /// - `Err(Error)`: Storage error
    async fn get(&self, label: &str) -> Result<Option<StateRecord>, crate::Error>;

    /// Store a snapshot, replacing any previous record
    async fn put(&self, label: &str, state: &ApplicationState) -> Result<(), crate::Error>;

    /// Remove a resource's record
    ///
    /// Removing a missing record is not an error.
    async fn remove(&self, label: &str) -> Result<(), crate::Error>;

    /// List all stored resource labels, sorted
    async fn list(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

