// # snsapp-core
//
// Core library for managing SNS platform applications as declarative
// resources.
//
// ## Architecture Overview
//
// - **ApplicationHandler**: Create / Read / Update / Delete for one platform
//   application, plus plan-time validation
// - **PlatformApi**: Trait for the remote SNS platform application calls
// - **StateStore**: Trait for persisting resource state snapshots
// - **ApiRegistry**: Plugin-based registry of platform API factories
//
// ## Design Principles
//
// 1. **Identifier is the source of truth**: name and platform are parsed out
//    of the ARN on every read, never stored on their own
// 2. **Secrets are hashed**: state keeps SHA-256 digests, raw values are only
//    sent to the service
// 3. **Validate before mutating**: an invalid configuration never reaches
//    the remote side
// 4. **No hidden policy**: no retries, caching or background work; every
//    failure is returned to the caller

pub mod arn;
pub mod config;
pub mod error;
pub mod registry;
pub mod resource;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use arn::{Arn, PlatformApplicationArn};
pub use config::{ProviderConfig, StackConfig};
pub use error::{ApiError, Error, Result};
pub use registry::ApiRegistry;
pub use resource::{
    ApplicationConfig, ApplicationHandler, ApplicationState, FeedbackAttributes, hash_content,
    validate,
};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{AttributeMap, PlatformApi, PlatformApiFactory, StateStore};
