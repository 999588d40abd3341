//! The platform application resource
//!
//! - [`schema`]: field names and the local ↔ remote attribute table
//! - [`model`]: desired configuration and persisted state
//! - [`validate`]: plan-time validation and secret hashing
//! - [`handler`]: Create / Read / Update / Delete against a [`PlatformApi`](crate::PlatformApi)

pub mod handler;
pub mod model;
pub mod schema;
pub mod validate;

pub use handler::ApplicationHandler;
pub use model::{ApplicationConfig, ApplicationState, FeedbackAttributes};
pub use validate::{hash_content, validate};
