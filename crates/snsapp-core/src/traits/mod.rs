//! Core traits for the SNS platform application resource
//!
//! This module defines the abstract interfaces that implementations must follow.
//!
//! - [`PlatformApi`]: Remote SNS platform application calls
//! - [`StateStore`]: Persistence of resource state snapshots

pub mod platform_api;
pub mod state_store;

pub use platform_api::{AttributeMap, PlatformApi, PlatformApiFactory};
pub use state_store::{StateRecord, StateStore};
