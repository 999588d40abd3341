// # Platform API Trait
//
// Defines the remote boundary the resource handler talks to: the four SNS
// control-plane calls for platform applications.
//
// ## Implementations
//
// - AWS SNS: `snsapp-provider-aws` crate
// - Tests: recording doubles under `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use snsapp_core::PlatformApi;
// use std::collections::HashMap;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let api = /* PlatformApi implementation */;
//
//     let mut attributes = HashMap::new();
//     attributes.insert("PlatformCredential".to_string(), "key".to_string());
//
//     let arn = api.create_platform_application("app1", "GCM", attributes).await?;
//     let current = api.get_platform_application_attributes(&arn).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::ApiError;

/// Unordered remote attribute map; absence of a key means "not set"
pub type AttributeMap = HashMap<String, String>;

/// Trait for platform application API implementations
///
/// # Trust Level: Untrusted
///
/// Implementations are thin adapters over a remote service:
///
/// ## Allowed Capabilities
/// - ✅ One remote call per method invocation
/// - ✅ Translate service errors into [`ApiError`]
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off on their own (the caller owns retry policy)
/// - ❌ Cache attributes between calls
/// - ❌ Log attribute values (they may carry credentials)
///
/// Validation, attribute mapping and state handling belong to
/// [`ApplicationHandler`](crate::ApplicationHandler).
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Create a platform application
    ///
    /// # Parameters
    ///
    /// - `name`: Application name
    /// - `platform`: Push platform, e.g. "GCM"
    /// - `attributes`: Creation attributes (`PlatformCredential`, optionally
    ///   `PlatformPrincipal`)
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The ARN minted by the service
    /// - `Err(ApiError)`: If the call failed
    async fn create_platform_application(
        &self,
        name: &str,
        platform: &str,
        attributes: AttributeMap,
    ) -> Result<String, ApiError>;

    /// Fetch all attributes of a platform application
    ///
    /// The result may contain informational keys (e.g. `Enabled`) that have
    /// no local counterpart.
    async fn get_platform_application_attributes(&self, arn: &str)
    -> Result<AttributeMap, ApiError>;

    /// Set attributes of a platform application
    async fn set_platform_application_attributes(
        &self,
        arn: &str,
        attributes: AttributeMap,
    ) -> Result<(), ApiError>;

    /// Delete a platform application
    async fn delete_platform_application(&self, arn: &str) -> Result<(), ApiError>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing platform APIs from configuration
#[async_trait]
pub trait PlatformApiFactory: Send + Sync {
    /// Create a PlatformApi instance from configuration
    ///
    /// Async because SDK-backed implementations resolve credentials and
    /// region while building their client.
    async fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn PlatformApi>, crate::Error>;
}
