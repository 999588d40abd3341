// # AWS SNS Platform API
//
// Implements `PlatformApi` over the official AWS SDK for SNS.
//
// ## Implementation Status
//
// - ✅ One SDK request per trait call
// - ✅ Service error code and message carried through to `ApiError`
// - ✅ Region, profile and endpoint overrides (LocalStack, VPC endpoints)
// - ✅ Per-operation timeout from configuration
// - ❌ NO retry logic beyond the SDK's standard retry policy
// - ❌ NO caching of attributes between calls
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - Credential and principal values NEVER appear in logs
// - Attribute maps are logged by key only
//
// ## API Reference
//
// - CreatePlatformApplication, GetPlatformApplicationAttributes,
//   SetPlatformApplicationAttributes, DeletePlatformApplication
// - https://docs.aws.amazon.com/sns/latest/api/API_Operations.html

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_sns::Client;
use aws_sdk_sns::config::Region;
use aws_sdk_sns::error::{DisplayErrorContext, ProvideErrorMetadata};
use snsapp_core::config::ProviderConfig;
use snsapp_core::error::ApiError;
use snsapp_core::registry::ApiRegistry;
use snsapp_core::traits::{AttributeMap, PlatformApi, PlatformApiFactory};
use snsapp_core::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Name this backend registers under
pub const PROVIDER_NAME: &str = "aws";

/// SNS-backed platform API
///
/// Holds nothing but the SDK client; every call is a single request.
#[derive(Clone)]
pub struct SnsPlatformApi {
    client: Client,
}

impl std::fmt::Debug for SnsPlatformApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnsPlatformApi")
            .field("region", &self.client.config().region())
            .finish()
    }
}

impl SnsPlatformApi {
    /// Wrap an already configured SDK client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the SDK default chain plus overrides
    pub async fn new(
        region: Option<String>,
        profile: Option<String>,
        endpoint_url: Option<String>,
        timeout: Duration,
    ) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(timeout)
                .build(),
        );
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;

        let sns_config = aws_sdk_sns::config::Builder::from(&shared_config).build();
        Self::from_client(Client::from_conf(sns_config))
    }
}

/// Convert an SDK failure into the service-neutral error type
///
/// Prefers the service's own code and message; falls back to the full error
/// chain for transport failures that carry no metadata.
fn api_error<E>(err: &E) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(err).to_string());

    match err.code() {
        Some(code) => ApiError::with_code(code, message),
        None => ApiError::new(message),
    }
}

fn attribute_keys(attributes: &AttributeMap) -> Vec<&str> {
    let mut keys: Vec<&str> = attributes.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

#[async_trait]
impl PlatformApi for SnsPlatformApi {
    async fn create_platform_application(
        &self,
        name: &str,
        platform: &str,
        attributes: AttributeMap,
    ) -> std::result::Result<String, ApiError> {
        debug!(
            "CreatePlatformApplication name={} platform={} keys={:?}",
            name,
            platform,
            attribute_keys(&attributes)
        );

        let output = self
            .client
            .create_platform_application()
            .name(name)
            .platform(platform)
            .set_attributes(Some(attributes))
            .send()
            .await
            .map_err(|e| api_error(&e))?;

        output
            .platform_application_arn()
            .map(str::to_string)
            .ok_or_else(|| ApiError::new("CreatePlatformApplication returned no PlatformApplicationArn"))
    }

    async fn get_platform_application_attributes(
        &self,
        arn: &str,
    ) -> std::result::Result<AttributeMap, ApiError> {
        debug!("GetPlatformApplicationAttributes arn={}", arn);

        let output = self
            .client
            .get_platform_application_attributes()
            .platform_application_arn(arn)
            .send()
            .await
            .map_err(|e| api_error(&e))?;

        Ok(output.attributes().cloned().unwrap_or_default())
    }

    async fn set_platform_application_attributes(
        &self,
        arn: &str,
        attributes: AttributeMap,
    ) -> std::result::Result<(), ApiError> {
        debug!(
            "SetPlatformApplicationAttributes arn={} keys={:?}",
            arn,
            attribute_keys(&attributes)
        );

        self.client
            .set_platform_application_attributes()
            .platform_application_arn(arn)
            .set_attributes(Some(attributes))
            .send()
            .await
            .map_err(|e| api_error(&e))?;

        Ok(())
    }

    async fn delete_platform_application(&self, arn: &str) -> std::result::Result<(), ApiError> {
        debug!("DeletePlatformApplication arn={}", arn);

        self.client
            .delete_platform_application()
            .platform_application_arn(arn)
            .send()
            .await
            .map_err(|e| api_error(&e))?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for the SNS platform API
pub struct AwsApiFactory;

#[async_trait]
impl PlatformApiFactory for AwsApiFactory {
    async fn create(&self, config: &ProviderConfig) -> Result<Box<dyn PlatformApi>> {
        match config {
            ProviderConfig::Aws {
                region,
                profile,
                endpoint_url,
                timeout_secs,
            } => {
                config.validate()?;
                let api = SnsPlatformApi::new(
                    region.clone(),
                    profile.clone(),
                    endpoint_url.clone(),
                    Duration::from_secs(*timeout_secs),
                )
                .await;
                Ok(Box::new(api))
            }
            other => Err(Error::config(format!(
                "AWS factory cannot build provider type: {}",
                other.type_name()
            ))),
        }
    }
}

/// Register the AWS backend under [`PROVIDER_NAME`]
pub fn register(registry: &ApiRegistry) {
    registry.register_api(PROVIDER_NAME, Box::new(AwsApiFactory));
}
