//! Configuration types for the SNS platform application resource
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::resource::ApplicationConfig;

/// Environment variable overriding the AWS region
pub const ENV_REGION: &str = "SNSAPP_REGION";

/// Environment variable overriding the AWS shared-config profile
pub const ENV_PROFILE: &str = "SNSAPP_PROFILE";

/// Environment variable overriding the SNS endpoint (e.g. LocalStack)
pub const ENV_ENDPOINT_URL: &str = "SNSAPP_ENDPOINT_URL";

/// A set of platform applications managed together
///
/// Stored as JSON on disk:
/// ```json
/// {
///   "provider": { "type": "aws", "region": "us-east-1" },
///   "applications": {
///     "android": {
///       "name": "app1",
///       "platform": "GCM",
///       "platform_credential": "AIza...",
///       "success_feedback_sample_rate": "100"
///     }
///   }
/// }
/// ```
///
/// Only deserialized: applications carry raw secrets that must never be
/// written back out.
#[derive(Debug, Clone, Deserialize)]
pub struct StackConfig {
    /// Platform API provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Applications to manage, keyed by a local label
    #[serde(default)]
    pub applications: BTreeMap<String, ApplicationConfig>,
}

impl StackConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            provider: ProviderConfig::default(),
            applications: BTreeMap::new(),
        }
    }

    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse a configuration from JSON text
    pub fn from_json(content: &str) -> Result<Self, crate::Error> {
        serde_json::from_str(content)
            .map_err(|e| crate::Error::config(format!("Invalid config: {}", e)))
    }

    /// Add an application under a label
    pub fn with_application(mut self, label: impl Into<String>, app: ApplicationConfig) -> Self {
        self.applications.insert(label.into(), app);
        self
    }

    /// Apply `SNSAPP_*` environment overrides to the provider configuration
    pub fn apply_env_overrides(&mut self) {
        self.provider.apply_overrides(
            std::env::var(ENV_REGION).ok(),
            std::env::var(ENV_PROFILE).ok(),
            std::env::var(ENV_ENDPOINT_URL).ok(),
        );
    }

    /// Validate the configuration
    ///
    /// Runs plan-time validation of every application, so a known-invalid
    /// configuration never reaches the remote service.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;

        for (label, app) in &self.applications {
            if label.is_empty() {
                return Err(crate::Error::config("Application label cannot be empty"));
            }
            app.validate()?;
        }

        Ok(())
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform API provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// AWS SNS via the official SDK
    Aws {
        /// Region override; SDK default chain when unset
        #[serde(default)]
        region: Option<String>,
        /// Shared-config profile name
        #[serde(default)]
        profile: Option<String>,
        /// Endpoint override (LocalStack, VPC endpoint)
        #[serde(default)]
        endpoint_url: Option<String>,
        /// Per-operation timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Aws {
                region,
                endpoint_url,
                timeout_secs,
                ..
            } => {
                if region.as_deref() == Some("") {
                    return Err(crate::Error::config("AWS region cannot be empty"));
                }
                if let Some(url) = endpoint_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "Endpoint URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("Operation timeout must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Aws { .. } => "aws",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }

    /// Override AWS settings; ignored for custom providers
    pub fn apply_overrides(
        &mut self,
        region_override: Option<String>,
        profile_override: Option<String>,
        endpoint_override: Option<String>,
    ) {
        if let ProviderConfig::Aws {
            region,
            profile,
            endpoint_url,
            ..
        } = self
        {
            if region_override.is_some() {
                *region = region_override;
            }
            if profile_override.is_some() {
                *profile = profile_override;
            }
            if endpoint_override.is_some() {
                *endpoint_url = endpoint_override;
            }
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Aws {
            region: None,
            profile: None,
            endpoint_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
