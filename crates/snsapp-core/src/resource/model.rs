//! Desired configuration and persisted state of a platform application

use serde::{Deserialize, Serialize};

use super::validate::{hash_content, validate};
use crate::error::{Error, Result};

/// Optional delivery-feedback attributes
///
/// Every field is passed through to the service under the remote name given
/// by [`ATTRIBUTE_NAME_MAP`](super::schema::ATTRIBUTE_NAME_MAP).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackAttributes {
    /// Topic notified when delivery to an endpoint fails permanently
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_delivery_failure_topic_arn: Option<String>,

    /// Topic notified when an endpoint is added
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_endpoint_created_topic_arn: Option<String>,

    /// Topic notified when an endpoint is deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_endpoint_deleted_topic_arn: Option<String>,

    /// Topic notified when an endpoint is changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_endpoint_updated_topic_arn: Option<String>,

    /// IAM role used to log failed deliveries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_feedback_role_arn: Option<String>,

    /// IAM role used to log successful deliveries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_feedback_role_arn: Option<String>,

    /// Percentage of successful deliveries to log, "0" to "100"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_feedback_sample_rate: Option<String>,
}

impl FeedbackAttributes {
    /// Read a field by its local name
    ///
    /// Returns `None` when `name` is not a field of this struct.
    pub fn field(&self, name: &str) -> Option<Option<&str>> {
        let slot = match name {
            "event_delivery_failure_topic_arn" => &self.event_delivery_failure_topic_arn,
            "event_endpoint_created_topic_arn" => &self.event_endpoint_created_topic_arn,
            "event_endpoint_deleted_topic_arn" => &self.event_endpoint_deleted_topic_arn,
            "event_endpoint_updated_topic_arn" => &self.event_endpoint_updated_topic_arn,
            "failure_feedback_role_arn" => &self.failure_feedback_role_arn,
            "success_feedback_role_arn" => &self.success_feedback_role_arn,
            "success_feedback_sample_rate" => &self.success_feedback_sample_rate,
            _ => return None,
        };
        Some(slot.as_deref())
    }

    /// Mutable access to a field by its local name
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "event_delivery_failure_topic_arn" => Some(&mut self.event_delivery_failure_topic_arn),
            "event_endpoint_created_topic_arn" => Some(&mut self.event_endpoint_created_topic_arn),
            "event_endpoint_deleted_topic_arn" => Some(&mut self.event_endpoint_deleted_topic_arn),
            "event_endpoint_updated_topic_arn" => Some(&mut self.event_endpoint_updated_topic_arn),
            "failure_feedback_role_arn" => Some(&mut self.failure_feedback_role_arn),
            "success_feedback_role_arn" => Some(&mut self.success_feedback_role_arn),
            "success_feedback_sample_rate" => Some(&mut self.success_feedback_sample_rate),
            _ => None,
        }
    }

    /// Set a field by its local name, returning false for unknown names
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.field_mut(name) {
            Some(slot) => {
                *slot = Some(value.into());
                true
            }
            None => false,
        }
    }
}

/// Desired configuration of a platform application, as supplied by the caller
///
/// `name` and `platform` are immutable after creation. The secrets are held
/// in memory only long enough to be sent; state keeps their hashes.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,

    /// Push platform, e.g. "APNS", "APNS_SANDBOX", "GCM", "ADM", "BAIDU"
    pub platform: String,

    /// Platform credential (API key, private key, client secret)
    /// ⚠️ NEVER log this value
    pub platform_credential: String,

    /// Platform principal (certificate, client ID); required for APNS
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub platform_principal: Option<String>,

    /// Feedback routing attributes
    #[serde(flatten)]
    pub attributes: FeedbackAttributes,
}

// Custom Debug implementation that hides the secrets
impl std::fmt::Debug for ApplicationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationConfig")
            .field("name", &self.name)
            .field("platform", &self.platform)
            .field("platform_credential", &"<REDACTED>")
            .field(
                "platform_principal",
                &self.platform_principal.as_ref().map(|_| "<REDACTED>"),
            )
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl ApplicationConfig {
    /// Create a configuration with no principal and no feedback attributes
    pub fn new(
        name: impl Into<String>,
        platform: impl Into<String>,
        platform_credential: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            platform: platform.into(),
            platform_credential: platform_credential.into(),
            platform_principal: None,
            attributes: FeedbackAttributes::default(),
        }
    }

    /// Set the platform principal
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.platform_principal = Some(principal.into());
        self
    }

    /// Set a feedback attribute by its local name
    ///
    /// Unknown names are ignored.
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        if !self.attributes.set(name, value) {
            tracing::warn!("Ignoring unknown platform application attribute: {}", name);
        }
        self
    }

    /// Plan-time validation
    ///
    /// Checks the required fields and the principal rule. Runs before any
    /// remote mutation.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config("name cannot be empty"));
        }
        if self.platform.is_empty() {
            return Err(Error::config("platform cannot be empty"));
        }
        if self.platform_credential.is_empty() {
            return Err(Error::config("platform_credential cannot be empty"));
        }
        validate(&self.platform, self.platform_principal.as_deref())
    }

    /// Hash of the configured credential, as it is kept in state
    pub fn credential_hash(&self) -> String {
        hash_content(&self.platform_credential)
    }

    /// Hash of the configured principal, as it is kept in state
    ///
    /// An empty principal counts as unset.
    pub fn principal_hash(&self) -> Option<String> {
        self.principal().map(hash_content)
    }

    /// The configured principal, if set and non-empty
    pub fn principal(&self) -> Option<&str> {
        self.platform_principal
            .as_deref()
            .filter(|p| !p.is_empty())
    }

    /// Whether applying this configuration over `prior` needs delete + create
    ///
    /// `name` and `platform` cannot be changed in place.
    pub fn requires_replacement(&self, prior: &ApplicationState) -> bool {
        self.name != prior.name || self.platform != prior.platform
    }
}

/// Persisted snapshot of a platform application
///
/// `name` and `platform` are never stored independently of `id`: every read
/// re-derives them from the identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationState {
    /// Identifier minted by the service
    pub id: String,

    /// Computed; equals `id`
    pub arn: String,

    /// Application name, derived from `id`
    pub name: String,

    /// Push platform, derived from `id`
    pub platform: String,

    /// SHA-256 of the credential; `None` when unknown (e.g. after import)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_credential: Option<String>,

    /// SHA-256 of the principal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_principal: Option<String>,

    /// Feedback routing attributes as last seen
    #[serde(flatten)]
    pub attributes: FeedbackAttributes,
}

impl ApplicationState {
    /// A snapshot that knows nothing but the identifier
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Record the secret hashes of `config`
    pub fn with_secrets_from(mut self, config: &ApplicationConfig) -> Self {
        self.platform_credential = Some(config.credential_hash());
        self.platform_principal = config.principal_hash();
        self
    }
}
