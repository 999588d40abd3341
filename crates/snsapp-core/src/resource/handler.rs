//! Resource handler for SNS platform applications
//!
//! The handler turns desired configuration plus a prior snapshot into remote
//! calls and a new snapshot:
//!
//! ```text
//!  create ──▶ CreatePlatformApplication ──▶ update ──▶ read
//!  update ──▶ SetPlatformApplicationAttributes ──▶ read
//!  read   ──▶ parse ARN ──▶ GetPlatformApplicationAttributes
//!  delete ──▶ DeletePlatformApplication
//! ```
//!
//! ## Contract
//!
//! - Validation runs before any remote mutation
//! - At most one mutating call per operation
//! - No retries, no timeouts, no suppression: every failure is returned
//! - Name and platform are always re-derived from the identifier
//! - Secrets are only ever sent, never stored; snapshots keep their hashes

use tracing::{debug, info};

use super::model::{ApplicationConfig, ApplicationState};
use super::schema::{self, ATTRIBUTE_NAME_MAP, PLATFORM_CREDENTIAL, PLATFORM_PRINCIPAL};
use crate::arn::PlatformApplicationArn;
use crate::error::{Error, Result};
use crate::traits::{AttributeMap, PlatformApi};

/// Create / Read / Update / Delete for one platform application at a time
pub struct ApplicationHandler {
    api: Box<dyn PlatformApi>,
}

impl std::fmt::Debug for ApplicationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationHandler")
            .field("api", &self.api.provider_name())
            .finish()
    }
}

impl ApplicationHandler {
    /// Create a handler over a platform API implementation
    pub fn new(api: Box<dyn PlatformApi>) -> Self {
        Self { api }
    }

    /// Create the application and apply any feedback attributes
    ///
    /// The creation call only accepts the credential and principal, so the
    /// rest is applied by delegating to [`update`](Self::update) against a
    /// snapshot that knows nothing but the new identifier.
    ///
    /// # Errors
    ///
    /// - Validation errors, before any remote call
    /// - `Error::Create` if the creation call fails
    /// - `Error::Created` if the follow-up update or read fails; it carries
    ///   the snapshot of the application that now exists remotely
    pub async fn create(&self, config: &ApplicationConfig) -> Result<ApplicationState> {
        config.validate()?;

        let mut attributes = AttributeMap::new();
        attributes.insert(
            PLATFORM_CREDENTIAL.to_string(),
            config.platform_credential.clone(),
        );
        if let Some(principal) = config.principal() {
            attributes.insert(PLATFORM_PRINCIPAL.to_string(), principal.to_string());
        }

        info!(
            "Creating SNS platform application: {} (platform: {}) [api: {}]",
            config.name,
            config.platform,
            self.api.provider_name()
        );

        let id = self
            .api
            .create_platform_application(&config.name, &config.platform, attributes)
            .await
            .map_err(Error::Create)?;

        info!("Created SNS platform application: {}", id);

        let created = Self::created_state(id);
        self.update(config, &created)
            .await
            .map_err(|source| Error::Created {
                state: Box::new(created),
                source: Box::new(source),
            })
    }

    /// Snapshot of a freshly created application: identifier plus whatever
    /// the identifier itself tells us
    fn created_state(id: String) -> ApplicationState {
        let mut state = ApplicationState::from_id(id);
        if let Ok(arn) = PlatformApplicationArn::parse(&state.id) {
            state.arn = state.id.clone();
            state.name = arn.name().to_string();
            state.platform = arn.platform().to_string();
        }
        state
    }

    /// Apply changed attributes, then refresh from the service
    ///
    /// `prior` is only borrowed: if the remote call fails, the caller still
    /// holds the snapshot that was in effect.
    ///
    /// # Errors
    ///
    /// - Validation errors, before any remote call
    /// - `Error::Update` if the attribute update fails
    /// - `Error::MalformedIdentifier` / `Error::Fetch` from the refresh
    pub async fn update(
        &self,
        config: &ApplicationConfig,
        prior: &ApplicationState,
    ) -> Result<ApplicationState> {
        config.validate()?;

        let attributes = Self::changed_attributes(config, prior);

        if attributes.is_empty() {
            debug!("No attribute changes for {}", prior.id);
        } else {
            info!(
                "Updating SNS platform application {}: {} attribute(s)",
                prior.id,
                attributes.len()
            );
            self.api
                .set_platform_application_attributes(&prior.id, attributes)
                .await
                .map_err(Error::Update)?;
        }

        // Start from what was just applied; the service omits cleared
        // attributes, so the prior values must not survive the refresh.
        let applied = ApplicationState {
            attributes: config.attributes.clone(),
            ..prior.clone()
        };
        let refreshed = self.refresh(applied).await?;
        Ok(refreshed.with_secrets_from(config))
    }

    /// Build the attribute-update request for `config` over `prior`
    ///
    /// - Every mapped feedback attribute whose value differs is included under
    ///   its remote name; an unset value is sent empty, which clears it.
    /// - A changed credential is always included, together with the
    ///   configured principal (if any) whether or not the principal changed:
    ///   the service wants both in one request, and the stored hash cannot tell
    ///   us what the remote side currently holds.
    /// - A changed principal is included on its own as well.
    pub fn changed_attributes(config: &ApplicationConfig, prior: &ApplicationState) -> AttributeMap {
        let mut attributes = AttributeMap::new();

        for (local, remote) in ATTRIBUTE_NAME_MAP {
            let new = config.attributes.field(local).flatten();
            let old = prior.attributes.field(local).flatten();
            if new != old {
                debug!("Updating {}", remote);
                attributes.insert(remote.to_string(), new.unwrap_or_default().to_string());
            }
        }

        if prior.platform_credential.as_deref() != Some(config.credential_hash().as_str()) {
            debug!("Updating {}", PLATFORM_CREDENTIAL);
            attributes.insert(
                PLATFORM_CREDENTIAL.to_string(),
                config.platform_credential.clone(),
            );
            if let Some(principal) = config.principal() {
                attributes.insert(PLATFORM_PRINCIPAL.to_string(), principal.to_string());
            }
        }

        if prior.platform_principal != config.principal_hash() {
            debug!("Updating {}", PLATFORM_PRINCIPAL);
            attributes.insert(
                PLATFORM_PRINCIPAL.to_string(),
                config.principal().unwrap_or_default().to_string(),
            );
        }

        attributes
    }

    /// Read the live state of an application from its identifier alone
    ///
    /// Secret hashes are unknown to the service and come back unset.
    ///
    /// # Errors
    ///
    /// - `Error::MalformedIdentifier` if `identifier` is not
    ///   `arn:PARTITION:sns:REGION:ACCOUNTID:app/PLATFORM/NAME`
    /// - `Error::Fetch` if the attribute fetch fails
    pub async fn read(&self, identifier: &str) -> Result<ApplicationState> {
        self.refresh(ApplicationState::from_id(identifier)).await
    }

    /// Adopt an existing application into state
    pub async fn import(&self, identifier: &str) -> Result<ApplicationState> {
        info!("Importing SNS platform application: {}", identifier);
        self.read(identifier).await
    }

    /// Refresh a snapshot from the service
    ///
    /// Name and platform are re-derived from `state.id`. Mapped attributes
    /// present remotely overwrite local values; everything else in `state`
    /// (secret hashes, attributes the service did not return) is kept.
    pub async fn refresh(&self, mut state: ApplicationState) -> Result<ApplicationState> {
        let arn = PlatformApplicationArn::parse(&state.id)?;

        state.arn = arn.to_string();
        state.name = arn.name().to_string();
        state.platform = arn.platform().to_string();

        let remote = self
            .api
            .get_platform_application_attributes(&state.arn)
            .await
            .map_err(Error::Fetch)?;

        for (remote_key, value) in &remote {
            // The service also reports stateful properties (subscription
            // counts, ownership, certificate expiry); only declared optional
            // fields are copied.
            let Some(local) = schema::local_name(remote_key) else {
                continue;
            };
            if !schema::is_optional_field(local) {
                continue;
            }
            debug!("Updating {} => {}", local, remote_key);

            if let Some(slot) = state.attributes.field_mut(local) {
                *slot = Some(value.clone());
            }
        }

        Ok(state)
    }

    /// Delete the application
    ///
    /// # Errors
    ///
    /// `Error::Delete` with the remote error, including when the application
    /// is already gone.
    pub async fn delete(&self, identifier: &str) -> Result<()> {
        info!("Deleting SNS platform application: {}", identifier);
        self.api
            .delete_platform_application(identifier)
            .await
            .map_err(Error::Delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::hash_content;

    fn prior_for(config: &ApplicationConfig) -> ApplicationState {
        let mut prior = ApplicationState::from_id("arn:aws:sns:us-east-1:123456789012:app/GCM/app1")
            .with_secrets_from(config);
        prior.attributes = config.attributes.clone();
        prior
    }

    #[test]
    fn test_unchanged_config_builds_empty_request() {
        let config = ApplicationConfig::new("app1", "GCM", "cred")
            .with_attribute("success_feedback_sample_rate", "50");
        let prior = prior_for(&config);

        assert!(ApplicationHandler::changed_attributes(&config, &prior).is_empty());
    }

    #[test]
    fn test_sample_rate_change_only() {
        let before = ApplicationConfig::new("app1", "GCM", "cred")
            .with_attribute("success_feedback_sample_rate", "50");
        let prior = prior_for(&before);
        let after = before.clone().with_attribute("success_feedback_sample_rate", "100");

        let request = ApplicationHandler::changed_attributes(&after, &prior);

        let expected: AttributeMap =
            [("SuccessFeedbackSampleRate".to_string(), "100".to_string())].into();
        assert_eq!(request, expected);
    }

    #[test]
    fn test_removed_attribute_is_cleared() {
        let before = ApplicationConfig::new("app1", "GCM", "cred")
            .with_attribute("failure_feedback_role_arn", "arn:aws:iam::123456789012:role/f");
        let prior = prior_for(&before);
        let mut after = before.clone();
        after.attributes.failure_feedback_role_arn = None;

        let request = ApplicationHandler::changed_attributes(&after, &prior);
        assert_eq!(request.get("FailureFeedbackRoleArn").map(String::as_str), Some(""));
        assert_eq!(request.len(), 1);
    }

    #[test]
    fn test_credential_change_resends_unchanged_principal() {
        let before = ApplicationConfig::new("app1", "APNS", "old-key").with_principal("cert");
        let prior = prior_for(&before);
        let mut after = before.clone();
        after.platform_credential = "new-key".to_string();

        let request = ApplicationHandler::changed_attributes(&after, &prior);
        assert_eq!(request.get(PLATFORM_CREDENTIAL).map(String::as_str), Some("new-key"));
        assert_eq!(request.get(PLATFORM_PRINCIPAL).map(String::as_str), Some("cert"));
        assert_eq!(request.len(), 2);
    }

    #[test]
    fn test_credential_change_without_principal() {
        let before = ApplicationConfig::new("app1", "GCM", "old-key");
        let prior = prior_for(&before);
        let mut after = before.clone();
        after.platform_credential = "new-key".to_string();

        let request = ApplicationHandler::changed_attributes(&after, &prior);
        assert_eq!(request.get(PLATFORM_CREDENTIAL).map(String::as_str), Some("new-key"));
        assert!(!request.contains_key(PLATFORM_PRINCIPAL));
    }

    #[test]
    fn test_principal_change_alone_is_sent() {
        let before = ApplicationConfig::new("app1", "APNS", "key").with_principal("old-cert");
        let prior = prior_for(&before);
        let after = before.clone().with_principal("new-cert");

        let request = ApplicationHandler::changed_attributes(&after, &prior);
        assert_eq!(request.get(PLATFORM_PRINCIPAL).map(String::as_str), Some("new-cert"));
        assert!(!request.contains_key(PLATFORM_CREDENTIAL));
    }

    #[test]
    fn test_empty_principal_is_never_sent() {
        let config = ApplicationConfig::new("app1", "GCM", "key").with_principal("");
        let prior = ApplicationState::from_id("arn:aws:sns:us-east-1:123456789012:app/GCM/app1");

        let request = ApplicationHandler::changed_attributes(&config, &prior);
        assert_eq!(request.get(PLATFORM_CREDENTIAL).map(String::as_str), Some("key"));
        assert!(!request.contains_key(PLATFORM_PRINCIPAL));

        // Empty and absent are the same desired state
        let prior = prior_for(&ApplicationConfig::new("app1", "GCM", "key"));
        assert!(ApplicationHandler::changed_attributes(&config, &prior).is_empty());
    }

    #[test]
    fn test_removed_principal_is_cleared() {
        let before = ApplicationConfig::new("app1", "GCM", "key").with_principal("client-id");
        let prior = prior_for(&before);
        let mut after = before.clone();
        after.platform_principal = None;

        let request = ApplicationHandler::changed_attributes(&after, &prior);
        assert_eq!(request.get(PLATFORM_PRINCIPAL).map(String::as_str), Some(""));
        assert_eq!(request.len(), 1);
    }

    #[test]
    fn test_created_state_derives_identity() {
        let state = ApplicationHandler::created_state(
            "arn:aws:sns:us-east-1:123456789012:app/GCM/app1".to_string(),
        );
        assert_eq!(state.arn, state.id);
        assert_eq!(state.name, "app1");
        assert_eq!(state.platform, "GCM");
        assert_eq!(state.platform_credential, None);
    }

    #[test]
    fn test_unknown_credential_hash_counts_as_changed() {
        let config = ApplicationConfig::new("app1", "GCM", "key");
        let prior = ApplicationState::from_id("arn:aws:sns:us-east-1:123456789012:app/GCM/app1");

        let request = ApplicationHandler::changed_attributes(&config, &prior);
        assert_eq!(request.get(PLATFORM_CREDENTIAL).map(String::as_str), Some("key"));
        assert_eq!(prior.platform_credential, None);
        assert_ne!(Some(hash_content("key")), prior.platform_credential);
    }
}
