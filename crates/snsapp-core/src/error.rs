//! Error types for the SNS platform application resource
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

use crate::resource::ApplicationState;

/// Result type alias for resource operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by the remote platform API
///
/// Carries the service error code (when the service returned one) and the
/// underlying message, so callers can diagnose without inspecting SDK types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Service error code, e.g. "InvalidParameter" or "NotFound"
    pub code: Option<String>,
    /// Underlying message
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl ApiError {
    /// Create an API error without a service code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Create an API error with a service code
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Core error type for the resource handler
#[derive(Error, Debug)]
pub enum Error {
    /// create-application failed
    #[error("Error creating SNS platform application: {0}")]
    Create(#[source] ApiError),

    /// set-application-attributes failed
    #[error("Error updating SNS platform application: {0}")]
    Update(#[source] ApiError),

    /// The application exists remotely, but applying the rest of the
    /// configuration after creation failed
    ///
    /// `state` knows the new identifier; persist it so the next run updates
    /// instead of creating a second application.
    #[error("SNS platform application {} was created but not fully applied: {source}", .state.id)]
    Created {
        /// Snapshot of the created application (identifier only)
        state: Box<ApplicationState>,
        /// The failure of the follow-up update or read
        source: Box<Error>,
    },

    /// get-application-attributes failed
    #[error("Error reading SNS platform application attributes: {0}")]
    Fetch(#[source] ApiError),

    /// delete-application failed
    #[error("Error deleting SNS platform application: {0}")]
    Delete(#[source] ApiError),

    /// Identifier is not a platform application ARN
    #[error(
        "SNS platform application ID must be of the form \
         arn:PARTITION:sns:REGION:ACCOUNTID:app/PLATFORM/NAME, \
         was provided {identifier:?}: {reason}"
    )]
    MalformedIdentifier {
        /// The rejected identifier
        identifier: String,
        /// What was wrong with it
        reason: String,
    },

    /// Platform requires a principal but none was configured
    #[error("platform_principal is required when platform = {platform}")]
    MissingPrincipal {
        /// The configured platform
        platform: String,
    },

    /// Platform requires a principal but it was configured empty
    #[error("platform_principal must be non-empty when platform = {platform}")]
    EmptyPrincipal {
        /// The configured platform
        platform: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a malformed identifier error
    pub fn malformed_identifier(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing principal error
    pub fn missing_principal(platform: impl Into<String>) -> Self {
        Self::MissingPrincipal {
            platform: platform.into(),
        }
    }

    /// Create an empty principal error
    pub fn empty_principal(platform: impl Into<String>) -> Self {
        Self::EmptyPrincipal {
            platform: platform.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// The snapshot of an application that was created before the failure
    pub fn created_state(&self) -> Option<&ApplicationState> {
        match self {
            Self::Created { state, .. } => Some(&**state),
            _ => None,
        }
    }

    /// Whether this error was raised by plan-time validation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingPrincipal { .. } | Self::EmptyPrincipal { .. } | Self::Config(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
