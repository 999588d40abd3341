// # Resource Schema
//
// Field names, the local ↔ remote attribute name table and the platform set
// that requires a principal. All of it is process-wide and read-only.

/// Remote attribute carrying the platform credential
pub const PLATFORM_CREDENTIAL: &str = "PlatformCredential";

/// Remote attribute carrying the platform principal
pub const PLATFORM_PRINCIPAL: &str = "PlatformPrincipal";

/// Mutable feedback attributes: local field name → remote attribute name
///
/// This table is the single source of truth for translating names in both
/// directions. Every local name must be a declared optional field (see
/// [`OPTIONAL_FIELDS`]).
///
/// See <http://docs.aws.amazon.com/sns/latest/api/API_SetPlatformApplicationAttributes.html>
pub const ATTRIBUTE_NAME_MAP: [(&str, &str); 7] = [
    ("event_delivery_failure_topic_arn", "EventDeliveryFailure"),
    ("event_endpoint_created_topic_arn", "EventEndpointCreated"),
    ("event_endpoint_deleted_topic_arn", "EventEndpointDeleted"),
    ("event_endpoint_updated_topic_arn", "EventEndpointUpdated"),
    ("failure_feedback_role_arn", "FailureFeedbackRoleArn"),
    ("success_feedback_role_arn", "SuccessFeedbackRoleArn"),
    ("success_feedback_sample_rate", "SuccessFeedbackSampleRate"),
];

/// Optional, caller-settable fields of the resource
pub const OPTIONAL_FIELDS: [&str; 8] = [
    "event_delivery_failure_topic_arn",
    "event_endpoint_created_topic_arn",
    "event_endpoint_deleted_topic_arn",
    "event_endpoint_updated_topic_arn",
    "failure_feedback_role_arn",
    "platform_principal",
    "success_feedback_role_arn",
    "success_feedback_sample_rate",
];

/// Platforms for which `platform_principal` is mandatory and non-empty
pub const PLATFORMS_REQUIRING_PRINCIPAL: [&str; 2] = ["APNS", "APNS_SANDBOX"];

/// Look up the local field name for a remote attribute
pub fn local_name(remote: &str) -> Option<&'static str> {
    ATTRIBUTE_NAME_MAP
        .iter()
        .find(|(_, r)| *r == remote)
        .map(|(local, _)| *local)
}

/// Whether a local field is a declared optional field
pub fn is_optional_field(local: &str) -> bool {
    OPTIONAL_FIELDS.contains(&local)
}

/// Whether a platform requires `platform_principal`
pub fn requires_principal(platform: &str) -> bool {
    PLATFORMS_REQUIRING_PRINCIPAL.contains(&platform)
}
