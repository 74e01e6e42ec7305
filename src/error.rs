//! Error taxonomy for resource updates and reference resolution.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures of a read-modify-write update.
///
/// Everything except [`UpdateError::RemoteCallFailed`] is raised locally and
/// deterministically, so retrying would not help.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("At least one property must be modified.")]
    NoFieldsSpecified,

    #[error(
        "No {kind} with name [{name}] in {scope_type} [{scope}] is part of the {parent_kind} [{parent}]."
    )]
    SubResourceNotFound {
        kind: String,
        name: String,
        scope_type: String,
        scope: String,
        parent_kind: String,
        parent: String,
    },

    #[error("Invalid value for [{option}]: {reason}")]
    IncompatibleFields { option: String, reason: String },

    #[error("[{option}] is not available in the {channel} channel")]
    UnsupportedOption { option: String, channel: String },

    #[error("Invalid value for [{option}]: {reason}")]
    InvalidValue { option: String, reason: String },

    #[error("Policy binding with the specified member [{member}] and role [{role}] not found.")]
    BindingNotFound { member: String, role: String },

    #[error(transparent)]
    RemoteCallFailed(anyhow::Error),
}

impl UpdateError {
    pub fn incompatible(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IncompatibleFields {
            option: option.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            option: option.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(option: impl Into<String>, channel: impl Into<String>) -> Self {
        Self::UnsupportedOption {
            option: option.into(),
            channel: channel.into(),
        }
    }

    /// HTTP status of the failed remote call, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RemoteCallFailed(err) => crate::gcp::http::api_status(err),
            _ => None,
        }
    }

    /// True for the remote-call failures; local failures are never retryable.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteCallFailed(_))
    }
}

/// Failures turning user input into a [`crate::resource::ResourceReference`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Could not resolve [{name}]: {reason}")]
    AmbiguousOrNotFound { name: String, reason: String },

    #[error("Invalid resource reference [{name}]: {reason}")]
    InvalidReference { name: String, reason: String },
}

impl ResolveError {
    pub fn ambiguous(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AmbiguousOrNotFound {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_resource_message_names_scope() {
        let err = UpdateError::SubResourceNotFound {
            kind: "backend".to_string(),
            name: "ig-1".to_string(),
            scope_type: "zone".to_string(),
            scope: "us-central1-a".to_string(),
            parent_kind: "backend service".to_string(),
            parent: "web".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No backend with name [ig-1] in zone [us-central1-a] is part of the backend service [web]."
        );
    }

    #[test]
    fn test_local_errors_have_no_status() {
        assert_eq!(UpdateError::NoFieldsSpecified.status(), None);
        assert!(!UpdateError::NoFieldsSpecified.is_remote());
    }
}
