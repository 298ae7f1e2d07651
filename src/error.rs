//! Error types surfaced to the host runtime.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;
use crate::translate::{DecodeError, ValidationError};

/// Lifecycle call an error originated from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    /// Token exchange.
    Authenticate,
    /// Resource creation.
    Create,
    /// Resource refresh.
    Read,
    /// Resource update.
    Update,
    /// Resource removal.
    Delete,
    /// Filtered list query.
    Query,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Authenticate => "authenticate",
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Query => "query",
        };
        f.write_str(label)
    }
}

/// Errors raised by the provider and its controllers.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProviderError {
    /// Raised when required connection settings are missing.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// Raised when the token exchange fails or returns no token.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Description of the failure.
        message: String,
    },
    /// Raised when attributes fail local validation; nothing was sent.
    #[error("invalid attributes: {0}")]
    Validation(#[from] ValidationError),
    /// Raised when the API could not be reached.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Raised when the API answers with an unexpected status or outcome.
    #[error("{operation} failed with status {status}: {body}")]
    Api {
        /// Lifecycle call that failed.
        operation: Operation,
        /// Status code returned by the API.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },
    /// Raised when a response body does not have the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// User-facing rendering of an error, as the host runtime displays it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    /// One-line summary.
    pub summary: String,
    /// Full description.
    pub detail: String,
    /// Attribute the diagnostic points at, when there is one.
    pub attribute: Option<String>,
}

impl ProviderError {
    /// Status code for API errors.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Renders the error as an error diagnostic.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (summary, attribute) = match self {
            Self::Configuration(ConfigError::MissingField { attribute, .. }) => (
                "Missing JumpServer connection setting",
                Some((*attribute).to_owned()),
            ),
            Self::Configuration(ConfigError::Parse(_)) => {
                ("Unable to load JumpServer provider configuration", None)
            }
            Self::Authentication { .. } => ("Unable to authenticate with JumpServer API", None),
            Self::Validation(err) => ("Invalid resource attribute", Some(err.field().to_owned())),
            Self::Transport(_) => ("HTTP Request Error", None),
            Self::Api { .. } => ("API Error", None),
            Self::Decode(_) => ("Response Decode Error", None),
        };
        Diagnostic {
            summary: summary.to_owned(),
            detail: self.to_string(),
            attribute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_carries_status_and_body() {
        let err = ProviderError::Api {
            operation: Operation::Delete,
            status: StatusCode::CONFLICT,
            body: String::from("{\"detail\":\"in use\"}"),
        };
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(
            err.to_string(),
            "delete failed with status 409 Conflict: {\"detail\":\"in use\"}"
        );
    }

    #[test]
    fn validation_diagnostic_points_at_field() {
        let err = ProviderError::from(ValidationError::InvalidUuid {
            field: String::from("assets[0]"),
            value: String::from("nope"),
        });
        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.attribute.as_deref(), Some("assets[0]"));
        assert!(diagnostic.detail.contains("'nope' is not a valid UUID"));
    }

    #[test]
    fn configuration_diagnostic_points_at_attribute() {
        let err = ProviderError::from(ConfigError::MissingField {
            attribute: "base_url",
            message: String::from("missing JumpServer API base URL"),
        });
        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.attribute.as_deref(), Some("base_url"));
        assert_eq!(diagnostic.summary, "Missing JumpServer connection setting");
    }
}
