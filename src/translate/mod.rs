//! Translation between typed resource attributes and the API's JSON.
//!
//! Outbound, each resource's attributes serialise into the request payload its
//! endpoint expects. Inbound, every endpoint response has its own decode
//! shape; unknown fields are ignored, wrong-typed ones are rejected.
//! Validation runs before anything is sent.

use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

pub mod account;
pub mod host;

pub use account::{AccountSpec, BulkAccountResult};
pub use host::{HostRecord, HostSpec, Protocol};

/// Local validation failure. No request is sent when one is raised.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ValidationError {
    /// Raised when a required string is empty or whitespace.
    #[error("missing or empty field: {field}")]
    MissingField {
        /// Attribute path of the offending field.
        field: String,
    },
    /// Raised when a value that must be a UUID does not parse as one.
    #[error("{field}: '{value}' is not a valid UUID")]
    InvalidUuid {
        /// Attribute path of the offending field.
        field: String,
        /// Rejected value.
        value: String,
    },
    /// Raised when a list that needs at least one element is empty.
    #[error("{field} must contain at least one element")]
    EmptyList {
        /// Attribute path of the offending list.
        field: String,
    },
}

impl ValidationError {
    /// Attribute path the error refers to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::InvalidUuid { field, .. }
            | Self::EmptyList { field } => field,
        }
    }
}

/// Failure to turn a response body into the expected shape.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DecodeError {
    /// Raised when the body is not JSON or a field has the wrong type.
    #[error("malformed {context} response: {message}")]
    Malformed {
        /// Endpoint the body came from.
        context: &'static str,
        /// Parser message.
        message: String,
    },
    /// Raised when a required field is absent or empty.
    #[error("{context} response is missing field '{field}'")]
    MissingField {
        /// Endpoint the body came from.
        context: &'static str,
        /// Name of the missing field.
        field: &'static str,
    },
}

/// Decodes `body` into `T`, labelling failures with `context`.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] when the body is not valid JSON or does
/// not match `T`.
pub fn decode<T: DeserializeOwned>(context: &'static str, body: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(body).map_err(|err| DecodeError::Malformed {
        context,
        message: err.to_string(),
    })
}

/// Rejects empty or whitespace-only strings.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] naming `field`.
pub fn require_non_empty(field: impl Into<String>, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: field.into(),
        });
    }
    Ok(())
}

/// Parses `value` as a UUID.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidUuid`] naming `field` and the value.
pub fn parse_uuid(field: impl Into<String>, value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value.trim()).map_err(|_| ValidationError::InvalidUuid {
        field: field.into(),
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        id: String,
    }

    #[test]
    fn decode_ignores_extra_fields() {
        let sample: Sample = decode("sample", br#"{"id":"a","extra":[1,2]}"#)
            .unwrap_or_else(|err| panic!("extra fields are allowed: {err}"));
        assert_eq!(sample.id, "a");
    }

    #[test]
    fn decode_rejects_wrong_type() {
        let err = decode::<Sample>("sample", br#"{"id":5}"#).expect_err("id must be a string");
        assert!(matches!(err, DecodeError::Malformed { context: "sample", .. }));
    }

    #[test]
    fn decode_rejects_non_json() {
        let err = decode::<Sample>("sample", b"<html>").expect_err("html is not json");
        assert!(err.to_string().starts_with("malformed sample response"));
    }

    #[test]
    fn require_non_empty_rejects_whitespace() {
        let err = require_non_empty("name", "  ").expect_err("blank is missing");
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn parse_uuid_reports_field_and_value() {
        let err = parse_uuid("assets[1]", "not-a-uuid").expect_err("invalid uuid");
        assert_eq!(
            err,
            ValidationError::InvalidUuid {
                field: String::from("assets[1]"),
                value: String::from("not-a-uuid"),
            }
        );
    }

    #[test]
    fn parse_uuid_accepts_hyphenated_form() {
        let parsed = parse_uuid("assets[0]", "67e55044-10b1-426f-9247-bb680e5fe0c8")
            .unwrap_or_else(|err| panic!("valid uuid: {err}"));
        assert_eq!(parsed.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }
}
