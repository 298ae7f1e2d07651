//! Transport abstraction every outbound API call flows through.
//!
//! Requests are described as plain values ([`ApiRequest`]) so that the
//! authenticated wrapper can mutate headers before delegating, and test
//! doubles can record exactly what would have been sent.

use std::future::Future;
use std::pin::Pin;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub mod auth;
pub mod http;

pub use auth::{AuthenticatedTransport, Session};
pub use http::HttpTransport;

const JSON_MIME: &str = "application/json";

/// Errors raised below the API layer, before any status code is known.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransportError {
    /// Raised when the underlying HTTP client cannot be constructed.
    #[error("failed to build HTTP client: {message}")]
    Client {
        /// Message returned by the HTTP client builder.
        message: String,
    },
    /// Raised when a request cannot be delivered.
    #[error("request {method} {url} failed: {message}")]
    Request {
        /// HTTP method of the failed request.
        method: String,
        /// Absolute URL of the failed request.
        url: String,
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when the response body cannot be read.
    #[error("failed to read response body from {url}: {message}")]
    Body {
        /// Absolute URL of the request.
        url: String,
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when a request body cannot be encoded as JSON.
    #[error("failed to encode request body for {url}: {message}")]
    Encode {
        /// Absolute URL of the request.
        url: String,
        /// Message returned by the serialiser.
        message: String,
    },
    /// Raised when a request URL cannot be built from the base URL.
    #[error("invalid request URL {url}: {message}")]
    InvalidUrl {
        /// URL that could not be extended.
        url: String,
        /// Reason reported by the URL parser.
        message: String,
    },
    /// Raised when a header value contains characters HTTP does not allow.
    #[error("invalid value for header {header}")]
    InvalidHeader {
        /// Name of the rejected header.
        header: String,
    },
}

/// Outgoing API request.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL, including any query string.
    pub url: String,
    /// Request headers. The authenticated transport edits these in place.
    pub headers: HeaderMap,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a `GET` request that asks for a JSON response.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url).accept_json()
    }

    /// Creates a `DELETE` request that asks for a JSON response.
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url).accept_json()
    }

    /// Creates a `POST` request carrying `payload` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Encode`] when the payload cannot be
    /// represented as JSON.
    pub fn post_json<B: Serialize + ?Sized>(
        url: impl Into<String>,
        payload: &B,
    ) -> Result<Self, TransportError> {
        let mut request = Self::new(Method::POST, url);
        let body = serde_json::to_value(payload).map_err(|err| TransportError::Encode {
            url: request.url.clone(),
            message: err.to_string(),
        })?;
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MIME));
        request.body = Some(body);
        Ok(request)
    }

    /// Adds `Accept: application/json`.
    #[must_use]
    pub fn accept_json(mut self) -> Self {
        self.headers
            .insert(ACCEPT, HeaderValue::from_static(JSON_MIME));
        self
    }
}

/// Response returned by a [`Transport`]. Any status code is a successful
/// transport outcome; interpreting it is left to the caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response from a status and raw body.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a response whose body is the JSON encoding of `value`.
    #[must_use]
    pub fn json(status: StatusCode, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Single round trip to the remote API.
///
/// Implementations must be shareable across tasks: one transport value is
/// built at configuration time and used by every controller.
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response, whatever its status.
    fn send(&self, request: ApiRequest) -> TransportFuture<'_, ApiResponse>;
}
