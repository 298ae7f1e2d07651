//! Username/password exchange for a bearer token.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Operation, ProviderError};
use crate::transport::http::sanitize_for_log;
use crate::transport::{ApiRequest, Transport};

/// Path of the token endpoint, relative to the base URL.
pub const AUTH_PATH: &str = "/api/v1/authentication/auth/";

/// Credentials exchanged for a token.
#[derive(Clone, Eq, PartialEq, Serialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Username being authenticated.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<serde_json::Value>,
}

fn auth_failure(message: impl Into<String>) -> ProviderError {
    ProviderError::Authentication {
        message: message.into(),
    }
}

/// Exchanges `credentials` for a bearer token at `base_url`.
///
/// The request goes through `transport` unauthenticated. Any 2xx response
/// whose body carries a non-empty string `token` succeeds.
///
/// # Errors
///
/// Returns [`ProviderError::Authentication`] for every failure, including
/// an unreachable endpoint, a non-2xx status, an unreadable body and a
/// missing token.
pub async fn acquire_token<T: Transport + ?Sized>(
    transport: &T,
    base_url: &str,
    credentials: &Credentials,
) -> Result<String, ProviderError> {
    let url = format!("{}{AUTH_PATH}", base_url.trim_end_matches('/'));
    let request = ApiRequest::post_json(url, credentials)
        .map_err(|err| auth_failure(format!("unable to encode token request: {err}")))?
        .accept_json();

    tracing::debug!(
        operation = %Operation::Authenticate,
        username = credentials.username(),
        "requesting API token"
    );
    let response = transport
        .send(request)
        .await
        .map_err(|err| auth_failure(format!("token request failed: {err}")))?;

    if !response.status.is_success() {
        tracing::error!(
            status = %response.status,
            body = %sanitize_for_log(&response.text()),
            "token request rejected"
        );
        return Err(auth_failure(format!(
            "token endpoint returned status {}",
            response.status
        )));
    }

    let parsed: TokenResponse = serde_json::from_slice(&response.body)
        .map_err(|err| auth_failure(format!("unable to parse token response: {err}")))?;

    match parsed.token {
        Some(serde_json::Value::String(token)) if !token.trim().is_empty() => {
            tracing::debug!("API token acquired");
            Ok(token)
        }
        _ => Err(auth_failure("unable to fetch token: response carries no token")),
    }
}
