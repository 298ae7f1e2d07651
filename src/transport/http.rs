//! `reqwest`-backed transport used against a real JumpServer instance.

use reqwest::Client;

use super::{ApiRequest, ApiResponse, Transport, TransportError, TransportFuture};

const USER_AGENT: &str = concat!("jumpserver-provider/", env!("CARGO_PKG_VERSION"));

/// Maximum number of characters of a response body written to logs.
const MAX_LOG_BODY_CHARS: usize = 200;

/// Truncates a response body for logging and strips control characters.
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let total = body.chars().count();
    let mut sanitized: String = body
        .chars()
        .take(MAX_LOG_BODY_CHARS)
        .filter(|c| !c.is_control())
        .collect();
    if total > MAX_LOG_BODY_CHARS {
        sanitized.push_str(&format!("... [truncated, {} bytes total]", body.len()));
    }
    sanitized
}

/// Unauthenticated HTTP transport.
///
/// Token acquisition talks to this directly; everything else goes through
/// [`super::AuthenticatedTransport`] wrapping it.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the default client settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] when the client cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| TransportError::Client {
                message: err.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client, keeping its TLS and proxy settings.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_, ApiResponse> {
        Box::pin(async move {
            let ApiRequest {
                method,
                url,
                headers,
                body,
            } = request;
            tracing::debug!("{} {}", method, url);

            let mut builder = self.client.request(method.clone(), &url).headers(headers);
            if let Some(payload) = &body {
                builder = builder.json(payload);
            }

            let response = builder
                .send()
                .await
                .map_err(|err| TransportError::Request {
                    method: method.to_string(),
                    url: url.clone(),
                    message: err.to_string(),
                })?;

            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|err| TransportError::Body {
                    url: url.clone(),
                    message: err.to_string(),
                })?;

            tracing::debug!("{} {} -> {}", method, url, status);
            Ok(ApiResponse::new(status, bytes.to_vec()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_short_bodies() {
        assert_eq!(sanitize_for_log("{\"detail\":\"nope\"}"), "{\"detail\":\"nope\"}");
    }

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_CHARS)));
        assert!(sanitized.ends_with("[truncated, 500 bytes total]"));
    }

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("a\nb\u{7}c"), "abc");
    }
}
