//! Bearer-token wrapper around an inner [`Transport`].

use std::fmt;

use reqwest::header::{AUTHORIZATION, HeaderValue};

use super::{ApiRequest, ApiResponse, Transport, TransportError, TransportFuture};

/// Credential established once at configuration time.
#[derive(Clone, Eq, PartialEq)]
pub struct Session {
    base_url: String,
    token: String,
}

impl Session {
    /// Creates a session. A trailing `/` on the base URL is dropped so that
    /// API paths can be appended verbatim.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base = base_url.into();
        Self {
            base_url: base.trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Transport that stamps `Authorization: Bearer <token>` on every request
/// before handing it to the wrapped transport.
///
/// The session is fixed at construction, so one value can be shared by any
/// number of controllers without locking.
#[derive(Clone)]
pub struct AuthenticatedTransport<T> {
    inner: T,
    base_url: String,
    authorization: HeaderValue,
}

impl<T: Transport> AuthenticatedTransport<T> {
    /// Wraps `inner` with the given session.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidHeader`] when the token contains
    /// characters that cannot appear in an HTTP header.
    pub fn new(inner: T, session: Session) -> Result<Self, TransportError> {
        let Session { base_url, token } = session;
        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                TransportError::InvalidHeader {
                    header: AUTHORIZATION.as_str().to_owned(),
                }
            })?;
        authorization.set_sensitive(true);
        Ok(Self {
            inner,
            base_url,
            authorization,
        })
    }

    /// Base URL all API paths are appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds an absolute URL by appending `path` to the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl<T: Transport> Transport for AuthenticatedTransport<T> {
    fn send(&self, mut request: ApiRequest) -> TransportFuture<'_, ApiResponse> {
        // `insert` replaces any existing value, so exactly one header is sent.
        request
            .headers
            .insert(AUTHORIZATION, self.authorization.clone());
        self.inner.send(request)
    }
}

impl<T> fmt::Debug for AuthenticatedTransport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
