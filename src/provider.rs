//! Provider configuration flow.
//!
//! Configuration resolves the connection settings, obtains a bearer token
//! once, and builds the single authenticated transport every controller
//! shares for the rest of the session.

use std::sync::Arc;

use crate::config::{ConnectionOverrides, ProviderConfig};
use crate::error::ProviderError;
use crate::query::HostSuggestionQuery;
use crate::resource::{AccountController, HostController};
use crate::token::{Credentials, acquire_token};
use crate::transport::{AuthenticatedTransport, HttpTransport, Session, Transport};

/// Provider type name as registered with the host runtime.
pub const PROVIDER_TYPE_NAME: &str = "jumpserver";

/// Configured provider handing out controllers that share one transport.
#[derive(Debug)]
pub struct Provider<T> {
    transport: Arc<AuthenticatedTransport<T>>,
}

impl<T> Clone for Provider<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl Provider<HttpTransport> {
    /// Configures the provider over HTTP.
    ///
    /// # Errors
    ///
    /// See [`Provider::configure_with`]; additionally returns
    /// [`ProviderError::Transport`] when the HTTP client cannot be built.
    pub async fn configure(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Self::configure_with(HttpTransport::new()?, config).await
    }

    /// Loads `JUMP_SERVER_*` settings, applies the explicitly configured
    /// values on top and configures the provider over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when loading fails, and
    /// otherwise the same errors as [`Provider::configure`].
    pub async fn configure_from_env(overrides: ConnectionOverrides) -> Result<Self, ProviderError> {
        let config = ProviderConfig::load_from_sources()?.with_overrides(overrides);
        Self::configure(&config).await
    }
}

impl<T: Transport> Provider<T> {
    /// Configures the provider on top of `inner`.
    ///
    /// A supplied token is used as is; otherwise the username and password
    /// are exchanged for one through `inner`, unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when a required setting is
    /// missing, [`ProviderError::Authentication`] when the token exchange
    /// fails for any reason (the endpoint being unreachable included), and
    /// [`ProviderError::Transport`] when the token cannot be sent as a header.
    pub async fn configure_with(inner: T, config: &ProviderConfig) -> Result<Self, ProviderError> {
        config.validate()?;
        let token = if let Some(token) = config.supplied_token() {
            tracing::debug!("using supplied API token");
            token.to_owned()
        } else {
            let credentials = Credentials::new(config.username.as_str(), config.password.as_str());
            acquire_token(&inner, &config.base_url, &credentials).await?
        };
        let session = Session::new(config.base_url.as_str(), token);
        let transport = AuthenticatedTransport::new(inner, session)?;
        tracing::debug!(base_url = transport.base_url(), "provider configured");
        Ok(Self {
            transport: Arc::new(transport),
        })
    }

    /// Controller for `jumpserver_asset_host`.
    #[must_use]
    pub fn hosts(&self) -> HostController<T> {
        HostController::new(Arc::clone(&self.transport))
    }

    /// Controller for `jumpserver_account`.
    #[must_use]
    pub fn accounts(&self) -> AccountController<T> {
        AccountController::new(Arc::clone(&self.transport))
    }

    /// Query façade for `jumpserver_host_suggestions`.
    #[must_use]
    pub fn host_suggestions(&self) -> HostSuggestionQuery<T> {
        HostSuggestionQuery::new(Arc::clone(&self.transport))
    }
}
