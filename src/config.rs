//! Connection settings loaded via `ortho-config`.

use std::fmt;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::Deserialize;
use thiserror::Error;

/// JumpServer connection settings.
///
/// Values merge defaults, configuration files and `JUMP_SERVER_*` environment
/// variables. Explicit settings from the provider block are applied on top
/// with [`ProviderConfig::with_overrides`].
#[derive(Clone, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "JUMP_SERVER",
    discovery(
        app_name = "jumpserver-provider",
        env_var = "JUMP_SERVER_CONFIG_PATH",
        config_file_name = "jumpserver.toml",
        dotfile_name = ".jumpserver.toml",
        project_file_name = "jumpserver.toml"
    )
)]
pub struct ProviderConfig {
    /// Base URL of the JumpServer API, for example `https://js.example.com`.
    #[ortho_config(default = String::new())]
    pub base_url: String,
    /// Username exchanged for a bearer token.
    #[ortho_config(default = String::new())]
    pub username: String,
    /// Password exchanged for a bearer token.
    #[ortho_config(default = String::new())]
    pub password: String,
    /// Pre-issued bearer token. When set, no token exchange takes place.
    pub token: Option<String>,
}

/// Explicitly configured values. `Some` wins over the environment fallback,
/// even when empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    /// Explicit base URL.
    pub base_url: Option<String>,
    /// Explicit username.
    pub username: Option<String>,
    /// Explicit password.
    pub password: Option<String>,
    /// Explicit token.
    pub token: Option<String>,
}

struct FieldMetadata {
    attribute: &'static str,
    description: &'static str,
    env_var: &'static str,
}

impl FieldMetadata {
    const fn new(attribute: &'static str, description: &'static str, env_var: &'static str) -> Self {
        Self {
            attribute,
            description,
            env_var,
        }
    }
}

const BASE_URL: FieldMetadata = FieldMetadata::new(
    "base_url",
    "JumpServer API base URL",
    "JUMP_SERVER_BASE_URL",
);
const USERNAME: FieldMetadata = FieldMetadata::new(
    "username",
    "JumpServer API username",
    "JUMP_SERVER_USERNAME",
);
const PASSWORD: FieldMetadata = FieldMetadata::new(
    "password",
    "JumpServer API password",
    "JUMP_SERVER_PASSWORD",
);

impl ProviderConfig {
    /// Creates settings from explicit values without consulting the
    /// environment.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            token: None,
        }
    }

    /// Sets a pre-issued token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Loads settings from configuration files and the environment without
    /// parsing command-line arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("jumpserver-provider")])
            .map_err(ConfigError::from)
    }

    /// Applies explicitly configured values over the loaded ones.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConnectionOverrides) -> Self {
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(username) = overrides.username {
            self.username = username;
        }
        if let Some(password) = overrides.password {
            self.password = password;
        }
        if overrides.token.is_some() {
            self.token = overrides.token;
        }
        self
    }

    /// Pre-issued token, ignoring blank values.
    #[must_use]
    pub fn supplied_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField {
                attribute: metadata.attribute,
                message: format!(
                    "missing {}: set {} in the provider configuration or jumpserver.toml, or the {} environment variable",
                    metadata.description, metadata.attribute, metadata.env_var
                ),
            });
        }
        Ok(())
    }

    /// Checks that every required connection setting is present. Username
    /// and password are only required when no token was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first missing
    /// setting and how to provide it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(&self.base_url, &BASE_URL)?;
        if self.supplied_token().is_none() {
            Self::require_field(&self.username, &USERNAME)?;
            Self::require_field(&self.password, &PASSWORD)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Debug for ConnectionOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOverrides")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required connection setting is empty or missing.
    #[error("{message}")]
    MissingField {
        /// Provider attribute that is missing.
        attribute: &'static str,
        /// Actionable description of how to provide it.
        message: String,
    },
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<Arc<OrthoError>> for ConfigError {
    fn from(value: Arc<OrthoError>) -> Self {
        Self::Parse(value.to_string())
    }
}
