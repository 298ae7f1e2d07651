//! Host asset controller.

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;
use url::Url;

use super::{ControllerFuture, ResourceController, expect_status, log_settled};
use crate::error::{Operation, ProviderError};
use crate::translate::host::decode_created_id;
use crate::translate::{HostRecord, HostSpec, ValidationError, require_non_empty};
use crate::transport::{ApiRequest, AuthenticatedTransport, Transport, TransportError};

/// Collection endpoint for host assets.
pub const HOSTS_PATH: &str = "/api/v1/assets/hosts/";

/// Server-assigned host identifier. Never empty.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct HostId(String);

impl HostId {
    /// Parses a stored identifier, dropping surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for an empty identifier.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let id = value.as_ref().trim();
        require_non_empty("id", id)?;
        Ok(Self(id.to_owned()))
    }

    /// Identifier as sent in item URLs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of a host that exists remotely.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostState {
    /// Server-assigned identifier.
    pub id: HostId,
    /// Attributes as last written or read.
    pub spec: HostSpec,
}

impl HostState {
    /// Rebuilds state from values the host runtime stored, for example
    /// after an import.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] when `id` is empty.
    pub fn from_stored(id: impl AsRef<str>, spec: HostSpec) -> Result<Self, ValidationError> {
        Ok(Self {
            id: HostId::parse(id)?,
            spec,
        })
    }
}

/// Drives the lifecycle of `jumpserver_asset_host` resources.
#[derive(Debug)]
pub struct HostController<T> {
    transport: Arc<AuthenticatedTransport<T>>,
}

impl<T> Clone for HostController<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> HostController<T> {
    /// Creates a controller sharing `transport`.
    #[must_use]
    pub const fn new(transport: Arc<AuthenticatedTransport<T>>) -> Self {
        Self { transport }
    }

    /// Item URL with `id` encoded as a single path segment.
    fn item_url(&self, id: &HostId) -> Result<String, TransportError> {
        let collection = self.transport.url(HOSTS_PATH);
        let invalid = |message: String| TransportError::InvalidUrl {
            url: collection.clone(),
            message,
        };
        let mut url = Url::parse(&collection).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid(String::from("base URL cannot carry a path")))?
            .pop_if_empty()
            .push(id.as_str())
            .push("");
        Ok(url.into())
    }

    async fn create_host(&self, planned: &HostSpec) -> Result<HostState, ProviderError> {
        planned.validate()?;
        let request =
            ApiRequest::post_json(self.transport.url(HOSTS_PATH), &planned.create_payload())?;
        let raw = self.transport.send(request).await?;
        let response = expect_status(Operation::Create, raw, &[StatusCode::CREATED])?;
        let id = HostId::parse(decode_created_id(&response.body)?)?;
        tracing::debug!(%id, name = %planned.name, "host created");
        Ok(HostState {
            id,
            spec: planned.clone(),
        })
    }

    async fn read_host(&self, prior: &HostState) -> Result<HostState, ProviderError> {
        let request = ApiRequest::get(self.item_url(&prior.id)?);
        let raw = self.transport.send(request).await?;
        let response = expect_status(Operation::Read, raw, &[StatusCode::OK])?;
        let record = HostRecord::from_body(&response.body)?;
        let mut spec = prior.spec.clone();
        record.merge_into(&mut spec);
        Ok(HostState {
            id: prior.id.clone(),
            spec,
        })
    }

    async fn delete_host(&self, prior: &HostState) -> Result<(), ProviderError> {
        let request = ApiRequest::delete(self.item_url(&prior.id)?);
        let raw = self.transport.send(request).await?;
        expect_status(
            Operation::Delete,
            raw,
            &[StatusCode::OK, StatusCode::NO_CONTENT],
        )?;
        tracing::debug!(id = %prior.id, "host deleted");
        Ok(())
    }
}

impl<T: Transport> ResourceController for HostController<T> {
    type Config = HostSpec;
    type State = HostState;

    const TYPE_NAME: &'static str = "jumpserver_asset_host";

    fn create<'a>(&'a self, planned: &'a HostSpec) -> ControllerFuture<'a, HostState> {
        Box::pin(async move {
            let result = self.create_host(planned).await;
            log_settled(
                Self::TYPE_NAME,
                result.as_ref().ok().map(|state| state.id.as_str()),
                Operation::Create,
                result.is_ok(),
            );
            result
        })
    }

    fn read<'a>(&'a self, prior: &'a HostState) -> ControllerFuture<'a, HostState> {
        Box::pin(self.read_host(prior))
    }

    fn update<'a>(
        &'a self,
        prior: &'a HostState,
        planned: &'a HostSpec,
    ) -> ControllerFuture<'a, HostState> {
        Box::pin(async move {
            if planned != &prior.spec {
                tracing::warn!(
                    id = %prior.id,
                    "host update is not supported by this provider; remote host left unchanged"
                );
            }
            log_settled(Self::TYPE_NAME, Some(prior.id.as_str()), Operation::Update, true);
            Ok(prior.clone())
        })
    }

    fn delete<'a>(&'a self, prior: &'a HostState) -> ControllerFuture<'a, ()> {
        Box::pin(async move {
            let result = self.delete_host(prior).await;
            log_settled(
                Self::TYPE_NAME,
                Some(prior.id.as_str()),
                Operation::Delete,
                result.is_ok(),
            );
            result
        })
    }
}
