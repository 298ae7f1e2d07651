//! Filtered lookup of host assets through the suggestions endpoint.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use url::form_urlencoded;

use crate::error::Operation;
use crate::resource::{ControllerFuture, expect_status};
use crate::translate::decode;
use crate::transport::{ApiRequest, AuthenticatedTransport, Transport};

/// Suggestions endpoint for host assets.
pub const SUGGESTIONS_PATH: &str = "/api/v1/assets/hosts/suggestions/";

/// Data source type name as registered with the host runtime.
pub const TYPE_NAME: &str = "jumpserver_host_suggestions";

/// Sparse filter set. Only fields that are `Some` reach the query string.
///
/// Flag-like filters stay strings so that whatever the caller supplies
/// (`true`, `1`, `False`) is passed to the API untouched.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HostSuggestionFilter {
    /// Host identifier.
    pub id: Option<String>,
    /// Host name.
    pub name: Option<String>,
    /// Host address.
    pub address: Option<String>,
    /// Activity flag.
    pub is_active: Option<String>,
    /// Asset type.
    pub r#type: Option<String>,
    /// Asset category.
    pub category: Option<String>,
    /// Platform name or id.
    pub platform: Option<String>,
    /// Gateway flag.
    pub is_gateway: Option<String>,
    /// Platform to exclude.
    pub exclude_platform: Option<String>,
    /// Domain (zone) id.
    pub domain: Option<String>,
    /// Protocol name.
    pub protocols: Option<String>,
    /// Domain capability flag.
    pub domain_enabled: Option<String>,
    /// Ping capability flag.
    pub ping_enabled: Option<String>,
    /// Fact gathering capability flag.
    pub gather_facts_enabled: Option<String>,
    /// Secret rotation capability flag.
    pub change_secret_enabled: Option<String>,
    /// Account push capability flag.
    pub push_account_enabled: Option<String>,
    /// Account verification capability flag.
    pub verify_account_enabled: Option<String>,
    /// Account discovery capability flag.
    pub gather_accounts_enabled: Option<String>,
    /// Free-text search.
    pub search: Option<String>,
    /// Ordering key.
    pub order: Option<String>,
    /// Page size.
    pub limit: Option<i64>,
    /// Page offset.
    pub offset: Option<i64>,
}

impl HostSuggestionFilter {
    /// Filter matching hosts by name only.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Present filters as `(parameter, value)` pairs, in declaration order.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let text = [
            ("id", &self.id),
            ("name", &self.name),
            ("address", &self.address),
            ("is_active", &self.is_active),
            ("type", &self.r#type),
            ("category", &self.category),
            ("platform", &self.platform),
            ("is_gateway", &self.is_gateway),
            ("exclude_platform", &self.exclude_platform),
            ("domain", &self.domain),
            ("protocols", &self.protocols),
            ("domain_enabled", &self.domain_enabled),
            ("ping_enabled", &self.ping_enabled),
            ("gather_facts_enabled", &self.gather_facts_enabled),
            ("change_secret_enabled", &self.change_secret_enabled),
            ("push_account_enabled", &self.push_account_enabled),
            ("verify_account_enabled", &self.verify_account_enabled),
            ("gather_accounts_enabled", &self.gather_accounts_enabled),
            ("search", &self.search),
            ("order", &self.order),
        ];
        let numeric = [("limit", self.limit), ("offset", self.offset)];

        text.into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
            .chain(
                numeric
                    .into_iter()
                    .filter_map(|(key, value)| value.map(|v| (key, v.to_string()))),
            )
            .collect()
    }

    /// URL-encoded query string without the leading `?`. Empty when no
    /// filter is set.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.to_query_pairs() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }
}

/// Minimal host entry returned by the suggestions endpoint.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct HostSummary {
    /// Host identifier.
    pub id: String,
    /// Host name.
    pub name: String,
}

/// Result of a suggestions lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostSuggestions {
    /// Matching hosts in API order.
    pub results: Vec<HostSummary>,
    /// Number of returned entries. The API's own pagination count is not
    /// consulted.
    pub total_count: usize,
    /// Next page link. Always `None`; pagination links are not read.
    pub next: Option<String>,
    /// Previous page link. Always `None`; pagination links are not read.
    pub previous: Option<String>,
}

impl HostSuggestions {
    fn from_results(results: Vec<HostSummary>) -> Self {
        Self {
            total_count: results.len(),
            results,
            next: None,
            previous: None,
        }
    }
}

/// Read-only façade over the host suggestions endpoint.
#[derive(Debug)]
pub struct HostSuggestionQuery<T> {
    transport: Arc<AuthenticatedTransport<T>>,
}

impl<T> Clone for HostSuggestionQuery<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> HostSuggestionQuery<T> {
    /// Creates a query façade sharing `transport`.
    #[must_use]
    pub const fn new(transport: Arc<AuthenticatedTransport<T>>) -> Self {
        Self { transport }
    }

    fn request_url(&self, filter: &HostSuggestionFilter) -> String {
        let base = self.transport.url(SUGGESTIONS_PATH);
        let query = filter.query_string();
        if query.is_empty() {
            base
        } else {
            format!("{base}?{query}")
        }
    }

    /// Issues one `GET` with the present filters and maps the returned array.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProviderError::Api`] for any status other than `200`,
    /// and [`crate::ProviderError::Decode`] when the body is not an array of
    /// `{id, name}` objects.
    pub fn fetch<'a>(
        &'a self,
        filter: &'a HostSuggestionFilter,
    ) -> ControllerFuture<'a, HostSuggestions> {
        Box::pin(async move {
            let request = ApiRequest::get(self.request_url(filter));
            let raw = self.transport.send(request).await?;
            let response = expect_status(Operation::Query, raw, &[StatusCode::OK])?;
            let results: Vec<HostSummary> = decode("host suggestions", &response.body)?;
            tracing::debug!(count = results.len(), "host suggestions fetched");
            Ok(HostSuggestions::from_results(results))
        })
    }
}
