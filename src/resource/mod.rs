//! Resource lifecycle controllers.
//!
//! Each managed resource kind implements [`ResourceController`]. A resource
//! moves `Absent -> Creating -> Present -> Deleting -> Absent`; a failed
//! create settles back to `Absent` and a failed delete settles back to
//! `Present`, so the next reconciliation starts from a consistent state.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use reqwest::StatusCode;

use crate::error::{Operation, ProviderError};
use crate::transport::ApiResponse;
use crate::transport::http::sanitize_for_log;

pub mod account;
pub mod host;

pub use account::{AccountController, AccountState};
pub use host::{HostController, HostId, HostState};

/// Lifecycle phase of a managed resource.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// No remote counterpart and no identifier known.
    Absent,
    /// Create call in flight.
    Creating,
    /// Identifier known; attributes mirror the last read or write.
    Present,
    /// Update call in flight.
    Updating,
    /// Delete call in flight.
    Deleting,
}

impl Phase {
    /// Phase entered when `operation` starts on a resource. Reads and
    /// queries do not change the phase.
    #[must_use]
    pub const fn entering(operation: Operation) -> Option<Self> {
        match operation {
            Operation::Create => Some(Self::Creating),
            Operation::Update => Some(Self::Updating),
            Operation::Delete => Some(Self::Deleting),
            Operation::Authenticate | Operation::Read | Operation::Query => None,
        }
    }

    /// Phase entered by `operation` and the phase it settles in, or `None`
    /// when the operation does not change the phase.
    #[must_use]
    pub const fn transition(operation: Operation, succeeded: bool) -> Option<(Self, Self)> {
        match Self::entering(operation) {
            Some(from) => Some((from, from.settle(succeeded))),
            None => None,
        }
    }

    /// Phase a resource settles in once the call in flight finishes.
    #[must_use]
    pub const fn settle(self, succeeded: bool) -> Self {
        match (self, succeeded) {
            (Self::Creating, false) | (Self::Deleting, true) | (Self::Absent, _) => Self::Absent,
            (Self::Creating | Self::Updating | Self::Present, _) | (Self::Deleting, false) => {
                Self::Present
            }
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Absent => "absent",
            Self::Creating => "creating",
            Self::Present => "present",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
        };
        f.write_str(label)
    }
}

/// Future returned by controller operations.
pub type ControllerFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// CRUD lifecycle of one managed resource kind.
///
/// The host runtime invokes at most one operation per resource instance at a
/// time; distinct instances may be driven concurrently through the same
/// controller. Dropping a returned future cancels the call.
pub trait ResourceController: Send + Sync {
    /// Declared attributes supplied by the host.
    type Config: Send + Sync;
    /// State written back to the host after each call.
    type State: Send + Sync;

    /// Resource type name as registered with the host runtime.
    const TYPE_NAME: &'static str;

    /// Creates the remote object and returns its initial state.
    fn create<'a>(&'a self, planned: &'a Self::Config) -> ControllerFuture<'a, Self::State>;

    /// Refreshes `prior` from the remote object.
    fn read<'a>(&'a self, prior: &'a Self::State) -> ControllerFuture<'a, Self::State>;

    /// Applies `planned` to an existing object.
    fn update<'a>(
        &'a self,
        prior: &'a Self::State,
        planned: &'a Self::Config,
    ) -> ControllerFuture<'a, Self::State>;

    /// Removes the remote object. On success the caller forgets the state.
    fn delete<'a>(&'a self, prior: &'a Self::State) -> ControllerFuture<'a, ()>;
}

/// Logs the phase change `operation` caused on one resource.
pub(crate) fn log_settled(
    resource: &'static str,
    id: Option<&str>,
    operation: Operation,
    succeeded: bool,
) {
    if let Some((from, to)) = Phase::transition(operation, succeeded) {
        tracing::debug!(resource, id, %operation, %from, %to, "phase settled");
    }
}

/// Passes `response` through when its status is one of `accepted`, otherwise
/// turns it into [`ProviderError::Api`] carrying the raw body.
pub(crate) fn expect_status(
    operation: Operation,
    response: ApiResponse,
    accepted: &[StatusCode],
) -> Result<ApiResponse, ProviderError> {
    if accepted.contains(&response.status) {
        return Ok(response);
    }
    let body = response.text();
    tracing::error!(
        %operation,
        status = %response.status,
        body = %sanitize_for_log(&body),
        "unexpected API status"
    );
    Err(ProviderError::Api {
        operation,
        status: response.status,
        body,
    })
}
