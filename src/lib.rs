//! Lifecycle controllers for JumpServer resources.
//!
//! The crate drives host assets and bulk-created accounts through their
//! create/read/update/delete lifecycle against the JumpServer REST API, and
//! exposes a filtered host lookup. Every call after configuration goes
//! through one shared bearer-token transport (configure → controllers →
//! API).

pub mod config;
pub mod error;
pub mod provider;
pub mod query;
pub mod resource;
pub mod test_support;
pub mod token;
pub mod translate;
pub mod transport;

pub use config::{ConfigError, ConnectionOverrides, ProviderConfig};
pub use error::{Diagnostic, Operation, ProviderError};
pub use provider::{PROVIDER_TYPE_NAME, Provider};
pub use query::{HostSuggestionFilter, HostSuggestionQuery, HostSuggestions, HostSummary};
pub use resource::{
    AccountController, AccountState, ControllerFuture, HostController, HostId, HostState, Phase,
    ResourceController,
};
pub use token::{Credentials, acquire_token};
pub use translate::{
    AccountSpec, BulkAccountResult, DecodeError, HostRecord, HostSpec, Protocol, ValidationError,
};
pub use transport::{
    ApiRequest, ApiResponse, AuthenticatedTransport, HttpTransport, Session, Transport,
    TransportError, TransportFuture,
};
