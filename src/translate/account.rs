//! Account attribute model and the bulk-create JSON shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DecodeError, ValidationError, decode, parse_uuid};

/// State reported by the bulk endpoint for an account it created.
pub const CREATED_STATE: &str = "created";

/// Declared attributes of an account pushed onto one or more assets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountSpec {
    /// Account display name.
    pub name: String,
    /// Login name on the target assets.
    pub username: String,
    /// Whether the account is privileged.
    pub privileged: bool,
    /// Whether the account is active.
    pub is_active: bool,
    /// Identifiers of the assets the account is linked to.
    pub assets: Vec<String>,
}

#[derive(Serialize)]
struct BulkAccountRequest<'a> {
    name: &'a str,
    username: &'a str,
    privileged: bool,
    is_active: bool,
    assets: Vec<String>,
}

impl AccountSpec {
    /// Parses every asset identifier. Names are left for the API to judge.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUuid`] for the first asset that is
    /// not a UUID.
    pub fn validate(&self) -> Result<Vec<Uuid>, ValidationError> {
        self.assets
            .iter()
            .enumerate()
            .map(|(index, asset)| parse_uuid(format!("assets[{index}]"), asset))
            .collect()
    }

    /// Request body for `POST /api/v1/accounts/accounts/bulk/`, using the
    /// already-parsed asset identifiers.
    pub(crate) fn bulk_payload(&self, assets: &[Uuid]) -> impl Serialize + '_ {
        BulkAccountRequest {
            name: &self.name,
            username: &self.username,
            privileged: self.privileged,
            is_active: self.is_active,
            assets: assets.iter().map(Uuid::to_string).collect(),
        }
    }
}

/// One entry of the bulk-create response.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct BulkAccountResult {
    /// Human readable asset label, for example `web-1(10.0.0.5)`.
    #[serde(default)]
    pub asset: Option<String>,
    /// Outcome for that asset, `created` on success.
    #[serde(default)]
    pub state: Option<String>,
    /// Whether the asset was modified.
    #[serde(default)]
    pub changed: Option<bool>,
}

impl BulkAccountResult {
    /// Whether this entry reports a newly created account.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.state.as_deref() == Some(CREATED_STATE)
    }

    /// Decodes the bulk-create response array.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] when the body is not a JSON array of
    /// result objects.
    pub fn list_from_body(body: &[u8]) -> Result<Vec<Self>, DecodeError> {
        decode("account bulk create", body)
    }
}
