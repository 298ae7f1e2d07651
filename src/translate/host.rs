//! Host attribute model and its JSON shapes.

use serde::{Deserialize, Serialize};

use super::{DecodeError, ValidationError, decode, require_non_empty};

/// Protocol entry exposed by a host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Protocol {
    /// Protocol name, for example `ssh`.
    pub name: String,
    /// Port; the server applies the protocol default when absent.
    pub port: Option<i64>,
}

impl Protocol {
    /// Creates a protocol entry.
    #[must_use]
    pub fn new(name: impl Into<String>, port: Option<i64>) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }
}

/// Declared attributes of a host asset.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostSpec {
    /// Display name.
    pub name: String,
    /// Network address, sent as `address` and read back from `ip`.
    pub address: String,
    /// Platform name, for example `Linux`.
    pub platform: String,
    /// Node paths the host is listed under.
    pub nodes_display: Vec<String>,
    /// Ordered protocol entries.
    pub protocols: Vec<Protocol>,
}

#[derive(Serialize)]
struct ProtocolPayload<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<i64>,
}

#[derive(Serialize)]
struct CreateHostRequest<'a> {
    name: &'a str,
    address: &'a str,
    platform: &'a str,
    nodes_display: &'a [String],
    protocols: Vec<ProtocolPayload<'a>>,
    is_active: bool,
}

impl HostSpec {
    /// Checks required fields before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the first offending attribute.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("address", &self.address)?;
        require_non_empty("platform", &self.platform)?;
        if self.protocols.is_empty() {
            return Err(ValidationError::EmptyList {
                field: String::from("protocols"),
            });
        }
        for (index, protocol) in self.protocols.iter().enumerate() {
            require_non_empty(format!("protocols[{index}].name"), &protocol.name)?;
        }
        Ok(())
    }

    /// Request body for `POST /api/v1/assets/hosts/`. New hosts are always
    /// created active.
    pub(crate) fn create_payload(&self) -> impl Serialize + '_ {
        CreateHostRequest {
            name: &self.name,
            address: &self.address,
            platform: &self.platform,
            nodes_display: &self.nodes_display,
            protocols: self
                .protocols
                .iter()
                .map(|protocol| ProtocolPayload {
                    name: &protocol.name,
                    port: protocol.port,
                })
                .collect(),
            is_active: true,
        }
    }
}

#[derive(Deserialize)]
struct CreatedResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Extracts the server-assigned identifier from a create response.
pub(crate) fn decode_created_id(body: &[u8]) -> Result<String, DecodeError> {
    let created: CreatedResponse = decode("host create", body)?;
    created
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or(DecodeError::MissingField {
            context: "host create",
            field: "id",
        })
}

/// Platform as returned by the API: either a bare name or an object.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
enum PlatformField {
    Name(String),
    Object { name: String },
}

impl PlatformField {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Object { name } => name,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct ProtocolRecord {
    name: String,
    #[serde(default)]
    port: Option<i64>,
}

/// Host as returned by `GET /api/v1/assets/hosts/{id}/`.
///
/// Every field is optional; absent fields leave the prior value untouched
/// when merged.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct HostRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    platform: Option<PlatformField>,
    #[serde(default)]
    nodes_display: Option<Vec<String>>,
    #[serde(default)]
    protocols: Option<Vec<ProtocolRecord>>,
}

impl HostRecord {
    /// Decodes a host detail response.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] when the body is not a JSON object
    /// or a known field has the wrong type.
    pub fn from_body(body: &[u8]) -> Result<Self, DecodeError> {
        decode("host read", body)
    }

    /// Overwrites the fields present in this record, leaving the rest as
    /// they were.
    pub fn merge_into(self, spec: &mut HostSpec) {
        if let Some(name) = self.name {
            spec.name = name;
        }
        if let Some(address) = self.ip.or(self.address) {
            spec.address = address;
        }
        if let Some(platform) = self.platform {
            spec.platform = platform.into_name();
        }
        if let Some(nodes) = self.nodes_display {
            spec.nodes_display = nodes;
        }
        if let Some(protocols) = self.protocols {
            spec.protocols = protocols
                .into_iter()
                .map(|record| Protocol::new(record.name, record.port))
                .collect();
        }
    }
}
