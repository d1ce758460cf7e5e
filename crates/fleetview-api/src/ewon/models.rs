// Talk2M wire types
//
// Deliberately lenient: identity fields are optional so a record missing
// them still decodes and the normalizer can reject it individually.

use serde::Deserialize;
use serde_json::Value;

use crate::decode::null_as_empty;

/// Talk2M identifiers arrive as numbers, some proxies stringify them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for RawId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One Ewon gateway as returned by `getewons`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEwon {
    pub id: Option<RawId>,
    pub name: Option<String>,
    /// `"online"`, `"offline"`, or absent.
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub lan_devices: Vec<RawLanDevice>,
}

/// A device behind the gateway reachable through an m2web VNC tunnel.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLanDevice {
    pub name: Option<String>,
    pub ip: Option<String>,
    pub port: Option<Value>,
}

impl RawLanDevice {
    /// Port as text, accepting both numeric and string encodings.
    pub fn port_text(&self) -> Option<String> {
        match self.port.as_ref()? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

/// Common envelope fields on every Talk2M response.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default = "default_success")]
    pub success: bool,
    pub message: Option<String>,
    pub code: Option<Value>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub t2msession: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EwonsResponse {
    #[serde(default)]
    pub ewons: Vec<Value>,
}
