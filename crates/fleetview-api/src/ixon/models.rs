// Ixon Cloud wire types
//
// Responses use a `{ "type": ..., "data": ... }` envelope. Agent records
// are decoded leniently: identity fields are optional and list fields
// tolerate `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::null_as_empty;

/// Generic `{ data }` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// An Ixon agent (IXrouter or software agent).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAgent {
    pub public_id: Option<String>,
    pub name: Option<String>,
    /// Present and non-null while the agent holds a VPN session.
    pub active_vpn_session: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub servers: Vec<RawServer>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data_monitors: Vec<RawDashboardRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data_reports: Vec<RawDashboardRef>,
}

impl RawAgent {
    pub fn is_online(&self) -> bool {
        self.active_vpn_session.is_some()
    }
}

/// A web-access server configured on an agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawServer {
    pub public_id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Proxied URL filled in by `IxonClient::resolve_web_access`.
    #[serde(skip)]
    pub web_access_url: Option<String>,
}

impl RawServer {
    pub fn is_http(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("http"))
    }

    pub fn is_vnc(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("vnc"))
    }
}

/// A data monitor or data report attached to an agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDashboardRef {
    pub public_id: Option<String>,
    pub name: Option<String>,
}

/// Signed-in user as returned by the `MyUser` relation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub public_id: Option<String>,
    pub name: Option<String>,
    pub email_address: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessToken {
    pub secret_id: Option<String>,
    pub public_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Role {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Permission {
    pub public_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct WebAccessRequest<'a> {
    pub server: ServerRef<'a>,
    pub method: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServerRef<'a> {
    pub public_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WebAccessGrant {
    pub url: Option<String>,
}
