// ── Provider-to-domain conversions ──
//
// Bridges raw `fleetview_api` records into the canonical `Device`. Pure:
// no I/O, no clock. Each provider has one liveness predicate and one
// link builder; offline devices get no session-dependent URLs.

use fleetview_api::ewon::{RawEwon, RawLanDevice};
use fleetview_api::ixon::{RawAgent, RawDashboardRef, RawServer};
use tracing::{debug, warn};
use url::Url;

use crate::config::LinkTemplates;
use crate::error::CoreError;
use crate::model::{DashboardLink, Device, Link, Provider};

const EWON_ONLINE: &str = "online";

/// A raw provider record, tagged with the provider it came from.
#[derive(Debug, Clone)]
pub enum RawDeviceRecord {
    Ewon(RawEwon),
    Ixon(RawAgent),
}

impl RawDeviceRecord {
    /// Liveness as reported by the provider. Unknown resolves to offline.
    pub fn is_online(&self) -> bool {
        match self {
            Self::Ewon(ewon) => ewon_is_online(ewon),
            Self::Ixon(agent) => agent.is_online(),
        }
    }
}

impl From<RawEwon> for RawDeviceRecord {
    fn from(ewon: RawEwon) -> Self {
        Self::Ewon(ewon)
    }
}

impl From<RawAgent> for RawDeviceRecord {
    fn from(agent: RawAgent) -> Self {
        Self::Ixon(agent)
    }
}

// ── Normalization ──────────────────────────────────────────────────

/// Map one raw record into a canonical `Device`.
///
/// Fails only when the record has no usable identifier. Missing optional
/// lists are already empty at this point.
pub fn normalize(record: &RawDeviceRecord, templates: &LinkTemplates) -> Result<Device, CoreError> {
    match record {
        RawDeviceRecord::Ewon(ewon) => normalize_ewon(ewon, templates),
        RawDeviceRecord::Ixon(agent) => normalize_agent(agent, templates),
    }
}

/// Normalize a batch, dropping malformed records with a warning.
pub fn normalize_batch<I>(records: I, templates: &LinkTemplates) -> Vec<Device>
where
    I: IntoIterator<Item = RawDeviceRecord>,
{
    records
        .into_iter()
        .filter_map(|record| match normalize(&record, templates) {
            Ok(device) => Some(device),
            Err(e) => {
                warn!(error = %e, "dropping malformed device record");
                None
            }
        })
        .collect()
}

fn malformed(provider: Provider, reason: &str) -> CoreError {
    CoreError::MalformedRecord {
        provider: provider.to_string(),
        reason: reason.into(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ── Ewon ───────────────────────────────────────────────────────────

fn normalize_ewon(ewon: &RawEwon, templates: &LinkTemplates) -> Result<Device, CoreError> {
    let id = ewon
        .id
        .as_ref()
        .map(ToString::to_string)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| malformed(Provider::Ewon, "missing id"))?;
    let name = non_empty(ewon.name.as_deref()).unwrap_or(&id).to_owned();
    let is_online = ewon_is_online(ewon);

    let links = ewon
        .lan_devices
        .iter()
        .map(|lan| Link {
            name: lan_label(lan),
            url: if is_online {
                vnc_tunnel_url(&name, lan, templates)
            } else {
                None
            },
        })
        .collect();

    Ok(Device {
        id,
        name,
        provider: Provider::Ewon,
        is_online,
        links,
        data_monitors: Vec::new(),
        data_reports: Vec::new(),
        recent_errors: None,
    })
}

fn ewon_is_online(ewon: &RawEwon) -> bool {
    ewon.status.as_deref() == Some(EWON_ONLINE)
}

fn lan_label(lan: &RawLanDevice) -> String {
    non_empty(lan.name.as_deref())
        .or_else(|| non_empty(lan.ip.as_deref()))
        .unwrap_or("VNC")
        .to_owned()
}

/// `{m2web}/{account}/{ewon}/vnc/{ip}:{port}`; the port is left off when unknown.
fn vnc_tunnel_url(ewon_name: &str, lan: &RawLanDevice, templates: &LinkTemplates) -> Option<String> {
    let ip = non_empty(lan.ip.as_deref())?;
    let target = match lan.port_text() {
        Some(port) => format!("{ip}:{port}"),
        None => ip.to_owned(),
    };
    templates.m2web(&[ewon_name, "vnc", &target])
}

// ── Ixon ───────────────────────────────────────────────────────────

fn normalize_agent(agent: &RawAgent, templates: &LinkTemplates) -> Result<Device, CoreError> {
    let id = non_empty(agent.public_id.as_deref())
        .ok_or_else(|| malformed(Provider::Ixon, "missing publicId"))?
        .to_owned();
    let name = non_empty(agent.name.as_deref()).unwrap_or(&id).to_owned();
    let is_online = agent.is_online();

    let links = agent
        .servers
        .iter()
        .map(|server| Link {
            name: server_label(server),
            url: if is_online {
                server_url(&id, server, templates)
            } else {
                None
            },
        })
        .collect();

    Ok(Device {
        data_monitors: dashboards(&id, "data-monitors", &agent.data_monitors, templates),
        data_reports: dashboards(&id, "data-reports", &agent.data_reports, templates),
        id,
        name,
        provider: Provider::Ixon,
        is_online,
        links,
        recent_errors: None,
    })
}

fn server_label(server: &RawServer) -> String {
    non_empty(server.name.as_deref())
        .or_else(|| non_empty(server.kind.as_deref()))
        .unwrap_or("Server")
        .to_owned()
}

/// HTTP servers use the pre-resolved web-access URL, VNC servers the portal
/// viewer. Other server types have no link.
fn server_url(agent_id: &str, server: &RawServer, templates: &LinkTemplates) -> Option<String> {
    if server.is_http() {
        let raw = server.web_access_url.as_deref()?;
        return match Url::parse(raw) {
            Ok(url) => Some(url.into()),
            Err(e) => {
                debug!(agent_id, error = %e, "dropping unparseable web access url");
                None
            }
        };
    }
    if server.is_vnc() {
        let server_id = non_empty(server.public_id.as_deref())?;
        return Some(templates.ixon(&[
            "portal",
            "devices",
            agent_id,
            "web-access",
            "vnc",
            server_id,
        ]));
    }
    None
}

fn dashboards(
    agent_id: &str,
    kind: &str,
    refs: &[RawDashboardRef],
    templates: &LinkTemplates,
) -> Vec<DashboardLink> {
    refs.iter()
        .filter_map(|r| {
            let Some(ref_id) = non_empty(r.public_id.as_deref()) else {
                debug!(agent_id, kind, "skipping dashboard without publicId");
                return None;
            };
            Some(DashboardLink {
                name: non_empty(r.name.as_deref()).unwrap_or(ref_id).to_owned(),
                url: templates.ixon(&["agents", agent_id, kind, ref_id]),
            })
        })
        .collect()
}
