// ── Device domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Upstream backend a device was fetched from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[non_exhaustive]
pub enum Provider {
    Ewon,
    Ixon,
}

/// Global identity of a device: ids are only unique within a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceKey {
    pub provider: Provider,
    pub id: String,
}

impl std::fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.id)
    }
}

/// An interactive endpoint on a device.
///
/// `url` is `None` when the device is offline or the endpoint could not be
/// resolved. Consumers must not navigate to a missing url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub url: Option<String>,
}

impl Link {
    pub fn is_navigable(&self) -> bool {
        self.url.is_some()
    }
}

/// A supplementary dashboard (data monitor or data report).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardLink {
    pub name: String,
    pub url: String,
}

/// Canonical device, normalized from either provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub provider: Provider,
    pub is_online: bool,
    /// Provider order is preserved.
    pub links: Vec<Link>,
    pub data_monitors: Vec<DashboardLink>,
    pub data_reports: Vec<DashboardLink>,
    /// Summed error count for the recent window. `None` means no error data,
    /// which is distinct from `Some(0)`.
    pub recent_errors: Option<u64>,
}

impl Device {
    pub fn key(&self) -> DeviceKey {
        DeviceKey {
            provider: self.provider,
            id: self.id.clone(),
        }
    }

    /// Number of links that can actually be opened.
    pub fn navigable_links(&self) -> usize {
        self.links.iter().filter(|l| l.is_navigable()).count()
    }
}
