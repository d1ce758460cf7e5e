// ── Presentation filter ──
//
// Narrows a ranked device list without reordering it: substring match on
// the lower-cased name, exact match on provider and status.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;
use crate::model::{Device, Provider};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderFilter {
    #[default]
    All,
    Ewon,
    Ixon,
}

impl ProviderFilter {
    pub fn matches(self, provider: Provider) -> bool {
        match self {
            Self::All => true,
            Self::Ewon => provider == Provider::Ewon,
            Self::Ixon => provider == Provider::Ixon,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatusFilter {
    #[default]
    All,
    Online,
    Offline,
}

impl StatusFilter {
    pub fn matches(self, is_online: bool) -> bool {
        match self {
            Self::All => true,
            Self::Online => is_online,
            Self::Offline => !is_online,
        }
    }
}

/// Text query plus provider and status filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    query: String,
    pub provider: ProviderFilter,
    pub status: StatusFilter,
}

impl DeviceFilter {
    pub fn new(query: &str, provider: ProviderFilter, status: StatusFilter) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            provider,
            status,
        }
    }

    /// The normalized query (trimmed, lower-cased).
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self, device: &Device) -> bool {
        self.provider.matches(device.provider)
            && self.status.matches(device.is_online)
            && (self.query.is_empty() || device.name.to_lowercase().contains(&self.query))
    }

    /// Visible devices, in their ranked order.
    pub fn apply<'a>(&self, devices: &'a [Device]) -> Vec<&'a Device> {
        devices.iter().filter(|d| self.matches(d)).collect()
    }
}

/// Look a device up by id, `provider:id` key, or exact name (case-insensitive).
///
/// Id matches win over name matches.
pub fn find_device<'a>(devices: &'a [Device], identifier: &str) -> Result<&'a Device, CoreError> {
    let identifier = identifier.trim();
    devices
        .iter()
        .find(|d| d.id == identifier || d.key().to_string() == identifier)
        .or_else(|| {
            devices
                .iter()
                .find(|d| d.name.eq_ignore_ascii_case(identifier))
        })
        .ok_or_else(|| CoreError::DeviceNotFound {
            identifier: identifier.to_owned(),
        })
}
