// ── Ranking engine ──
//
// Deterministic ordering of the merged device collection. Both modes use
// a stable sort, so devices with equal keys keep their merged order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::Device;

/// Selectable ordering for the device list.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortKey {
    /// Online devices first, each partition by name.
    #[default]
    Alphabetical,
    /// Most recent errors first. Zero and unknown counts rank equal, last.
    Errors,
}

/// Reorder `devices` in place.
pub fn rank(devices: &mut [Device], key: SortKey) {
    match key {
        SortKey::Alphabetical => devices.sort_by(alphabetical),
        SortKey::Errors => devices.sort_by(by_errors),
    }
}

fn alphabetical(a: &Device, b: &Device) -> Ordering {
    b.is_online
        .cmp(&a.is_online)
        .then_with(|| a.name.cmp(&b.name))
}

/// Descending by error count; `Some(0)` and `None` share the lowest rank.
fn by_errors(a: &Device, b: &Device) -> Ordering {
    error_weight(b).cmp(&error_weight(a))
}

fn error_weight(device: &Device) -> u64 {
    device.recent_errors.unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Provider;

    fn device(id: &str, name: &str, is_online: bool, recent_errors: Option<u64>) -> Device {
        Device {
            id: id.into(),
            name: name.into(),
            provider: Provider::Ixon,
            is_online,
            links: Vec::new(),
            data_monitors: Vec::new(),
            data_reports: Vec::new(),
            recent_errors,
        }
    }

    fn ids(devices: &[Device]) -> Vec<&str> {
        devices.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn alphabetical_partitions_online_first() {
        let mut devices = vec![
            device("1", "Alpha", false, None),
            device("2", "Zulu", true, None),
            device("3", "Bravo", true, None),
            device("4", "Aardvark", false, None),
        ];

        rank(&mut devices, SortKey::Alphabetical);

        assert_eq!(ids(&devices), vec!["3", "2", "4", "1"]);
        let first_offline = devices.iter().position(|d| !d.is_online).unwrap();
        assert!(devices[first_offline..].iter().all(|d| !d.is_online));
    }

    #[test]
    fn alphabetical_ties_keep_merged_order() {
        let mut devices = vec![
            device("ewon-1", "Press", true, None),
            device("ixon-1", "Press", true, None),
        ];
        rank(&mut devices, SortKey::Alphabetical);
        assert_eq!(ids(&devices), vec!["ewon-1", "ixon-1"]);
    }

    #[test]
    fn errors_descending_with_zero_equal_to_unknown() {
        let mut devices = vec![
            device("zero", "A", true, Some(0)),
            device("null", "B", true, None),
            device("five", "C", true, Some(5)),
            device("nine", "D", false, Some(9)),
        ];

        rank(&mut devices, SortKey::Errors);

        assert_eq!(ids(&devices), vec!["nine", "five", "zero", "null"]);

        let mut swapped = vec![
            device("null", "B", true, None),
            device("zero", "A", true, Some(0)),
            device("five", "C", true, Some(5)),
        ];
        rank(&mut swapped, SortKey::Errors);
        assert_eq!(ids(&swapped), vec!["five", "null", "zero"]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let mut devices = vec![
            device("1", "b", false, Some(2)),
            device("2", "a", true, None),
            device("3", "c", true, Some(2)),
        ];
        rank(&mut devices, SortKey::Errors);
        let once = devices.clone();
        rank(&mut devices, SortKey::Errors);
        assert_eq!(devices, once);
    }

    #[test]
    fn sort_key_parses_from_text() {
        assert_eq!(SortKey::from_str("errors").unwrap(), SortKey::Errors);
        assert_eq!(
            SortKey::from_str("Alphabetical").unwrap(),
            SortKey::Alphabetical
        );
        assert!(SortKey::from_str("random").is_err());
    }
}
