//! Aggregation layer between `fleetview-api` and presentation consumers.
//!
//! - **[`Dashboard`]** owns one client per provider and runs the session
//!   lifecycle: [`connect()`](Dashboard::connect) performs startup discovery,
//!   [`sign_in()`](Dashboard::sign_in) yields [`Sessions`], and
//!   [`load_devices()`](Dashboard::load_devices) runs one aggregation pass.
//!
//! - **Normalizer** ([`convert`]) maps each [`RawDeviceRecord`] variant into
//!   the canonical [`Device`].
//!
//! - **Aggregator** ([`aggregate`]) runs provider fetches and the error-log
//!   source concurrently, tolerates partial failure, merges by identity and
//!   attaches summed error counts.
//!
//! - **Ranking** ([`rank`]) and **filtering** ([`filter`]) order and narrow
//!   the merged collection for display.

pub mod aggregate;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod model;
pub mod rank;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregate::{ProviderFetch, aggregate};
pub use config::{
    DashboardConfig, EwonSettings, IxonSettings, LinkTemplates, PermissionPolicy, TlsVerification,
};
pub use convert::{RawDeviceRecord, normalize, normalize_batch};
pub use dashboard::{Dashboard, SessionHealth, Sessions};
pub use error::CoreError;
pub use filter::{DeviceFilter, ProviderFilter, StatusFilter, find_device};
pub use model::{DashboardLink, Device, DeviceKey, Link, Provider};
pub use rank::{SortKey, rank};

// Credential and session types pass straight through from the API crate.
pub use fleetview_api::{Credentials, ErrorRow, RetryPolicy, Session, ixon::UserProfile};
