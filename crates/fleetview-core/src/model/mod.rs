// ── Domain model ──
//
// Canonical, provider-agnostic types produced by the normalizer and
// consumed by ranking, filtering and presentation.

pub mod device;

pub use device::{DashboardLink, Device, DeviceKey, Link, Provider};
