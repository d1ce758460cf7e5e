// Ixon Cloud client modules
//
// Link-driven JSON API. Endpoints are resolved through the discovery
// cache; operations are implemented as inherent methods on `IxonClient`
// in separate files so `client.rs` stays focused on transport mechanics.

pub mod agents;
pub mod auth;
pub mod client;
pub mod discovery;
pub mod models;

pub use client::IxonClient;
pub use discovery::{DiscoveryCache, LinkTable};
pub use models::{RawAgent, RawDashboardRef, RawServer, UserProfile};

/// Relation names the client depends on.
pub mod rel {
    pub const ACCESS_TOKEN_LIST: &str = "AccessTokenList";
    pub const AGENT_LIST: &str = "AgentList";
    pub const MY_USER: &str = "MyUser";
    pub const ROLE_LIST: &str = "RoleList";
    pub const WEB_ACCESS: &str = "WebAccess";
}
