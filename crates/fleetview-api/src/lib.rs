// fleetview-api: Async Rust clients for the Ewon Talk2M and Ixon Cloud APIs

pub mod auth;
mod decode;
pub mod error;
pub mod error_log;
pub mod ewon;
pub mod ixon;
pub mod retry;
pub mod transport;

pub use auth::{Credentials, Session};
pub use error::Error;
pub use error_log::{ErrorLogClient, ErrorRow};
pub use ewon::EwonClient;
pub use ixon::{DiscoveryCache, IxonClient};
pub use retry::RetryPolicy;
pub use transport::{TlsMode, TransportConfig};
