// Ewon Talk2M client modules
//
// Form-encoded POST API at `m2web.talk2m.com/t2mapi`. Every response is a
// JSON object carrying a `success` flag; failures come back as HTTP 200
// with `success: false` as often as with an error status.

pub mod client;
pub mod models;

pub use client::EwonClient;
pub use models::{RawEwon, RawId, RawLanDevice};
