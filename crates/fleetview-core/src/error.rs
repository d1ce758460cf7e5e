// ── Core error types ──
//
// User-facing errors from fleetview-core. Consumers never see raw HTTP
// bodies or JSON parse failures; the `From<fleetview_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Discovery failed: {message}")]
    DiscoveryFailed { message: String },

    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Aggregation errors ───────────────────────────────────────────
    /// A single provider pipeline failed. Absorbed by the aggregator
    /// unless every provider fails.
    #[error("{provider} device fetch failed: {message}")]
    ProviderFailed { provider: String, message: String },

    /// Every provider fetch failed, or none was attempted.
    #[error("No session retrieved: no provider returned devices")]
    NoSessionRetrieved,

    /// A raw record lacked a required identity field.
    #[error("Malformed {provider} record: {reason}")]
    MalformedRecord { provider: String, reason: String },

    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether signing in again could resolve this error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fleetview_api::Error> for CoreError {
    fn from(err: fleetview_api::Error) -> Self {
        use fleetview_api::Error as ApiError;

        match err {
            ApiError::SignInFailed { provider, message } => CoreError::AuthenticationFailed {
                message: format!("{provider}: {message}"),
            },
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::Api {
                status: 401,
                provider,
                ..
            } => CoreError::AuthenticationFailed {
                message: format!("{provider} session expired"),
            },
            ApiError::DiscoveryFailed { message } => CoreError::DiscoveryFailed { message },
            ApiError::MissingRelation { rel } => CoreError::DiscoveryFailed {
                message: format!("relation '{rel}' missing from link catalog"),
            },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api {
                provider,
                status,
                message,
            } => CoreError::Api {
                message: format!("{provider}: {message}"),
                status: Some(status),
            },
            ApiError::Rejected { provider, message } => CoreError::ProviderFailed {
                provider: provider.into(),
                message,
            },
            ApiError::WebAccess { message } => CoreError::ProviderFailed {
                provider: "ixon".into(),
                message: format!("web access: {message}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_failure_becomes_authentication() {
        let err: CoreError = fleetview_api::Error::SignInFailed {
            provider: "ixon",
            message: "credentials rejected".into(),
        }
        .into();
        assert!(err.is_auth());
        assert!(err.to_string().contains("ixon"));
    }

    #[test]
    fn unauthorized_api_status_becomes_authentication() {
        let err: CoreError = fleetview_api::Error::Api {
            provider: "ewon",
            status: 401,
            message: String::new(),
        }
        .into();
        assert!(err.is_auth());
    }

    #[test]
    fn missing_relation_is_a_discovery_failure() {
        let err: CoreError = fleetview_api::Error::MissingRelation {
            rel: "AgentList".into(),
        }
        .into();
        assert!(matches!(err, CoreError::DiscoveryFailed { .. }));
    }
}
