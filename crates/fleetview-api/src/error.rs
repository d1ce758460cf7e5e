use thiserror::Error;

/// Top-level error type for the `fleetview-api` crate.
///
/// Covers every failure mode across both provider surfaces and the
/// error-log source. `fleetview-core` maps these into user-facing variants.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials were rejected or the sign-in response was unusable.
    /// Never carries the submitted credentials.
    #[error("{provider} sign in failed: {message}")]
    SignInFailed {
        provider: &'static str,
        message: String,
    },

    /// Session token expired or was revoked.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Discovery ───────────────────────────────────────────────────
    /// Link catalog could not be fetched or decoded.
    #[error("Discovery failed: {message}")]
    DiscoveryFailed { message: String },

    /// An operation needs a relation that is not in the current catalog.
    #[error("Relation '{rel}' not present in link catalog -- run discovery first")]
    MissingRelation { rel: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success HTTP status from a provider.
    #[error("{provider} API error (HTTP {status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// HTTP 200 with an explicit `success: false` payload.
    #[error("{provider} rejected the request: {message}")]
    Rejected {
        provider: &'static str,
        message: String,
    },

    /// Web-access resolution for HTTP servers failed or came back short.
    #[error("Web access resolution failed: {message}")]
    WebAccess { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for failures of the link-catalog layer.
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            Self::DiscoveryFailed { .. } | Self::MissingRelation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_relation_is_a_discovery_error() {
        let err = Error::MissingRelation {
            rel: "AgentList".into(),
        };
        assert!(err.is_discovery());
        assert!(err.to_string().contains("AgentList"));
    }
}
