//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use fleetview_config::ConfigError;
use fleetview_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNAVAILABLE: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(fleetview::connection_failed),
        help(
            "Check network access to the provider.\n\
             Reason: {reason}\n\
             Self-signed endpoints need --insecure (-k) or defaults.ca_cert."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(fleetview::timeout),
        help("Raise the limit with --timeout <SECS> or defaults.timeout.")
    )]
    Timeout,

    #[error("Ixon link discovery failed: {message}")]
    #[diagnostic(
        code(fleetview::discovery_failed),
        help(
            "The Ixon API catalog could not be fetched.\n\
             Check ixon.discovery_url and ixon.application_id."
        )
    )]
    DiscoveryFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(fleetview::auth_failed),
        help(
            "Verify the username and password.\n\
             Accounts with two-factor authentication need --otp <CODE>."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for {provider}")]
    #[diagnostic(
        code(fleetview::no_credentials),
        help(
            "Set the username in the config file or with --username,\n\
             and the password in FLEETVIEW_{env}_PASSWORD, the system keyring,\n\
             or the config file."
        )
    )]
    NoCredentials { provider: String, env: String },

    // ── Aggregation ──────────────────────────────────────────────────
    #[error("No provider returned devices")]
    #[diagnostic(
        code(fleetview::no_session),
        help("Every provider fetch failed. Re-run with -v to see each failure.")
    )]
    NoSessionRetrieved,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(fleetview::not_found),
        help("Run: fleetview {list_command}")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(fleetview::config),
        help("Inspect the effective settings with: fleetview config show")
    )]
    Config { message: String },

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(fleetview::validation))]
    Validation { field: String, reason: String },

    // ── Upstream & internal ──────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(fleetview::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("Failed to render output: {message}")]
    #[diagnostic(code(fleetview::output))]
    Output { message: String },

    #[error(transparent)]
    #[diagnostic(code(fleetview::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::DiscoveryFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. }
            | Self::ApiError {
                status: Some(404), ..
            } => exit_code::NOT_FOUND,
            Self::NoSessionRetrieved => exit_code::UNAVAILABLE,
            Self::Config { .. } | Self::Validation { .. } => exit_code::USAGE,
            Self::ApiError { .. } | Self::Output { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout => CliError::Timeout,

            CoreError::DiscoveryFailed { message } => CliError::DiscoveryFailed { message },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::NoSessionRetrieved => CliError::NoSessionRetrieved,

            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Api { message, status } => CliError::ApiError { message, status },

            err @ (CoreError::ProviderFailed { .. }
            | CoreError::MalformedRecord { .. }
            | CoreError::Internal(_)) => CliError::ApiError {
                message: err.to_string(),
                status: None,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { provider } => CliError::NoCredentials {
                env: provider.to_uppercase(),
                provider,
            },
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::AuthenticationFailed {
                    message: "ixon: rejected".into(),
                },
                exit_code::AUTH,
            ),
            (CoreError::Timeout, exit_code::TIMEOUT),
            (CoreError::NoSessionRetrieved, exit_code::UNAVAILABLE),
            (
                CoreError::DeviceNotFound {
                    identifier: "boiler".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::DiscoveryFailed {
                    message: "503".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::Internal("boom".into()),
                exit_code::GENERAL,
            ),
        ];

        for (core, expected) in cases {
            let cli = CliError::from(core);
            assert_eq!(cli.exit_code(), expected, "{cli}");
        }
    }

    #[test]
    fn missing_ewon_password_names_env_var() {
        let cli = CliError::from(ConfigError::NoCredentials {
            provider: "ewon".into(),
        });
        assert_eq!(cli.exit_code(), exit_code::AUTH);
        let CliError::NoCredentials { env, .. } = cli else {
            panic!("expected NoCredentials");
        };
        assert_eq!(env, "EWON");
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let cli = CliError::from(ConfigError::Missing {
            field: "ixon.company_id".into(),
        });
        assert_eq!(cli.exit_code(), exit_code::USAGE);
        assert!(cli.to_string().contains("ixon.company_id"));
    }
}
