//! Configuration for the fleetview CLI.
//!
//! TOML file + `FLEETVIEW_` environment overlay, credential resolution
//! (env + keyring + plaintext), and translation to
//! `fleetview_core::DashboardConfig`. The core never reads files itself.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use fleetview_core::{
    Credentials, DashboardConfig, EwonSettings, IxonSettings, PermissionPolicy, RetryPolicy,
    SortKey, TlsVerification,
};

const KEYRING_SERVICE: &str = "fleetview";
const ENV_PREFIX: &str = "FLEETVIEW_";
const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("missing required setting '{field}'")]
    Missing { field: String },

    #[error("no credentials configured for {provider}")]
    NoCredentials { provider: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub ixon: IxonSection,

    /// Absent section disables the Ewon provider.
    pub ewon: Option<EwonSection>,

    #[serde(default)]
    pub error_log: ErrorLogSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// `alphabetical` or `errors`.
    #[serde(default = "default_sort")]
    pub sort: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            ca_cert: None,
            timeout: default_timeout(),
            sort: default_sort(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_sort() -> String {
    SortKey::default().to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IxonSection {
    /// `Api-Application` header value.
    #[serde(default)]
    pub application_id: String,

    /// `Api-Company` header value.
    #[serde(default)]
    pub company_id: String,

    #[serde(default = "default_discovery_url")]
    pub discovery_url: String,

    #[serde(default = "default_portal_url")]
    pub portal_url: String,

    /// Pre-filled sign-in user for the CLI.
    pub username: Option<String>,

    /// Plaintext password (prefer keyring or env var).
    pub password: Option<String>,

    #[serde(default = "default_ixon_ttl")]
    pub session_ttl_secs: u64,

    /// Startup discovery attempts before giving up.
    #[serde(default = "default_discovery_attempts")]
    pub discovery_attempts: u32,
}

impl Default for IxonSection {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            company_id: String::new(),
            discovery_url: default_discovery_url(),
            portal_url: default_portal_url(),
            username: None,
            password: None,
            session_ttl_secs: default_ixon_ttl(),
            discovery_attempts: default_discovery_attempts(),
        }
    }
}

fn default_discovery_url() -> String {
    "https://portal.ixon.cloud/api/".into()
}
fn default_portal_url() -> String {
    "https://portal.ixon.cloud".into()
}
fn default_ixon_ttl() -> u64 {
    3600
}
fn default_discovery_attempts() -> u32 {
    5
}

/// Talk2M service account. The dashboard signs in with these on behalf of
/// users the permission policy admits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EwonSection {
    pub account: String,

    /// Talk2M developer id (plaintext; prefer keyring or env var).
    pub developer_id: Option<String>,

    pub username: String,

    /// Plaintext password (prefer keyring or env var).
    pub password: Option<String>,

    #[serde(default = "default_ewon_api_url")]
    pub api_url: String,

    #[serde(default = "default_m2web_url")]
    pub m2web_url: String,

    /// Account segment in m2web VNC links. Defaults to `account`.
    pub m2web_account: Option<String>,

    #[serde(default = "default_ewon_ttl")]
    pub session_ttl_secs: u64,

    /// Ixon permission required for Ewon access. `*` admits everyone.
    #[serde(default = "default_required_permission")]
    pub required_permission: String,

    /// Keep-alive probe interval used by `devices watch`.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

fn default_ewon_api_url() -> String {
    "https://m2web.talk2m.com/t2mapi".into()
}
fn default_m2web_url() -> String {
    "https://eu2.m2web.talk2m.com".into()
}
fn default_ewon_ttl() -> u64 {
    60
}
fn default_required_permission() -> String {
    PermissionPolicy::COMPANY_WIDE_ROLE.into()
}
fn default_keep_alive() -> u64 {
    300
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ErrorLogSection {
    /// Recent-errors endpoint returning `[{agentId, numberOfErrors}]`.
    pub url: Option<String>,
}

impl Config {
    /// Parsed default sort key.
    pub fn sort_key(&self) -> Result<SortKey, ConfigError> {
        SortKey::from_str(&self.defaults.sort).map_err(|_| ConfigError::Validation {
            field: "defaults.sort".into(),
            reason: format!(
                "expected 'alphabetical' or 'errors', got '{}'",
                self.defaults.sort
            ),
        })
    }

    /// Copy with every secret replaced, safe to print.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.ixon.password.is_some() {
            copy.ixon.password = Some(REDACTED.into());
        }
        if let Some(ewon) = copy.ewon.as_mut() {
            if ewon.password.is_some() {
                ewon.password = Some(REDACTED.into());
            }
            if ewon.developer_id.is_some() {
                ewon.developer_id = Some(REDACTED.into());
            }
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "fleetview", "fleetview").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fleetview");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from an explicit file + environment. A missing file is not an error.
///
/// Environment keys nest with a double underscore:
/// `FLEETVIEW_IXON__COMPANY_ID` sets `ixon.company_id`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Look a secret up: env var, then system keyring, then plaintext config.
fn resolve_secret(env_var: &str, keyring_user: &str, plaintext: Option<&str>) -> Option<SecretString> {
    // 1. Env var
    if let Ok(val) = std::env::var(env_var) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, keyring_user) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|p| SecretString::from(p.to_owned()))
}

/// Ixon password for `username`, if stored anywhere. `None` means prompt.
pub fn resolve_ixon_password(section: &IxonSection, username: &str) -> Option<SecretString> {
    resolve_secret(
        "FLEETVIEW_IXON_PASSWORD",
        &format!("ixon/{username}"),
        section.password.as_deref(),
    )
}

/// Talk2M service credentials and developer id.
pub fn resolve_ewon_secrets(
    section: &EwonSection,
) -> Result<(Credentials, SecretString), ConfigError> {
    let password = resolve_secret(
        "FLEETVIEW_EWON_PASSWORD",
        &format!("ewon/{}", section.username),
        section.password.as_deref(),
    )
    .ok_or_else(|| ConfigError::NoCredentials {
        provider: "ewon".into(),
    })?;

    let developer_id = resolve_secret(
        "FLEETVIEW_EWON_DEVELOPER_ID",
        "ewon/developer-id",
        section.developer_id.as_deref(),
    )
    .ok_or_else(|| ConfigError::Missing {
        field: "ewon.developer_id".into(),
    })?;

    let credentials = Credentials {
        username: section.username.clone(),
        password,
        otp: None,
    };
    Ok((credentials, developer_id))
}

// ── Translation to DashboardConfig ──────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: field.into(),
        });
    }
    Ok(())
}

fn permission_policy(required: &str) -> PermissionPolicy {
    match required.trim() {
        "*" => PermissionPolicy::allow_all(),
        permission => PermissionPolicy::require(permission),
    }
}

/// Build a `DashboardConfig`. Secrets are resolved here; the Ixon user
/// password is not, since it belongs to the sign-in step.
pub fn to_dashboard_config(cfg: &Config) -> Result<DashboardConfig, ConfigError> {
    require("ixon.application_id", &cfg.ixon.application_id)?;
    require("ixon.company_id", &cfg.ixon.company_id)?;

    let mut dashboard = DashboardConfig::new(IxonSettings {
        discovery_url: parse_url("ixon.discovery_url", &cfg.ixon.discovery_url)?,
        application_id: cfg.ixon.application_id.clone(),
        company_id: cfg.ixon.company_id.clone(),
        portal_url: parse_url("ixon.portal_url", &cfg.ixon.portal_url)?,
        session_ttl: Duration::from_secs(cfg.ixon.session_ttl_secs),
    });

    if let Some(ref ewon) = cfg.ewon {
        require("ewon.account", &ewon.account)?;
        require("ewon.username", &ewon.username)?;
        let (credentials, developer_id) = resolve_ewon_secrets(ewon)?;
        dashboard.ewon = Some(EwonSettings {
            api_url: parse_url("ewon.api_url", &ewon.api_url)?,
            account: ewon.account.clone(),
            developer_id,
            credentials,
            session_ttl: Duration::from_secs(ewon.session_ttl_secs),
            m2web_url: parse_url("ewon.m2web_url", &ewon.m2web_url)?,
            m2web_account: ewon
                .m2web_account
                .clone()
                .unwrap_or_else(|| ewon.account.clone()),
        });
        dashboard.permission_policy = permission_policy(&ewon.required_permission);
    }

    dashboard.error_log_url = cfg
        .error_log
        .url
        .as_deref()
        .map(|raw| parse_url("error_log.url", raw))
        .transpose()?;

    dashboard.tls = if cfg.defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = cfg.defaults.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    dashboard.timeout = Duration::from_secs(cfg.defaults.timeout);
    dashboard.discovery_retry = RetryPolicy {
        max_attempts: cfg.ixon.discovery_attempts,
        ..RetryPolicy::default()
    };

    Ok(dashboard)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const FULL: &str = r#"
        [defaults]
        sort = "errors"
        timeout = 10

        [ixon]
        application_id = "app-123"
        company_id = "company-9"
        username = "operator"

        [ewon]
        account = "PlantRemote"
        developer_id = "dev-id"
        username = "service"
        password = "service-pw"
        required_permission = "*"

        [error_log]
        url = "https://errors.example.com/recent"
    "#;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.defaults.output, "table");
        assert_eq!(config.ixon.discovery_url, "https://portal.ixon.cloud/api/");
        assert!(config.ewon.is_none());
        assert_eq!(config.sort_key().unwrap(), SortKey::Alphabetical);
    }

    #[test]
    fn full_file_translates_to_dashboard_config() {
        let file = write_config(FULL);
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.sort_key().unwrap(), SortKey::Errors);

        let dashboard = to_dashboard_config(&config).unwrap();
        assert_eq!(dashboard.ixon.company_id, "company-9");
        assert_eq!(dashboard.ixon.session_ttl, Duration::from_secs(3600));
        assert_eq!(dashboard.timeout, Duration::from_secs(10));
        assert_eq!(dashboard.tls, TlsVerification::SystemDefaults);

        let ewon = dashboard.ewon.as_ref().unwrap();
        assert_eq!(ewon.m2web_account, "PlantRemote");
        assert_eq!(ewon.api_url.as_str(), "https://m2web.talk2m.com/t2mapi");
        assert_eq!(ewon.session_ttl, Duration::from_secs(60));
        assert!(dashboard.permission_policy.allows(&[]));
        assert_eq!(
            dashboard.error_log_url.as_ref().map(Url::as_str),
            Some("https://errors.example.com/recent")
        );
    }

    #[test]
    fn missing_company_is_reported() {
        let file = write_config("[ixon]\napplication_id = \"app\"\n");
        let config = load_config_from(file.path()).unwrap();
        let err = to_dashboard_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref field } if field == "ixon.company_id"));
    }

    #[test]
    fn bad_url_is_a_validation_error() {
        let file = write_config(
            "[ixon]\napplication_id = \"a\"\ncompany_id = \"c\"\nportal_url = \"not a url\"\n",
        );
        let config = load_config_from(file.path()).unwrap();
        assert!(matches!(
            to_dashboard_config(&config),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn bad_sort_is_a_validation_error() {
        let file = write_config("[defaults]\nsort = \"random\"\n");
        let config = load_config_from(file.path()).unwrap();
        assert!(config.sort_key().is_err());
    }

    #[test]
    fn ewon_secrets_resolve_from_plaintext() {
        let section = EwonSection {
            account: "acct".into(),
            developer_id: Some("dev-plain".into()),
            username: "fleetview-test-nobody".into(),
            password: Some("pw-plain".into()),
            api_url: default_ewon_api_url(),
            m2web_url: default_m2web_url(),
            m2web_account: None,
            session_ttl_secs: 60,
            required_permission: default_required_permission(),
            keep_alive_secs: 300,
        };
        let (credentials, developer_id) = resolve_ewon_secrets(&section).unwrap();
        assert_eq!(credentials.username, "fleetview-test-nobody");
        assert!(!credentials.password.expose_secret().is_empty());
        assert!(!developer_id.expose_secret().is_empty());
    }

    #[test]
    fn redacted_hides_every_secret() {
        let file = write_config(FULL);
        let config = load_config_from(file.path()).unwrap();
        let rendered = config.redacted().to_toml().unwrap();
        assert!(!rendered.contains("service-pw"));
        assert!(!rendered.contains("dev-id"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("company-9"));
    }
}
