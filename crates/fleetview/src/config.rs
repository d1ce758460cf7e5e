//! Config resolution for the CLI: file + env from `fleetview-config`,
//! then command-line overrides on top.

use std::io::IsTerminal;
use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

use fleetview_config::Config;
use fleetview_core::{Credentials, DashboardConfig, SortKey, TlsVerification};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Load the config file named by `--config`, or the platform default.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(fleetview_config::config_path);
    tracing::debug!(path = %path.display(), "loading config");
    Ok(fleetview_config::load_config_from(&path)?)
}

/// How results are presented.
#[derive(Debug, Clone, Copy)]
pub struct Presentation {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

pub fn presentation(cfg: &Config, global: &GlobalOpts) -> Result<Presentation, CliError> {
    let format = match global.output {
        Some(format) => format,
        None => parse_enum("defaults.output", &cfg.defaults.output)?,
    };
    let color = match global.color {
        Some(mode) => mode,
        None => parse_enum::<ColorMode>("defaults.color", &cfg.defaults.color)?,
    };
    Ok(Presentation {
        format,
        color: crate::output::should_color(color),
        quiet: global.quiet,
    })
}

fn parse_enum<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

pub fn sort_key(cfg: &Config) -> Result<SortKey, CliError> {
    Ok(cfg.sort_key()?)
}

/// Interval between session renewals while watching: the Ewon keep-alive
/// period when Ewon is configured, otherwise half the Ixon token lifetime.
pub fn keep_alive_interval(cfg: &Config) -> Duration {
    let secs = cfg
        .ewon
        .as_ref()
        .map_or(cfg.ixon.session_ttl_secs / 2, |ewon| ewon.keep_alive_secs);
    Duration::from_secs(secs.max(1))
}

/// `DashboardConfig` from the file, with `--insecure` and `--timeout` applied.
pub fn dashboard_config(cfg: &Config, global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let mut dashboard = fleetview_config::to_dashboard_config(cfg)?;
    if global.insecure {
        dashboard.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        dashboard.timeout = Duration::from_secs(secs);
    }
    Ok(dashboard)
}

/// Ixon user credentials. The password comes from env, keyring or the
/// config file; failing those, it is prompted for on an interactive terminal.
pub fn ixon_credentials(cfg: &Config, global: &GlobalOpts) -> Result<Credentials, CliError> {
    let username = global
        .username
        .clone()
        .or_else(|| cfg.ixon.username.clone())
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(no_ixon_credentials)?;

    let password = match fleetview_config::resolve_ixon_password(&cfg.ixon, &username) {
        Some(password) => password,
        None if std::io::stdin().is_terminal() => {
            let entered = rpassword::prompt_password(format!("Ixon password for {username}: "))?;
            SecretString::from(entered)
        }
        None => return Err(no_ixon_credentials()),
    };

    Ok(Credentials {
        username,
        password,
        otp: global.otp.clone(),
    })
}

fn no_ixon_credentials() -> CliError {
    CliError::NoCredentials {
        provider: "ixon".into(),
        env: "IXON".into(),
    }
}
