//! Command handlers.
//!
//! Everything except `config` and `completions` runs against a signed-in
//! [`Ctx`]: the dashboard, the credentials it signed in with, and the
//! sessions it holds. The sessions are revoked when the command finishes.

pub mod config_cmd;
pub mod devices;
pub mod session;

use std::time::Duration;

use tracing::{debug, info, warn};

use fleetview_core::{CoreError, Credentials, Dashboard, Device, Sessions, SortKey};

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Presentation};
use crate::error::CliError;

/// A signed-in command context.
pub struct Ctx {
    pub dashboard: Dashboard,
    pub sessions: Sessions,
    pub view: Presentation,
    pub sort: SortKey,
    pub renew_every: Duration,
    credentials: Credentials,
}

impl Ctx {
    /// Discover, then sign in to both providers.
    pub async fn sign_in(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = config::load(global)?;
        let view = config::presentation(&cfg, global)?;
        let sort = config::sort_key(&cfg)?;
        let renew_every = config::keep_alive_interval(&cfg);

        let dashboard = Dashboard::new(config::dashboard_config(&cfg, global)?)?;
        let credentials = config::ixon_credentials(&cfg, global)?;

        dashboard.connect().await?;
        let sessions = dashboard.sign_in(&credentials).await?;
        debug!(
            ewon = sessions.ewon.is_some(),
            permissions = sessions.permissions.len(),
            "signed in"
        );

        Ok(Self {
            dashboard,
            sessions,
            view,
            sort,
            renew_every,
            credentials,
        })
    }

    /// Run one aggregation pass. When the pass fails in a way a fresh
    /// sign-in could fix and the session probe confirms the sessions have
    /// lapsed, sign in again and retry once.
    pub async fn load_devices(&mut self, key: SortKey) -> Result<Vec<Device>, CliError> {
        match self.dashboard.load_devices(&self.sessions, key).await {
            Ok(devices) => Ok(devices),
            Err(err) if err.is_auth() || matches!(err, CoreError::NoSessionRetrieved) => {
                let health = self.dashboard.check_sessions(&self.sessions).await;
                if health.is_healthy() {
                    return Err(err.into());
                }
                info!(?health, "sessions expired, signing in again");
                self.sessions = self.dashboard.sign_in(&self.credentials).await?;
                Ok(self.dashboard.load_devices(&self.sessions, key).await?)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Periodic renewal: sign in again when the Ixon session has lapsed,
    /// otherwise probe the Ewon session and renew it if needed.
    pub async fn keep_alive(&mut self) -> Result<(), CliError> {
        if !self.dashboard.check_sessions(&self.sessions).await.ixon {
            info!("ixon session lapsed, signing in again");
            self.sessions = self.dashboard.sign_in(&self.credentials).await?;
            return Ok(());
        }
        let held = self.sessions.ewon.is_some();
        if !self.dashboard.keep_alive(&mut self.sessions).await && held {
            warn!("ewon session lost and could not be renewed");
        }
        Ok(())
    }

    /// Revoke the held sessions. Failures are logged, never fatal.
    pub async fn sign_out(self) {
        if let Err(e) = self.dashboard.sign_out(self.sessions).await {
            warn!(error = %e, "sign-out failed");
        }
    }
}

/// Dispatch a session-backed command, then sign out.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let mut ctx = Ctx::sign_in(global).await?;

    let result = match cmd {
        Command::Devices(args) => devices::handle(args, &mut ctx).await,
        Command::Whoami => session::whoami(&ctx).await,
        Command::Check => session::check(&ctx).await,
        Command::Config(_) | Command::Completions(_) => Ok(()),
    };

    ctx.sign_out().await;
    result
}
