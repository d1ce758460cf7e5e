// ── Dashboard facade ──
//
// Owns one client per provider (each Ixon client owns its own discovery
// cache) and runs the session lifecycle around the aggregation pass.
// Sessions are handed back to the caller and only borrowed per pass.

use fleetview_api::ixon::UserProfile;
use fleetview_api::{
    Credentials, ErrorLogClient, EwonClient, IxonClient, Session, TlsMode, TransportConfig,
};
use futures_util::FutureExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{ProviderFetch, aggregate};
use crate::config::{DashboardConfig, LinkTemplates, TlsVerification};
use crate::convert::{RawDeviceRecord, normalize_batch};
use crate::error::CoreError;
use crate::model::{Device, Provider};
use crate::rank::{SortKey, rank};

/// Provider sessions obtained by one sign-in.
#[derive(Debug, Clone)]
pub struct Sessions {
    pub ixon: Session,
    /// Present only when the permission policy admitted the user and the
    /// service sign-in succeeded.
    pub ewon: Option<Session>,
    /// Ixon permission ids of the signed-in user.
    pub permissions: Vec<String>,
}

/// Result of probing both sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionHealth {
    pub ixon: bool,
    /// `None` when no Ewon session is held.
    pub ewon: Option<bool>,
}

impl SessionHealth {
    pub fn is_healthy(&self) -> bool {
        self.ixon && self.ewon != Some(false)
    }
}

pub struct Dashboard {
    config: DashboardConfig,
    ixon: IxonClient,
    ewon: Option<EwonClient>,
    error_log: Option<ErrorLogClient>,
    templates: LinkTemplates,
}

impl Dashboard {
    /// Build all clients. Performs no network I/O.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            timeout: config.timeout,
        };

        let ixon = IxonClient::new(
            config.ixon.discovery_url.clone(),
            config.ixon.application_id.clone(),
            config.ixon.company_id.clone(),
            &transport,
        )?;

        let ewon = config
            .ewon
            .as_ref()
            .map(|settings| {
                EwonClient::new(
                    settings.api_url.clone(),
                    settings.account.clone(),
                    settings.developer_id.clone(),
                    settings.session_ttl,
                    &transport,
                )
            })
            .transpose()?;

        let error_log = config
            .error_log_url
            .clone()
            .map(|url| ErrorLogClient::new(url, &transport))
            .transpose()?;

        let templates = config.link_templates()?;

        Ok(Self {
            config,
            ixon,
            ewon,
            error_log,
            templates,
        })
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Startup discovery under the configured retry budget.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.ixon
            .discover_with_retry(&self.config.discovery_retry)
            .await?;
        info!(
            relations = self.ixon.links().snapshot().len(),
            "ixon link catalog loaded"
        );
        Ok(())
    }

    /// Sign the user in to Ixon and, if the permission policy admits them,
    /// open an Ewon session with the service credentials.
    ///
    /// Ewon failures are logged and leave `Sessions::ewon` empty.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Sessions, CoreError> {
        self.ixon.discover().await?;

        let ixon = self
            .ixon
            .sign_in(credentials, self.config.ixon.session_ttl)
            .await?;

        let permissions = match self.ixon.list_permissions(&ixon).await {
            Ok(permissions) => permissions,
            Err(e) => {
                warn!(error = %e, "could not read ixon permissions");
                Vec::new()
            }
        };

        let ewon = if self.config.permission_policy.allows(&permissions) {
            self.sign_in_ewon().await
        } else {
            info!(
                policy = ?self.config.permission_policy,
                "permission policy declined ewon access"
            );
            None
        };

        Ok(Sessions {
            ixon,
            ewon,
            permissions,
        })
    }

    async fn sign_in_ewon(&self) -> Option<Session> {
        let client = self.ewon.as_ref()?;
        let settings = self.config.ewon.as_ref()?;
        match client.sign_in(&settings.credentials).await {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "ewon sign-in failed");
                None
            }
        }
    }

    /// Probe both sessions concurrently. Never fails.
    pub async fn check_sessions(&self, sessions: &Sessions) -> SessionHealth {
        let ewon = async {
            match (self.ewon.as_ref(), sessions.ewon.as_ref()) {
                (Some(client), Some(session)) => Some(client.is_session_valid(session).await),
                _ => None,
            }
        };
        let (ixon, ewon) = tokio::join!(self.ixon.is_session_valid(&sessions.ixon), ewon);
        SessionHealth { ixon, ewon }
    }

    /// Keep the Ewon session usable: probe it and sign in again when it has
    /// lapsed. Returns whether an Ewon session is held afterwards.
    pub async fn keep_alive(&self, sessions: &mut Sessions) -> bool {
        if self.ewon.is_none() || !self.config.permission_policy.allows(&sessions.permissions) {
            return false;
        }
        if let (Some(client), Some(session)) = (self.ewon.as_ref(), sessions.ewon.as_ref()) {
            if client.is_session_valid(session).await {
                debug!("ewon session still valid");
                return true;
            }
            info!("ewon session lapsed, signing in again");
        }
        sessions.ewon = self.sign_in_ewon().await;
        sessions.ewon.is_some()
    }

    /// Revoke both sessions concurrently. Both deletions always run; the
    /// first failure is returned.
    pub async fn sign_out(&self, sessions: Sessions) -> Result<(), CoreError> {
        let ewon = async {
            match (self.ewon.as_ref(), sessions.ewon.as_ref()) {
                (Some(client), Some(session)) => client.delete_session(session).await,
                _ => Ok(()),
            }
        };
        let (ixon_res, ewon_res) = tokio::join!(self.ixon.delete_session(&sessions.ixon), ewon);

        if let Err(ref e) = ixon_res {
            warn!(error = %e, "ixon sign-out failed");
        }
        if let Err(ref e) = ewon_res {
            warn!(error = %e, "ewon sign-out failed");
        }
        ixon_res?;
        ewon_res?;
        Ok(())
    }

    /// Profile of the signed-in Ixon user.
    pub async fn current_user(&self, sessions: &Sessions) -> Result<UserProfile, CoreError> {
        Ok(self.ixon.current_user(&sessions.ixon).await?)
    }

    // ── Aggregation ──────────────────────────────────────────────

    /// One aggregation pass: both providers and the error log concurrently,
    /// then ranking.
    pub async fn load_devices(
        &self,
        sessions: &Sessions,
        key: SortKey,
    ) -> Result<Vec<Device>, CoreError> {
        let templates = &self.templates;

        let mut fetches = vec![ProviderFetch::new(
            Provider::Ixon,
            async move {
                let agents = self.ixon.fetch_agents(&sessions.ixon).await?;
                Ok::<_, CoreError>(normalize_batch(
                    agents.into_iter().map(RawDeviceRecord::Ixon),
                    templates,
                ))
            }
            .boxed(),
        )];

        if let (Some(client), Some(session)) = (self.ewon.as_ref(), sessions.ewon.as_ref()) {
            fetches.push(ProviderFetch::new(
                Provider::Ewon,
                async move {
                    let ewons = client.list_ewons(session).await?;
                    Ok::<_, CoreError>(normalize_batch(
                        ewons.into_iter().map(RawDeviceRecord::Ewon),
                        templates,
                    ))
                }
                .boxed(),
            ));
        }

        let error_source = match self.error_log.as_ref() {
            Some(client) => async move { Ok::<_, CoreError>(client.recent_errors().await?) }.boxed(),
            None => async { Ok::<_, CoreError>(Vec::new()) }.boxed(),
        };

        let mut devices = aggregate(fetches, error_source).await?;
        rank(&mut devices, key);
        info!(count = devices.len(), %key, "aggregation pass complete");
        Ok(devices)
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_tolerates_missing_ewon() {
        assert!(SessionHealth { ixon: true, ewon: None }.is_healthy());
        assert!(!SessionHealth { ixon: true, ewon: Some(false) }.is_healthy());
        assert!(!SessionHealth { ixon: false, ewon: Some(true) }.is_healthy());
    }
}
