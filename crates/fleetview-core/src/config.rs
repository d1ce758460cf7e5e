// ── Runtime dashboard configuration ──
//
// These types describe how to reach both providers and how to build
// device links. They carry credential data but never touch disk: the
// CLI constructs a `DashboardConfig` and hands it in.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use fleetview_api::{Credentials, RetryPolicy};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Both providers are public cloud services.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (intercepting proxies).
    DangerAcceptInvalid,
}

/// Ewon Talk2M access. Signed in with service credentials, not the user's.
#[derive(Debug, Clone)]
pub struct EwonSettings {
    /// Talk2M API root, e.g. `https://m2web.talk2m.com/t2mapi`.
    pub api_url: Url,
    pub account: String,
    pub developer_id: SecretString,
    pub credentials: Credentials,
    /// Lifetime reported for the Talk2M session.
    pub session_ttl: Duration,
    /// m2web host used for VNC links, e.g. `https://eu2.m2web.talk2m.com`.
    pub m2web_url: Url,
    /// m2web account segment of VNC links.
    pub m2web_account: String,
}

/// Ixon Cloud access.
#[derive(Debug, Clone)]
pub struct IxonSettings {
    pub discovery_url: Url,
    pub application_id: String,
    pub company_id: String,
    /// Portal root for VNC and dashboard links, e.g. `https://portal.ixon.cloud`.
    pub portal_url: Url,
    /// Requested lifetime of the access token.
    pub session_ttl: Duration,
}

/// Opaque predicate over the signed-in user's Ixon permissions.
///
/// Decides whether the Ewon fleet is loaded for this user.
#[derive(Clone)]
pub struct PermissionPolicy {
    label: String,
    check: Arc<dyn Fn(&[String]) -> bool + Send + Sync>,
}

impl PermissionPolicy {
    pub const COMPANY_WIDE_ROLE: &'static str = "COMPANY_WIDE_ROLE";

    pub fn new(
        label: impl Into<String>,
        check: impl Fn(&[String]) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            check: Arc::new(check),
        }
    }

    /// Accept users holding `permission`.
    pub fn require(permission: impl Into<String>) -> Self {
        let permission = permission.into();
        let label = format!("require {permission}");
        Self::new(label, move |granted| granted.iter().any(|p| *p == permission))
    }

    pub fn allow_all() -> Self {
        Self::new("allow all", |_| true)
    }

    pub fn deny_all() -> Self {
        Self::new("deny all", |_| false)
    }

    pub fn allows(&self, permissions: &[String]) -> bool {
        (self.check)(permissions)
    }
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::require(Self::COMPANY_WIDE_ROLE)
    }
}

impl fmt::Debug for PermissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PermissionPolicy").field(&self.label).finish()
    }
}

/// Configuration for one dashboard instance.
///
/// Built by the CLI and passed to `Dashboard::new`.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub ixon: IxonSettings,
    /// `None` disables the Ewon provider entirely.
    pub ewon: Option<EwonSettings>,
    /// Recent-errors endpoint. `None` leaves every device unannotated.
    pub error_log_url: Option<Url>,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// Startup discovery retry budget.
    pub discovery_retry: RetryPolicy,
    pub permission_policy: PermissionPolicy,
}

impl DashboardConfig {
    pub fn new(ixon: IxonSettings) -> Self {
        Self {
            ixon,
            ewon: None,
            error_log_url: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            discovery_retry: RetryPolicy::default(),
            permission_policy: PermissionPolicy::default(),
        }
    }

    /// Link templates derived from the provider settings.
    pub fn link_templates(&self) -> Result<LinkTemplates, CoreError> {
        LinkTemplates::new(
            self.ixon.portal_url.clone(),
            self.ewon
                .as_ref()
                .map(|e| (e.m2web_url.clone(), e.m2web_account.clone())),
        )
    }
}

/// URL roots for every templated device link.
///
/// Construction rejects roots that cannot carry path segments, so link
/// building never fails afterwards.
#[derive(Debug, Clone)]
pub struct LinkTemplates {
    ixon_portal: Url,
    m2web: Option<(Url, String)>,
}

impl LinkTemplates {
    pub fn new(ixon_portal: Url, m2web: Option<(Url, String)>) -> Result<Self, CoreError> {
        check_base(&ixon_portal)?;
        if let Some((host, _)) = &m2web {
            check_base(host)?;
        }
        Ok(Self { ixon_portal, m2web })
    }

    /// `{portal}/{segments...}`, each segment percent-encoded.
    pub fn ixon(&self, segments: &[&str]) -> String {
        join_segments(&self.ixon_portal, segments)
    }

    /// `{m2web host}/{account}/{segments...}`, or `None` without Ewon settings.
    pub fn m2web(&self, segments: &[&str]) -> Option<String> {
        let (host, account) = self.m2web.as_ref()?;
        let mut all = Vec::with_capacity(segments.len() + 1);
        all.push(account.as_str());
        all.extend_from_slice(segments);
        Some(join_segments(host, &all))
    }
}

fn check_base(url: &Url) -> Result<(), CoreError> {
    if url.cannot_be_a_base() {
        return Err(CoreError::Config {
            message: format!("{url} cannot be used as a link root"),
        });
    }
    Ok(())
}

fn join_segments(base: &Url, segments: &[&str]) -> String {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url.into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn templates() -> LinkTemplates {
        LinkTemplates::new(
            Url::parse("https://portal.ixon.cloud/").unwrap(),
            Some((
                Url::parse("https://eu2.m2web.talk2m.com").unwrap(),
                "PlantRemote".into(),
            )),
        )
        .unwrap()
    }

    #[test]
    fn segments_are_percent_encoded() {
        let url = templates().m2web(&["Line 3 / East", "vnc", "10.0.0.5:5900"]);
        assert_eq!(
            url.as_deref(),
            Some("https://eu2.m2web.talk2m.com/PlantRemote/Line%203%20%2F%20East/vnc/10.0.0.5:5900")
        );
    }

    #[test]
    fn portal_links_keep_trailing_slash_out() {
        assert_eq!(
            templates().ixon(&["agents", "a1", "data-monitors", "m1"]),
            "https://portal.ixon.cloud/agents/a1/data-monitors/m1"
        );
    }

    #[test]
    fn m2web_links_need_ewon_settings() {
        let templates =
            LinkTemplates::new(Url::parse("https://portal.ixon.cloud").unwrap(), None).unwrap();
        assert_eq!(templates.m2web(&["x"]), None);
    }

    #[test]
    fn opaque_roots_are_rejected() {
        let result = LinkTemplates::new(Url::parse("mailto:ops@example.com").unwrap(), None);
        assert!(matches!(result, Err(CoreError::Config { .. })));
    }

    #[test]
    fn default_policy_requires_company_wide_role() {
        let policy = PermissionPolicy::default();
        assert!(policy.allows(&["MANAGE_AGENT".into(), "COMPANY_WIDE_ROLE".into()]));
        assert!(!policy.allows(&["MANAGE_AGENT".into()]));
        assert!(PermissionPolicy::allow_all().allows(&[]));
        assert!(!PermissionPolicy::deny_all().allows(&["COMPANY_WIDE_ROLE".into()]));
        assert_eq!(
            format!("{policy:?}"),
            "PermissionPolicy(\"require COMPANY_WIDE_ROLE\")"
        );
    }
}
