// Ewon Talk2M HTTP client
//
// Wraps `reqwest::Client` with Talk2M form encoding and `success`-flag
// envelope checking. The account name and developer id are sent with
// every call; the session token is supplied per call by the caller.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::{Credentials, Session};
use crate::decode::{decode_records, parse_body, preview};
use crate::error::Error;
use crate::ewon::models::{Envelope, EwonsResponse, LoginResponse, RawEwon};
use crate::transport::TransportConfig;

const PROVIDER: &str = "ewon";

/// Raw HTTP client for the Talk2M API.
pub struct EwonClient {
    http: reqwest::Client,
    api_url: Url,
    account: String,
    developer_id: SecretString,
    session_ttl: Duration,
}

impl EwonClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `api_url` is the Talk2M API root, e.g. `https://m2web.talk2m.com/t2mapi`.
    pub fn new(
        api_url: Url,
        account: String,
        developer_id: SecretString,
        session_ttl: Duration,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            api_url,
            account,
            developer_id,
            session_ttl,
        ))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        api_url: Url,
        account: String,
        developer_id: SecretString,
        session_ttl: Duration,
    ) -> Self {
        Self {
            http,
            api_url: with_trailing_slash(api_url),
            account,
            developer_id,
            session_ttl,
        }
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Open a Talk2M session.
    ///
    /// `POST /login`. Every failure surfaces as [`Error::SignInFailed`];
    /// the message never includes the submitted credentials.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, Error> {
        let form = [
            ("t2maccount", self.account.as_str()),
            ("t2musername", credentials.username.as_str()),
            ("t2mpassword", credentials.password.expose_secret()),
            ("t2mdeveloperid", self.developer_id.expose_secret()),
        ];

        let resp: LoginResponse = self
            .post_form("login", &form)
            .await
            .map_err(|e| sign_in_failed(&e))?;

        let token = resp
            .t2msession
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::SignInFailed {
                provider: PROVIDER,
                message: "response carried no session".into(),
            })?;

        debug!("ewon sign in successful");
        Ok(Session::new(token, self.session_ttl))
    }

    /// List every gateway visible to the session.
    ///
    /// `POST /getewons`. Records that fail to decode are dropped with a warning.
    pub async fn list_ewons(&self, session: &Session) -> Result<Vec<RawEwon>, Error> {
        if session.is_blank() {
            return Err(Error::Authentication {
                message: "no ewon session".into(),
            });
        }
        let form = [
            ("t2msession", session.token()),
            ("t2mdeveloperid", self.developer_id.expose_secret()),
        ];
        let resp: EwonsResponse = self.post_form("getewons", &form).await?;
        debug!(count = resp.ewons.len(), "listed ewons");
        Ok(decode_records(PROVIDER, resp.ewons))
    }

    /// Close the session. A blank session is a no-op.
    ///
    /// `POST /logout`.
    pub async fn delete_session(&self, session: &Session) -> Result<(), Error> {
        if session.is_blank() {
            return Ok(());
        }
        let form = [
            ("t2maccount", self.account.as_str()),
            ("t2msession", session.token()),
            ("t2mdeveloperid", self.developer_id.expose_secret()),
        ];
        let _: serde_json::Value = self.post_form("logout", &form).await?;
        debug!("ewon session closed");
        Ok(())
    }

    /// Probe the session with `POST /getaccountinfo`.
    ///
    /// Never fails: every error collapses to `false`.
    pub async fn is_session_valid(&self, session: &Session) -> bool {
        if session.is_blank() {
            return false;
        }
        let form = [
            ("t2maccount", self.account.as_str()),
            ("t2msession", session.token()),
            ("t2mdeveloperid", self.developer_id.expose_secret()),
        ];
        match self
            .post_form::<serde_json::Value>("getaccountinfo", &form)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "ewon session probe failed");
                false
            }
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn endpoint(&self, name: &str) -> Result<Url, Error> {
        self.api_url.join(name).map_err(Error::InvalidUrl)
    }

    /// POST a form, check HTTP status and the `success` flag, then decode.
    async fn post_form<T: DeserializeOwned>(
        &self,
        name: &str,
        form: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = self.endpoint(name)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "ewon session expired or invalid".into(),
            });
        }
        if !status.is_success() {
            return Err(Error::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        let envelope: Envelope = parse_body(&body)?;
        if !envelope.success {
            let message = envelope.message.unwrap_or_else(|| "success=false".into());
            let code = envelope.code.as_ref().and_then(serde_json::Value::as_u64);
            return Err(if matches!(code, Some(401 | 403)) {
                Error::Authentication { message }
            } else {
                Error::Rejected {
                    provider: PROVIDER,
                    message,
                }
            });
        }

        parse_body(&body)
    }
}

fn sign_in_failed(err: &Error) -> Error {
    let message = match err {
        Error::Authentication { message } | Error::Rejected { message, .. } => message.clone(),
        Error::Api { status, .. } => format!("HTTP {status}"),
        // The body may hold a session token; never echo it.
        Error::Deserialization { .. } => "unreadable sign-in response".into(),
        other => other.to_string(),
    };
    Error::SignInFailed {
        provider: PROVIDER,
        message,
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
