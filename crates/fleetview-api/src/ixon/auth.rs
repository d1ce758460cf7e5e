// Ixon authentication and account endpoints
//
// Access tokens are created through the `AccessTokenList` relation with
// HTTP Basic auth of `username:otp:password`. The token's `secretId` is
// the bearer; its `publicId` is needed to revoke it again.

use std::time::Duration;

use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::debug;

use crate::auth::{Credentials, Session};
use crate::error::Error;
use crate::ixon::client::{IxonClient, PROVIDER, with_query};
use crate::ixon::models::{AccessToken, Role, UserProfile};
use crate::ixon::rel;

impl IxonClient {
    /// Create an access token valid for `expires_in`.
    ///
    /// Discovery failures pass through unchanged so the caller knows to
    /// refresh the catalog; everything else becomes [`Error::SignInFailed`].
    pub async fn sign_in(
        &self,
        credentials: &Credentials,
        expires_in: Duration,
    ) -> Result<Session, Error> {
        let url = with_query(
            self.relation(rel::ACCESS_TOKEN_LIST).await?,
            &[("fields", "secretId,publicId")],
        );
        debug!("creating ixon access token");

        let user = format!(
            "{}:{}",
            credentials.username,
            credentials.otp.as_deref().unwrap_or_default()
        );
        let builder = self
            .request(Method::POST, url, None)
            .basic_auth(user, Some(credentials.password.expose_secret()))
            .json(&json!({ "expiresIn": expires_in.as_secs() }));

        let token: AccessToken = self.send_data(builder).await.map_err(|e| match e {
            Error::Authentication { .. } => Error::SignInFailed {
                provider: PROVIDER,
                message: "credentials rejected".into(),
            },
            Error::Api { status, .. } => Error::SignInFailed {
                provider: PROVIDER,
                message: format!("HTTP {status}"),
            },
            // The body may hold a token; never echo it.
            Error::Deserialization { .. } => Error::SignInFailed {
                provider: PROVIDER,
                message: "unreadable sign-in response".into(),
            },
            other => Error::SignInFailed {
                provider: PROVIDER,
                message: other.to_string(),
            },
        })?;

        let secret = token
            .secret_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::SignInFailed {
                provider: PROVIDER,
                message: "response carried no access token".into(),
            })?;

        debug!("ixon sign in successful");
        let session = Session::new(secret, expires_in);
        Ok(match token.public_id {
            Some(public_id) => session.with_token_id(public_id),
            None => session,
        })
    }

    /// Revoke the access token behind `session`.
    pub async fn delete_session(&self, session: &Session) -> Result<(), Error> {
        let public_id = session.token_id().ok_or_else(|| Error::Rejected {
            provider: PROVIDER,
            message: "session has no token id to revoke".into(),
        })?;
        let url = self.relation(rel::ACCESS_TOKEN_LIST).await?;
        debug!("revoking ixon access token");

        let builder = self
            .request(Method::DELETE, url, Some(session))
            .json(&json!({ "publicId": public_id }));
        self.send_text(builder).await?;
        Ok(())
    }

    /// Probe the session against the `MyUser` relation.
    ///
    /// Never fails: every error collapses to `false`.
    pub async fn is_session_valid(&self, session: &Session) -> bool {
        if session.is_blank() {
            return false;
        }
        let url = match self.relation(rel::MY_USER).await {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "ixon session probe could not resolve MyUser");
                return false;
            }
        };
        match self
            .send_text(self.request(Method::GET, url, Some(session)))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "ixon session probe failed");
                false
            }
        }
    }

    /// Unique permission ids across all of the user's roles, first-seen order.
    pub async fn list_permissions(&self, session: &Session) -> Result<Vec<String>, Error> {
        let url = with_query(
            self.relation(rel::ROLE_LIST).await?,
            &[("fields", "permissions")],
        );
        let roles: Vec<Role> = self
            .send_data(self.request(Method::GET, url, Some(session)))
            .await?;

        let mut permissions: Vec<String> = Vec::new();
        for permission in roles.into_iter().flat_map(|r| r.permissions) {
            if !permissions.contains(&permission.public_id) {
                permissions.push(permission.public_id);
            }
        }
        debug!(count = permissions.len(), "resolved ixon permissions");
        Ok(permissions)
    }

    /// The signed-in user's profile.
    pub async fn current_user(&self, session: &Session) -> Result<UserProfile, Error> {
        let url = with_query(
            self.relation(rel::MY_USER).await?,
            &[("fields", "publicId,emailAddress,name,language")],
        );
        self.send_data(self.request(Method::GET, url, Some(session)))
            .await
    }
}
