use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Username/password pair supplied by the sign-in layer.
///
/// `Debug` redacts the password through `SecretString`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// One-time code for providers with two-factor authentication.
    pub otp: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            otp: None,
        }
    }

    #[must_use]
    pub fn with_otp(mut self, otp: impl Into<String>) -> Self {
        self.otp = Some(otp.into());
        self
    }
}

/// An opaque provider session: bearer token plus lifetime.
///
/// Owned by the caller. Clients only borrow it for the duration of a call.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    /// Provider-side identifier of the token itself (Ixon needs it to revoke).
    token_id: Option<String>,
    expires_in: Duration,
}

impl Session {
    pub fn new(token: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            token: SecretString::from(token.into()),
            token_id: None,
            expires_in,
        }
    }

    #[must_use]
    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }

    pub(crate) fn token(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn token_id(&self) -> Option<&str> {
        self.token_id.as_deref()
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.token.expose_secret().is_empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("token_id", &self.token_id)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_token() {
        let session = Session::new("s3cr3t-token", Duration::from_secs(60)).with_token_id("pub-1");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("s3cr3t-token"));
        assert!(rendered.contains("pub-1"));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::new("operator", "hunter2").with_otp("123456");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(creds.otp.as_deref(), Some("123456"));
    }
}
