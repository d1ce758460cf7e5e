// Ixon HTTP client
//
// Wraps `reqwest::Client` with the `Api-*` header set, bearer auth, the
// `{ data }` envelope, and ownership of the discovery cache. Each client
// instance has its own cache; nothing is shared process-wide.

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Session;
use crate::decode::{parse_body, preview};
use crate::error::Error;
use crate::ixon::discovery::DiscoveryCache;
use crate::ixon::models::DataEnvelope;
use crate::retry::RetryPolicy;
use crate::transport::TransportConfig;

pub(crate) const PROVIDER: &str = "ixon";
const API_VERSION: &str = "2";

/// Raw HTTP client for the Ixon Cloud API.
pub struct IxonClient {
    http: reqwest::Client,
    discovery_url: Url,
    application_id: String,
    company_id: String,
    links: DiscoveryCache,
}

impl IxonClient {
    /// Create a client from a `TransportConfig`. Does not perform discovery.
    pub fn new(
        discovery_url: Url,
        application_id: String,
        company_id: String,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            discovery_url,
            application_id,
            company_id,
        ))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        discovery_url: Url,
        application_id: String,
        company_id: String,
    ) -> Self {
        Self {
            http,
            discovery_url,
            application_id,
            company_id,
            links: DiscoveryCache::new(),
        }
    }

    /// The relation cache owned by this client.
    pub fn links(&self) -> &DiscoveryCache {
        &self.links
    }

    // ── Discovery ────────────────────────────────────────────────────

    /// Fetch the discovery document and feed it to the cache.
    ///
    /// Returns `true` when the relation table changed. Network and decode
    /// failures surface as [`Error::DiscoveryFailed`].
    pub async fn discover(&self) -> Result<bool, Error> {
        debug!("GET {}", self.discovery_url);
        let resp = self
            .request(Method::GET, self.discovery_url.clone(), None)
            .send()
            .await
            .map_err(|e| Error::DiscoveryFailed {
                message: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::DiscoveryFailed {
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(Error::DiscoveryFailed {
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        self.links.update_link_list(&body)
    }

    /// Run discovery under a bounded retry policy.
    pub async fn discover_with_retry(&self, policy: &RetryPolicy) -> Result<bool, Error> {
        policy.run("ixon discovery", || self.discover()).await
    }

    /// Resolve a relation, running discovery once if it is missing.
    pub(crate) async fn relation(&self, rel: &str) -> Result<Url, Error> {
        if !self.links.contains(rel) {
            debug!(rel, "relation missing, refreshing discovery");
            self.discover().await?;
        }
        self.links.resolve(rel)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Build a request carrying the `Api-*` headers and optional bearer auth.
    pub(crate) fn request(
        &self,
        method: Method,
        url: Url,
        session: Option<&Session>,
    ) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("Api-Application", &self.application_id)
            .header("Api-Version", API_VERSION)
            .header("Api-Company", &self.company_id);
        match session {
            Some(session) => builder.bearer_auth(session.token()),
            None => builder,
        }
    }

    /// Send a request and unwrap the `{ data }` envelope.
    pub(crate) async fn send_data<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, Error> {
        let body = self.send_text(builder).await?;
        let envelope: DataEnvelope<T> = parse_body(&body)?;
        Ok(envelope.data)
    }

    /// Send a request, map HTTP failures, and return the raw body.
    pub(crate) async fn send_text(&self, builder: reqwest::RequestBuilder) -> Result<String, Error> {
        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "ixon session expired or invalid".into(),
            });
        }
        if !status.is_success() {
            return Err(Error::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message: preview(&body),
            });
        }
        Ok(body)
    }
}

/// Append `key=value` query pairs to a relation URL.
pub(crate) fn with_query(mut url: Url, pairs: &[(&str, &str)]) -> Url {
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    url
}
