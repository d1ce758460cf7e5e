// Error-log source client
//
// Read-only HTTP view over the relational error store: one row per agent
// per reporting period. Accepts either a bare JSON array or a `{ data }`
// envelope.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::decode::{parse_body, preview};
use crate::error::Error;
use crate::transport::TransportConfig;

const PROVIDER: &str = "error-log";

/// Error count for one agent in one reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRow {
    pub agent_id: String,
    pub number_of_errors: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RowsBody {
    Bare(Vec<ErrorRow>),
    Wrapped { data: Vec<ErrorRow> },
}

/// Client for the recent-errors endpoint.
pub struct ErrorLogClient {
    http: reqwest::Client,
    url: Url,
}

impl ErrorLogClient {
    pub fn new(url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self::with_client(transport.build_client()?, url))
    }

    pub fn with_client(http: reqwest::Client, url: Url) -> Self {
        Self { http, url }
    }

    /// Fetch the error rows for the recent window.
    pub async fn recent_errors(&self) -> Result<Vec<ErrorRow>, Error> {
        debug!("GET {}", self.url);
        let resp = self
            .http
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        let rows = match parse_body::<RowsBody>(&body)? {
            RowsBody::Bare(rows) | RowsBody::Wrapped { data: rows } => rows,
        };
        debug!(rows = rows.len(), "fetched error rows");
        Ok(rows)
    }
}
