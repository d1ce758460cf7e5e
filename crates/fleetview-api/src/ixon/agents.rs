// Ixon agent endpoints
//
// Agent listing plus the secondary `WebAccess` call that turns HTTP
// servers of online agents into proxied URLs.

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::auth::Session;
use crate::decode::decode_records;
use crate::error::Error;
use crate::ixon::client::{IxonClient, with_query};
use crate::ixon::models::{RawAgent, ServerRef, WebAccessGrant, WebAccessRequest};
use crate::ixon::rel;

const AGENT_FIELDS: &str =
    "name,publicId,activeVpnSession,devices.*,servers.*,dataMonitors,dataReports";
const PAGE_SIZE: &str = "500";

impl IxonClient {
    /// List agents with servers and dashboards, without web-access URLs.
    pub async fn list_agents(&self, session: &Session) -> Result<Vec<RawAgent>, Error> {
        let url = with_query(
            self.relation(rel::AGENT_LIST).await?,
            &[("fields", AGENT_FIELDS), ("page-size", PAGE_SIZE)],
        );
        let items: Vec<Value> = self
            .send_data(self.request(Method::GET, url, Some(session)))
            .await?;
        debug!(count = items.len(), "listed ixon agents");
        Ok(decode_records("ixon", items))
    }

    /// Fill `web_access_url` on every HTTP server of every online agent.
    ///
    /// Skips the network entirely when no such server exists. Any failure,
    /// including a grant list whose length does not match the request,
    /// fails the whole call rather than leaving some links unresolved.
    pub async fn resolve_web_access(
        &self,
        session: &Session,
        agents: &mut [RawAgent],
    ) -> Result<(), Error> {
        let targets: Vec<(usize, usize)> = agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| agent.is_online())
            .flat_map(|(a, agent)| {
                agent
                    .servers
                    .iter()
                    .enumerate()
                    .filter(|(_, server)| server.is_http() && server.public_id.is_some())
                    .map(move |(s, _)| (a, s))
            })
            .collect();

        if targets.is_empty() {
            debug!("no online http servers, skipping web access");
            return Ok(());
        }

        let grants = self
            .request_web_access(session, agents, &targets)
            .await
            .map_err(|e| match e {
                Error::Authentication { .. } | Error::WebAccess { .. } => e,
                e if e.is_discovery() => e,
                other => Error::WebAccess {
                    message: other.to_string(),
                },
            })?;

        if grants.len() != targets.len() {
            return Err(Error::WebAccess {
                message: format!(
                    "requested {} server links, received {}",
                    targets.len(),
                    grants.len()
                ),
            });
        }

        for ((a, s), grant) in targets.into_iter().zip(grants) {
            if let Some(server) = agents.get_mut(a).and_then(|agent| agent.servers.get_mut(s)) {
                server.web_access_url = grant.url;
            }
        }
        Ok(())
    }

    /// Agents with web-access URLs resolved: the full device fetch.
    pub async fn fetch_agents(&self, session: &Session) -> Result<Vec<RawAgent>, Error> {
        let mut agents = self.list_agents(session).await?;
        self.resolve_web_access(session, &mut agents).await?;
        Ok(agents)
    }

    async fn request_web_access(
        &self,
        session: &Session,
        agents: &[RawAgent],
        targets: &[(usize, usize)],
    ) -> Result<Vec<WebAccessGrant>, Error> {
        let body: Vec<WebAccessRequest<'_>> = targets
            .iter()
            .filter_map(|&(a, s)| {
                let public_id = agents.get(a)?.servers.get(s)?.public_id.as_deref()?;
                Some(WebAccessRequest {
                    server: ServerRef { public_id },
                    method: "http",
                })
            })
            .collect();

        let url = self.relation(rel::WEB_ACCESS).await?;
        debug!(servers = body.len(), "requesting ixon web access");
        self.send_data(self.request(Method::POST, url, Some(session)).json(&body))
            .await
    }
}
