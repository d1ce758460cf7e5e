// Ixon link catalog cache
//
// The Ixon API is link-driven: a discovery document maps relation names
// (`AgentList`, `AccessTokenList`, ...) to endpoint URLs. The cache keeps
// the last mapping together with a SHA-256 checksum of the raw payload.
// An identical payload is a no-op; a different one replaces the whole
// table in a single atomic swap, so readers see either the old or the new
// complete mapping and removed relations never linger.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use crate::decode::null_as_empty;
use crate::error::Error;

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default, deserialize_with = "null_as_empty")]
    data: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    rel: String,
    href: String,
}

/// An immutable relation table. Replaced wholesale, never patched.
#[derive(Debug, Default)]
pub struct LinkTable {
    checksum: Option<String>,
    links: HashMap<String, String>,
}

impl LinkTable {
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn href(&self, rel: &str) -> Option<&str> {
        self.links.get(rel).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Relation names, sorted for stable output.
    pub fn relations(&self) -> Vec<&str> {
        let mut rels: Vec<&str> = self.links.keys().map(String::as_str).collect();
        rels.sort_unstable();
        rels
    }
}

/// Checksum-gated relation cache owned by one `IxonClient`.
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    table: ArcSwap<LinkTable>,
}

impl DiscoveryCache {
    /// An empty cache. Every lookup fails until the first update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw discovery payload into the cache.
    ///
    /// Returns `Ok(false)` when the payload checksum matches the stored one
    /// (nothing changes) and `Ok(true)` when the table was rebuilt. A payload
    /// that cannot be decoded leaves the current table in place.
    pub fn update_link_list(&self, payload: &str) -> Result<bool, Error> {
        let checksum = hex::encode(Sha256::digest(payload.as_bytes()));

        if self.table.load().checksum.as_deref() == Some(checksum.as_str()) {
            debug!("link catalog unchanged");
            return Ok(false);
        }

        let catalog: Catalog =
            serde_json::from_str(payload).map_err(|e| Error::DiscoveryFailed {
                message: format!("undecodable link catalog: {e}"),
            })?;

        let links: HashMap<String, String> = catalog
            .data
            .into_iter()
            .map(|entry| (entry.rel, entry.href))
            .collect();

        debug!(relations = links.len(), "link catalog rebuilt");
        self.table.store(Arc::new(LinkTable {
            checksum: Some(checksum),
            links,
        }));
        Ok(true)
    }

    /// Resolve a relation to its endpoint URL.
    pub fn resolve(&self, rel: &str) -> Result<Url, Error> {
        let table = self.table.load();
        let href = table.href(rel).ok_or_else(|| Error::MissingRelation {
            rel: rel.to_owned(),
        })?;
        Url::parse(href).map_err(Error::InvalidUrl)
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.table.load().href(rel).is_some()
    }

    /// The current complete table.
    pub fn snapshot(&self) -> Arc<LinkTable> {
        self.table.load_full()
    }

    pub fn checksum(&self) -> Option<String> {
        self.table.load().checksum.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.table.load().is_empty()
    }
}
