// ── Aggregation pass ──
//
// Runs every provider fetch and the error-log source concurrently, waits
// for all of them to settle, then merges and annotates. A failing provider
// contributes nothing; only a pass where every provider fails is an error.
// A failing error source degrades to unannotated devices.

use std::collections::{HashMap, HashSet};

use futures_util::future::{BoxFuture, join_all};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Device, Provider};
use fleetview_api::ErrorRow;

/// One provider's device fetch, labelled for logging.
pub struct ProviderFetch<'a> {
    provider: Provider,
    fetch: BoxFuture<'a, Result<Vec<Device>, CoreError>>,
}

impl<'a> ProviderFetch<'a> {
    pub fn new(provider: Provider, fetch: BoxFuture<'a, Result<Vec<Device>, CoreError>>) -> Self {
        Self { provider, fetch }
    }
}

/// Run one aggregation pass.
///
/// Returns [`CoreError::NoSessionRetrieved`] when `fetches` is empty or every
/// fetch fails. Devices keep provider order and are unique by `(provider, id)`.
pub async fn aggregate(
    fetches: Vec<ProviderFetch<'_>>,
    error_source: BoxFuture<'_, Result<Vec<ErrorRow>, CoreError>>,
) -> Result<Vec<Device>, CoreError> {
    let (providers, futures): (Vec<Provider>, Vec<_>) =
        fetches.into_iter().map(|f| (f.provider, f.fetch)).unzip();

    let (results, error_rows) = tokio::join!(join_all(futures), error_source);

    let attempted = providers.len();
    let mut failed = 0_usize;
    let mut seen = HashSet::new();
    let mut devices = Vec::new();

    for (provider, result) in providers.into_iter().zip(results) {
        match result {
            Ok(batch) => {
                debug!(%provider, count = batch.len(), "provider fetch complete");
                for device in batch {
                    if seen.insert(device.key()) {
                        devices.push(device);
                    } else {
                        debug!(key = %device.key(), "dropping duplicate device");
                    }
                }
            }
            Err(e) => {
                warn!(%provider, error = %e, "provider fetch failed, continuing without it");
                failed += 1;
            }
        }
    }

    if failed == attempted {
        return Err(CoreError::NoSessionRetrieved);
    }

    match error_rows {
        Ok(rows) => annotate_errors(&mut devices, &rows),
        Err(e) => warn!(error = %e, "error log unavailable, skipping annotation"),
    }

    Ok(devices)
}

/// Attach summed error counts by `agent_id == device.id`.
///
/// Rows for one agent are added together. Devices without rows get `None`.
/// Idempotent: running it twice with the same rows gives the same totals.
pub fn annotate_errors(devices: &mut [Device], rows: &[ErrorRow]) {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for row in rows {
        let total = totals.entry(row.agent_id.as_str()).or_default();
        *total = total.saturating_add(row.number_of_errors);
    }

    for device in devices.iter_mut() {
        device.recent_errors = totals.get(device.id.as_str()).copied();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::FutureExt;
    use pretty_assertions::assert_eq;

    use super::*;

    fn device(provider: Provider, id: &str) -> Device {
        Device {
            id: id.into(),
            name: format!("device {id}"),
            provider,
            is_online: true,
            links: Vec::new(),
            data_monitors: Vec::new(),
            data_reports: Vec::new(),
            recent_errors: None,
        }
    }

    fn ok(provider: Provider, ids: &[&str]) -> ProviderFetch<'static> {
        let devices: Vec<Device> = ids.iter().map(|id| device(provider, id)).collect();
        ProviderFetch::new(provider, async move { Ok(devices) }.boxed())
    }

    fn failing(provider: Provider) -> ProviderFetch<'static> {
        ProviderFetch::new(
            provider,
            async move {
                Err(CoreError::ProviderFailed {
                    provider: provider.to_string(),
                    message: "HTTP 503".into(),
                })
            }
            .boxed(),
        )
    }

    fn rows(rows: &[(&str, u64)]) -> BoxFuture<'static, Result<Vec<ErrorRow>, CoreError>> {
        let rows: Vec<ErrorRow> = rows
            .iter()
            .map(|(id, n)| ErrorRow {
                agent_id: (*id).into(),
                number_of_errors: *n,
            })
            .collect();
        async move { Ok(rows) }.boxed()
    }

    fn no_error_log() -> BoxFuture<'static, Result<Vec<ErrorRow>, CoreError>> {
        async { Err(CoreError::Internal("error log offline".into())) }.boxed()
    }

    fn ids(devices: &[Device]) -> Vec<&str> {
        devices.iter().map(|d| d.id.as_str()).collect()
    }

    #[tokio::test]
    async fn merges_providers_in_order() {
        let devices = aggregate(
            vec![ok(Provider::Ixon, &["a", "b"]), ok(Provider::Ewon, &["1"])],
            rows(&[]),
        )
        .await
        .unwrap();
        assert_eq!(ids(&devices), vec!["a", "b", "1"]);
    }

    #[tokio::test]
    async fn identity_is_unique_per_provider() {
        let devices = aggregate(
            vec![
                ok(Provider::Ixon, &["a", "a", "b"]),
                ok(Provider::Ewon, &["a"]),
            ],
            rows(&[]),
        )
        .await
        .unwrap();

        let keys: HashSet<_> = devices.iter().map(Device::key).collect();
        assert_eq!(keys.len(), devices.len());
        assert_eq!(devices.len(), 3);
    }

    #[tokio::test]
    async fn partial_failure_keeps_surviving_provider() {
        let devices = aggregate(
            vec![ok(Provider::Ixon, &["a", "b"]), failing(Provider::Ewon)],
            rows(&[]),
        )
        .await
        .unwrap();
        assert_eq!(ids(&devices), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn total_failure_is_no_session_retrieved() {
        let result = aggregate(
            vec![failing(Provider::Ixon), failing(Provider::Ewon)],
            rows(&[]),
        )
        .await;
        assert!(matches!(result, Err(CoreError::NoSessionRetrieved)));
    }

    #[tokio::test]
    async fn no_providers_is_no_session_retrieved() {
        let result = aggregate(Vec::new(), rows(&[])).await;
        assert!(matches!(result, Err(CoreError::NoSessionRetrieved)));
    }

    #[tokio::test]
    async fn empty_success_is_not_a_failure() {
        let devices = aggregate(
            vec![ok(Provider::Ixon, &[]), failing(Provider::Ewon)],
            rows(&[]),
        )
        .await
        .unwrap();
        assert!(devices.is_empty());
    }

    #[tokio::test]
    async fn error_rows_are_summed() {
        let devices = aggregate(
            vec![ok(Provider::Ixon, &["A", "B", "C"])],
            rows(&[("A", 3), ("A", 2), ("B", 0), ("Z", 9)]),
        )
        .await
        .unwrap();

        let errors: Vec<Option<u64>> = devices.iter().map(|d| d.recent_errors).collect();
        assert_eq!(errors, vec![Some(5), Some(0), None]);
    }

    #[tokio::test]
    async fn error_log_failure_leaves_devices_unannotated() {
        let devices = aggregate(vec![ok(Provider::Ixon, &["A"])], no_error_log())
            .await
            .unwrap();
        assert_eq!(devices[0].recent_errors, None);
    }

    #[test]
    fn annotation_is_idempotent() {
        let mut devices = vec![device(Provider::Ixon, "A")];
        let rows = vec![
            ErrorRow {
                agent_id: "A".into(),
                number_of_errors: 3,
            },
            ErrorRow {
                agent_id: "A".into(),
                number_of_errors: 2,
            },
        ];

        annotate_errors(&mut devices, &rows);
        annotate_errors(&mut devices, &rows);

        assert_eq!(devices[0].recent_errors, Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_run_concurrently() {
        use std::time::Duration;

        let slow = |provider: Provider, id: &'static str| {
            ProviderFetch::new(
                provider,
                async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(vec![device(provider, id)])
                }
                .boxed(),
            )
        };
        let errors = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
        .boxed();

        let started = tokio::time::Instant::now();
        let devices = aggregate(vec![slow(Provider::Ixon, "a"), slow(Provider::Ewon, "1")], errors)
            .await
            .unwrap();

        assert_eq!(devices.len(), 2);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
