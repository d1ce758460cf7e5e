//! Device command handlers.

use std::fmt::Write as _;

use tabled::Tabled;
use tracing::warn;

use fleetview_core::{Device, DeviceFilter, find_device};

use crate::cli::{DevicesArgs, DevicesCommand, ListArgs};
use crate::commands::Ctx;
use crate::config::Presentation;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Errors")]
    errors: String,
    #[tabled(rename = "Links")]
    links: String,
    #[tabled(rename = "ID")]
    id: String,
}

fn to_row(device: &Device, color: bool) -> DeviceRow {
    DeviceRow {
        name: device.name.clone(),
        provider: device.provider.to_string(),
        status: output::status_label(device.is_online, color),
        errors: output::errors_label(device.recent_errors, color),
        links: format!("{}/{}", device.navigable_links(), device.links.len()),
        id: device.id.clone(),
    }
}

fn detail(device: &Device, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:      {}", device.name);
    let _ = writeln!(out, "ID:        {}", device.key());
    let _ = writeln!(out, "Status:    {}", output::status_label(device.is_online, color));
    let _ = writeln!(
        out,
        "Errors:    {}",
        output::errors_label(device.recent_errors, color)
    );

    let _ = writeln!(out, "\nLinks:");
    if device.links.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for link in &device.links {
        let target = link.url.as_deref().unwrap_or("(unavailable)");
        let _ = writeln!(out, "  {}  {target}", link.name);
    }

    for (title, entries) in [
        ("Data monitors", &device.data_monitors),
        ("Data reports", &device.data_reports),
    ] {
        if entries.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{title}:");
        for entry in entries {
            let _ = writeln!(out, "  {}  {}", entry.name, entry.url);
        }
    }

    out.trim_end().to_owned()
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(args: DevicesArgs, ctx: &mut Ctx) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List(list) => {
            let devices = ctx.load_devices(list.sort.map_or(ctx.sort, Into::into)).await?;
            let rendered = render_filtered(&devices, &list, ctx.view)?;
            output::print_output(&rendered, ctx.view.quiet);
            Ok(())
        }

        DevicesCommand::Show { device } => {
            let devices = ctx.load_devices(ctx.sort).await?;
            let found = find_device(&devices, &device)?;
            let color = ctx.view.color;
            let rendered = output::render_single(
                ctx.view.format,
                found,
                |d| detail(d, color),
                |d| d.key().to_string(),
            )?;
            output::print_output(&rendered, ctx.view.quiet);
            Ok(())
        }

        DevicesCommand::Watch { list, interval } => watch(ctx, &list, interval).await,
    }
}

fn filter_for(list: &ListArgs) -> DeviceFilter {
    DeviceFilter::new(
        list.query.as_deref().unwrap_or_default(),
        list.provider.into(),
        list.status.into(),
    )
}

fn render_filtered(
    devices: &[Device],
    list: &ListArgs,
    view: Presentation,
) -> Result<String, CliError> {
    let shown = filter_for(list).apply(devices);
    output::render_list(
        view.format,
        &shown,
        |d| to_row(d, view.color),
        |d| d.key().to_string(),
    )
}

/// Refresh on `interval` until Ctrl-C, renewing sessions on their own
/// schedule. A failed pass is logged and retried at the next tick; only a
/// failed re-authentication ends the watch.
async fn watch(ctx: &mut Ctx, list: &ListArgs, interval: u64) -> Result<(), CliError> {
    use tokio::time::{self, Duration, Instant, MissedTickBehavior};

    let key = list.sort.map_or(ctx.sort, Into::into);

    let mut refresh = time::interval(Duration::from_secs(interval));
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut keep_alive = time::interval_at(Instant::now() + ctx.renew_every, ctx.renew_every);
    keep_alive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("watch interrupted");
                return Ok(());
            }
            _ = refresh.tick() => {
                match ctx.load_devices(key).await {
                    Ok(devices) => {
                        let rendered = render_filtered(&devices, list, ctx.view)?;
                        if !ctx.view.quiet {
                            println!(
                                "── {} · {} devices ──",
                                chrono::Local::now().format("%H:%M:%S"),
                                devices.len()
                            );
                        }
                        output::print_output(&rendered, ctx.view.quiet);
                    }
                    Err(err @ (CliError::AuthFailed { .. } | CliError::NoCredentials { .. })) => {
                        return Err(err);
                    }
                    Err(err) => warn!(error = %err, "refresh failed"),
                }
            }
            _ = keep_alive.tick() => ctx.keep_alive().await?,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use fleetview_core::{DashboardLink, Link, Provider};

    use super::*;

    fn device() -> Device {
        Device {
            id: "a1".into(),
            name: "Boiler Room".into(),
            provider: Provider::Ixon,
            is_online: true,
            links: vec![
                Link {
                    name: "HMI".into(),
                    url: Some("https://hmi.example/".into()),
                },
                Link {
                    name: "PLC".into(),
                    url: None,
                },
            ],
            data_monitors: vec![DashboardLink {
                name: "Temperatures".into(),
                url: "https://portal.example/agents/a1/data-monitors/m1".into(),
            }],
            data_reports: Vec::new(),
            recent_errors: Some(4),
        }
    }

    #[test]
    fn row_counts_navigable_links() {
        let row = to_row(&device(), false);
        assert_eq!(row.links, "1/2");
        assert_eq!(row.status, "online");
        assert_eq!(row.errors, "4");
        assert_eq!(row.provider, "ixon");
    }

    #[test]
    fn detail_lists_links_and_dashboards() {
        let text = detail(&device(), false);
        assert!(text.contains("ID:        ixon:a1"));
        assert!(text.contains("PLC  (unavailable)"));
        assert!(text.contains("Data monitors:"));
        assert!(text.contains("Temperatures"));
        assert!(!text.contains("Data reports:"));
    }
}
