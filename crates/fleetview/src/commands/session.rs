//! `whoami` and `check`.

use std::fmt::Write as _;

use serde::Serialize;

use fleetview_core::SessionHealth;

use crate::commands::Ctx;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Identity {
    public_id: Option<String>,
    name: Option<String>,
    email_address: Option<String>,
    permissions: Vec<String>,
    ewon_session: bool,
}

pub async fn whoami(ctx: &Ctx) -> Result<(), CliError> {
    let profile = ctx.dashboard.current_user(&ctx.sessions).await?;
    let identity = Identity {
        public_id: profile.public_id,
        name: profile.name,
        email_address: profile.email_address,
        permissions: ctx.sessions.permissions.clone(),
        ewon_session: ctx.sessions.ewon.is_some(),
    };

    let rendered = output::render_single(
        ctx.view.format,
        &identity,
        |i| {
            let mut out = String::new();
            let _ = writeln!(out, "User:         {}", i.name.as_deref().unwrap_or("-"));
            let _ = writeln!(out, "Email:        {}", i.email_address.as_deref().unwrap_or("-"));
            let _ = writeln!(out, "ID:           {}", i.public_id.as_deref().unwrap_or("-"));
            let _ = writeln!(out, "Ewon session: {}", if i.ewon_session { "yes" } else { "no" });
            let _ = write!(out, "Permissions:  {}", i.permissions.join(", "));
            out
        },
        |i| i.public_id.clone().unwrap_or_default(),
    )?;
    output::print_output(&rendered, ctx.view.quiet);
    Ok(())
}

fn health_label(valid: Option<bool>, color: bool) -> String {
    match valid {
        None => "not signed in".into(),
        Some(valid) => output::flag_label(valid, "valid", "expired", color),
    }
}

/// Probe both sessions; unhealthy sessions exit with the auth code.
pub async fn check(ctx: &Ctx) -> Result<(), CliError> {
    let health = ctx.dashboard.check_sessions(&ctx.sessions).await;
    let color = ctx.view.color;

    let rendered = output::render_single(
        ctx.view.format,
        &health,
        |h: &SessionHealth| {
            format!(
                "Ixon: {}\nEwon: {}",
                health_label(Some(h.ixon), color),
                health_label(h.ewon, color)
            )
        },
        |h| if h.is_healthy() { "ok".into() } else { "expired".into() },
    )?;
    output::print_output(&rendered, ctx.view.quiet);

    if health.is_healthy() {
        Ok(())
    } else {
        Err(CliError::AuthFailed {
            message: "a provider session did not validate".into(),
        })
    }
}
