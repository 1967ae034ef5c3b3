//! `holectl status`.

use serde::Serialize;
use tabled::Tabled;

use holectl_core::{CanonicalStatus, Negotiator, format_remaining};

use crate::cli::GlobalOpts;
use crate::config::Target;
use crate::error::CliError;
use crate::output;

/// What `status` reports, in every output format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView {
    host: String,
    /// `v5` or `v6`: whichever generation answered.
    api: String,
    blocking_enabled: bool,
    remaining_disable_seconds: u64,
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Blocking")]
    blocking: String,
    #[tabled(rename = "Re-enables in")]
    remaining: String,
    #[tabled(rename = "API")]
    api: String,
}

fn remaining_cell(view: &StatusView) -> String {
    if view.blocking_enabled {
        "-".into()
    } else if view.remaining_disable_seconds == 0 {
        "never".into()
    } else {
        format_remaining(view.remaining_disable_seconds)
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    negotiator: &Negotiator,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let status: CanonicalStatus = negotiator.get_status(&target.host, &target.password).await?;

    let view = StatusView {
        host: target.host.clone(),
        api: negotiator
            .preferred_generation()
            .generation()
            .map_or_else(|| "unknown".into(), |g| g.to_string()),
        blocking_enabled: status.blocking_enabled,
        remaining_disable_seconds: status.remaining_disable_seconds,
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| {
            output::render_table(&[StatusRow {
                host: v.host.clone(),
                blocking: output::blocking_label(v.blocking_enabled, color),
                remaining: remaining_cell(v),
                api: v.api.clone(),
            }])
        },
        |v| output::blocking_label(v.blocking_enabled, false),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
