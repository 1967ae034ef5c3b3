//! `holectl enable` and `holectl disable`.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use holectl_core::{Acknowledgement, Negotiator, format_remaining};

use crate::cli::{DisableArgs, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleView {
    host: String,
    api: String,
    blocking_enabled: bool,
    /// Requested disable duration; `0` means until re-enabled.
    duration_seconds: u64,
    /// The Pi-hole's own reply.
    response: Value,
}

impl ToggleView {
    fn new(target: &Target, ack: Acknowledgement, enabled: bool, duration_seconds: u64) -> Self {
        Self {
            host: target.host.clone(),
            api: ack.generation.to_string(),
            blocking_enabled: enabled,
            duration_seconds,
            response: ack.raw,
        }
    }

    fn summary(&self, color: bool) -> String {
        let state = output::blocking_label(self.blocking_enabled, color);
        let suffix = match (self.blocking_enabled, self.duration_seconds) {
            (true, _) => String::new(),
            (false, 0) => " until re-enabled".into(),
            (false, secs) => format!(" for {}", format_remaining(secs)),
        };
        format!("Blocking {state}{suffix} on {} ({} API)", self.host, self.api)
    }
}

fn print(view: &ToggleView, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        view,
        |v| v.summary(color),
        |v| output::blocking_label(v.blocking_enabled, false),
    );
    output::print_output(&out, global.quiet);
}

/// Whole seconds to disable for. `None` means indefinitely.
fn disable_seconds(duration: Option<humantime::Duration>) -> Result<u64, CliError> {
    let Some(duration) = duration else {
        return Ok(0);
    };
    let secs = Duration::from(duration).as_secs();
    if secs == 0 {
        return Err(CliError::Validation {
            field: "duration".into(),
            reason: "must be at least 1s (omit it to disable until re-enabled)".into(),
        });
    }
    Ok(secs)
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn enable(
    negotiator: &Negotiator,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ack = negotiator.enable(&target.host, &target.password).await?;
    print(&ToggleView::new(target, ack, true, 0), global);
    Ok(())
}

pub async fn disable(
    negotiator: &Negotiator,
    target: &Target,
    args: DisableArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let seconds = disable_seconds(args.duration)?;
    let ack = negotiator
        .disable(&target.host, &target.password, seconds)
        .await?;
    print(&ToggleView::new(target, ack, false, seconds), global);
    Ok(())
}
