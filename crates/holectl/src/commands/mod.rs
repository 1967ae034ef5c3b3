//! Command dispatch: bridges CLI args -> negotiator calls -> output formatting.

pub mod blocking;
pub mod config_cmd;
pub mod status;

use holectl_core::Negotiator;

use crate::cli::{Command, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

/// Dispatch a Pi-hole-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    negotiator: &Negotiator,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(negotiator, target, global).await,
        Command::Enable => blocking::enable(negotiator, target, global).await,
        Command::Disable(args) => blocking::disable(negotiator, target, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
