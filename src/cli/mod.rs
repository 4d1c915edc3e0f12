//! cli
//!
//! Command-line interface: argument grammar and command dispatch.

pub mod args;
pub mod commands;

use crate::ui::output::Verbosity;

/// Parse arguments and run the requested command.
pub fn run() -> anyhow::Result<()> {
    let cli = args::Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    commands::dispatch(cli.command, cli.cwd.as_deref(), verbosity)
}
