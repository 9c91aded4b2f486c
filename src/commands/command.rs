//! Command trait definition for CLI commands.
//!
//! Commands are dispatched through `enum_dispatch` from the subcommand enum
//! in `main`.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// Trait implemented by all covcap CLI commands.
///
/// The `command_line` parameter contains the full invocation for @PG records.
#[enum_dispatch]
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str) -> Result<()>;
}
