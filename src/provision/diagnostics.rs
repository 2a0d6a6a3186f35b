//! Sound device snapshot.
//!
//! Purely informational: the enumeration file and the listing tool only feed
//! the run log. An unreadable enumeration file is a warning; a missing or
//! failing listing tool is ignored.

use crate::command_traits::CommandArgs;
use crate::commands::diagnostics::ListDevicesArgs;
use crate::host::Host;
use crate::provision::context::RunContext;
use std::path::Path;

/// What the snapshot saw, for the caller and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    /// Contents of the enumeration file, if readable
    pub cards: Option<String>,
    /// Output of the listing tool, if it ran successfully
    pub listing: Option<String>,
}

pub fn snapshot_devices(
    host: &mut dyn Host,
    ctx: &mut RunContext,
    cards_path: &Path,
    tool: Option<&str>,
    tool_args: &[String],
) -> DeviceSnapshot {
    let cards = match std::fs::read_to_string(cards_path) {
        Ok(content) => {
            tracing::info!("Detected sound cards ({}):", cards_path.display());
            for line in content.lines() {
                tracing::info!("  {}", line);
            }
            Some(content)
        }
        Err(e) => {
            ctx.degrade(format!("Cannot read {}: {}", cards_path.display(), e));
            None
        }
    };

    let listing = tool.and_then(|tool| list_with_tool(host, tool, tool_args));

    DeviceSnapshot { cards, listing }
}

fn list_with_tool(host: &mut dyn Host, tool: &str, tool_args: &[String]) -> Option<String> {
    if !host.has_executable(tool) {
        tracing::debug!("{} not available, skipping device listing", tool);
        return None;
    }

    let args = ListDevicesArgs {
        tool: tool.to_string(),
        args: tool_args.to_vec(),
    };
    match host.run(&args) {
        Ok(out) if out.success => {
            for line in out.stdout.lines() {
                tracing::info!("  {}", line);
            }
            Some(out.stdout)
        }
        Ok(out) => {
            tracing::debug!("{} exited with {}", args.command_line(), out.failure_reason());
            None
        }
        Err(e) => {
            tracing::debug!("{} could not run: {:#}", tool, e);
            None
        }
    }
}
