//! Type-safe command execution
//!
//! All external commands go through `run_command_safe`, which:
//!
//! - spawns the program in its own process group and registers its PID,
//! - captures stdout and stderr,
//! - writes the full command line and its output to the run log,
//! - skips mutating commands in dry-run mode.

use crate::command_traits::CommandArgs;
use crate::process_guard::{CommandProcessGroup, RegisteredChild};
use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Execute a command with type-safe arguments.
///
/// A non-zero exit is not an error here: it comes back as an output with
/// `success == false` so the caller can decide how severe it is. `Err` is
/// reserved for spawn and wait failures (e.g. the program does not exist).
pub fn run_command_safe(args: &dyn CommandArgs, dry_run: bool) -> Result<CommandOutput> {
    let program = args.program();
    let cli_args = args.to_cli_args();
    let env_vars = args.get_env_vars();

    if dry_run && args.is_mutating() {
        tracing::info!("[DRY RUN] Skipped: {}", args.command_line());
        return Ok(CommandOutput::dry_run(args));
    }

    tracing::debug!("run_command_safe: {} args={:?} env={:?}", program, cli_args, env_vars);

    let mut cmd = Command::new(program);
    cmd.args(&cli_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .in_new_process_group();

    for (key, value) in &env_vars {
        cmd.env(key, value);
    }

    let child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;
    let registration = RegisteredChild::register(child.id());

    let output = child
        .wait_with_output()
        .with_context(|| format!("Failed waiting for {}", program))?;
    drop(registration);

    let result = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code(),
        success: output.status.success(),
        dry_run: false,
    };
    result.log_streams(program);

    if result.success {
        tracing::debug!("{} exited successfully", program);
    } else {
        tracing::debug!("{} failed with exit code {}", program, result.exit_code.unwrap_or(-1));
    }

    Ok(result)
}

/// Output from a command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Whether the command was skipped because of dry-run mode.
    pub dry_run: bool,
}

impl CommandOutput {
    /// Synthetic successful output for a skipped mutating command.
    pub fn dry_run(args: &dyn CommandArgs) -> Self {
        Self {
            stdout: format!("[DRY RUN] Skipped: {}\n", args.command_line()),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
            dry_run: true,
        }
    }

    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
            success: true,
            ..Self::default()
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            exit_code: Some(code),
            success: false,
            ..Self::default()
        }
    }

    /// Short failure description for summaries.
    pub fn failure_reason(&self) -> String {
        let code = self
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        match self.stderr.trim().lines().last() {
            Some(line) if !line.is_empty() => format!("exit {}: {}", code, line),
            _ => format!("exit {}", code),
        }
    }

    fn log_streams(&self, program: &str) {
        for line in self.stdout.lines() {
            tracing::debug!(target: "audio_setup::output", "[{} stdout] {}", program, line);
        }
        for line in self.stderr.lines() {
            tracing::debug!(target: "audio_setup::output", "[{} stderr] {}", program, line);
        }
    }
}
