//! Type-safe external command contracts.
//!
//! Every external command the provisioner runs is described by a struct that
//! implements `CommandArgs`. The struct owns the mapping from Rust fields to
//! the program's argv and environment, so flag mistakes are fixed in one
//! place and tests can assert on exact argument vectors.

use std::fmt;

/// Trait for typed command arguments.
///
/// # Contract
///
/// - `program()`: Executable name, resolved on PATH at spawn time.
/// - `to_cli_args()`: Arguments exactly as the program expects them.
/// - `get_env_vars()`: Extra environment variables for the child.
/// - `is_mutating()`: Whether running the command changes system state.
///   Mutating commands are skipped in dry-run mode.
///
/// # Example
///
/// ```
/// use audio_setup::command_traits::CommandArgs;
/// use audio_setup::commands::accounts::AddUserToGroupArgs;
///
/// let args = AddUserToGroupArgs {
///     user: "pi".to_string(),
///     group: "audio".to_string(),
/// };
/// assert_eq!(args.program(), "usermod");
/// assert_eq!(args.to_cli_args(), vec!["-aG", "audio", "pi"]);
/// assert!(args.is_mutating());
/// ```
pub trait CommandArgs: fmt::Debug {
    /// Executable name (e.g., `apt-get`).
    fn program(&self) -> &str;

    /// Convert struct fields to CLI arguments.
    fn to_cli_args(&self) -> Vec<String>;

    /// Environment variables the command requires.
    fn get_env_vars(&self) -> Vec<(String, String)> {
        vec![]
    }

    /// Whether this command modifies the host.
    fn is_mutating(&self) -> bool {
        false
    }

    /// Shell-like rendering used in log lines.
    fn command_line(&self) -> String {
        let mut parts = vec![self.program().to_string()];
        parts.extend(self.to_cli_args());
        parts.join(" ")
    }
}
