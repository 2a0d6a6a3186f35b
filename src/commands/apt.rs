//! Type-safe arguments for the Debian package manager.
//!
//! - `AptUpdateArgs` refreshes the package cache
//! - `AptInstallArgs` installs one or more packages non-interactively

use crate::command_traits::CommandArgs;

/// Environment that keeps debconf from prompting on a headless run.
fn noninteractive_env() -> Vec<(String, String)> {
    vec![("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())]
}

// ============================================================================
// Cache refresh
// ============================================================================

/// `apt-get update`
#[derive(Debug, Clone)]
pub struct AptUpdateArgs {
    /// Package manager front-end (normally `apt-get`).
    pub program: String,
}

impl CommandArgs for AptUpdateArgs {
    fn program(&self) -> &str {
        &self.program
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["update".to_string()]
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        noninteractive_env()
    }

    fn is_mutating(&self) -> bool {
        true
    }
}

// ============================================================================
// Install
// ============================================================================

/// `apt-get install -y <packages...>`
///
/// | Rust Field | CLI Flag | Notes |
/// |------------|----------|-------|
/// | `packages` | trailing | One or more package names |
#[derive(Debug, Clone)]
pub struct AptInstallArgs {
    pub program: String,
    pub packages: Vec<String>,
}

impl CommandArgs for AptInstallArgs {
    fn program(&self) -> &str {
        &self.program
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec!["install".to_string(), "-y".to_string()];
        args.extend(self.packages.iter().cloned());
        args
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        noninteractive_env()
    }

    fn is_mutating(&self) -> bool {
        true
    }
}
