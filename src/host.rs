//! The seam between provisioning logic and the machine it runs on.
//!
//! Stages never call `Command::new` or `geteuid` themselves; they ask a
//! `Host`. `SystemHost` answers from the real system, and tests supply a
//! scripted host that models groups, users and installed executables.

use crate::command_runner::{run_command_safe, CommandOutput};
use crate::command_traits::CommandArgs;
use anyhow::Result;

/// Everything a provisioning stage needs from the machine.
pub trait Host {
    /// Effective UID is 0
    fn is_root(&self) -> bool;

    /// `name` resolves to an executable on PATH
    fn has_executable(&self, name: &str) -> bool;

    /// Run a command. `Err` only for spawn/wait failures.
    fn run(&mut self, args: &dyn CommandArgs) -> Result<CommandOutput>;

    /// Value of `SUDO_USER`, used as the default target user
    fn sudo_user(&self) -> Option<String> {
        None
    }
}

/// The real machine.
#[derive(Debug, Clone, Default)]
pub struct SystemHost {
    dry_run: bool,
}

impl SystemHost {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl Host for SystemHost {
    fn is_root(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    fn has_executable(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }

    fn run(&mut self, args: &dyn CommandArgs) -> Result<CommandOutput> {
        run_command_safe(args, self.dry_run)
    }

    fn sudo_user(&self) -> Option<String> {
        std::env::var("SUDO_USER").ok()
    }
}
