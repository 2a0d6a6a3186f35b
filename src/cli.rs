use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// audio-setup - Idempotent ALSA provisioning for Debian-based hosts
#[derive(Parser, Debug)]
#[command(name = "audio-setup")]
#[command(about = "Install ALSA tooling, configure module options and audio group membership")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would change without changing anything.
    ///
    /// Queries (group lookups, device listing) still run so the preview is
    /// realistic; package installs, group changes and file writes are skipped.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// JSON configuration file overriding the built-in defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Configure this host for audio (default when no command is given)
    Provision {
        /// Exit with code 2 if any step was degraded or failed
        #[arg(long)]
        strict: bool,
    },
    /// Download the provisioning artifact and run it
    Bootstrap {
        /// Do not keep a copy of the artifact at the install path
        /// (overrides AUDIO_SETUP_INSTALL_COPY)
        #[arg(long)]
        no_install_copy: bool,
    },
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
