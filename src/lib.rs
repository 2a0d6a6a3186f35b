//! audio-setup library
//!
//! A bootstrap fetcher that downloads and runs a provisioning artifact, and
//! the idempotent provisioner that configures ALSA on Debian-based hosts.

pub mod bootstrap;
pub mod cli;
pub mod command_runner;
pub mod command_traits;
pub mod commands;
pub mod config_file;
pub mod error;
pub mod host;
pub mod logging;
pub mod process_guard;
pub mod provision;
pub mod types;

pub use bootstrap::source::{ArtifactSource, HttpSource};
pub use bootstrap::{Bootstrapper, FetchedArtifact};
pub use command_runner::{run_command_safe, CommandOutput};
pub use command_traits::CommandArgs;
pub use config_file::{BootstrapSettings, PackageSpec, ProvisionSettings, SetupConfig};
pub use error::{Result, SetupError};
pub use host::{Host, SystemHost};
pub use logging::LogSink;
pub use process_guard::{ChildRegistry, CommandProcessGroup, TrackedDir};
pub use provision::summary::ProvisionReport;
pub use provision::{LogTarget, Provisioner};
pub use types::{Severity, Toggle};
