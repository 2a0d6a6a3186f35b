//! Bootstrap fetcher.
//!
//! Resolves the live branch of the repository, downloads the provisioning
//! artifact into a private temporary directory, optionally installs a
//! durable copy, and runs the artifact as a child process whose exit code
//! becomes ours.
//!
//! # Failure Policy
//!
//! - Branch probe failure: fall back to the second candidate, never fatal
//! - Download failure: fatal (`SetupError::Download`)
//! - Local copy failure: warning, the run continues
//!
//! The temporary directory is owned by `FetchedArtifact` and removed when it
//! drops, on success and on every error path. It is also tracked by the
//! process guard, which removes it if the run is interrupted by a signal.

pub mod source;

use crate::config_file::BootstrapSettings;
use crate::error::{Result, SetupError};
use crate::process_guard::{CommandProcessGroup, RegisteredChild, TrackedDir};
use crate::types::Toggle;
use source::ArtifactSource;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tempfile::TempDir;

/// A downloaded artifact and the directory that holds it.
#[derive(Debug)]
pub struct FetchedArtifact {
    dir: TempDir,
    path: PathBuf,
    pub branch: String,
    // Dropped after `dir`.
    _tracked: TrackedDir,
}

impl FetchedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

pub struct Bootstrapper {
    settings: BootstrapSettings,
    install_copy: Toggle,
}

impl Bootstrapper {
    pub fn new(settings: BootstrapSettings, install_copy: Toggle) -> Self {
        Self {
            settings,
            install_copy,
        }
    }

    /// `<origin>/<repository>/<branch>/<artifact_path>`
    pub fn artifact_url(&self, branch: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.settings.raw_origin.trim_end_matches('/'),
            self.settings.repository.trim_matches('/'),
            branch,
            self.settings.artifact_path.trim_start_matches('/')
        )
    }

    /// Probe the first branch candidate; fall back to the second without probing.
    pub fn resolve_branch(&self, source: &dyn ArtifactSource) -> String {
        let candidates = &self.settings.branch_candidates;
        let Some(first) = candidates.first() else {
            return "main".to_string();
        };

        if source.exists(&self.artifact_url(first)) {
            tracing::info!("Using branch '{}'", first);
            return first.clone();
        }

        match candidates.get(1) {
            Some(second) => {
                tracing::info!("Branch '{}' not reachable, falling back to '{}'", first, second);
                second.clone()
            }
            None => first.clone(),
        }
    }

    /// Download the artifact into a fresh private temporary directory.
    pub fn fetch(&self, source: &dyn ArtifactSource) -> Result<FetchedArtifact> {
        let branch = self.resolve_branch(source);
        let url = self.artifact_url(&branch);

        let dir = tempfile::Builder::new().prefix("audio-setup.").tempdir()?;
        let tracked = TrackedDir::new(dir.path());
        let file_name = Path::new(&self.settings.artifact_path)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "install-audio".into());
        let path = dir.path().join(file_name);

        tracing::info!("Downloading {}", url);
        let bytes = source.download(&url, &path)?;
        if !path.is_file() {
            return Err(SetupError::download(format!("{}: nothing was written", url)));
        }
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        tracing::debug!("Downloaded {} bytes to {}", bytes, path.display());

        Ok(FetchedArtifact {
            dir,
            path,
            branch,
            _tracked: tracked,
        })
    }

    /// Copy the artifact to the install path. Returns the installed path on success.
    pub fn install_local_copy(&self, artifact: &FetchedArtifact) -> Option<PathBuf> {
        if !self.install_copy.as_bool() {
            tracing::debug!("Local copy disabled");
            return None;
        }

        let target = &self.settings.install_path;
        match copy_executable(artifact.path(), target) {
            Ok(()) => {
                tracing::info!("Installed {} for later runs", target.display());
                Some(target.clone())
            }
            Err(e) => {
                tracing::warn!("Could not install {}: {}", target.display(), e);
                None
            }
        }
    }

    /// Resolve, download, optionally install, then run the artifact.
    /// Returns the artifact's exit code.
    pub fn run(&self, source: &dyn ArtifactSource) -> Result<i32> {
        let artifact = self.fetch(source)?;
        self.install_local_copy(&artifact);
        let code = execute(artifact.path())?;
        drop(artifact);
        Ok(code)
    }
}

fn copy_executable(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::copy(from, to)?;
    fs::set_permissions(to, fs::Permissions::from_mode(0o755))
}

/// Run an executable with inherited stdio and return its exit code.
pub fn execute(path: &Path) -> Result<i32> {
    tracing::info!("Running {}", path.display());
    let mut child = Command::new(path)
        .in_new_process_group()
        .spawn()
        .map_err(|e| SetupError::command(format!("Failed to run {}: {}", path.display(), e)))?;
    let registration = RegisteredChild::register(child.id());
    let status = child
        .wait()
        .map_err(|e| SetupError::command(format!("Failed waiting for {}: {}", path.display(), e)))?;
    drop(registration);

    let code = exit_code_of(status);
    tracing::debug!("{} exited with {}", path.display(), code);
    Ok(code)
}

/// Exit code, or `128 + signal` for a child killed by a signal.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|s| 128 + s))
        .unwrap_or(1)
}
