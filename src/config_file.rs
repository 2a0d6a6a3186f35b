//! Configuration file handling for audio-setup.
//!
//! Every field has a built-in default, so the tool runs without any file.
//! A JSON file passed with `--config` overrides individual fields; missing
//! sections and fields keep their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default run log location
pub const DEFAULT_LOG_PATH: &str = "/var/log/audio-setup.log";

/// Default module configuration file
pub const DEFAULT_MODULE_CONFIG_PATH: &str = "/etc/modprobe.d/alsa-base.conf";

/// Default module parameter directive
pub const DEFAULT_MODULE_LINE: &str = "options snd-usb-audio index=0";

/// Environment variable controlling the durable local copy of the artifact
pub const INSTALL_COPY_ENV: &str = "AUDIO_SETUP_INSTALL_COPY";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub provision: ProvisionSettings,
    pub bootstrap: BootstrapSettings,
}

/// A package and the executable whose presence stands in for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Package name as the package manager knows it
    pub name: String,
    /// Representative executable looked up on PATH
    pub executable: String,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, executable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            executable: executable.into(),
        }
    }
}

/// Target file and directive for the module configuration step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfigSettings {
    pub path: PathBuf,
    pub line: String,
    /// Permission bits used when the file has to be created
    pub mode: u32,
}

impl Default for ModuleConfigSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODULE_CONFIG_PATH),
            line: DEFAULT_MODULE_LINE.to_string(),
            mode: 0o644,
        }
    }
}

/// Settings for the provisioner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionSettings {
    pub log_path: PathBuf,
    pub group: String,
    /// User added to `group`; `SUDO_USER` or `root` when unset
    pub target_user: Option<String>,
    pub packages: Vec<PackageSpec>,
    /// Package manager front-end; its absence marks the host as unsupported
    pub package_manager: String,
    /// Hardware enumeration pseudo-file
    pub cards_path: PathBuf,
    /// Optional device listing tool and its arguments
    pub diagnostic_tool: Option<String>,
    pub diagnostic_args: Vec<String>,
    pub module_config: ModuleConfigSettings,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            group: "audio".to_string(),
            target_user: None,
            packages: vec![PackageSpec::new("alsa-utils", "aplay")],
            package_manager: "apt-get".to_string(),
            cards_path: PathBuf::from("/proc/asound/cards"),
            diagnostic_tool: Some("aplay".to_string()),
            diagnostic_args: vec!["-l".to_string()],
            module_config: ModuleConfigSettings::default(),
        }
    }
}

impl ProvisionSettings {
    /// Resolve the user whose group membership is managed.
    ///
    /// Order: configured `target_user`, then the `sudo_user` value
    /// (normally `SUDO_USER`), then `root`.
    pub fn resolve_target_user(&self, sudo_user: Option<String>) -> String {
        self.target_user
            .clone()
            .or_else(|| sudo_user.filter(|u| !u.trim().is_empty()))
            .unwrap_or_else(|| "root".to_string())
    }
}

/// Settings for the bootstrap fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    /// Raw content origin, without trailing slash
    pub raw_origin: String,
    /// `owner/name` on the hosting service
    pub repository: String,
    /// Branch names tried in order; only the first is probed
    pub branch_candidates: Vec<String>,
    /// Artifact path inside the repository
    pub artifact_path: String,
    /// Where the durable copy of the artifact is installed
    pub install_path: PathBuf,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            raw_origin: "https://raw.githubusercontent.com".to_string(),
            repository: "audio-setup/audio-setup".to_string(),
            branch_candidates: vec!["main".to_string(), "master".to_string()],
            artifact_path: "install-audio.sh".to_string(),
            install_path: PathBuf::from("/usr/local/bin/install-audio"),
        }
    }
}

impl SetupConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Load `path` if given, otherwise the built-in defaults, and validate.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let p = &self.provision;

        validate_account_name("group", &p.group)?;
        if let Some(ref user) = p.target_user {
            validate_account_name("target_user", user)?;
        }

        if p.package_manager.trim().is_empty() {
            anyhow::bail!("package_manager cannot be empty");
        }
        for pkg in &p.packages {
            if pkg.name.trim().is_empty() || pkg.executable.trim().is_empty() {
                anyhow::bail!("Package entries need both a name and an executable");
            }
            if pkg.name.starts_with('-') || pkg.name.contains(char::is_whitespace) {
                anyhow::bail!("Invalid package name: {:?}", pkg.name);
            }
        }

        let line = &p.module_config.line;
        if line.trim().is_empty() {
            anyhow::bail!("module_config.line cannot be empty");
        }
        if line.contains('\n') || line.contains('\r') {
            anyhow::bail!("module_config.line must be a single line");
        }
        if p.module_config.mode > 0o7777 {
            anyhow::bail!("module_config.mode {:o} is not a permission mask", p.module_config.mode);
        }

        let b = &self.bootstrap;
        if !b.raw_origin.starts_with("https://") && !b.raw_origin.starts_with("http://") {
            anyhow::bail!("raw_origin must be an http(s) URL: {}", b.raw_origin);
        }
        if b.repository.split('/').filter(|s| !s.is_empty()).count() != 2 {
            anyhow::bail!("repository must be in owner/name form: {}", b.repository);
        }
        if b.branch_candidates.is_empty() || b.branch_candidates.iter().any(|s| s.trim().is_empty()) {
            anyhow::bail!("branch_candidates must list at least one non-empty branch");
        }
        if b.artifact_path.trim().is_empty() {
            anyhow::bail!("artifact_path cannot be empty");
        }

        Ok(())
    }
}

/// Validate a POSIX user or group name the way `useradd`/`groupadd` accept it
fn validate_account_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 32 {
        anyhow::bail!("{} must be between 1 and 32 characters", field);
    }
    if name.starts_with('-') {
        anyhow::bail!("{} cannot start with a hyphen", field);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        anyhow::bail!("{} contains invalid characters: {:?}", field, name);
    }
    Ok(())
}
