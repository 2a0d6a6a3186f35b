//! Shared fixtures for the provisioning tests.
//!
//! `FakeHost` models just enough of a Debian machine for the stages to
//! converge: groups, per-user memberships, executables on PATH and which
//! executable each package provides. Every command it receives is recorded.

#![allow(dead_code)]

use audio_setup::config_file::{ModuleConfigSettings, ProvisionSettings};
use audio_setup::{CommandArgs, CommandOutput, Host, PackageSpec};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const MODULE_LINE: &str = "options snd-usb-audio index=0";

pub const CARDS: &str = " 0 [Device         ]: USB-Audio - USB Audio Device\n";

pub const APLAY_LISTING: &str = "**** List of PLAYBACK Hardware Devices ****\n\
card 0: Device [USB Audio Device], device 0: USB Audio [USB Audio]\n";

#[derive(Debug, Default)]
pub struct FakeHost {
    pub root: bool,
    pub sudo_user: Option<String>,
    pub executables: HashSet<String>,
    pub groups: HashSet<String>,
    /// user -> supplementary groups
    pub users: HashMap<String, Vec<String>>,
    /// package -> executable it provides once installed
    pub provides: HashMap<String, String>,
    /// Command line prefixes that exit non-zero
    pub failing: Vec<String>,
    pub calls: Vec<String>,
}

impl FakeHost {
    /// Fresh Debian host: root, apt-get available, user `pi` exists, no audio
    /// group, no ALSA tools.
    pub fn fresh_debian() -> Self {
        let mut host = Self {
            root: true,
            ..Self::default()
        };
        host.executables.insert("apt-get".to_string());
        host.users.insert("pi".to_string(), vec!["pi".to_string()]);
        host.groups.insert("pi".to_string());
        host.provides.insert("alsa-utils".to_string(), "aplay".to_string());
        host
    }

    pub fn fail(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    pub fn calls_to(&self, program: &str) -> Vec<&String> {
        self.calls
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(program))
            .collect()
    }

    pub fn mutating_calls(&self) -> Vec<&String> {
        self.calls
            .iter()
            .filter(|c| {
                c.starts_with("groupadd")
                    || c.starts_with("usermod")
                    || c.starts_with("apt-get")
            })
            .collect()
    }

    pub fn in_group(&self, user: &str, group: &str) -> bool {
        self.users
            .get(user)
            .is_some_and(|groups| groups.iter().any(|g| g == group))
    }
}

impl Host for FakeHost {
    fn is_root(&self) -> bool {
        self.root
    }

    fn has_executable(&self, name: &str) -> bool {
        self.executables.contains(name)
    }

    fn run(&mut self, args: &dyn CommandArgs) -> anyhow::Result<CommandOutput> {
        let line = args.command_line();
        self.calls.push(line.clone());

        if self.failing.iter().any(|prefix| line.starts_with(prefix.as_str())) {
            return Ok(CommandOutput::failed(1, format!("{}: simulated failure", args.program())));
        }

        let argv = args.to_cli_args();
        let output = match args.program() {
            "getent" => {
                let group = &argv[1];
                if self.groups.contains(group) {
                    CommandOutput::ok(format!("{}:x:29:\n", group))
                } else {
                    CommandOutput::failed(2, "")
                }
            }
            "groupadd" => {
                self.groups.insert(argv[0].clone());
                CommandOutput::ok("")
            }
            "id" => match self.users.get(&argv[1]) {
                Some(groups) => CommandOutput::ok(format!("{}\n", groups.join(" "))),
                None => CommandOutput::failed(1, format!("id: '{}': no such user", argv[1])),
            },
            "usermod" => {
                let (group, user) = (&argv[1], &argv[2]);
                match self.users.get_mut(user) {
                    Some(groups) => {
                        groups.push(group.clone());
                        CommandOutput::ok("")
                    }
                    None => CommandOutput::failed(6, format!("usermod: user '{}' does not exist", user)),
                }
            }
            "apt-get" => match argv[0].as_str() {
                "update" => CommandOutput::ok("Reading package lists... Done\n"),
                "install" => {
                    for package in &argv[2..] {
                        match self.provides.get(package) {
                            Some(exe) => {
                                self.executables.insert(exe.clone());
                            }
                            None => {
                                return Ok(CommandOutput::failed(
                                    100,
                                    format!("E: Unable to locate package {}", package),
                                ));
                            }
                        }
                    }
                    CommandOutput::ok("")
                }
                other => anyhow::bail!("unexpected apt-get verb {}", other),
            },
            "aplay" => CommandOutput::ok(APLAY_LISTING),
            other => anyhow::bail!("{}: command not found", other),
        };
        Ok(output)
    }

    fn sudo_user(&self) -> Option<String> {
        self.sudo_user.clone()
    }
}

/// Settings that point every file the provisioner touches into a temp dir.
pub struct Sandbox {
    pub dir: TempDir,
    pub settings: ProvisionSettings,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cards_path = dir.path().join("cards");
        fs::write(&cards_path, CARDS).unwrap();

        let settings = ProvisionSettings {
            log_path: dir.path().join("log").join("audio-setup.log"),
            target_user: Some("pi".to_string()),
            cards_path,
            module_config: ModuleConfigSettings {
                path: dir.path().join("modprobe.d").join("alsa-base.conf"),
                line: MODULE_LINE.to_string(),
                mode: 0o644,
            },
            ..ProvisionSettings::default()
        };
        Self { dir, settings }
    }

    pub fn with_packages(mut self, packages: Vec<PackageSpec>) -> Self {
        self.settings.packages = packages;
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.settings.module_config.path.clone()
    }

    pub fn backups(&self) -> Vec<PathBuf> {
        let Some(parent) = self.settings.module_config.path.parent() else {
            return Vec::new();
        };
        let Ok(entries) = fs::read_dir(parent) else {
            return Vec::new();
        };
        let mut found: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.to_string_lossy().contains(".bak."))
            .collect();
        found.sort();
        found
    }
}
