//! Interrupt handling for child processes and scratch directories.
//!
//! Children run as leaders of their own process group, so a terminal Ctrl-C
//! reaches only this process. The listener started by `init_signal_handlers`
//! takes the registry lock and holds it until the process exits. While
//! holding it, it stops every tracked group (SIGTERM, a grace period, then
//! SIGKILL), removes every tracked scratch directory, and exits with
//! `128 + signal`. Any other thread that reaches for the registry after that
//! point blocks until the exit.

use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

/// Time a stopped group gets between SIGTERM and SIGKILL
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

static REGISTRY: OnceLock<Mutex<ChildRegistry>> = OnceLock::new();

/// Process groups and directories to clean up when interrupted.
#[derive(Debug, Default)]
pub struct ChildRegistry {
    groups: HashSet<u32>,
    scratch_dirs: HashSet<PathBuf>,
    shut_down: bool,
}

impl ChildRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static Mutex<ChildRegistry> {
        REGISTRY.get_or_init(Mutex::default)
    }

    fn lock_global() -> MutexGuard<'static, ChildRegistry> {
        Self::global().lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Track the group led by `pgid`.
    pub fn register(&mut self, pgid: u32) {
        self.groups.insert(pgid);
        tracing::debug!(pgid, "tracking process group");
    }

    pub fn unregister(&mut self, pgid: u32) {
        self.groups.remove(&pgid);
    }

    /// Number of tracked process groups
    pub fn count(&self) -> usize {
        self.groups.len()
    }

    /// Remove `path` (recursively) if the run is interrupted.
    pub fn track_dir(&mut self, path: &Path) {
        self.scratch_dirs.insert(path.to_path_buf());
    }

    pub fn untrack_dir(&mut self, path: &Path) {
        self.scratch_dirs.remove(path);
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.scratch_dirs.contains(path)
    }

    /// Stop every tracked group, then remove every tracked directory.
    /// Only the first call does anything.
    pub fn shutdown(&mut self, grace: Duration) {
        if std::mem::replace(&mut self.shut_down, true) {
            return;
        }

        let groups: Vec<u32> = self.groups.drain().collect();
        stop_groups(&groups, grace);

        for dir in self.scratch_dirs.drain() {
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => tracing::debug!("Removed {}", dir.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Could not remove {}: {}", dir.display(), e),
            }
        }
    }
}

/// SIGTERM every group, wait until they are gone or `grace` runs out, then
/// SIGKILL whatever is left.
fn stop_groups(groups: &[u32], grace: Duration) {
    if groups.is_empty() {
        return;
    }
    tracing::info!("Stopping {} child process group(s)...", groups.len());

    for &pgid in groups {
        signal_group(pgid, Signal::SIGTERM);
    }

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if !groups.iter().any(|&pgid| group_exists(pgid)) {
            return;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    for &pgid in groups.iter().filter(|&&pgid| group_exists(pgid)) {
        tracing::warn!("Process group {} outlived SIGTERM, sending SIGKILL", pgid);
        signal_group(pgid, Signal::SIGKILL);
    }
}

/// A negative PID addresses the whole group, so grandchildren (dpkg under
/// apt-get, whatever the artifact spawns) are reached too.
fn signal_group(pgid: u32, sig: Signal) {
    let leader = pgid as i32;
    if signal::kill(Pid::from_raw(-leader), sig).is_err() {
        let _ = signal::kill(Pid::from_raw(leader), sig);
    }
}

/// True while any member of the group, including an unreaped leader, exists.
fn group_exists(pgid: u32) -> bool {
    signal::kill(Pid::from_raw(-(pgid as i32)), None).is_ok()
}

/// Keeps a child's process group tracked while it runs.
pub struct RegisteredChild {
    pgid: u32,
}

impl RegisteredChild {
    pub fn register(pid: u32) -> Self {
        ChildRegistry::lock_global().register(pid);
        Self { pgid: pid }
    }
}

impl Drop for RegisteredChild {
    fn drop(&mut self) {
        ChildRegistry::lock_global().unregister(self.pgid);
    }
}

/// Keeps a directory tracked for removal on interrupt.
///
/// Declare it after the owner of the directory (e.g. a `TempDir`) so the
/// directory is removed before it stops being tracked.
#[derive(Debug)]
pub struct TrackedDir {
    path: PathBuf,
}

impl TrackedDir {
    pub fn new(path: &Path) -> Self {
        ChildRegistry::lock_global().track_dir(path);
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Drop for TrackedDir {
    fn drop(&mut self) {
        ChildRegistry::lock_global().untrack_dir(&self.path);
    }
}

/// Listen for SIGINT, SIGTERM and SIGHUP on a background thread.
///
/// On the first signal the registry is shut down and the process exits with
/// `128 + signal`. Call once at program start.
pub fn init_signal_handlers() -> io::Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                eprintln!("Interrupted, stopping child processes and cleaning up...");
                let mut registry = ChildRegistry::lock_global();
                registry.shutdown(SHUTDOWN_GRACE);
                std::process::exit(128 + sig);
            }
        })?;

    Ok(())
}

/// Extension trait for `std::process::Command` to set up process groups
pub trait CommandProcessGroup {
    /// Run the command as leader of a new process group that gets SIGTERM
    /// when the spawning thread dies.
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: the closure only calls async-signal-safe setpgid and prctl.
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(io::Error::other)?;
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }
        self
    }
}
