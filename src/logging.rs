//! Scoped logging sink.
//!
//! A `LogSink` installs a `tracing` subscriber for the current thread and
//! removes it when dropped. The console layer honours `RUST_LOG` (default
//! `info`); the optional file layer records everything down to `DEBUG`,
//! including the captured output of every command, in a run log opened in
//! append mode. Dropping the sink flushes and syncs the run log, so the log
//! is complete on every exit path, including early returns on error.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct LogSink {
    run_log: Option<(PathBuf, Arc<File>)>,
    _guard: DefaultGuard,
}

impl LogSink {
    /// Console-only sink.
    pub fn console() -> Self {
        Self::install(None)
    }

    /// Console plus a run log at `path`, created if missing and never truncated.
    pub fn with_file(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::install(Some((path.to_path_buf(), Arc::new(file)))))
    }

    fn install(run_log: Option<(PathBuf, Arc<File>)>) -> Self {
        let console = fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(console_filter());

        let file_layer = run_log.as_ref().map(|(_, file)| {
            fmt::layer()
                .with_writer(Arc::clone(file))
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG)
        });

        let subscriber = tracing_subscriber::registry().with(console).with(file_layer);
        let guard = tracing::subscriber::set_default(subscriber);

        Self {
            run_log,
            _guard: guard,
        }
    }

    /// Path of the run log, if one is attached
    pub fn path(&self) -> Option<&Path> {
        self.run_log.as_ref().map(|(path, _)| path.as_path())
    }

    /// Flush and sync the run log to disk.
    pub fn flush(&self) -> io::Result<()> {
        if let Some((_, file)) = &self.run_log {
            (&**file).flush()?;
            file.sync_data()?;
        }
        Ok(())
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_log_receives_debug_events() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        {
            let sink = LogSink::with_file(&path).unwrap();
            assert_eq!(sink.path(), Some(path.as_path()));
            tracing::debug!("debug line for the run log");
            tracing::warn!("warning line");
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("debug line for the run log"));
        assert!(content.contains("WARN"));
        assert!(!content.contains("\x1b["), "run log must not contain ANSI escapes");
    }

    #[test]
    fn test_run_log_is_appended_not_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        std::fs::write(&path, "previous run\n").unwrap();
        {
            let _sink = LogSink::with_file(&path).unwrap();
            tracing::info!("second run");
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.contains("second run"));
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/logs/run.log");
        let sink = LogSink::with_file(&path).unwrap();
        drop(sink);
        assert!(path.exists());
    }

    #[test]
    fn test_console_sink_has_no_path() {
        let sink = LogSink::console();
        assert!(sink.path().is_none());
        assert!(sink.flush().is_ok());
    }
}
