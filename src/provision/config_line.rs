//! Append-only configuration line management.
//!
//! `ensure_line` guarantees a file contains a given line exactly once:
//!
//! - missing file: created with the fixed mode, containing only the line
//! - line present (whole-line match): file untouched, no backup
//! - line absent: pre-run content backed up once per run, then the line is
//!   appended after the existing content
//!
//! Existing content is never rewritten or removed.

use crate::provision::context::RunContext;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    AlreadyPresent,
    Created,
    Appended { backup: Option<PathBuf> },
}

/// Whole-line containment on raw bytes, so files that are not valid UTF-8
/// still match. `\r\n` endings compare equal to `\n`.
pub fn contains_line(content: &[u8], line: &str) -> bool {
    let needle = line.as_bytes();
    content
        .split(|&b| b == b'\n')
        .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
        .any(|l| l == needle)
}

/// `content` with `line` appended on a line of its own.
pub fn with_line_appended(content: &[u8], line: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + line.len() + 2);
    out.extend_from_slice(content);
    if lacks_final_newline(content) {
        out.push(b'\n');
    }
    out.extend_from_slice(line.as_bytes());
    out.push(b'\n');
    out
}

fn lacks_final_newline(content: &[u8]) -> bool {
    !content.is_empty() && !content.ends_with(b"\n")
}

pub fn ensure_line(path: &Path, line: &str, mode: u32, ctx: &mut RunContext) -> io::Result<LineOutcome> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if !ctx.dry_run {
                create_with_line(path, line, mode)?;
            }
            ctx.record_mutation(
                format!("created {} with '{}'", path.display(), line),
                true,
            );
            return Ok(LineOutcome::Created);
        }
        Err(e) => return Err(e),
    };

    if contains_line(&content, line) {
        tracing::info!("{} already contains '{}'", path.display(), line);
        return Ok(LineOutcome::AlreadyPresent);
    }

    let mut backup = None;
    if !ctx.dry_run {
        if ctx.claim_backup(path) {
            let backup_path = write_backup(path)?;
            tracing::info!("Backed up {} to {}", path.display(), backup_path.display());
            backup = Some(backup_path);
        }
        append_line(path, &content, line)?;
    }
    ctx.record_mutation(
        format!("appended '{}' to {}", line, path.display()),
        true,
    );
    Ok(LineOutcome::Appended { backup })
}

fn create_with_line(path: &Path, line: &str, mode: u32) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(path)?;
    file.write_all(&with_line_appended(b"", line))?;
    file.sync_all()?;
    // The umask may have narrowed the mode given to open().
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

fn append_line(path: &Path, content: &[u8], line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    if lacks_final_newline(content) {
        file.write_all(b"\n")?;
    }
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()
}

/// Copy `path` to `<path>.bak.<YYYYMMDDHHMMSS>` (UTC), adding `.N` on collision.
fn write_backup(path: &Path) -> io::Result<PathBuf> {
    let stamp = backup_timestamp();
    let base = format!("{}.bak.{}", path.display(), stamp);
    let mut candidate = PathBuf::from(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{}.{}", base, n));
        n += 1;
    }
    fs::copy(path, &candidate)?;
    Ok(candidate)
}

fn backup_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(format_description!("[year][month][day][hour][minute][second]"))
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LINE: &str = "options snd-usb-audio index=0";

    fn backups_in(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().contains(".bak."))
            .collect()
    }

    #[test]
    fn test_contains_line_is_whole_line() {
        assert!(contains_line(b"a\noptions snd-usb-audio index=0\n", LINE));
        assert!(contains_line(b"options snd-usb-audio index=0\r\n", LINE));
        assert!(contains_line(b"options snd-usb-audio index=0", LINE));
        assert!(!contains_line(b"# options snd-usb-audio index=0\n", LINE));
        assert!(!contains_line(b"options snd-usb-audio index=0 extra\n", LINE));
    }

    #[test]
    fn test_contains_line_ignores_invalid_utf8_elsewhere() {
        assert!(contains_line(b"# caf\xe9 card\noptions snd-usb-audio index=0\n", LINE));
        assert!(!contains_line(b"# caf\xe9 card\n", LINE));
    }

    #[test]
    fn test_with_line_appended_adds_missing_newline() {
        assert_eq!(with_line_appended(b"", "x"), b"x\n");
        assert_eq!(with_line_appended(b"a\n", "x"), b"a\nx\n");
        assert_eq!(with_line_appended(b"a", "x"), b"a\nx\n");
    }

    #[test]
    fn test_creates_missing_file_with_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("modprobe.d/alsa-base.conf");
        let mut ctx = RunContext::new(false);

        let outcome = ensure_line(&path, LINE, 0o644, &mut ctx).unwrap();

        assert_eq!(outcome, LineOutcome::Created);
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", LINE));
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode, 0o644);
        assert!(ctx.needs_reboot);
        assert!(backups_in(path.parent().unwrap()).is_empty());
    }

    #[test]
    fn test_present_line_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alsa-base.conf");
        let original = format!("# ALSA\n{}\noptions snd-hda-intel model=auto\n", LINE);
        fs::write(&path, &original).unwrap();
        let mut ctx = RunContext::new(false);

        let outcome = ensure_line(&path, LINE, 0o644, &mut ctx).unwrap();

        assert_eq!(outcome, LineOutcome::AlreadyPresent);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
        assert!(backups_in(dir.path()).is_empty());
        assert!(!ctx.needs_reboot);
        assert!(ctx.mutations().is_empty());
    }

    #[test]
    fn test_appends_after_existing_content_with_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alsa-base.conf");
        fs::write(&path, "options snd-hda-intel model=auto").unwrap();
        let mut ctx = RunContext::new(false);

        let outcome = ensure_line(&path, LINE, 0o644, &mut ctx).unwrap();

        let backup = match outcome {
            LineOutcome::Appended { backup: Some(b) } => b,
            other => panic!("expected an append with backup, got {:?}", other),
        };
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            format!("options snd-hda-intel model=auto\n{}\n", LINE)
        );
        assert_eq!(fs::read_to_string(&backup).unwrap(), "options snd-hda-intel model=auto");
        assert!(ctx.needs_reboot);
    }

    #[test]
    fn test_appends_to_latin1_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alsa-base.conf");
        let original: &[u8] = b"# caf\xe9 card\noptions snd-hda-intel model=auto\n";
        fs::write(&path, original).unwrap();
        let mut ctx = RunContext::new(false);

        let outcome = ensure_line(&path, LINE, 0o644, &mut ctx).unwrap();

        let backup = match outcome {
            LineOutcome::Appended { backup: Some(b) } => b,
            other => panic!("expected an append with backup, got {:?}", other),
        };
        let mut expected = original.to_vec();
        expected.extend_from_slice(LINE.as_bytes());
        expected.push(b'\n');
        assert_eq!(fs::read(&path).unwrap(), expected);
        assert_eq!(fs::read(&backup).unwrap(), original);
        assert!(ctx.issues().is_empty());

        let again = ensure_line(&path, LINE, 0o644, &mut ctx).unwrap();
        assert_eq!(again, LineOutcome::AlreadyPresent);
    }

    #[test]
    fn test_second_call_is_a_no_op() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alsa-base.conf");
        fs::write(&path, "# empty\n").unwrap();
        let mut ctx = RunContext::new(false);

        ensure_line(&path, LINE, 0o644, &mut ctx).unwrap();
        let after_first = fs::read(&path).unwrap();
        let outcome = ensure_line(&path, LINE, 0o644, &mut ctx).unwrap();

        assert_eq!(outcome, LineOutcome::AlreadyPresent);
        assert_eq!(fs::read(&path).unwrap(), after_first);
        assert_eq!(backups_in(dir.path()).len(), 1);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join("alsa-base.conf");
        fs::write(&existing, "# empty\n").unwrap();
        let missing = dir.path().join("new.conf");
        let mut ctx = RunContext::new(true);

        let appended = ensure_line(&existing, LINE, 0o644, &mut ctx).unwrap();
        let created = ensure_line(&missing, LINE, 0o644, &mut ctx).unwrap();

        assert_eq!(appended, LineOutcome::Appended { backup: None });
        assert_eq!(created, LineOutcome::Created);
        assert_eq!(fs::read_to_string(&existing).unwrap(), "# empty\n");
        assert!(!missing.exists());
        assert!(backups_in(dir.path()).is_empty());
        assert_eq!(ctx.mutations().len(), 2);
    }

    #[test]
    fn test_backup_name_collision_gets_suffix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.conf");
        fs::write(&path, "x\n").unwrap();

        let first = write_backup(&path).unwrap();
        let second = write_backup(&path).unwrap();

        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }
}
