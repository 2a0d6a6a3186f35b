//! Root precondition.

use crate::error::{Result, SetupError};
use crate::host::Host;

/// Fail with `SetupError::Permission` unless the effective user is root.
///
/// Runs before the run log is opened and before any command, so a
/// non-root invocation leaves the host untouched.
pub fn ensure_root(host: &dyn Host) -> Result<()> {
    if host.is_root() {
        tracing::debug!("Running with root privileges");
        Ok(())
    } else {
        Err(SetupError::permission(
            "this installer must be run as root (try: sudo audio-setup)",
        ))
    }
}
