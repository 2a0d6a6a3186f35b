//! End-of-run report.

use crate::provision::context::{RunContext, StepIssue};
use crate::types::Severity;
use std::fmt;
use std::path::PathBuf;

/// Outcome of a provisioning run that reached the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub needs_reboot: bool,
    pub dry_run: bool,
    pub log_path: Option<PathBuf>,
    pub mutations: Vec<String>,
    pub issues: Vec<StepIssue>,
}

impl ProvisionReport {
    pub fn from_context(ctx: &RunContext, log_path: Option<PathBuf>) -> Self {
        Self {
            needs_reboot: ctx.needs_reboot,
            dry_run: ctx.dry_run,
            log_path,
            mutations: ctx.mutations().to_vec(),
            issues: ctx.issues().to_vec(),
        }
    }

    /// Returns true if any step was degraded or failed
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Process exit code. Reaching the end is success unless `strict`
    /// is set and a step degraded or failed.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if strict && self.has_issues() { 2 } else { 0 }
    }

    /// Write the summary to the log.
    pub fn log(&self) {
        if self.mutations.is_empty() {
            tracing::info!("No changes were needed");
        } else {
            tracing::info!("{} change(s) made", self.mutations.len());
        }
        for issue in &self.issues {
            tracing::info!("  {}", issue);
        }
        if self.needs_reboot {
            tracing::warn!("A reboot (or at least a re-login) is recommended for the changes to take effect");
        }
        if let Some(ref path) = self.log_path {
            tracing::info!("Log written to {}", path.display());
        }
    }
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "Dry run: no changes were made.")?;
        }
        writeln!(
            f,
            "Changes: {}, warnings: {}, errors: {}",
            self.mutations.len(),
            self.count(Severity::DegradedCapability),
            self.count(Severity::OperationFailure)
        )?;
        if self.needs_reboot {
            writeln!(f, "Reboot or re-login recommended.")?;
        } else {
            writeln!(f, "No reboot needed.")?;
        }
        match self.log_path {
            Some(ref path) => write!(f, "Log: {}", path.display()),
            None => write!(f, "Log: (console only)"),
        }
    }
}
