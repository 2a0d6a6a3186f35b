//! Per-run state shared by the provisioning stages.

use crate::provision::stage::{ProvisionStage, StageTracker};
use crate::types::Severity;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// A non-fatal problem recorded by a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepIssue {
    pub stage: ProvisionStage,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for StepIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.stage, self.message)
    }
}

/// Everything one provisioning run remembers between stages.
#[derive(Debug, Default)]
pub struct RunContext {
    /// Package cache refresh was attempted this run
    pub apt_updated: bool,
    /// A change was made that takes effect after reboot or re-login
    pub needs_reboot: bool,
    /// Mutating commands and file writes are skipped
    pub dry_run: bool,
    stages: StageTracker,
    backed_up: HashSet<PathBuf>,
    mutations: Vec<String>,
    issues: Vec<StepIssue>,
}

impl RunContext {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn stages(&self) -> &StageTracker {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut StageTracker {
        &mut self.stages
    }

    /// Record a change to the host. `reboot` marks it as needing a reboot
    /// or re-login to take effect.
    pub fn record_mutation(&mut self, description: impl Into<String>, reboot: bool) {
        let description = if self.dry_run {
            format!("[DRY RUN] would have {}", description.into())
        } else {
            description.into()
        };
        tracing::info!("Changed: {}", description);
        self.mutations.push(description);
        if reboot {
            self.needs_reboot = true;
        }
    }

    /// Log a warning and keep it for the summary.
    pub fn degrade(&mut self, message: impl Into<String>) {
        self.record_issue(Severity::DegradedCapability, message.into());
    }

    /// Log an error and keep it for the summary.
    pub fn fail_step(&mut self, message: impl Into<String>) {
        self.record_issue(Severity::OperationFailure, message.into());
    }

    fn record_issue(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::OperationFailure | Severity::FatalPrecondition => {
                tracing::error!("{}", message)
            }
            Severity::DegradedCapability => tracing::warn!("{}", message),
        }
        self.issues.push(StepIssue {
            stage: self.stages.current(),
            severity,
            message,
        });
    }

    /// Returns true the first time `path` is seen this run.
    pub fn claim_backup(&mut self, path: &Path) -> bool {
        self.backed_up.insert(path.to_path_buf())
    }

    pub fn mutations(&self) -> &[String] {
        &self.mutations
    }

    pub fn issues(&self) -> &[StepIssue] {
        &self.issues
    }
}
