//! Idempotent audio provisioning.
//!
//! `Provisioner::run` walks the stages in `stage::ProvisionStage` order.
//! Each stage inspects the host before changing it, so running the
//! provisioner again converges to the same end state and makes no further
//! changes.
//!
//! # Failure Policy
//!
//! Only the root check is fatal. Every later stage catches its own failures,
//! logs them at warning or error level, records them in the `RunContext`,
//! and the run moves on to the next stage.

pub mod accounts;
pub mod config_line;
pub mod context;
pub mod diagnostics;
pub mod packages;
pub mod privileges;
pub mod stage;
pub mod summary;

use crate::config_file::ProvisionSettings;
use crate::error::Result;
use crate::host::Host;
use crate::logging::LogSink;
use context::RunContext;
use stage::ProvisionStage;
use summary::ProvisionReport;

pub use config_line::LineOutcome;
pub use context::StepIssue;

/// How the provisioner reports to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Console plus the configured run log
    #[default]
    RunLog,
    /// Whatever subscriber the caller already installed
    Inherit,
}

pub struct Provisioner {
    settings: ProvisionSettings,
    dry_run: bool,
    log_target: LogTarget,
}

impl Provisioner {
    pub fn new(settings: ProvisionSettings) -> Self {
        Self {
            settings,
            dry_run: false,
            log_target: LogTarget::RunLog,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn log_target(mut self, target: LogTarget) -> Self {
        self.log_target = target;
        self
    }

    /// Run every stage against `host`.
    ///
    /// # Errors
    ///
    /// - `SetupError::Permission` if not root; nothing is touched
    /// - `SetupError::Io` if the run log cannot be opened
    ///
    /// Any other problem is recorded in the returned report.
    pub fn run(&self, host: &mut dyn Host) -> Result<ProvisionReport> {
        let mut ctx = RunContext::new(self.dry_run);

        ctx.stages_mut().transition_to(ProvisionStage::RootCheck)?;
        if let Err(e) = privileges::ensure_root(host) {
            ctx.stages_mut().fail();
            return Err(e);
        }

        let sink = match self.log_target {
            LogTarget::RunLog => Some(LogSink::with_file(&self.settings.log_path)?),
            LogTarget::Inherit => None,
        };
        let log_path = sink.as_ref().and_then(|s| s.path().map(|p| p.to_path_buf()));

        tracing::info!(
            "Starting audio provisioning{}",
            if self.dry_run { " (dry run)" } else { "" }
        );

        let s = &self.settings;

        ctx.stages_mut().transition_to(ProvisionStage::GroupMembership)?;
        let user = s.resolve_target_user(host.sudo_user());
        accounts::ensure_group_membership(host, &mut ctx, &s.group, &user);

        ctx.stages_mut().transition_to(ProvisionStage::Packages)?;
        packages::ensure_packages(host, &mut ctx, &s.package_manager, &s.packages);

        ctx.stages_mut().transition_to(ProvisionStage::DeviceSnapshot)?;
        self.snapshot(host, &mut ctx);

        ctx.stages_mut().transition_to(ProvisionStage::ModuleConfig)?;
        let module = &s.module_config;
        if let Err(e) = config_line::ensure_line(&module.path, &module.line, module.mode, &mut ctx) {
            ctx.fail_step(format!("Could not update {}: {}", module.path.display(), e));
        }

        ctx.stages_mut().transition_to(ProvisionStage::Summary)?;
        self.snapshot(host, &mut ctx);
        let report = ProvisionReport::from_context(&ctx, log_path);
        report.log();

        ctx.stages_mut().transition_to(ProvisionStage::Completed)?;
        drop(sink);
        Ok(report)
    }

    fn snapshot(&self, host: &mut dyn Host, ctx: &mut RunContext) {
        let s = &self.settings;
        diagnostics::snapshot_devices(
            host,
            ctx,
            &s.cards_path,
            s.diagnostic_tool.as_deref(),
            &s.diagnostic_args,
        );
    }
}
