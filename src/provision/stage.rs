//! Provision stage machine
//!
//! The provisioner walks six stages in a fixed order. `StageTracker` is the
//! single source of truth for where a run is; it only moves forward, one
//! stage at a time, and any non-terminal stage may fall into `Failed`.
//!
//! ```text
//! NotStarted
//!     ↓
//! RootCheck
//!     ↓
//! GroupMembership
//!     ↓
//! Packages
//!     ↓
//! DeviceSnapshot
//!     ↓
//! ModuleConfig
//!     ↓
//! Summary
//!     ↓
//! Completed
//!
//! (Any stage can transition to Failed)
//! ```

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ProvisionStage {
    #[default]
    NotStarted = 0,
    /// Effective user must be root; the only fatal stage
    RootCheck = 1,
    /// Audio group exists and the target user belongs to it
    GroupMembership = 2,
    /// ALSA tooling installed
    Packages = 3,
    /// Detected devices logged before configuration
    DeviceSnapshot = 4,
    /// Module parameter line present
    ModuleConfig = 5,
    /// Final snapshot and reboot advice
    Summary = 6,
    Completed = 7,
    Failed = 255,
}

impl ProvisionStage {
    #[inline]
    pub const fn order(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns the next stage in the sequence, or None if at a terminal state
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::RootCheck),
            Self::RootCheck => Some(Self::GroupMembership),
            Self::GroupMembership => Some(Self::Packages),
            Self::Packages => Some(Self::DeviceSnapshot),
            Self::DeviceSnapshot => Some(Self::ModuleConfig),
            Self::ModuleConfig => Some(Self::Summary),
            Self::Summary => Some(Self::Completed),
            Self::Completed | Self::Failed => None,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::RootCheck => "Checking privileges",
            Self::GroupMembership => "Ensuring audio group membership",
            Self::Packages => "Installing ALSA packages",
            Self::DeviceSnapshot => "Listing sound devices",
            Self::ModuleConfig => "Configuring kernel module options",
            Self::Summary => "Summarizing",
            Self::Completed => "Provisioning complete",
            Self::Failed => "Provisioning failed",
        }
    }

}

impl fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("Cannot skip from {from} to {to}")]
    SkippedStage {
        from: ProvisionStage,
        to: ProvisionStage,
    },

    #[error("Cannot go backwards from {from} to {to}")]
    BackwardTransition {
        from: ProvisionStage,
        to: ProvisionStage,
    },

    #[error("Cannot transition from terminal state {from}")]
    FromTerminalState { from: ProvisionStage },

    #[error("Already at stage {stage}")]
    AlreadyAtStage { stage: ProvisionStage },
}

/// Forward-only tracker for a single provisioning run.
///
/// ```
/// use audio_setup::provision::stage::{ProvisionStage, StageTracker};
///
/// let mut tracker = StageTracker::new();
/// tracker.advance().unwrap();
/// assert_eq!(tracker.current(), ProvisionStage::RootCheck);
/// assert!(tracker.transition_to(ProvisionStage::ModuleConfig).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StageTracker {
    current: ProvisionStage,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> ProvisionStage {
        self.current
    }

    /// Advance to the next stage in sequence.
    pub fn advance(&mut self) -> Result<ProvisionStage, StageTransitionError> {
        let from = self.current();
        let next = from
            .next()
            .ok_or(StageTransitionError::FromTerminalState { from })?;
        self.enter(next);
        Ok(next)
    }

    /// Transition to `target`, which must be the next stage in sequence.
    pub fn transition_to(&mut self, target: ProvisionStage) -> Result<(), StageTransitionError> {
        let from = self.current();
        if from.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from });
        }
        if target == from {
            return Err(StageTransitionError::AlreadyAtStage { stage: from });
        }
        if target == ProvisionStage::Failed {
            self.fail();
            return Ok(());
        }
        if target.order() < from.order() {
            return Err(StageTransitionError::BackwardTransition { from, to: target });
        }
        if from.next() != Some(target) {
            return Err(StageTransitionError::SkippedStage { from, to: target });
        }
        self.enter(target);
        Ok(())
    }

    /// Mark the run as failed at the current stage. No-op on terminal states.
    pub fn fail(&mut self) {
        let from = self.current();
        if from.is_terminal() {
            return;
        }
        tracing::debug!(stage = from.order(), "run failed at stage: {}", from);
        self.current = ProvisionStage::Failed;
    }

    fn enter(&mut self, stage: ProvisionStage) {
        tracing::debug!(stage = stage.order(), "entering stage: {}", stage);
        self.current = stage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walks_all_stages_in_order() {
        let mut tracker = StageTracker::new();
        let mut visited = Vec::new();
        while !tracker.current().is_terminal() {
            visited.push(tracker.advance().unwrap());
        }
        assert_eq!(
            visited,
            vec![
                ProvisionStage::RootCheck,
                ProvisionStage::GroupMembership,
                ProvisionStage::Packages,
                ProvisionStage::DeviceSnapshot,
                ProvisionStage::ModuleConfig,
                ProvisionStage::Summary,
                ProvisionStage::Completed,
            ]
        );
    }

    #[test]
    fn test_cannot_skip_or_go_back() {
        let mut tracker = StageTracker::new();
        tracker.advance().unwrap();
        tracker.advance().unwrap();

        assert_eq!(
            tracker.transition_to(ProvisionStage::ModuleConfig),
            Err(StageTransitionError::SkippedStage {
                from: ProvisionStage::GroupMembership,
                to: ProvisionStage::ModuleConfig,
            })
        );
        assert!(matches!(
            tracker.transition_to(ProvisionStage::RootCheck),
            Err(StageTransitionError::BackwardTransition { .. })
        ));
        assert!(tracker.transition_to(ProvisionStage::Packages).is_ok());
    }

    #[test]
    fn test_fail_is_terminal() {
        let mut tracker = StageTracker::new();
        tracker.advance().unwrap();
        tracker.fail();

        assert_eq!(tracker.current(), ProvisionStage::Failed);
        tracker.fail();
        assert_eq!(tracker.current(), ProvisionStage::Failed);
        assert!(matches!(
            tracker.advance(),
            Err(StageTransitionError::FromTerminalState { .. })
        ));
    }

    #[test]
    fn test_terminal_stages_have_no_next() {
        assert_eq!(ProvisionStage::Completed.next(), None);
        assert_eq!(ProvisionStage::Failed.next(), None);
        assert_eq!(ProvisionStage::Summary.next(), Some(ProvisionStage::Completed));
    }
}
