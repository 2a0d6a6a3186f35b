//! Shared enums for audio-setup
//!
//! Stringly-typed flags and severity tags are parsed into these enums at the
//! edges so the rest of the crate matches on them exhaustively.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How bad a non-success outcome is.
///
/// Only `FatalPrecondition` aborts a run. The other two are logged, recorded
/// in the run context and surfaced in the final summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum Severity {
    /// Not root, or the artifact download failed
    #[strum(serialize = "fatal")]
    FatalPrecondition,
    /// Unsupported host or missing optional tool; step skipped
    #[strum(serialize = "warning")]
    DegradedCapability,
    /// A mutation was attempted and failed
    #[strum(serialize = "error")]
    OperationFailure,
}

/// On/off switch read from an environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum Toggle {
    #[default]
    #[strum(serialize = "on")]
    On,
    #[strum(serialize = "off")]
    Off,
}

impl Toggle {
    /// Convert to boolean
    pub fn as_bool(&self) -> bool {
        matches!(self, Self::On)
    }

    /// Parse a raw environment value. Unset or unrecognised values fall back
    /// to `default`; `0`, `false`, `no` and `off` switch it off and `1`,
    /// `true`, `yes` and `on` switch it on.
    pub fn from_env_value(value: Option<&str>, default: Toggle) -> Toggle {
        let Some(raw) = value else {
            return default;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "0" | "false" | "no" | "off" => Self::Off,
            "1" | "true" | "yes" | "on" => Self::On,
            _ => default,
        }
    }
}

impl From<bool> for Toggle {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::FatalPrecondition.to_string(), "fatal");
        assert_eq!(Severity::DegradedCapability.to_string(), "warning");
        assert_eq!(Severity::OperationFailure.to_string(), "error");
        assert_eq!(Severity::from_str("warning").ok(), Some(Severity::DegradedCapability));
    }

    #[test]
    fn test_toggle_env_values() {
        assert_eq!(Toggle::from_env_value(None, Toggle::On), Toggle::On);
        assert_eq!(Toggle::from_env_value(Some("0"), Toggle::On), Toggle::Off);
        assert_eq!(Toggle::from_env_value(Some("FALSE"), Toggle::On), Toggle::Off);
        assert_eq!(Toggle::from_env_value(Some(" off "), Toggle::On), Toggle::Off);
        assert_eq!(Toggle::from_env_value(Some("yes"), Toggle::Off), Toggle::On);
        assert_eq!(Toggle::from_env_value(Some("maybe"), Toggle::On), Toggle::On);
    }

    #[test]
    fn test_toggle_bool_conversion() {
        assert!(Toggle::On.as_bool());
        assert!(!Toggle::Off.as_bool());
        assert_eq!(Toggle::from(false), Toggle::Off);
    }
}
