//! Typed argument structs for every external command the provisioner runs.

pub mod accounts;
pub mod apt;
pub mod diagnostics;
