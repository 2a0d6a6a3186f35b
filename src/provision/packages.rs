//! Package installation stage.
//!
//! Each package is handled on its own: a present representative executable
//! means nothing to do; a host without the package manager is skipped with a
//! warning; otherwise the cache is refreshed at most once per run and the
//! package is installed. An install failure is logged as an error and the
//! next package is still attempted.

use crate::commands::apt::{AptInstallArgs, AptUpdateArgs};
use crate::config_file::PackageSpec;
use crate::host::Host;
use crate::provision::context::RunContext;

pub fn ensure_packages(
    host: &mut dyn Host,
    ctx: &mut RunContext,
    package_manager: &str,
    packages: &[PackageSpec],
) {
    for package in packages {
        ensure_package(host, ctx, package_manager, package);
    }
}

fn ensure_package(host: &mut dyn Host, ctx: &mut RunContext, package_manager: &str, package: &PackageSpec) {
    if host.has_executable(&package.executable) {
        tracing::info!(
            "{} already installed ('{}' found on PATH)",
            package.name,
            package.executable
        );
        return;
    }

    if !host.has_executable(package_manager) {
        ctx.degrade(format!(
            "'{}' not found; host does not look Debian-based, skipping {}",
            package_manager, package.name
        ));
        return;
    }

    refresh_cache_once(host, ctx, package_manager);

    tracing::info!("Installing {}...", package.name);
    let install = AptInstallArgs {
        program: package_manager.to_string(),
        packages: vec![package.name.clone()],
    };
    match host.run(&install) {
        Ok(out) if out.success => {
            ctx.record_mutation(format!("installed package '{}'", package.name), false);
        }
        Ok(out) => ctx.fail_step(format!(
            "Failed to install {} ({})",
            package.name,
            out.failure_reason()
        )),
        Err(e) => ctx.fail_step(format!("Failed to install {}: {:#}", package.name, e)),
    }
}

fn refresh_cache_once(host: &mut dyn Host, ctx: &mut RunContext, package_manager: &str) {
    if ctx.apt_updated {
        return;
    }
    // Set before running so a failed refresh is not retried for the next package.
    ctx.apt_updated = true;

    tracing::info!("Refreshing package cache...");
    let update = AptUpdateArgs {
        program: package_manager.to_string(),
    };
    match host.run(&update) {
        Ok(out) if out.success => {}
        Ok(out) => ctx.degrade(format!("Package cache refresh failed ({})", out.failure_reason())),
        Err(e) => ctx.degrade(format!("Package cache refresh failed: {:#}", e)),
    }
}
