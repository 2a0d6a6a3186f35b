//! Group and membership stage.
//!
//! Ensures the audio group exists and the target user belongs to it. Every
//! failure here is degraded to a warning; a successful change marks the run
//! as needing a re-login.

use crate::commands::accounts::{
    parse_group_list, AddUserToGroupArgs, GroupAddArgs, GroupLookupArgs, UserGroupsArgs,
};
use crate::host::Host;
use crate::provision::context::RunContext;

pub fn ensure_group_membership(host: &mut dyn Host, ctx: &mut RunContext, group: &str, user: &str) {
    if ensure_group(host, ctx, group) {
        ensure_membership(host, ctx, group, user);
    }
}

/// Returns true when the group exists (or would, in dry-run mode).
fn ensure_group(host: &mut dyn Host, ctx: &mut RunContext, group: &str) -> bool {
    let lookup = GroupLookupArgs {
        group: group.to_string(),
    };
    match host.run(&lookup) {
        Ok(out) if out.success => {
            tracing::info!("Group '{}' already exists", group);
            return true;
        }
        Ok(_) => {}
        Err(e) => {
            // Without getent we cannot tell; let groupadd decide.
            tracing::debug!("Group lookup unavailable: {:#}", e);
        }
    }

    let add = GroupAddArgs {
        group: group.to_string(),
    };
    match host.run(&add) {
        Ok(out) if out.success => {
            ctx.record_mutation(format!("created group '{}'", group), true);
            true
        }
        Ok(out) => {
            ctx.degrade(format!("Could not create group '{}' ({})", group, out.failure_reason()));
            false
        }
        Err(e) => {
            ctx.degrade(format!("Could not create group '{}': {:#}", group, e));
            false
        }
    }
}

fn ensure_membership(host: &mut dyn Host, ctx: &mut RunContext, group: &str, user: &str) {
    let query = UserGroupsArgs {
        user: user.to_string(),
    };
    match host.run(&query) {
        Ok(out) if out.success => {
            if parse_group_list(&out.stdout).contains(&group) {
                tracing::info!("User '{}' is already in group '{}'", user, group);
                return;
            }
        }
        Ok(out) => {
            ctx.degrade(format!(
                "Cannot read groups of user '{}' ({}); skipping membership",
                user,
                out.failure_reason()
            ));
            return;
        }
        Err(e) => {
            ctx.degrade(format!("Cannot read groups of user '{}': {:#}", user, e));
            return;
        }
    }

    let add = AddUserToGroupArgs {
        user: user.to_string(),
        group: group.to_string(),
    };
    match host.run(&add) {
        Ok(out) if out.success => {
            ctx.record_mutation(format!("added user '{}' to group '{}'", user, group), true);
        }
        Ok(out) => ctx.degrade(format!(
            "Could not add user '{}' to group '{}' ({})",
            user,
            group,
            out.failure_reason()
        )),
        Err(e) => ctx.degrade(format!("Could not add user '{}' to group '{}': {:#}", user, group, e)),
    }
}
