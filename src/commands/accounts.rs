//! Type-safe arguments for group and membership management.
//!
//! Queries (`getent`, `id`) never modify the host and still run in dry-run
//! mode; `groupadd` and `usermod` are mutating.

use crate::command_traits::CommandArgs;

/// `getent group <group>`: exit 0 when the group exists, 2 when it does not.
#[derive(Debug, Clone)]
pub struct GroupLookupArgs {
    pub group: String,
}

impl CommandArgs for GroupLookupArgs {
    fn program(&self) -> &str {
        "getent"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["group".to_string(), self.group.clone()]
    }
}

/// `groupadd <group>`
#[derive(Debug, Clone)]
pub struct GroupAddArgs {
    pub group: String,
}

impl CommandArgs for GroupAddArgs {
    fn program(&self) -> &str {
        "groupadd"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.group.clone()]
    }

    fn is_mutating(&self) -> bool {
        true
    }
}

/// `id -nG <user>`: space-separated group names, non-zero for unknown users.
#[derive(Debug, Clone)]
pub struct UserGroupsArgs {
    pub user: String,
}

impl CommandArgs for UserGroupsArgs {
    fn program(&self) -> &str {
        "id"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-nG".to_string(), self.user.clone()]
    }
}

/// Parse `id -nG` output into group names.
pub fn parse_group_list(stdout: &str) -> Vec<&str> {
    stdout.split_whitespace().collect()
}

/// `usermod -aG <group> <user>`
///
/// | Rust Field | CLI Flag | Notes |
/// |------------|----------|-------|
/// | `group`    | `-aG`    | Appended, existing groups are kept |
/// | `user`     | trailing | Login name |
#[derive(Debug, Clone)]
pub struct AddUserToGroupArgs {
    pub user: String,
    pub group: String,
}

impl CommandArgs for AddUserToGroupArgs {
    fn program(&self) -> &str {
        "usermod"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-aG".to_string(), self.group.clone(), self.user.clone()]
    }

    fn is_mutating(&self) -> bool {
        true
    }
}
