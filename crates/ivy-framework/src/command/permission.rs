//! The permission gate applied before a command runs.

use std::collections::HashSet;

use ivy_core::{BoxedOracle, GuildId, MessageHandle, Permission, Role, User, UserId, is_snowflake};

use super::CommandSpec;

/// Decides whether a user may run a command.
///
/// A user is authorized when any of these holds:
///
/// - they are a global super-permission user
/// - their id is in the command's user allow-list
/// - one of their roles matches the command's role allow-list
/// - the command needs a named permission and the platform grants it
pub struct PermissionGate {
    oracle: BoxedOracle,
    super_perms: HashSet<UserId>,
}

impl PermissionGate {
    pub fn new(oracle: BoxedOracle, super_perms: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            oracle,
            super_perms: super_perms.into_iter().collect(),
        }
    }

    /// Returns whether `user` is in the global super-permission allow-list.
    pub fn is_super_user(&self, user: &UserId) -> bool {
        self.super_perms.contains(user)
    }

    /// Returns whether `user` holds `permission` in `guild`.
    ///
    /// Super-permission users hold every permission. Allow-lists are not
    /// consulted.
    pub async fn has(&self, user: &User, permission: &Permission, guild: &GuildId) -> bool {
        if self.is_super_user(&user.id) {
            return true;
        }
        match permission {
            Permission::SuperPerms => false,
            Permission::Named(name) => self.oracle.has_permission(user, name, guild).await,
        }
    }

    /// Returns whether the author of `message` may run `command`.
    pub async fn authorize(&self, message: &dyn MessageHandle, command: &CommandSpec) -> bool {
        let user = message.author();
        if self.is_super_user(&user.id)
            || command.permit_users.contains(&user.id)
            || has_permitted_role(message.member_roles(), &command.permit_roles)
        {
            return true;
        }

        match (&command.permission, message.guild_id()) {
            (Permission::Named(name), Some(guild)) => {
                self.oracle.has_permission(user, name, guild).await
            }
            _ => false,
        }
    }
}

/// Matches a role against an allow-list entry.
///
/// Snowflake entries match the role id exactly; anything else matches the
/// role name case-insensitively.
pub fn role_matches(role: &Role, entry: &str) -> bool {
    if is_snowflake(entry) {
        role.id.as_str() == entry
    } else {
        role.name.to_lowercase() == entry.to_lowercase()
    }
}

fn has_permitted_role(roles: &[Role], permitted: &[String]) -> bool {
    permitted
        .iter()
        .any(|entry| roles.iter().any(|role| role_matches(role, entry)))
}
