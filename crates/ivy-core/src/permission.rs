//! Permission requirements.
//!
//! A command requires either one of the platform's native permissions,
//! identified by name (e.g. `MANAGE_MESSAGES`), or the framework-owned
//! super-permission, which only the operator allow-list (plus per-command
//! role/user allow-lists) can satisfy.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Textual form of [`Permission::SuperPerms`].
pub const SUPER_PERMS: &str = "SUPER_PERMS";

/// Authorization level required to run a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Permission {
    /// A platform-defined permission, by name.
    Named(String),
    /// Operator-granted authorization outside the platform's permission set.
    SuperPerms,
}

impl Permission {
    /// Shorthand for [`Permission::Named`].
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Returns whether this is the super-permission sentinel.
    pub fn is_super(&self) -> bool {
        matches!(self, Self::SuperPerms)
    }

    /// Returns the platform permission name, if any.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::SuperPerms => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::SuperPerms => f.write_str(SUPER_PERMS),
        }
    }
}

impl FromStr for Permission {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl From<String> for Permission {
    fn from(raw: String) -> Self {
        if raw.eq_ignore_ascii_case(SUPER_PERMS) {
            Self::SuperPerms
        } else {
            Self::Named(raw)
        }
    }
}

impl From<&str> for Permission {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.to_string()
    }
}
