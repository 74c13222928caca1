//! Platform identifiers.
//!
//! The chat platform hands out opaque string identifiers ("snowflakes") for
//! guilds, users, roles and messages. Each gets its own newtype so a role id
//! can never be passed where a guild id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum number of digits in a platform snowflake.
pub const SNOWFLAKE_MIN_DIGITS: usize = 18;

/// Returns whether `raw` looks like a platform snowflake (18+ ASCII digits).
pub fn is_snowflake(raw: &str) -> bool {
    raw.len() >= SNOWFLAKE_MIN_DIGITS && raw.bytes().all(|b| b.is_ascii_digit())
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns whether the identifier is a well-formed snowflake.
            pub fn is_snowflake(&self) -> bool {
                is_snowflake(&self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of a guild (server / workspace).
    GuildId
);
define_id!(
    /// Identifier of a user account.
    UserId
);
define_id!(
    /// Identifier of a guild role.
    RoleId
);
define_id!(
    /// Identifier of a channel.
    ChannelId
);
define_id!(
    /// Identifier of a single message.
    MessageId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_detection() {
        assert!(is_snowflake("123456789012345678"));
        assert!(is_snowflake("1234567890123456789012"));
        assert!(!is_snowflake("12345678901234567"));
        assert!(!is_snowflake("Moderators"));
        assert!(!is_snowflake("12345678901234567a"));
        assert!(!is_snowflake(""));
    }

    #[test]
    fn test_ids_are_distinct_types() {
        let guild = GuildId::from("100000000000000000");
        assert_eq!(guild.as_str(), "100000000000000000");
        assert_eq!(guild.to_string(), "100000000000000000");
        assert!(guild.is_snowflake());
    }

    #[test]
    fn test_serde_transparent() {
        let id: UserId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(id, UserId::new("42"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }
}
