//! # Ivy Core
//!
//! Foundation types for the Ivy chat bot framework.
//!
//! This crate knows nothing about commands or modules. It defines the
//! vocabulary the higher layers are written in:
//!
//! - **Identifiers**: [`GuildId`], [`UserId`], [`RoleId`] and friends
//! - **Permissions**: the closed [`Permission`] union (platform permission or super-permission)
//! - **Transport contracts**: [`MessageHandle`], [`PermissionOracle`], [`TransportEvent`]
//! - **Replies**: [`Reply`], [`Embed`] and the [`EmbedBuilder`]
//! - **Guild data**: [`GuildDataProvider`] with default and cached implementations
//! - **Utilities**: [`GuildQueue`], [`RechargeManager`], markdown helpers in [`format`]
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌───────────────┐
//! │  Transport  │────▶│ EventManager │────▶│ CommandManager│
//! │  (adapter)  │     │  (framework) │     │  (framework)  │
//! └─────────────┘     └──────────────┘     └───────────────┘
//!        ▲                                         │
//!        └────────── Reply / delete ───────────────┘
//! ```

pub mod data;
pub mod error;
pub mod format;
pub mod id;
pub mod permission;
pub mod queue;
pub mod recharge;
pub mod reply;
pub mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use data::{
    BoxedPrefixSource, CachedGuildDataProvider, DefaultGuildDataProvider, GuildData,
    GuildDataProvider, GuildDataSource, GuildToken, PrefixSource,
};
pub use error::{DataError, DataResult, TransportError, TransportResult};
pub use id::{ChannelId, GuildId, MessageId, RoleId, UserId, is_snowflake};
pub use permission::{Permission, SUPER_PERMS};
pub use queue::GuildQueue;
pub use recharge::RechargeManager;
pub use reply::{Embed, EmbedBuilder, EmbedField, EmbedFooter, EmbedIcon, Reply};
pub use transport::{
    BoxedMessage, BoxedOracle, MessageHandle, PermissionOracle, Reaction, Role, TransportEvent,
    User,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::data::{GuildData, GuildDataProvider, PrefixSource};
    pub use super::id::{GuildId, RoleId, UserId};
    pub use super::permission::Permission;
    pub use super::reply::{Embed, EmbedField, EmbedIcon, Reply};
    pub use super::transport::{MessageHandle, PermissionOracle, User};
}
