//! Contracts with the chat transport.
//!
//! The framework never talks to the network itself. Adapters implement
//! [`MessageHandle`] for inbound messages and [`PermissionOracle`] for
//! platform permission checks, and push [`TransportEvent`]s into the
//! event manager.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{TransportError, TransportResult};
use crate::id::{GuildId, MessageId, RoleId, UserId};
use crate::reply::Reply;

/// A platform user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier.
    pub id: UserId,
    /// Account name.
    pub name: String,
    /// Whether the account is automated.
    #[serde(default)]
    pub bot: bool,
    /// Avatar URL, used in embed footers.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl User {
    /// Creates a human user with no avatar.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bot: false,
            avatar_url: None,
        }
    }

    /// Marks this user as an automated account.
    pub fn as_bot(mut self) -> Self {
        self.bot = true;
        self
    }
}

/// A role held by a guild member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Role display name.
    pub name: String,
}

impl Role {
    /// Creates a role.
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// An inbound message, as seen by the framework.
///
/// `send`, `reply` and `delete` are best-effort: callers in the dispatch
/// path log failures and never re-raise them.
#[async_trait]
pub trait MessageHandle: Send + Sync + 'static {
    /// Returns the message identifier.
    fn id(&self) -> &MessageId;

    /// Returns the raw text content.
    fn content(&self) -> &str;

    /// Returns the author of the message.
    fn author(&self) -> &User;

    /// Returns the guild the message was sent in, if any.
    fn guild_id(&self) -> Option<&GuildId>;

    /// Returns the roles the author holds in the guild.
    fn member_roles(&self) -> &[Role];

    /// Returns the author's guild display name.
    fn author_display_name(&self) -> &str {
        &self.author().name
    }

    /// Returns a human readable channel label (e.g. `#general`).
    fn channel_label(&self) -> Option<&str> {
        None
    }

    /// Sends a new message into the same channel.
    async fn send(&self, reply: Reply) -> TransportResult<()>;

    /// Replies to this message.
    async fn reply(&self, reply: Reply) -> TransportResult<()>;

    /// Deletes this message.
    async fn delete(&self) -> TransportResult<()>;
}

/// A shared message handle.
pub type BoxedMessage = Arc<dyn MessageHandle>;

/// Answers whether a user holds a platform permission in a guild.
#[async_trait]
pub trait PermissionOracle: Send + Sync + 'static {
    /// Returns whether `user` holds the platform permission named
    /// `permission` in `guild`.
    async fn has_permission(&self, user: &User, permission: &str, guild: &GuildId) -> bool;
}

/// A shared permission oracle.
pub type BoxedOracle = Arc<dyn PermissionOracle>;

/// A reaction added to or removed from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// The message reacted to.
    pub message_id: MessageId,
    /// The guild the message lives in.
    pub guild_id: Option<GuildId>,
    /// The reacting user.
    pub user: User,
    /// Emoji name or custom emote markup.
    pub emoji: String,
}

/// Events delivered by the transport.
#[derive(Clone)]
pub enum TransportEvent {
    /// A message was received.
    Message(BoxedMessage),
    /// A reaction was added.
    ReactionAdd(Reaction),
    /// A reaction was removed.
    ReactionRemove(Reaction),
    /// The transport reported an error.
    Error(TransportError),
}

impl TransportEvent {
    /// Returns a short name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::ReactionAdd(_) => "reaction_add",
            Self::ReactionRemove(_) => "reaction_remove",
            Self::Error(_) => "error",
        }
    }
}

impl std::fmt::Debug for TransportEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(m) => f
                .debug_struct("Message")
                .field("id", m.id())
                .field("author", &m.author().id)
                .finish(),
            Self::ReactionAdd(r) => f.debug_tuple("ReactionAdd").field(r).finish(),
            Self::ReactionRemove(r) => f.debug_tuple("ReactionRemove").field(r).finish(),
            Self::Error(e) => f.debug_tuple("Error").field(e).finish(),
        }
    }
}
