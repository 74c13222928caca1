//! In-memory transport doubles for tests.
//!
//! Enabled with the `mock` feature (always on for this crate's own tests).

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{TransportError, TransportResult};
use crate::id::{GuildId, MessageId};
use crate::reply::Reply;
use crate::transport::{MessageHandle, PermissionOracle, Role, User};

/// A message that records everything sent through it.
pub struct MockMessage {
    id: MessageId,
    content: String,
    author: User,
    guild: Option<GuildId>,
    roles: Vec<Role>,
    fail_delete: bool,
    sent: Mutex<Vec<Reply>>,
    replies: Mutex<Vec<Reply>>,
    deleted: AtomicBool,
}

impl MockMessage {
    /// Creates a guild message authored by `author`.
    pub fn new(content: impl Into<String>, author: User, guild: impl Into<GuildId>) -> Self {
        Self {
            id: MessageId::new("1"),
            content: content.into(),
            author,
            guild: Some(guild.into()),
            roles: Vec::new(),
            fail_delete: false,
            sent: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
            deleted: AtomicBool::new(false),
        }
    }

    /// Removes the guild, making this a direct message.
    pub fn without_guild(mut self) -> Self {
        self.guild = None;
        self
    }

    /// Gives the author a role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    /// Makes `delete` fail.
    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    /// Wraps in an `Arc`.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Messages sent into the channel.
    pub fn sent(&self) -> Vec<Reply> {
        self.sent.lock().clone()
    }

    /// Replies to this message.
    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().clone()
    }

    /// Everything emitted, replies first then sends, rendered as text.
    pub fn transcript(&self) -> String {
        self.replies()
            .iter()
            .chain(self.sent().iter())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether `delete` succeeded.
    pub fn was_deleted(&self) -> bool {
        self.deleted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageHandle for MockMessage {
    fn id(&self) -> &MessageId {
        &self.id
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn author(&self) -> &User {
        &self.author
    }

    fn guild_id(&self) -> Option<&GuildId> {
        self.guild.as_ref()
    }

    fn member_roles(&self) -> &[Role] {
        &self.roles
    }

    fn channel_label(&self) -> Option<&str> {
        Some("#test")
    }

    async fn send(&self, reply: Reply) -> TransportResult<()> {
        self.sent.lock().push(reply);
        Ok(())
    }

    async fn reply(&self, reply: Reply) -> TransportResult<()> {
        self.replies.lock().push(reply);
        Ok(())
    }

    async fn delete(&self) -> TransportResult<()> {
        if self.fail_delete {
            return Err(TransportError::DeleteFailed {
                id: self.id.to_string(),
                reason: "mock failure".into(),
            });
        }
        self.deleted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A permission oracle backed by an explicit grant list.
#[derive(Default)]
pub struct MockOracle {
    grants: Mutex<HashSet<(String, String, String)>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `permission` to `user` in `guild`.
    pub fn grant(&self, user: &str, permission: &str, guild: &str) {
        self.grants
            .lock()
            .insert((user.to_string(), permission.to_string(), guild.to_string()));
    }
}

#[async_trait]
impl PermissionOracle for MockOracle {
    async fn has_permission(&self, user: &User, permission: &str, guild: &GuildId) -> bool {
        self.grants.lock().contains(&(
            user.id.to_string(),
            permission.to_string(),
            guild.to_string(),
        ))
    }
}
