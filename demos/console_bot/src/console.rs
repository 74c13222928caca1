//! A transport that reads messages from stdin and prints replies.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ivy::async_trait;
use ivy::core::{
    BoxedMessage, GuildId, MessageHandle, MessageId, PermissionOracle, Reply, Role,
    TransportEvent, TransportResult, User,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// One line typed into the console.
pub struct ConsoleMessage {
    id: MessageId,
    content: String,
    author: User,
    guild: GuildId,
    roles: Vec<Role>,
}

impl ConsoleMessage {
    pub fn new(content: impl Into<String>, author: User, guild: GuildId, roles: Vec<Role>) -> Self {
        Self {
            id: MessageId::new(NEXT_ID.fetch_add(1, Ordering::Relaxed).to_string()),
            content: content.into(),
            author,
            guild,
            roles,
        }
    }
}

#[async_trait]
impl MessageHandle for ConsoleMessage {
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
        Some(&self.guild)
    }

    fn member_roles(&self) -> &[Role] {
        &self.roles
    }

    fn channel_label(&self) -> Option<&str> {
        Some("#console")
    }

    async fn send(&self, reply: Reply) -> TransportResult<()> {
        println!("{reply}");
        Ok(())
    }

    async fn reply(&self, reply: Reply) -> TransportResult<()> {
        println!("> @{}\n{reply}", self.author.name);
        Ok(())
    }

    async fn delete(&self) -> TransportResult<()> {
        debug!(message = %self.id, "Deleted message");
        Ok(())
    }
}

/// Grants the permissions listed on the command line.
pub struct ConsoleOracle {
    granted: Vec<String>,
}

impl ConsoleOracle {
    pub fn new(granted: Vec<String>) -> Self {
        Self { granted }
    }
}

#[async_trait]
impl PermissionOracle for ConsoleOracle {
    async fn has_permission(&self, _user: &User, permission: &str, _guild: &GuildId) -> bool {
        self.granted.iter().any(|p| p.eq_ignore_ascii_case(permission))
    }
}

/// Spawns the stdin reader. The returned channel closes at end of input.
pub fn spawn_reader(author: User, guild: GuildId, roles: Vec<Role>) -> mpsc::Receiver<TransportEvent> {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    let message: BoxedMessage =
                        Arc::new(ConsoleMessage::new(line, author.clone(), guild.clone(), roles.clone()));
                    if tx.send(TransportEvent::Message(message)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read from stdin");
                    break;
                }
            }
        }
    });
    rx
}
