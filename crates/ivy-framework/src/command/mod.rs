//! Commands: metadata, the [`Command`] trait and the dispatch manager.
//!
//! A command is described by a [`CommandSpec`] and run through the
//! [`CommandManager`] pipeline:
//!
//! ```text
//! message ─► parse ─► lookup ─► internal gate ─► permission gate
//!                                                      │
//!              help reply ◄── "-h" ◄───────────────────┤
//!                                                      ▼
//!                             delete? ◄── execute ──► Exit | HelpMenu
//!                                            │
//!                                            └─err─► verbose | generic report
//! ```

mod component;
mod flow;
mod manager;
mod multi;
mod parse;
mod permission;

use std::sync::Arc;

use async_trait::async_trait;
use ivy_core::{
    BoxedMessage, Embed, EmbedBuilder, EmbedField, EmbedIcon, GuildId, MessageHandle, Permission,
    Reply, TransportResult, User, UserId,
};
use tracing::warn;

use crate::messages::CommandMessages;

pub use component::{CommandComponent, ComponentHandle, ComponentSpec};
pub use flow::{FlowCommand, FlowOutput, GenericTestFlow, TestFlow};
pub use manager::{COMMAND_MODULE, CommandManager, CommandManagerBuilder};
pub use multi::{MultiCommand, MultiCommandBuilder};
pub use parse::{ParsedInvocation, has_prefix, parse_invocation};
pub use permission::{PermissionGate, role_matches};

// =============================================================================
// CommandSpec
// =============================================================================

/// Declarative metadata for a command.
///
/// ```rust,ignore
/// let spec = CommandSpec::new("purge", Permission::named("MANAGE_MESSAGES"))
///     .help("purge <count>")
///     .category("Moderation")
///     .permit_role("Janitors");
/// ```
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Command name, matched case-insensitively.
    pub name: String,
    /// Usage text shown in the help embed.
    pub help: String,
    /// Overrides the default help embed title.
    pub help_title: Option<String>,
    /// Extra fields appended to the help embed.
    pub help_fields: Vec<EmbedField>,
    /// Permission required to run the command.
    pub permission: Permission,
    /// Delete the triggering message after a successful run.
    pub delete_message: bool,
    /// Omit from help listings.
    pub hide_from_help: bool,
    /// Listing category.
    pub category: Option<String>,
    /// Role ids or names allowed regardless of `permission`.
    pub permit_roles: Vec<String>,
    /// Users allowed regardless of `permission`.
    pub permit_users: Vec<UserId>,
    /// Only dispatch in guilds on the error-reporting allow-list.
    pub internal: bool,
}

impl CommandSpec {
    /// Creates a spec. Triggering messages are deleted by default.
    pub fn new(name: impl Into<String>, permission: impl Into<Permission>) -> Self {
        let name = name.into();
        Self {
            help: name.clone(),
            name,
            help_title: None,
            help_fields: Vec::new(),
            permission: permission.into(),
            delete_message: true,
            hide_from_help: false,
            category: None,
            permit_roles: Vec::new(),
            permit_users: Vec::new(),
            internal: false,
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn help_title(mut self, title: impl Into<String>) -> Self {
        self.help_title = Some(title.into());
        self
    }

    pub fn help_field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.help_fields.push(EmbedField::new(name, value, inline));
        self
    }

    /// Leaves the triggering message in place.
    pub fn keep_message(mut self) -> Self {
        self.delete_message = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hide_from_help = true;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn permit_role(mut self, role: impl Into<String>) -> Self {
        self.permit_roles.push(role.into());
        self
    }

    pub fn permit_user(mut self, user: impl Into<UserId>) -> Self {
        self.permit_users.push(user.into());
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Title of the help embed.
    pub fn help_embed_title(&self) -> String {
        self.help_title
            .clone()
            .unwrap_or_else(|| format!(".{} | Help Menu", self.name))
    }

    /// Builds the help embed for this command.
    pub fn help_embed(&self, embeds: &EmbedBuilder, message: Option<&dyn MessageHandle>) -> Embed {
        embeds.build(
            self.help_embed_title(),
            EmbedIcon::Help,
            self.help.clone(),
            self.help_fields.clone(),
            message,
        )
    }
}

// =============================================================================
// Command trait
// =============================================================================

/// What a command asks the dispatcher to do after it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandReturn {
    /// Handling is complete.
    Exit,
    /// Send the command's help embed.
    HelpMenu,
}

/// Shape of a command, as seen by the registrar.
pub enum CommandKind {
    /// A plain command.
    Simple,
    /// A command that delegates to sub-commands; each is started at
    /// registration.
    Multi(Vec<Arc<dyn ComponentHandle>>),
}

/// A chat command.
#[async_trait]
pub trait Command: Send + Sync + 'static {
    /// Returns the command metadata.
    fn spec(&self) -> &CommandSpec;

    /// Returns the command shape. Plain commands keep the default.
    fn kind(&self) -> CommandKind {
        CommandKind::Simple
    }

    /// Called once at registration.
    async fn start(&self, _services: &Arc<CommandServices>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs the command.
    ///
    /// Errors and panics are caught by the dispatcher and reported to the
    /// invoking channel.
    async fn execute(&self, inv: Invocation) -> anyhow::Result<CommandReturn>;
}

/// A shared command.
pub type BoxedCommand = Arc<dyn Command>;

/// A registered command (or test flow).
#[derive(Clone)]
pub struct CommandEntry {
    /// The registered name.
    pub name: String,
    /// The command itself.
    pub command: BoxedCommand,
}

impl CommandEntry {
    pub fn spec(&self) -> &CommandSpec {
        self.command.spec()
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Services & Invocation
// =============================================================================

/// Collaborators shared by every command.
pub struct CommandServices {
    gate: PermissionGate,
    embeds: EmbedBuilder,
    messages: Arc<dyn CommandMessages>,
}

impl CommandServices {
    pub fn new(gate: PermissionGate, embeds: EmbedBuilder, messages: Arc<dyn CommandMessages>) -> Self {
        Self {
            gate,
            embeds,
            messages,
        }
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub fn embeds(&self) -> &EmbedBuilder {
        &self.embeds
    }

    pub fn messages(&self) -> &dyn CommandMessages {
        self.messages.as_ref()
    }
}

/// One run of a command.
#[derive(Clone)]
pub struct Invocation {
    /// The invoking user.
    pub user: User,
    /// The triggering message.
    pub message: BoxedMessage,
    /// Name of the top-level command that was invoked.
    pub command: String,
    /// Arguments after the command name (or after the component name, inside
    /// a component).
    pub args: Vec<String>,
    services: Arc<CommandServices>,
}

impl Invocation {
    pub fn new(
        message: BoxedMessage,
        command: impl Into<String>,
        args: Vec<String>,
        services: Arc<CommandServices>,
    ) -> Self {
        Self {
            user: message.author().clone(),
            message,
            command: command.into(),
            args,
            services,
        }
    }

    pub fn services(&self) -> &Arc<CommandServices> {
        &self.services
    }

    pub fn guild_id(&self) -> Option<&GuildId> {
        self.message.guild_id()
    }

    /// Drops the first argument.
    pub fn shift(mut self) -> Self {
        if !self.args.is_empty() {
            self.args.remove(0);
        }
        self
    }

    /// Replies to the triggering message.
    pub async fn reply(&self, reply: impl Into<Reply>) -> TransportResult<()> {
        self.message.reply(reply.into()).await
    }

    /// Sends into the triggering message's channel.
    pub async fn send(&self, reply: impl Into<Reply>) -> TransportResult<()> {
        self.message.send(reply.into()).await
    }
}

/// Replies, logging instead of propagating transport failures.
pub(crate) async fn respond(message: &dyn MessageHandle, reply: Reply) {
    if let Err(e) = message.reply(reply).await {
        warn!(message = %message.id(), error = %e, "Failed to reply");
    }
}

/// Sends, logging instead of propagating transport failures.
pub(crate) async fn announce(message: &dyn MessageHandle, reply: Reply) {
    if let Err(e) = message.send(reply).await {
        warn!(message = %message.id(), error = %e, "Failed to send");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults() {
        let spec = CommandSpec::new("ping", Permission::named("SEND_MESSAGES"));
        assert_eq!(spec.help, "ping");
        assert!(spec.delete_message);
        assert!(!spec.internal);
        assert_eq!(spec.help_embed_title(), ".ping | Help Menu");
    }

    #[test]
    fn test_help_embed_uses_title_override_and_fields() {
        let spec = CommandSpec::new("queue", Permission::SuperPerms)
            .help("queue <add|skip>")
            .help_title("Queue")
            .help_field("Note", "admins only", false);
        let embed = spec.help_embed(&EmbedBuilder::default(), None);

        assert_eq!(embed.title, "Queue");
        assert_eq!(embed.description, "queue <add|skip>");
        assert_eq!(embed.icon.as_deref(), Some(EmbedIcon::Help.url()));
        assert!(embed.find_field("Note").is_some());
    }
}
