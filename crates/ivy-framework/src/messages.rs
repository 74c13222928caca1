//! Replies the dispatcher sends on its own behalf.

use ivy_core::format::code_block;
use ivy_core::{EmbedBuilder, EmbedField, EmbedIcon, MessageHandle, Reply, User};

use crate::command::CommandSpec;

const ERROR_TITLE: &str = "Huh? That wasn't supposed to happen..";
const ERROR_BODY: &str = "Something went wrong while processing your command.";

/// Customizes the permission-denied and failure replies.
///
/// The verbose variant is sent only in guilds on the error-reporting
/// allow-list. The generic variant must not leak error details.
pub trait CommandMessages: Send + Sync + 'static {
    /// Reply for a user who failed the permission gate.
    fn permission(&self, user: &User, message: &dyn MessageHandle, command: &CommandSpec) -> Reply;

    /// Reply for a failed command, without internals.
    fn command_error(&self, user: &User, message: &dyn MessageHandle, name: &str, args: &[String]) -> Reply;

    /// Reply for a failed command, with full diagnostics.
    fn command_error_verbose(
        &self,
        user: &User,
        message: &dyn MessageHandle,
        name: &str,
        args: &[String],
        error: &anyhow::Error,
    ) -> Reply;
}

/// Stock embeds for [`CommandMessages`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCommandMessages {
    embeds: EmbedBuilder,
}

impl DefaultCommandMessages {
    pub fn new(embeds: EmbedBuilder) -> Self {
        Self { embeds }
    }
}

impl CommandMessages for DefaultCommandMessages {
    fn permission(&self, _user: &User, _message: &dyn MessageHandle, _command: &CommandSpec) -> Reply {
        self.embeds
            .build(
                "Whoops",
                EmbedIcon::Error,
                "You don't have permission to do this.",
                Vec::new(),
                None,
            )
            .into()
    }

    fn command_error(&self, _user: &User, message: &dyn MessageHandle, _name: &str, _args: &[String]) -> Reply {
        self.embeds
            .build(ERROR_TITLE, EmbedIcon::Error, ERROR_BODY, Vec::new(), Some(message))
            .into()
    }

    fn command_error_verbose(
        &self,
        _user: &User,
        message: &dyn MessageHandle,
        name: &str,
        args: &[String],
        error: &anyhow::Error,
    ) -> Reply {
        let args_json = serde_json::to_string(args).unwrap_or_else(|_| "[]".to_string());
        let fields = vec![
            EmbedField::new("Command", code_block("", name), true),
            EmbedField::new("Arguments", code_block("json", args_json), true),
            EmbedField::new("Error", code_block("", error), false),
            EmbedField::new("Stacktrace", code_block("", format!("{error:?}")), false),
        ];
        self.embeds
            .build(ERROR_TITLE, EmbedIcon::Error, ERROR_BODY, fields, Some(message))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use ivy_core::mock::MockMessage;

    fn message() -> MockMessage {
        MockMessage::new(".x", User::new("1", "alice"), "g")
    }

    #[test]
    fn test_generic_error_hides_details() {
        let msg = message();
        let reply = DefaultCommandMessages::default().command_error(
            msg.author(),
            &msg,
            "ping",
            &["a".into()],
        );
        let embed = reply.as_embed().unwrap();
        assert_eq!(embed.title, ERROR_TITLE);
        assert!(embed.fields.is_empty());
        assert!(embed.footer.is_some());
    }

    #[test]
    fn test_verbose_error_has_diagnostics() {
        let msg = message();
        let error = Err::<(), _>(anyhow::anyhow!("disk on fire"))
            .context("saving queue")
            .unwrap_err();
        let reply = DefaultCommandMessages::default().command_error_verbose(
            msg.author(),
            &msg,
            "queue",
            &["add".into(), "x y".into()],
            &error,
        );
        let embed = reply.as_embed().unwrap();

        assert!(embed.find_field("Command").unwrap().value.contains("queue"));
        assert!(
            embed
                .find_field("Arguments")
                .unwrap()
                .value
                .contains(r#"["add","x y"]"#)
        );
        assert!(embed.find_field("Error").unwrap().value.contains("saving queue"));
        assert!(embed.find_field("Stacktrace").unwrap().value.contains("disk on fire"));
    }

    #[test]
    fn test_permission_reply() {
        let msg = message();
        let spec = CommandSpec::new("x", ivy_core::Permission::SuperPerms);
        let reply = DefaultCommandMessages::default().permission(msg.author(), &msg, &spec);
        assert_eq!(reply.as_embed().unwrap().title, "Whoops");
    }
}
