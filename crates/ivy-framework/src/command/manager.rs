//! The command registry and per-message dispatch pipeline.

use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use ivy_core::{BoxedMessage, BoxedOracle, BoxedPrefixSource, EmbedBuilder, GuildId, UserId};
use parking_lot::RwLock;
use tracing::{Instrument, Level, debug, error, info, span, warn};

use super::{
    BoxedCommand, Command, CommandEntry, CommandKind, CommandReturn, CommandServices, FlowCommand,
    GenericTestFlow, Invocation, PermissionGate, TestFlow, parse_invocation, respond,
};
use crate::error::{RegistrationError, RegistrationResult, panic_to_error};
use crate::messages::{CommandMessages, DefaultCommandMessages};
use crate::module::{Module, ModuleContext};

/// Name the command manager registers under.
pub const COMMAND_MODULE: &str = "Commands";

/// Owns commands and test flows and dispatches messages to them.
///
/// Both registries are keyed by lower-cased name, so lookups during
/// dispatch are direct and listings come out sorted.
pub struct CommandManager {
    services: Arc<CommandServices>,
    prefixes: BoxedPrefixSource,
    report_errors: HashSet<GuildId>,
    commands: RwLock<BTreeMap<String, CommandEntry>>,
    flows: RwLock<BTreeMap<String, CommandEntry>>,
}

/// Builder for [`CommandManager`].
pub struct CommandManagerBuilder {
    oracle: BoxedOracle,
    prefixes: BoxedPrefixSource,
    super_perms: Vec<UserId>,
    report_errors: Vec<GuildId>,
    embeds: EmbedBuilder,
    messages: Option<Arc<dyn CommandMessages>>,
}

impl CommandManagerBuilder {
    /// Users allowed to run anything.
    pub fn super_perms(mut self, users: impl IntoIterator<Item = UserId>) -> Self {
        self.super_perms.extend(users);
        self
    }

    /// Guilds that get verbose error reports and internal commands.
    pub fn report_errors(mut self, guilds: impl IntoIterator<Item = GuildId>) -> Self {
        self.report_errors.extend(guilds);
        self
    }

    pub fn embeds(mut self, embeds: EmbedBuilder) -> Self {
        self.embeds = embeds;
        self
    }

    /// Replaces the stock permission and failure replies.
    pub fn messages(mut self, messages: Arc<dyn CommandMessages>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn build(self) -> Arc<CommandManager> {
        let messages = self
            .messages
            .unwrap_or_else(|| Arc::new(DefaultCommandMessages::new(self.embeds)));
        let gate = PermissionGate::new(self.oracle, self.super_perms);

        Arc::new(CommandManager {
            services: Arc::new(CommandServices::new(gate, self.embeds, messages)),
            prefixes: self.prefixes,
            report_errors: self.report_errors.into_iter().collect(),
            commands: RwLock::new(BTreeMap::new()),
            flows: RwLock::new(BTreeMap::new()),
        })
    }
}

impl CommandManager {
    pub fn builder(oracle: BoxedOracle, prefixes: BoxedPrefixSource) -> CommandManagerBuilder {
        CommandManagerBuilder {
            oracle,
            prefixes,
            super_perms: Vec::new(),
            report_errors: Vec::new(),
            embeds: EmbedBuilder::default(),
            messages: None,
        }
    }

    pub fn services(&self) -> &Arc<CommandServices> {
        &self.services
    }

    pub fn prefixes(&self) -> &BoxedPrefixSource {
        &self.prefixes
    }

    /// Whether `guild` is on the error-reporting allow-list.
    pub fn reports_errors(&self, guild: &GuildId) -> bool {
        self.report_errors.contains(guild)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Starts and registers a command.
    ///
    /// Multi-commands also start each of their components. Nothing is
    /// registered if any start hook fails.
    pub async fn register_command(&self, command: impl Command) -> RegistrationResult<()> {
        self.register_boxed(Arc::new(command)).await
    }

    /// Starts and registers a shared command.
    pub async fn register_boxed(&self, command: BoxedCommand) -> RegistrationResult<()> {
        let name = command.spec().name.clone();
        let key = name.to_lowercase();
        if self.is_taken(&key) {
            return Err(RegistrationError::DuplicateCommand { name });
        }

        self.start_command(&command, &name).await?;

        let mut commands = self.commands.write();
        if commands.contains_key(&key) || self.flows.read().contains_key(&key) {
            return Err(RegistrationError::DuplicateCommand { name });
        }
        commands.insert(key, CommandEntry { name: name.clone(), command });
        debug!(command = %name, "Command registered");
        Ok(())
    }

    /// Registers a test flow.
    pub async fn register_test_flow(&self, flow: impl TestFlow) -> RegistrationResult<()> {
        self.register_flow(FlowCommand::new(flow)).await
    }

    /// Registers a test flow bound to `module`.
    pub async fn register_generic_test_flow<M, F>(&self, flow: F, module: Arc<M>) -> RegistrationResult<()>
    where
        M: Send + Sync + 'static,
        F: GenericTestFlow<M>,
    {
        self.register_flow(FlowCommand::managed(flow, module)).await
    }

    async fn register_flow(&self, flow: FlowCommand) -> RegistrationResult<()> {
        let name = flow.name().to_string();
        let key = name.to_lowercase();
        let command: BoxedCommand = Arc::new(flow);
        if self.is_taken(&key) {
            return Err(RegistrationError::DuplicateFlow { name });
        }

        self.start_command(&command, &name).await?;

        let commands = self.commands.read();
        let mut flows = self.flows.write();
        if commands.contains_key(&key) || flows.contains_key(&key) {
            return Err(RegistrationError::DuplicateFlow { name });
        }
        flows.insert(key, CommandEntry { name: name.clone(), command });
        debug!(flow = %name, "Test flow registered");
        Ok(())
    }

    /// Whether `key` names a command or a flow. Commands and flows share one
    /// namespace since dispatch tries commands first.
    ///
    /// Lock order is always `commands` then `flows`.
    fn is_taken(&self, key: &str) -> bool {
        let commands = self.commands.read();
        commands.contains_key(key) || self.flows.read().contains_key(key)
    }

    async fn start_command(&self, command: &BoxedCommand, name: &str) -> RegistrationResult<()> {
        command
            .start(&self.services)
            .await
            .map_err(|e| RegistrationError::start_failed(name, e))?;

        if let CommandKind::Multi(components) = command.kind() {
            for component in components {
                component.start(&self.services).await.map_err(|e| {
                    RegistrationError::start_failed(format!("{name} {}", component.spec().name), e)
                })?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Lookup & listings
    // =========================================================================

    /// Finds a command by exact, case-sensitive name.
    pub fn find_command(&self, name: &str) -> Option<CommandEntry> {
        self.commands
            .read()
            .get(&name.to_lowercase())
            .filter(|entry| entry.name == name)
            .cloned()
    }

    /// Finds a test flow by exact, case-sensitive name.
    pub fn find_flow(&self, name: &str) -> Option<CommandEntry> {
        self.flows
            .read()
            .get(&name.to_lowercase())
            .filter(|entry| entry.name == name)
            .cloned()
    }

    /// All commands, sorted by name.
    pub fn commands(&self) -> Vec<CommandEntry> {
        self.commands.read().values().cloned().collect()
    }

    /// Commands not hidden from help, sorted by name.
    pub fn visible_commands(&self) -> Vec<CommandEntry> {
        self.commands
            .read()
            .values()
            .filter(|entry| !entry.spec().hide_from_help)
            .cloned()
            .collect()
    }

    /// Commands in `category` (case-insensitive), sorted by name.
    pub fn commands_in(&self, category: &str) -> Vec<CommandEntry> {
        let category = category.to_lowercase();
        self.commands
            .read()
            .values()
            .filter(|entry| {
                entry
                    .spec()
                    .category
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase() == category)
            })
            .cloned()
            .collect()
    }

    /// All test flows, sorted by name.
    pub fn flows(&self) -> Vec<CommandEntry> {
        self.flows.read().values().cloned().collect()
    }

    pub fn command_count(&self) -> usize {
        self.commands.read().len()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Dispatches a message that opens with its guild's prefix.
    ///
    /// Every failure is handled here: nothing propagates to the caller.
    pub async fn handle(&self, message: BoxedMessage) {
        let Some(guild) = message.guild_id().cloned() else {
            debug!("Ignoring message outside a guild");
            return;
        };

        let prefix = match self.prefixes.prefix(&guild).await {
            Ok(prefix) => prefix,
            Err(e) => {
                warn!(guild = %guild, error = %e, "Failed to load guild prefix");
                return;
            }
        };

        let parsed = parse_invocation(message.content(), &prefix);
        let Some(entry) = self.lookup(&parsed.name) else {
            return;
        };

        let span = span!(Level::DEBUG, "command", command = %entry.name, guild = %guild);
        self.dispatch(entry, &guild, message, parsed.args)
            .instrument(span)
            .await;
    }

    fn lookup(&self, name: &str) -> Option<CommandEntry> {
        if let Some(entry) = self.commands.read().get(name) {
            return Some(entry.clone());
        }
        self.flows.read().get(name).cloned()
    }

    async fn dispatch(&self, entry: CommandEntry, guild: &GuildId, message: BoxedMessage, args: Vec<String>) {
        let spec = entry.spec();
        if spec.internal && !self.reports_errors(guild) {
            debug!("Internal command invoked outside a reporting guild");
            return;
        }

        let run = self.run_gated(&entry, message.clone(), args.clone());
        let error = match AssertUnwindSafe(run).catch_unwind().await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(panic) => panic_to_error(panic),
        };

        let user = message.author();
        let reply = if self.reports_errors(guild) {
            error!(error = %error, stack = ?error, "Encountered an exception while processing a command");
            self.services
                .messages()
                .command_error_verbose(user, message.as_ref(), &entry.name, &args, &error)
        } else {
            error!(error = %error, "Encountered an exception while processing a command");
            self.services
                .messages()
                .command_error(user, message.as_ref(), &entry.name, &args)
        };
        respond(message.as_ref(), reply).await;
    }

    async fn run_gated(&self, entry: &CommandEntry, message: BoxedMessage, args: Vec<String>) -> anyhow::Result<()> {
        let spec = entry.spec();
        let services = &self.services;

        if !services.gate().authorize(message.as_ref(), spec).await {
            debug!(user = %message.author().id, "Permission denied");
            let reply = services
                .messages()
                .permission(message.author(), message.as_ref(), spec);
            respond(message.as_ref(), reply).await;
            return Ok(());
        }

        if args.len() == 1 && args[0].eq_ignore_ascii_case("-h") {
            if spec.delete_message {
                delete(&message).await;
            }
            let help = spec.help_embed(services.embeds(), Some(message.as_ref()));
            respond(message.as_ref(), help.into()).await;
            return Ok(());
        }

        let inv = Invocation::new(message.clone(), &entry.name, args, services.clone());
        let result = entry.command.execute(inv).await?;

        if spec.delete_message {
            delete(&message).await;
        }

        if result == CommandReturn::HelpMenu {
            let help = spec.help_embed(services.embeds(), Some(message.as_ref()));
            respond(message.as_ref(), help.into()).await;
        }
        Ok(())
    }
}

async fn delete(message: &BoxedMessage) {
    if let Err(e) = message.delete().await {
        warn!(message = %message.id(), error = %e, "Failed to delete triggering message");
    }
}

#[async_trait]
impl Module for CommandManager {
    fn name(&self) -> &str {
        COMMAND_MODULE
    }

    async fn start(&self, _ctx: ModuleContext) -> anyhow::Result<()> {
        let count = self.command_count();
        info!(count, "Registered {count} command(s)");
        Ok(())
    }

    async fn end(&self) -> anyhow::Result<()> {
        self.commands.write().clear();
        self.flows.write().clear();
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandSpec, FlowOutput};
    use ivy_core::mock::{MockMessage, MockOracle};
    use ivy_core::{DefaultGuildDataProvider, Permission, Reply, User};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Outcome {
        Exit,
        Help,
        Fail,
        Panic,
    }

    struct Scripted {
        spec: CommandSpec,
        outcome: Outcome,
        calls: AtomicUsize,
        args: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(spec: CommandSpec, outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                spec,
                outcome,
                calls: AtomicUsize::new(0),
                args: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Command for Scripted {
        fn spec(&self) -> &CommandSpec {
            &self.spec
        }

        async fn execute(&self, inv: Invocation) -> anyhow::Result<CommandReturn> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.args.lock() = inv.args.clone();
            match self.outcome {
                Outcome::Exit => Ok(CommandReturn::Exit),
                Outcome::Help => Ok(CommandReturn::HelpMenu),
                Outcome::Fail => anyhow::bail!("secret detail"),
                Outcome::Panic => panic!("secret detail"),
            }
        }
    }

    fn manager(oracle: MockOracle) -> Arc<CommandManager> {
        CommandManager::builder(Arc::new(oracle), Arc::new(DefaultGuildDataProvider::new(".")))
            .super_perms([UserId::new("root")])
            .report_errors([GuildId::new("dev")])
            .build()
    }

    fn open(name: &str) -> CommandSpec {
        CommandSpec::new(name, Permission::named("SEND_MESSAGES")).permit_user("alice")
    }

    fn message(content: &str, author: &str, guild: &str) -> Arc<MockMessage> {
        MockMessage::new(content, User::new(author, author), guild).shared()
    }

    fn help_replies(message: &MockMessage) -> usize {
        message
            .replies()
            .iter()
            .filter_map(Reply::as_embed)
            .filter(|embed| embed.title.ends_with("| Help Menu"))
            .count()
    }

    #[tokio::test]
    async fn test_dispatch_forwards_args_and_deletes() {
        let manager = manager(MockOracle::new());
        let echo = Scripted::new(open("echo"), Outcome::Exit);
        manager.register_boxed(echo.clone()).await.unwrap();

        let msg = message(".ECHO bar baz", "alice", "g");
        manager.handle(msg.clone()).await;

        assert_eq!(echo.calls(), 1);
        assert_eq!(*echo.args.lock(), vec!["bar", "baz"]);
        assert!(msg.was_deleted());
        assert!(msg.replies().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_and_direct_messages_are_ignored() {
        let manager = manager(MockOracle::new());
        let echo = Scripted::new(open("echo"), Outcome::Exit);
        manager.register_boxed(echo.clone()).await.unwrap();

        let unknown = message(".nope", "alice", "g");
        manager.handle(unknown.clone()).await;
        assert!(unknown.transcript().is_empty());

        let direct = MockMessage::new(".echo", User::new("alice", "alice"), "g")
            .without_guild()
            .shared();
        manager.handle(direct.clone()).await;
        assert_eq!(echo.calls(), 0);
    }

    #[tokio::test]
    async fn test_super_perms_denied_never_executes() {
        let manager = manager(MockOracle::new());
        let reboot = Scripted::new(CommandSpec::new("reboot", Permission::SuperPerms), Outcome::Exit);
        manager.register_boxed(reboot.clone()).await.unwrap();

        let msg = message(".reboot", "mallory", "g");
        manager.handle(msg.clone()).await;

        assert_eq!(reboot.calls(), 0);
        assert!(msg.transcript().contains("You don't have permission to do this."));
        assert!(!msg.was_deleted());

        manager.handle(message(".reboot", "root", "g")).await;
        assert_eq!(reboot.calls(), 1);
    }

    #[tokio::test]
    async fn test_named_permission_granted_by_oracle() {
        let oracle = MockOracle::new();
        oracle.grant("bob", "MANAGE_MESSAGES", "g");
        let manager = manager(oracle);
        let purge = Scripted::new(
            CommandSpec::new("purge", Permission::named("MANAGE_MESSAGES")),
            Outcome::Exit,
        );
        manager.register_boxed(purge.clone()).await.unwrap();

        manager.handle(message(".purge", "bob", "g")).await;
        manager.handle(message(".purge", "bob", "other")).await;
        assert_eq!(purge.calls(), 1);
    }

    #[tokio::test]
    async fn test_help_flag_short_circuits() {
        let manager = manager(MockOracle::new());
        let deleting = Scripted::new(open("deleting"), Outcome::Exit);
        let keeping = Scripted::new(open("keeping").keep_message(), Outcome::Exit);
        manager.register_boxed(deleting.clone()).await.unwrap();
        manager.register_boxed(keeping.clone()).await.unwrap();

        let first = message(".deleting -H", "alice", "g");
        manager.handle(first.clone()).await;
        assert_eq!(deleting.calls(), 0);
        assert_eq!(help_replies(&first), 1);
        assert!(first.was_deleted());

        let second = message(".keeping -h", "alice", "g");
        manager.handle(second.clone()).await;
        assert_eq!(keeping.calls(), 0);
        assert_eq!(help_replies(&second), 1);
        assert!(!second.was_deleted());

        // Only a lone "-h" counts.
        manager.handle(message(".keeping -h more", "alice", "g")).await;
        assert_eq!(keeping.calls(), 1);
    }

    #[tokio::test]
    async fn test_help_menu_outcome_sends_help() {
        let manager = manager(MockOracle::new());
        let menu = Scripted::new(open("menu").help("menu <page>"), Outcome::Help);
        manager.register_boxed(menu.clone()).await.unwrap();

        let msg = message(".menu", "alice", "g");
        manager.handle(msg.clone()).await;

        assert_eq!(menu.calls(), 1);
        assert_eq!(help_replies(&msg), 1);
        assert!(msg.transcript().contains("menu <page>"));
    }

    #[tokio::test]
    async fn test_failure_outside_reporting_guild_is_sanitized() {
        let manager = manager(MockOracle::new());
        manager
            .register_boxed(Scripted::new(open("boom"), Outcome::Fail))
            .await
            .unwrap();

        let msg = message(".boom x", "alice", "g");
        manager.handle(msg.clone()).await;

        let transcript = msg.transcript();
        assert!(transcript.contains("Something went wrong while processing your command."));
        assert!(!transcript.contains("secret detail"));
        assert!(!transcript.contains("Stacktrace"));
    }

    #[tokio::test]
    async fn test_failure_in_reporting_guild_is_verbose() {
        let manager = manager(MockOracle::new());
        manager
            .register_boxed(Scripted::new(open("boom"), Outcome::Fail))
            .await
            .unwrap();

        let msg = message(".boom x y", "alice", "dev");
        manager.handle(msg.clone()).await;

        let replies = msg.replies();
        let embed = replies[0].as_embed().unwrap();
        assert!(embed.find_field("Command").unwrap().value.contains("boom"));
        assert!(embed.find_field("Arguments").unwrap().value.contains(r#"["x","y"]"#));
        assert!(embed.find_field("Error").unwrap().value.contains("secret detail"));
        assert!(embed.find_field("Stacktrace").is_some());
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let manager = manager(MockOracle::new());
        manager
            .register_boxed(Scripted::new(open("boom"), Outcome::Panic))
            .await
            .unwrap();

        let msg = message(".boom", "alice", "g");
        manager.handle(msg.clone()).await;

        let transcript = msg.transcript();
        assert!(transcript.contains("Something went wrong"));
        assert!(!transcript.contains("secret detail"));
    }

    #[tokio::test]
    async fn test_failed_delete_does_not_abort() {
        let manager = manager(MockOracle::new());
        let menu = Scripted::new(open("menu"), Outcome::Help);
        manager.register_boxed(menu.clone()).await.unwrap();

        let msg = MockMessage::new(".menu", User::new("alice", "alice"), "g")
            .failing_delete()
            .shared();
        manager.handle(msg.clone()).await;

        assert_eq!(menu.calls(), 1);
        assert_eq!(help_replies(&msg), 1);
    }

    #[tokio::test]
    async fn test_internal_commands_gated_by_reporting_guilds() {
        let manager = manager(MockOracle::new());
        let debug = Scripted::new(open("debug").internal(), Outcome::Exit);
        manager.register_boxed(debug.clone()).await.unwrap();

        let msg = message(".debug", "alice", "g");
        manager.handle(msg.clone()).await;
        assert_eq!(debug.calls(), 0);
        assert!(msg.transcript().is_empty());

        manager.handle(message(".debug", "alice", "dev")).await;
        assert_eq!(debug.calls(), 1);
    }

    #[tokio::test]
    async fn test_registration_rules_and_listings() {
        let manager = manager(MockOracle::new());
        manager
            .register_boxed(Scripted::new(open("Zeta").category("Fun"), Outcome::Exit))
            .await
            .unwrap();
        manager
            .register_boxed(Scripted::new(open("alpha").hidden(), Outcome::Exit))
            .await
            .unwrap();
        manager
            .register_boxed(Scripted::new(open("mid").category("fun"), Outcome::Exit))
            .await
            .unwrap();

        let err = manager
            .register_boxed(Scripted::new(open("ZETA"), Outcome::Exit))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateCommand { .. }));

        let names = |entries: Vec<CommandEntry>| entries.into_iter().map(|e| e.name).collect::<Vec<_>>();
        assert_eq!(names(manager.commands()), vec!["alpha", "mid", "Zeta"]);
        assert_eq!(names(manager.visible_commands()), vec!["mid", "Zeta"]);
        assert_eq!(names(manager.commands_in("FUN")), vec!["mid", "Zeta"]);

        assert!(manager.find_command("Zeta").is_some());
        assert!(manager.find_command("zeta").is_none());
    }

    #[tokio::test]
    async fn test_failed_start_is_not_registered() {
        struct Broken(CommandSpec);

        #[async_trait]
        impl Command for Broken {
            fn spec(&self) -> &CommandSpec {
                &self.0
            }

            async fn start(&self, _services: &Arc<CommandServices>) -> anyhow::Result<()> {
                anyhow::bail!("missing api key")
            }

            async fn execute(&self, _inv: Invocation) -> anyhow::Result<CommandReturn> {
                Ok(CommandReturn::Exit)
            }
        }

        let manager = manager(MockOracle::new());
        let err = manager
            .register_command(Broken(open("weather")))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::StartFailed { .. }));
        assert_eq!(manager.command_count(), 0);
    }

    #[tokio::test]
    async fn test_flows_dispatch_like_commands() {
        struct Ping;

        #[async_trait]
        impl TestFlow for Ping {
            fn name(&self) -> &str {
                "pingFlow"
            }

            async fn run(&self, _user: &User, _message: &BoxedMessage) -> anyhow::Result<FlowOutput> {
                Ok(FlowOutput::passed())
            }
        }

        let manager = manager(MockOracle::new());
        manager.register_test_flow(Ping).await.unwrap();
        assert!(manager.find_flow("pingFlow").is_some());
        assert!(manager.find_flow("pingflow").is_none());
        assert!(matches!(
            manager.register_test_flow(Ping).await,
            Err(RegistrationError::DuplicateFlow { .. })
        ));

        let denied = message(".pingflow", "alice", "g");
        manager.handle(denied.clone()).await;
        assert!(denied.transcript().contains("Whoops"));

        let allowed = message(".pingflow", "root", "g");
        manager.handle(allowed.clone()).await;
        assert!(allowed.transcript().contains("Executing test flow ``pingFlow``.."));
        assert!(allowed.transcript().contains(":white_check_mark:"));
    }

    #[tokio::test]
    async fn test_commands_and_flows_share_a_namespace() {
        struct Named(&'static str);

        #[async_trait]
        impl TestFlow for Named {
            fn name(&self) -> &str {
                self.0
            }

            async fn run(&self, _user: &User, _message: &BoxedMessage) -> anyhow::Result<FlowOutput> {
                Ok(FlowOutput::passed())
            }
        }

        let manager = manager(MockOracle::new());
        let echo = Scripted::new(open("echo"), Outcome::Exit);
        manager.register_boxed(echo.clone()).await.unwrap();

        assert!(matches!(
            manager.register_test_flow(Named("Echo")).await,
            Err(RegistrationError::DuplicateFlow { .. })
        ));
        assert!(manager.flows().is_empty());

        manager.register_test_flow(Named("Health")).await.unwrap();
        let err = manager
            .register_boxed(Scripted::new(open("HEALTH"), Outcome::Exit))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateCommand { .. }));
        assert_eq!(manager.command_count(), 1);

        manager.handle(message(".echo", "root", "g")).await;
        assert_eq!(echo.calls(), 1);

        let health = message(".health", "root", "g");
        manager.handle(health.clone()).await;
        assert!(health.transcript().contains("Executing test flow ``Health``.."));
    }

    #[tokio::test]
    async fn test_module_lifecycle() {
        let manager = manager(MockOracle::new());
        manager
            .register_boxed(Scripted::new(open("echo"), Outcome::Exit))
            .await
            .unwrap();

        let modules = crate::manager::ModuleManager::new();
        modules.register_module(manager.clone()).await.unwrap();
        assert!(modules.require_as::<CommandManager>("commands").is_some());

        modules.disable().await;
        assert_eq!(manager.command_count(), 0);
    }
}
