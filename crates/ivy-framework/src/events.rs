//! Bridges transport events into the command manager.
//!
//! ```text
//! TransportEvent ─► EventManager::dispatch
//!                     ├─ Message ──► bot? no guild? wrong prefix? ──► CommandManager::handle
//!                     ├─ ReactionAdd / ReactionRemove ──► EventHandler hooks
//!                     └─ Error ──► EventHandler::on_transport_error
//! FaultSink ─────────────────────► EventHandler::on_fault
//! ```

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ivy_core::{BoxedMessage, Reaction, TransportError, TransportEvent};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::command::{CommandManager, has_prefix};
use crate::fault::{Fault, FaultSink};
use crate::module::{Module, ModuleContext};

/// Name the event manager registers under.
pub const EVENT_MODULE: &str = "Events";

/// Override points for transport events.
///
/// Every hook has a default; implement only what you need.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Sees every guild message from a human before command routing.
    async fn on_message(&self, _message: &BoxedMessage) {}

    async fn on_react(&self, _reaction: &Reaction) {}

    async fn on_react_removed(&self, _reaction: &Reaction) {}

    async fn on_transport_error(&self, error: &TransportError) {
        error!(error = %error, "Transport reported an error");
    }

    async fn on_fault(&self, fault: &Fault) {
        error!(
            kind = %fault.kind,
            location = fault.location.as_deref().unwrap_or("unknown"),
            "Uncaught fault: {}",
            fault.message
        );
    }
}

/// Handler with only the default hooks.
pub struct DefaultEventHandler;

impl EventHandler for DefaultEventHandler {}

/// Routes transport events; registered as the `Events` module.
pub struct EventManager {
    commands: Arc<CommandManager>,
    handler: Arc<dyn EventHandler>,
    default: bool,
    faults: Option<FaultSink>,
    fault_task: Mutex<Option<JoinHandle<()>>>,
    loaded: AtomicBool,
}

impl EventManager {
    /// Creates a manager with the default handler.
    pub fn new(commands: Arc<CommandManager>) -> Self {
        Self::build(commands, Arc::new(DefaultEventHandler), true)
    }

    /// Creates a manager with a custom handler.
    pub fn with_handler(commands: Arc<CommandManager>, handler: impl EventHandler) -> Self {
        Self::build(commands, Arc::new(handler), false)
    }

    fn build(commands: Arc<CommandManager>, handler: Arc<dyn EventHandler>, default: bool) -> Self {
        Self {
            commands,
            handler,
            default,
            faults: None,
            fault_task: Mutex::new(None),
            loaded: AtomicBool::new(false),
        }
    }

    /// Forwards faults from `sink` to the handler while started.
    pub fn subscribe_to(mut self, sink: FaultSink) -> Self {
        self.faults = Some(sink);
        self
    }

    /// Whether this manager uses the default handler.
    pub fn is_default(&self) -> bool {
        self.default
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Handles one transport event to completion.
    ///
    /// Events arriving while the manager is not started are dropped.
    pub async fn dispatch(&self, event: TransportEvent) {
        if !self.is_loaded() {
            trace!(event = event.event_name(), "Event manager not started, dropping event");
            return;
        }

        match event {
            TransportEvent::Message(message) => self.route_message(message).await,
            TransportEvent::ReactionAdd(reaction) => self.handler.on_react(&reaction).await,
            TransportEvent::ReactionRemove(reaction) => self.handler.on_react_removed(&reaction).await,
            TransportEvent::Error(error) => self.handler.on_transport_error(&error).await,
        }
    }

    async fn route_message(&self, message: BoxedMessage) {
        if message.author().bot {
            return;
        }
        let Some(guild) = message.guild_id() else {
            return;
        };

        self.handler.on_message(&message).await;

        let prefix = match self.commands.prefixes().prefix(guild).await {
            Ok(prefix) => prefix,
            Err(e) => {
                warn!(guild = %guild, error = %e, "Failed to load guild prefix");
                return;
            }
        };
        if !has_prefix(message.content(), &prefix) {
            return;
        }

        self.commands.handle(message).await;
    }

    fn listen_for_faults(&self) {
        let Some(sink) = &self.faults else {
            return;
        };
        let mut rx = sink.subscribe();
        let handler = self.handler.clone();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(fault) => handler.on_fault(&fault).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Fault listener lagged, some faults were not logged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        if let Some(previous) = self.fault_task.lock().replace(task) {
            previous.abort();
        }
    }
}

#[async_trait]
impl Module for EventManager {
    fn name(&self) -> &str {
        EVENT_MODULE
    }

    async fn start(&self, _ctx: ModuleContext) -> anyhow::Result<()> {
        self.listen_for_faults();
        self.loaded.store(true, Ordering::SeqCst);
        info!(default = self.default, "Event manager started");
        Ok(())
    }

    async fn end(&self) -> anyhow::Result<()> {
        self.loaded.store(false, Ordering::SeqCst);
        if let Some(task) = self.fault_task.lock().take() {
            task.abort();
        }
        debug!("Event manager stopped");
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, CommandReturn, CommandSpec, Invocation};
    use crate::fault::FaultKind;
    use crate::manager::ModuleManager;
    use ivy_core::mock::{MockMessage, MockOracle};
    use ivy_core::{DefaultGuildDataProvider, MessageId, Permission, User};
    use std::sync::atomic::AtomicUsize;
    use tokio_test::assert_ok;

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    struct Ping(CommandSpec, Arc<Counter>);

    #[async_trait]
    impl Command for Ping {
        fn spec(&self) -> &CommandSpec {
            &self.0
        }

        async fn execute(&self, _inv: Invocation) -> anyhow::Result<CommandReturn> {
            self.1.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CommandReturn::Exit)
        }
    }

    #[derive(Default)]
    struct Recording {
        messages: AtomicUsize,
        reactions: Mutex<Vec<String>>,
        faults: Mutex<Vec<Fault>>,
    }

    #[async_trait]
    impl EventHandler for Arc<Recording> {
        async fn on_message(&self, _message: &BoxedMessage) {
            self.messages.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_react(&self, reaction: &Reaction) {
            self.reactions.lock().push(format!("+{}", reaction.emoji));
        }

        async fn on_react_removed(&self, reaction: &Reaction) {
            self.reactions.lock().push(format!("-{}", reaction.emoji));
        }

        async fn on_fault(&self, fault: &Fault) {
            self.faults.lock().push(fault.clone());
        }
    }

    async fn commands(counter: Arc<Counter>) -> Arc<CommandManager> {
        let commands = CommandManager::builder(
            Arc::new(MockOracle::new()),
            Arc::new(DefaultGuildDataProvider::new("!")),
        )
        .build();
        let spec = CommandSpec::new("ping", Permission::named("SEND_MESSAGES")).permit_user("alice");
        assert_ok!(commands.register_command(Ping(spec, counter)).await);
        commands
    }

    fn message(content: &str, author: User) -> TransportEvent {
        TransportEvent::Message(MockMessage::new(content, author, "g").shared())
    }

    fn reaction(emoji: &str) -> Reaction {
        Reaction {
            message_id: MessageId::new("1"),
            guild_id: None,
            user: User::new("alice", "alice"),
            emoji: emoji.to_string(),
        }
    }

    #[tokio::test]
    async fn test_routes_prefixed_human_messages() {
        let counter = Arc::new(Counter::default());
        let events = Arc::new(EventManager::new(commands(counter.clone()).await));
        let modules = ModuleManager::new();
        assert_ok!(modules.register_module(events.clone()).await);

        events.dispatch(message("!ping", User::new("alice", "alice"))).await;
        events.dispatch(message(".ping", User::new("alice", "alice"))).await;
        events.dispatch(message("!ping", User::new("robot", "robot").as_bot())).await;

        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drops_events_when_not_started() {
        let counter = Arc::new(Counter::default());
        let events = Arc::new(EventManager::new(commands(counter.clone()).await));

        events.dispatch(message("!ping", User::new("alice", "alice"))).await;
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);

        let modules = ModuleManager::new();
        assert_ok!(modules.register_module(events.clone()).await);
        assert_ok!(modules.unregister_by_name(EVENT_MODULE).await);
        assert!(!events.is_loaded());
    }

    #[tokio::test]
    async fn test_custom_handler_hooks() {
        let recording = Arc::new(Recording::default());
        let counter = Arc::new(Counter::default());
        let events = Arc::new(EventManager::with_handler(
            commands(counter.clone()).await,
            recording.clone(),
        ));
        assert!(!events.is_default());
        let modules = ModuleManager::new();
        assert_ok!(modules.register_module(events.clone()).await);

        events.dispatch(message("hello", User::new("alice", "alice"))).await;
        events.dispatch(TransportEvent::ReactionAdd(reaction("👍"))).await;
        events.dispatch(TransportEvent::ReactionRemove(reaction("👍"))).await;
        events
            .dispatch(TransportEvent::Error(TransportError::NotConnected))
            .await;

        assert_eq!(recording.messages.load(Ordering::SeqCst), 1);
        assert_eq!(*recording.reactions.lock(), vec!["+👍", "-👍"]);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_faults_forwarded_while_started() {
        let recording = Arc::new(Recording::default());
        let sink = FaultSink::default();
        let events = Arc::new(
            EventManager::with_handler(
                commands(Arc::new(Counter::default())).await,
                recording.clone(),
            )
            .subscribe_to(sink.clone()),
        );
        let modules = ModuleManager::new();
        assert_ok!(modules.register_module(events.clone()).await);
        assert_eq!(sink.subscriber_count(), 1);

        sink.report(Fault::new(FaultKind::Panic, "worker died"));
        for _ in 0..100 {
            if !recording.faults.lock().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(recording.faults.lock()[0].message, "worker died");

        modules.disable().await;
        for _ in 0..100 {
            if sink.subscriber_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(sink.subscriber_count(), 0);
    }
}
