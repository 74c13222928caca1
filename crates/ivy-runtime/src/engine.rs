//! The engine: assembles configuration, managers and the event loop.
//!
//! ```rust,ignore
//! use ivy_runtime::{ConfigLoader, IvyEngine};
//!
//! let config = ConfigLoader::new().load()?;
//! let engine = IvyEngine::builder(config)
//!     .oracle(Arc::new(MyOracle))
//!     .capture_panics()
//!     .build()
//!     .await?;
//!
//! engine.register_command(Ping::new()).await?;
//! engine.start();
//! engine.run(transport_events).await;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use ivy_core::{
    BoxedOracle, BoxedPrefixSource, DefaultGuildDataProvider, EmbedBuilder, GuildDataProvider,
    GuildId, Permission, TransportEvent, User,
};
use ivy_framework::{
    BoxedModule, Command, CommandManager, CommandMessages, DefaultCommandMessages, EVENT_MODULE,
    EventHandler, EventManager, FaultSink, GenericTestFlow, Module, ModuleManager, TestFlow,
};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, trace, warn};

use crate::config::{ConfigError, IvyConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::fault::install_panic_hook;
use crate::logging;

/// A running bot: one command manager, one module manager, and the event
/// manager registered in it.
pub struct IvyEngine {
    config: IvyConfig,
    embeds: EmbedBuilder,
    commands: Arc<CommandManager>,
    modules: Arc<ModuleManager>,
    faults: FaultSink,
    shutdown: CancellationToken,
    created_at: Instant,
}

impl IvyEngine {
    pub fn builder(config: IvyConfig) -> IvyEngineBuilder {
        IvyEngineBuilder::new(config)
    }

    pub fn config(&self) -> &IvyConfig {
        &self.config
    }

    pub fn embeds(&self) -> &EmbedBuilder {
        &self.embeds
    }

    pub fn commands(&self) -> &Arc<CommandManager> {
        &self.commands
    }

    pub fn modules(&self) -> &Arc<ModuleManager> {
        &self.modules
    }

    pub fn faults(&self) -> &FaultSink {
        &self.faults
    }

    /// Time since the engine was built.
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    pub async fn register_command(&self, command: impl Command) -> RuntimeResult<()> {
        self.commands.register_command(command).await?;
        Ok(())
    }

    pub async fn register_flow(&self, flow: impl TestFlow) -> RuntimeResult<()> {
        self.commands.register_test_flow(flow).await?;
        Ok(())
    }

    /// Registers a flow that runs against `module`.
    pub async fn register_managed_flow<M, F>(&self, flow: F, module: Arc<M>) -> RuntimeResult<()>
    where
        M: Send + Sync + 'static,
        F: GenericTestFlow<M>,
    {
        self.commands.register_generic_test_flow(flow, module).await?;
        Ok(())
    }

    pub async fn register_module<M: Module>(&self, module: Arc<M>) -> RuntimeResult<()> {
        let module: BoxedModule = module;
        self.modules.register_module(module).await?;
        Ok(())
    }

    pub async fn unregister_module(&self, name: &str) -> RuntimeResult<()> {
        self.modules.unregister_by_name(name).await?;
        Ok(())
    }

    /// Replaces the registered event manager with one driving `handler`.
    ///
    /// Events arriving during the swap are dropped.
    pub async fn register_event_handler(&self, handler: impl EventHandler) -> RuntimeResult<()> {
        let replacement = Arc::new(
            EventManager::with_handler(self.commands.clone(), handler).subscribe_to(self.faults.clone()),
        );

        if let Some(current) = self.event_manager() {
            debug!(default = current.is_default(), "Replacing event manager");
            self.modules.unregister_by_name(EVENT_MODULE).await?;
        }
        self.modules.register_module(replacement).await?;
        Ok(())
    }

    /// The currently registered event manager.
    pub fn event_manager(&self) -> Option<Arc<EventManager>> {
        self.modules.require_as::<EventManager>(EVENT_MODULE)
    }

    /// Whether `user` holds `permission` in `guild`. Super users hold every
    /// permission.
    pub async fn has(&self, user: &User, permission: impl Into<Permission>, guild: &GuildId) -> bool {
        self.commands
            .services()
            .gate()
            .has(user, &permission.into(), guild)
            .await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Reports the loaded modules. Modules start as they are registered.
    pub fn start(&self) {
        self.modules.init();
        info!(
            name = %self.config.name,
            commands = self.commands.command_count(),
            flows = self.commands.flows().len(),
            "Engine started"
        );
    }

    /// Handles one transport event to completion.
    pub async fn dispatch(&self, event: TransportEvent) {
        dispatch_to(&self.modules, event).await;
    }

    /// Feeds `events` into the engine until the channel closes, Ctrl+C is
    /// pressed, or [`stop`](Self::stop) is called, then shuts down.
    ///
    /// Every event is handled on its own task.
    pub async fn run(&self, mut events: mpsc::Receiver<TransportEvent>) {
        let span = info_span!("bot", name = %self.config.name);
        info!(parent: &span, "Engine is running");

        let ctrl_c = signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!(parent: &span, "Stop requested");
                    break;
                }
                result = &mut ctrl_c => {
                    match result {
                        Ok(()) => info!(parent: &span, "Received Ctrl+C, shutting down"),
                        Err(e) => warn!(parent: &span, error = %e, "Failed to listen for Ctrl+C, shutting down"),
                    }
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        let modules = self.modules.clone();
                        tokio::spawn(
                            async move { dispatch_to(&modules, event).await }.instrument(span.clone()),
                        );
                    }
                    None => {
                        info!(parent: &span, "Transport closed, shutting down");
                        break;
                    }
                },
            }
        }

        self.shutdown().await;
    }

    /// Makes [`run`](Self::run) return.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// A token cancelled when the engine stops.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stops the loop and ends every module.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.modules.disable().await;
        info!(uptime = ?self.uptime(), "Engine stopped");
    }
}

async fn dispatch_to(modules: &ModuleManager, event: TransportEvent) {
    match modules.require_as::<EventManager>(EVENT_MODULE) {
        Some(events) => events.dispatch(event).await,
        None => trace!(event = event.event_name(), "No event manager registered, dropping event"),
    }
}

// =============================================================================
// IvyEngineBuilder
// =============================================================================

/// Builder for [`IvyEngine`].
pub struct IvyEngineBuilder {
    config: IvyConfig,
    oracle: Option<BoxedOracle>,
    prefixes: Option<BoxedPrefixSource>,
    messages: Option<Arc<dyn CommandMessages>>,
    faults: Option<FaultSink>,
    capture_panics: bool,
    init_logging: bool,
}

impl IvyEngineBuilder {
    pub fn new(config: IvyConfig) -> Self {
        Self {
            config,
            oracle: None,
            prefixes: None,
            messages: None,
            faults: None,
            capture_panics: false,
            init_logging: true,
        }
    }

    /// Sets the permission oracle. Required.
    pub fn oracle(mut self, oracle: BoxedOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Uses `provider` for guild prefixes instead of the configured prefix.
    pub fn provider(mut self, provider: impl GuildDataProvider) -> Self {
        self.prefixes = Some(Arc::new(provider));
        self
    }

    /// Overrides the permission and error replies.
    pub fn messages(mut self, messages: impl CommandMessages) -> Self {
        self.messages = Some(Arc::new(messages));
        self
    }

    /// Reports faults into an existing sink.
    pub fn fault_sink(mut self, sink: FaultSink) -> Self {
        self.faults = Some(sink);
        self
    }

    /// Installs the process-wide panic hook at build time.
    pub fn capture_panics(mut self) -> Self {
        self.capture_panics = true;
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Validates the configuration and assembles the engine.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::Config`] if validation fails, including when both
    ///   or neither of a provider and a prefix are supplied.
    /// - [`RuntimeError::MissingOracle`] without an oracle.
    /// - [`RuntimeError::Registration`] if a built-in module fails to start.
    pub async fn build(self) -> RuntimeResult<IvyEngine> {
        validate_config(&self.config, self.prefixes.is_some())?;
        let oracle = self.oracle.ok_or(RuntimeError::MissingOracle)?;

        if self.init_logging && !logging::init_from_config(&self.config.logging) {
            debug!("A tracing subscriber is already installed, keeping it");
        }

        let prefixes: BoxedPrefixSource = match (self.prefixes, self.config.prefix.as_deref()) {
            (Some(prefixes), _) => prefixes,
            (None, Some(prefix)) => Arc::new(DefaultGuildDataProvider::new(prefix)),
            (None, None) => return Err(ConfigError::MissingPrefix.into()),
        };

        let embeds = EmbedBuilder::new(self.config.color);
        let messages = self
            .messages
            .unwrap_or_else(|| Arc::new(DefaultCommandMessages::new(embeds)));
        let commands = CommandManager::builder(oracle, prefixes)
            .super_perms(self.config.super_perms.iter().cloned())
            .report_errors(self.config.report_errors.iter().cloned())
            .embeds(embeds)
            .messages(messages)
            .build();

        let faults = self.faults.unwrap_or_default();
        if self.capture_panics && !install_panic_hook(faults.clone()) {
            warn!("A panic hook was already installed by an earlier engine, keeping it");
        }

        let modules = ModuleManager::new();
        let events = Arc::new(EventManager::new(commands.clone()).subscribe_to(faults.clone()));
        modules.register_module(events).await?;
        modules.register_module(commands.clone()).await?;

        info!(
            name = %self.config.name,
            super_users = self.config.super_perms.len(),
            report_guilds = self.config.report_errors.len(),
            "Engine built"
        );

        Ok(IvyEngine {
            config: self.config,
            embeds,
            commands,
            modules,
            faults,
            shutdown: CancellationToken::new(),
            created_at: Instant::now(),
        })
    }
}
