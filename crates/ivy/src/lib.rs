//! # Ivy
//!
//! A chat bot framework: declare commands, modules and event handlers, and
//! let the engine handle prefixes, permissions, help menus and error reports.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  TransportEvent  ┌──────────────┐      ┌────────────────┐
//! │ transport │─────────────────▶│  IvyEngine   │─────▶│ EventManager   │
//! └───────────┘                  │ (ivy-runtime)│      └───────┬────────┘
//!                                └──────┬───────┘              ▼
//!                                       │              ┌────────────────┐
//!                               ModuleManager ────────▶│ CommandManager │──▶ Command / MultiCommand / flow
//!                                                      └────────────────┘
//! ```
//!
//! - **ivy-core**: ids, permissions, transport contracts, replies and embeds,
//!   guild data providers, `GuildQueue`, `RechargeManager`
//! - **ivy-framework**: modules, commands, dispatch, event routing
//! - **ivy-runtime**: configuration, logging, panic capture, the engine
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ivy::prelude::*;
//!
//! struct Ping(CommandSpec);
//!
//! #[async_trait]
//! impl Command for Ping {
//!     fn spec(&self) -> &CommandSpec {
//!         &self.0
//!     }
//!
//!     async fn execute(&self, inv: Invocation) -> anyhow::Result<CommandReturn> {
//!         inv.reply("Pong!").await?;
//!         Ok(CommandReturn::Exit)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = IvyEngine::builder(ConfigLoader::new().load()?)
//!         .oracle(oracle)
//!         .build()
//!         .await?;
//!     engine.register_command(Ping(CommandSpec::new("ping", "SEND_MESSAGES"))).await?;
//!     engine.start();
//!     engine.run(transport_events).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: `ivy.toml` configuration files
//! - `yaml-config`: `ivy.yaml` configuration files
//! - `json-log`: JSON log output

pub use ivy_core as core;
pub use ivy_framework as framework;
pub use ivy_runtime as runtime;

pub use async_trait::async_trait;

/// Everything a bot usually needs.
///
/// ```rust,ignore
/// use ivy::prelude::*;
/// ```
pub mod prelude {
    // Runtime
    pub use ivy_runtime::{ConfigLoader, IvyConfig, IvyEngine, RuntimeError};

    // Commands & modules
    pub use ivy_framework::{
        Command, CommandComponent, CommandManager, CommandReturn, CommandServices, CommandSpec,
        ComponentSpec, EventHandler, FlowOutput, GenericTestFlow, Invocation, Module,
        ModuleContext, MultiCommand, TestFlow,
    };

    // Transport contracts & payloads
    pub use ivy_core::{
        BoxedMessage, Embed, EmbedIcon, GuildDataProvider, GuildId, GuildQueue, MessageHandle,
        Permission, PermissionOracle, RechargeManager, Reply, TransportEvent, User, UserId,
    };

    pub use super::async_trait;
}
