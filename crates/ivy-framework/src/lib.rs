//! # Ivy Framework
//!
//! The dispatch core: modules, commands and event routing.
//!
//! ```text
//! ┌───────────────┐  TransportEvent  ┌──────────────┐  handle()  ┌────────────────┐
//! │   transport   │─────────────────▶│ EventManager │───────────▶│ CommandManager │
//! └───────────────┘                  └──────────────┘            └────────────────┘
//!                                          ▲                         │
//!                              FaultSink ──┘          parse ─ gate ─ execute ─ report
//!
//!            ModuleManager owns both managers plus any application modules
//! ```
//!
//! - [`ModuleManager`] registers [`Module`]s transactionally and drives
//!   their start/end lifecycle.
//! - [`CommandManager`] owns [`Command`]s and test flows and runs the
//!   per-message pipeline: prefix strip, lookup, internal gate, permission
//!   gate, `-h` help, execute, cleanup and error reporting.
//! - [`MultiCommand`] routes its first argument to a [`CommandComponent`].
//! - [`EventManager`] filters transport events and forwards commands; an
//!   [`EventHandler`] customizes reactions, errors and faults.

pub mod command;
pub mod error;
pub mod events;
pub mod fault;
pub mod manager;
pub mod messages;
pub mod module;

pub use command::{
    BoxedCommand, COMMAND_MODULE, Command, CommandComponent, CommandEntry, CommandKind, CommandManager,
    CommandManagerBuilder, CommandReturn, CommandServices, CommandSpec, ComponentSpec, FlowOutput,
    GenericTestFlow, Invocation, MultiCommand, PermissionGate, TestFlow,
};
pub use error::{RegistrationError, RegistrationResult};
pub use events::{DefaultEventHandler, EVENT_MODULE, EventHandler, EventManager};
pub use fault::{Fault, FaultKind, FaultSink};
pub use manager::ModuleManager;
pub use messages::{CommandMessages, DefaultCommandMessages};
pub use module::{BoxedModule, Module, ModuleContext};

/// Prelude for common imports.
pub mod prelude {
    pub use super::command::{
        Command, CommandComponent, CommandReturn, CommandSpec, ComponentSpec, FlowOutput,
        GenericTestFlow, Invocation, MultiCommand, TestFlow,
    };
    pub use super::events::EventHandler;
    pub use super::module::{Module, ModuleContext};
}
