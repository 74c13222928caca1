//! # Ivy Runtime
//!
//! Bootstraps a bot on top of `ivy-framework`:
//!
//! - [`config`]: layered configuration (defaults, `ivy.toml`, `IVY_*`
//!   environment variables, programmatic overrides) and validation
//! - [`logging`]: the `tracing-subscriber` setup driven by that configuration
//! - [`fault`]: the process-wide panic hook feeding a
//!   [`FaultSink`](ivy_framework::FaultSink)
//! - [`IvyEngine`]: owns the command and module managers and pumps
//!   transport events into them
//!
//! ```ignore
//! use ivy_runtime::{ConfigLoader, IvyEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     let engine = IvyEngine::builder(config)
//!         .oracle(oracle)
//!         .capture_panics()
//!         .build()
//!         .await?;
//!
//!     engine.register_command(Ping::new()).await?;
//!     engine.start();
//!     engine.run(events).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod fault;
pub mod logging;

pub use config::{ConfigError, ConfigLoader, ConfigResult, IvyConfig, LoggingConfig, Profile};
pub use engine::{IvyEngine, IvyEngineBuilder};
pub use error::{RuntimeError, RuntimeResult};
pub use fault::install_panic_hook;
pub use logging::{LoggingBuilder, SpanEvents};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
