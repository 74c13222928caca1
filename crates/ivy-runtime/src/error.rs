//! Runtime error types.

use ivy_framework::RegistrationError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while building or driving an engine.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The engine was built without a permission oracle.
    #[error("A permission oracle is required to build the engine")]
    MissingOracle,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
