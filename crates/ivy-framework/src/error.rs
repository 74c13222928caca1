//! Error types for the Ivy framework.

use thiserror::Error;

/// Errors raised while registering or removing modules, commands and flows.
///
/// Registration is all-or-nothing: when one of these is returned the
/// manager is left exactly as it was before the call.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A module with the same case-insensitive name is already registered.
    #[error("a module named '{name}' is already registered")]
    DuplicateModule {
        /// The conflicting name.
        name: String,
    },

    /// A command with the same case-insensitive name is already registered.
    #[error("a command named '{name}' is already registered")]
    DuplicateCommand {
        /// The conflicting name.
        name: String,
    },

    /// A test flow with the same case-insensitive name is already registered.
    #[error("a test flow named '{name}' is already registered")]
    DuplicateFlow {
        /// The conflicting name.
        name: String,
    },

    /// The module to unregister is not present.
    #[error("module '{name}' is not registered")]
    NotRegistered {
        /// The name that was looked up.
        name: String,
    },

    /// The start hook failed, so nothing was committed.
    #[error("'{name}' failed to start: {source}")]
    StartFailed {
        /// The module, command or flow that failed.
        name: String,
        /// The error returned by the start hook.
        #[source]
        source: anyhow::Error,
    },
}

impl RegistrationError {
    /// Creates a start failure for `name`.
    pub fn start_failed(name: impl Into<String>, source: anyhow::Error) -> Self {
        Self::StartFailed {
            name: name.into(),
            source,
        }
    }

    /// Creates a not-registered error for `name`.
    pub fn not_registered(name: impl Into<String>) -> Self {
        Self::NotRegistered { name: name.into() }
    }
}

/// Result type for registration operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Turns a caught panic payload into an error.
pub(crate) fn panic_to_error(payload: Box<dyn std::any::Any + Send>) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    anyhow::anyhow!("panicked: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_failed_keeps_source() {
        let err = RegistrationError::start_failed("Music", anyhow::anyhow!("no voice"));
        assert_eq!(err.to_string(), "'Music' failed to start: no voice");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_panic_payloads() {
        assert_eq!(
            panic_to_error(Box::new("boom")).to_string(),
            "panicked: boom"
        );
        assert_eq!(
            panic_to_error(Box::new(String::from("bang"))).to_string(),
            "panicked: bang"
        );
        assert_eq!(
            panic_to_error(Box::new(42u8)).to_string(),
            "panicked: unknown panic payload"
        );
    }
}
