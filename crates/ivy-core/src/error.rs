//! Unified error types for the Ivy core layer.
//!
//! Framework-level errors (registration, dispatch) are defined in
//! `ivy-framework`; configuration errors live in `ivy-runtime`.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors surfaced by the chat transport collaborator.
///
/// Every transport operation is best-effort from the framework's point of
/// view: cleanup paths log these and move on instead of propagating them.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Sending or replying to a message failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// Deleting a message failed.
    #[error("failed to delete message '{id}': {reason}")]
    DeleteFailed {
        /// The message that could not be deleted.
        id: String,
        /// Reason for failure.
        reason: String,
    },

    /// The transport is not connected.
    #[error("transport not connected")]
    NotConnected,

    /// The message was not sent inside a guild.
    #[error("message is not associated with a guild")]
    NoGuild,
}

// =============================================================================
// Data Errors
// =============================================================================

/// Errors raised while loading or saving per-guild data.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    /// The backing source could not produce data for the guild.
    #[error("failed to load data for guild '{guild}': {reason}")]
    LoadFailed {
        /// The guild being loaded.
        guild: String,
        /// Reason for failure.
        reason: String,
    },

    /// The backing source rejected a write.
    #[error("failed to save data for guild '{guild}': {reason}")]
    SaveFailed {
        /// The guild being saved.
        guild: String,
        /// Reason for failure.
        reason: String,
    },
}

impl DataError {
    /// Creates a load error.
    pub fn load(guild: impl ToString, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            guild: guild.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a save error.
    pub fn save(guild: impl ToString, reason: impl Into<String>) -> Self {
        Self::SaveFailed {
            guild: guild.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for guild data operations.
pub type DataResult<T> = Result<T, DataError>;
