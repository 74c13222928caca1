//! Process-level fault reporting.
//!
//! Whatever catches process-wide failures (the runtime installs a panic hook
//! at bootstrap) reports them into a [`FaultSink`]. Event managers only
//! subscribe, so swapping event managers never installs a second hook.

use std::fmt;

use tokio::sync::broadcast;

/// Where a fault came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A panic outside the dispatch path.
    Panic,
    /// An error nobody handled.
    Unhandled,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panic => f.write_str("panic"),
            Self::Unhandled => f.write_str("unhandled error"),
        }
    }
}

/// A reported process-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
    /// Source location, when known.
    pub location: Option<String>,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Broadcasts faults to every subscriber.
#[derive(Clone)]
pub struct FaultSink {
    tx: broadcast::Sender<Fault>,
}

impl Default for FaultSink {
    fn default() -> Self {
        Self::new(64)
    }
}

impl FaultSink {
    /// Creates a sink buffering up to `capacity` undelivered faults per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Reports a fault. Returns how many subscribers will see it.
    pub fn report(&self, fault: Fault) -> usize {
        self.tx.send(fault).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Fault> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
