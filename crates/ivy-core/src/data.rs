//! Per-guild configuration data.
//!
//! The dispatch core only needs one thing from guild data: the command
//! prefix. Applications store richer per-guild records by implementing
//! [`GuildData`] on their own type and supplying a [`GuildDataProvider`].
//!
//! Two providers ship with the framework:
//!
//! - [`DefaultGuildDataProvider`]: every guild uses one fixed prefix.
//! - [`CachedGuildDataProvider`]: an in-memory read-through cache in front of
//!   an application-defined [`GuildDataSource`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::DataResult;
use crate::id::GuildId;

/// Minimal shape every guild data record must have.
pub trait GuildData: Clone + Send + Sync + 'static {
    /// Returns the guild's command prefix.
    fn prefix(&self) -> &str;
}

/// The smallest possible guild data record: just a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildToken {
    pub prefix: String,
}

impl GuildToken {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl GuildData for GuildToken {
    fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Loads and saves per-guild data.
#[async_trait]
pub trait GuildDataProvider: Send + Sync + 'static {
    /// The record type handled by this provider.
    type Data: GuildData;

    /// Retrieves data for `guild`.
    async fn load(&self, guild: &GuildId) -> DataResult<Self::Data>;

    /// Persists data for `guild`.
    async fn save(&self, guild: &GuildId, data: Self::Data) -> DataResult<()>;
}

/// Object-safe view of a provider that only exposes the prefix.
///
/// Implemented for every [`GuildDataProvider`]; this is what the command
/// and event managers hold.
#[async_trait]
pub trait PrefixSource: Send + Sync + 'static {
    /// Returns the command prefix configured for `guild`.
    async fn prefix(&self, guild: &GuildId) -> DataResult<String>;
}

#[async_trait]
impl<P> PrefixSource for P
where
    P: GuildDataProvider,
{
    async fn prefix(&self, guild: &GuildId) -> DataResult<String> {
        self.load(guild).await.map(|data| data.prefix().to_string())
    }
}

/// A shared prefix source.
pub type BoxedPrefixSource = Arc<dyn PrefixSource>;

// =============================================================================
// Default provider
// =============================================================================

/// Provider that returns the same prefix for every guild and discards saves.
#[derive(Debug, Clone)]
pub struct DefaultGuildDataProvider {
    prefix: String,
}

impl DefaultGuildDataProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl GuildDataProvider for DefaultGuildDataProvider {
    type Data = GuildToken;

    async fn load(&self, _guild: &GuildId) -> DataResult<GuildToken> {
        Ok(GuildToken::new(self.prefix.clone()))
    }

    async fn save(&self, _guild: &GuildId, _data: GuildToken) -> DataResult<()> {
        Ok(())
    }
}

// =============================================================================
// Cached provider
// =============================================================================

/// Backing store behind a [`CachedGuildDataProvider`].
#[async_trait]
pub trait GuildDataSource: Send + Sync + 'static {
    type Data: GuildData;

    /// Fetches data for `guild` from the backing store.
    async fn fetch(&self, guild: &GuildId) -> DataResult<Self::Data>;

    /// Writes data for `guild` to the backing store.
    async fn update(&self, guild: &GuildId, data: &Self::Data) -> DataResult<()>;
}

struct CacheSlot<D> {
    data: D,
    stored_at: Instant,
}

/// Read-through cache over a [`GuildDataSource`].
///
/// `load` serves from memory while the entry is fresh, otherwise fetches
/// from the source and caches the result. `save` updates the cache first,
/// then writes through to the source.
pub struct CachedGuildDataProvider<S: GuildDataSource> {
    source: S,
    expiry: Option<Duration>,
    cache: RwLock<HashMap<GuildId, CacheSlot<S::Data>>>,
}

impl<S: GuildDataSource> CachedGuildDataProvider<S> {
    /// Creates a cache whose entries never expire.
    pub fn new(source: S) -> Self {
        Self {
            source,
            expiry: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Sets how long an entry stays fresh.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Returns the backing source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the cached record for `guild` if present and fresh.
    pub fn cached(&self, guild: &GuildId) -> Option<S::Data> {
        let cache = self.cache.read();
        let slot = cache.get(guild)?;
        match self.expiry {
            Some(expiry) if slot.stored_at.elapsed() >= expiry => None,
            _ => Some(slot.data.clone()),
        }
    }

    /// Drops the cached record for `guild`.
    pub fn invalidate(&self, guild: &GuildId) -> bool {
        self.cache.write().remove(guild).is_some()
    }

    /// Drops every cached record.
    pub fn flush(&self) {
        self.cache.write().clear();
    }

    fn store(&self, guild: &GuildId, data: S::Data) {
        self.cache.write().insert(
            guild.clone(),
            CacheSlot {
                data,
                stored_at: Instant::now(),
            },
        );
    }
}

#[async_trait]
impl<S: GuildDataSource> GuildDataProvider for CachedGuildDataProvider<S> {
    type Data = S::Data;

    async fn load(&self, guild: &GuildId) -> DataResult<S::Data> {
        if let Some(data) = self.cached(guild) {
            trace!(guild = %guild, "Guild data cache hit");
            return Ok(data);
        }

        debug!(guild = %guild, "Guild data cache miss, fetching from source");
        let data = self.source.fetch(guild).await?;
        self.store(guild, data.clone());
        Ok(data)
    }

    async fn save(&self, guild: &GuildId, data: S::Data) -> DataResult<()> {
        self.store(guild, data.clone());
        self.source.update(guild, &data).await
    }
}
