//! Per-guild FIFO queues.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use rand::seq::SliceRandom;

use crate::id::GuildId;

/// A set of independent FIFO queues, one per guild.
///
/// Queries against a guild that has no queue behave as if the queue were
/// empty and never create an entry. Only [`push`](Self::push) and
/// [`set`](Self::set) create entries.
///
/// "Destructive" operations write their result back into the queue; the
/// non-destructive form only returns the transformed copy.
pub struct GuildQueue<T> {
    queues: RwLock<HashMap<GuildId, VecDeque<T>>>,
}

impl<T> Default for GuildQueue<T> {
    fn default() -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> GuildQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the guild's queue, if it exists.
    pub fn get(&self, guild: &GuildId) -> Option<Vec<T>> {
        self.queues
            .read()
            .get(guild)
            .map(|q| q.iter().cloned().collect())
    }

    /// Replaces (or creates) the guild's queue.
    pub fn set(&self, guild: &GuildId, items: Vec<T>) {
        self.queues.write().insert(guild.clone(), items.into());
    }

    /// Maps every element through `transform`.
    pub fn map<F>(&self, guild: &GuildId, destructive: bool, mut transform: F) -> Vec<T>
    where
        F: FnMut(&T, usize) -> T,
    {
        if destructive {
            return self.rewrite(guild, |items| {
                for (i, item) in items.iter_mut().enumerate() {
                    *item = transform(&*item, i);
                }
            });
        }
        self.get(guild).map_or_else(Vec::new, |queue| {
            queue
                .iter()
                .enumerate()
                .map(|(i, item)| transform(item, i))
                .collect()
        })
    }

    /// Shuffles the queue (Fisher-Yates).
    pub fn shuffle(&self, guild: &GuildId, destructive: bool) -> Vec<T> {
        if destructive {
            return self.rewrite(guild, |items| items.shuffle(&mut rand::thread_rng()));
        }
        let mut queue = self.get(guild).unwrap_or_default();
        queue.shuffle(&mut rand::thread_rng());
        queue
    }

    /// Sorts the queue with `compare` (stable).
    pub fn sort_by<F>(&self, guild: &GuildId, destructive: bool, compare: F) -> Vec<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if destructive {
            return self.rewrite(guild, |items| items.sort_by(compare));
        }
        let mut queue = self.get(guild).unwrap_or_default();
        queue.sort_by(compare);
        queue
    }

    /// Applies `f` to the guild's queue in place and returns a copy of the
    /// result. The write lock is held throughout.
    fn rewrite(&self, guild: &GuildId, f: impl FnOnce(&mut [T])) -> Vec<T> {
        let mut queues = self.queues.write();
        let Some(queue) = queues.get_mut(guild) else {
            return Vec::new();
        };
        f(queue.make_contiguous());
        queue.iter().cloned().collect()
    }

    /// Number of queued elements; zero for an absent guild.
    pub fn len(&self, guild: &GuildId) -> usize {
        self.queues.read().get(guild).map_or(0, VecDeque::len)
    }

    /// Returns whether the guild's queue is absent or empty.
    pub fn is_empty(&self, guild: &GuildId) -> bool {
        self.len(guild) == 0
    }

    /// Returns whether the guild has a queue entry (possibly empty).
    pub fn has(&self, guild: &GuildId) -> bool {
        self.queues.read().contains_key(guild)
    }

    /// Returns whether any element matches.
    pub fn any<F>(&self, guild: &GuildId, predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.queues
            .read()
            .get(guild)
            .is_some_and(|q| q.iter().any(predicate))
    }

    /// Returns whether every element matches. Vacuously true when empty.
    pub fn all<F>(&self, guild: &GuildId, predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.queues
            .read()
            .get(guild)
            .is_none_or(|q| q.iter().all(predicate))
    }

    /// Returns whether no element matches.
    pub fn none<F>(&self, guild: &GuildId, predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        !self.any(guild, predicate)
    }

    /// Folds the queue with `reducer`, seeded by the first element.
    pub fn reduce<F>(&self, guild: &GuildId, reducer: F) -> Option<T>
    where
        F: FnMut(T, T) -> T,
    {
        self.get(guild)?.into_iter().reduce(reducer)
    }

    /// Returns the elements matching `predicate`.
    pub fn filter<F>(&self, guild: &GuildId, mut predicate: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        self.queues
            .read()
            .get(guild)
            .map(|q| q.iter().filter(|item| predicate(item)).cloned().collect())
            .unwrap_or_default()
    }

    /// Appends to the guild's queue, creating it if needed.
    pub fn push(&self, guild: &GuildId, item: T) {
        self.queues
            .write()
            .entry(guild.clone())
            .or_default()
            .push_back(item);
    }

    /// Removes and returns the head of the queue.
    ///
    /// Returns `None` for an empty or absent queue, without creating an entry.
    pub fn pop(&self, guild: &GuildId) -> Option<T> {
        self.queues.write().get_mut(guild)?.pop_front()
    }

    /// Returns the head of the queue without removing it.
    pub fn peek(&self, guild: &GuildId) -> Option<T> {
        self.queues.read().get(guild)?.front().cloned()
    }

    /// Empties the guild's queue if it exists.
    pub fn clear(&self, guild: &GuildId) {
        if let Some(queue) = self.queues.write().get_mut(guild) {
            queue.clear();
        }
    }

    /// Removes every guild's queue.
    pub fn flush(&self) {
        self.queues.write().clear();
    }
}
