//! Per-user cooldowns.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::id::UserId;

/// Tracks a cooldown deadline per user.
///
/// Expired deadlines are evicted lazily, the first time they are observed.
#[derive(Default)]
pub struct RechargeManager {
    deadlines: Mutex<HashMap<UserId, Instant>>,
}

impl RechargeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `user` on cooldown for `timeout`.
    ///
    /// Returns `false` without touching the deadline if the user is already
    /// recharging.
    pub fn recharge(&self, user: &UserId, timeout: Duration) -> bool {
        let mut deadlines = self.deadlines.lock();
        if Self::active_deadline(&mut deadlines, user).is_some() {
            return false;
        }
        deadlines.insert(user.clone(), Instant::now() + timeout);
        true
    }

    /// Removes the user's cooldown. Returns whether one was stored.
    pub fn remove_recharge(&self, user: &UserId) -> bool {
        self.deadlines.lock().remove(user).is_some()
    }

    /// Removes every stored cooldown.
    pub fn clear_recharges(&self) {
        self.deadlines.lock().clear();
    }

    /// Returns whether `user` is currently on cooldown.
    pub fn is_recharging(&self, user: &UserId) -> bool {
        Self::active_deadline(&mut self.deadlines.lock(), user).is_some()
    }

    /// Time left on the user's cooldown, or `None` if not recharging.
    pub fn recharge_time(&self, user: &UserId) -> Option<Duration> {
        Self::active_deadline(&mut self.deadlines.lock(), user)
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Number of stored (possibly expired) deadlines.
    pub fn len(&self) -> usize {
        self.deadlines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn active_deadline(deadlines: &mut HashMap<UserId, Instant>, user: &UserId) -> Option<Instant> {
        let deadline = *deadlines.get(user)?;
        if deadline <= Instant::now() {
            deadlines.remove(user);
            return None;
        }
        Some(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_recharge_once_per_window() {
        let recharge = RechargeManager::new();
        let user = UserId::new("1");

        assert!(recharge.recharge(&user, Duration::from_secs(60)));
        assert!(!recharge.recharge(&user, Duration::from_secs(60)));
        assert!(recharge.is_recharging(&user));
    }

    #[test]
    fn test_expiry_evicts_and_allows_recharge() {
        let recharge = RechargeManager::new();
        let user = UserId::new("1");

        assert!(recharge.recharge(&user, Duration::from_millis(20)));
        assert!(recharge.is_recharging(&user));

        sleep(Duration::from_millis(40));

        assert!(!recharge.is_recharging(&user));
        assert!(recharge.is_empty());
        assert!(recharge.recharge(&user, Duration::from_millis(20)));
    }

    #[test]
    fn test_recharge_time() {
        let recharge = RechargeManager::new();
        let user = UserId::new("1");

        assert_eq!(recharge.recharge_time(&user), None);
        recharge.recharge(&user, Duration::from_secs(60));
        let left = recharge.recharge_time(&user).unwrap();
        assert!(left <= Duration::from_secs(60));
        assert!(left > Duration::from_secs(50));
    }

    #[test]
    fn test_remove_and_clear() {
        let recharge = RechargeManager::new();
        let a = UserId::new("a");
        let b = UserId::new("b");
        recharge.recharge(&a, Duration::from_secs(60));
        recharge.recharge(&b, Duration::from_secs(60));

        assert!(recharge.remove_recharge(&a));
        assert!(!recharge.remove_recharge(&a));
        assert!(recharge.recharge(&a, Duration::from_secs(60)));

        recharge.clear_recharges();
        assert!(!recharge.is_recharging(&b));
    }
}
