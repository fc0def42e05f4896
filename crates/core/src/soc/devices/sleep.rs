//! Sleep timer.
//!
//! Maps absolute wake ticks to synthetic wake tokens. Processes sleeping
//! until the same tick share one token and are woken together.

use std::collections::BTreeMap;

use super::device_id::DeviceId;

/// Registry of pending wake-ups.
#[derive(Debug, Default)]
pub struct SleepTimer {
    wakeups: BTreeMap<u64, DeviceId>,
    tokens_minted: u32,
}

impl SleepTimer {
    /// Creates an empty timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wake-up `duration` ticks after `now`.
    ///
    /// # Returns
    ///
    /// The token to park on; reused if another sleeper targets the same tick.
    pub fn register(&mut self, now: u64, duration: u32) -> DeviceId {
        let target = now + u64::from(duration);
        if let Some(&token) = self.wakeups.get(&target) {
            return token;
        }
        self.tokens_minted += 1;
        let token = DeviceId::sleep_token(self.tokens_minted);
        let _ = self.wakeups.insert(target, token);
        token
    }

    /// Removes and returns the token due at exactly `now`.
    pub fn expire(&mut self, now: u64) -> Option<DeviceId> {
        self.wakeups.remove(&now)
    }

    /// Returns the tick a token fires at.
    pub fn target_of(&self, token: DeviceId) -> Option<u64> {
        self.wakeups
            .iter()
            .find(|&(_, &t)| t == token)
            .map(|(&tick, _)| tick)
    }

    /// Number of distinct pending wake ticks.
    pub fn pending(&self) -> usize {
        self.wakeups.len()
    }
}
