//! Reentrant locks.
//!
//! A lock is owned by at most one process. The owner may acquire it again,
//! bumping the reference count; only the release that brings the count back
//! to zero gives up ownership.

use super::device_id::DeviceId;
use crate::common::ProcessId;
use crate::common::constants::FREE_OWNER;

/// Outcome of a release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Caller does not own the lock; nothing changed.
    NotOwner,
    /// Count decremented, caller still owns the lock.
    StillHeld,
    /// Count reached zero; the lock is unowned.
    Freed,
}

/// A reentrant mutex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lock {
    /// Device handle of the lock.
    pub handle: DeviceId,
    /// Owning process, or [`FREE_OWNER`].
    pub owner: ProcessId,
    /// Number of outstanding acquisitions by the owner.
    pub ref_count: u32,
}

impl Lock {
    /// Creates an unowned lock.
    pub const fn new(handle: DeviceId) -> Self {
        Self {
            handle,
            owner: FREE_OWNER,
            ref_count: 0,
        }
    }

    /// Acquires the lock if it is free or already held by `process`.
    ///
    /// # Returns
    ///
    /// `false` if another process owns the lock; the caller must block.
    pub fn try_acquire(&mut self, process: ProcessId) -> bool {
        if self.owner != FREE_OWNER && self.owner != process {
            return false;
        }
        self.owner = process;
        self.ref_count += 1;
        true
    }

    /// Releases one acquisition held by `process`.
    pub fn release(&mut self, process: ProcessId) -> ReleaseOutcome {
        if self.owner != process || self.owner == FREE_OWNER {
            return ReleaseOutcome::NotOwner;
        }
        self.ref_count = self.ref_count.saturating_sub(1);
        if self.ref_count > 0 {
            return ReleaseOutcome::StillHeld;
        }
        self.owner = FREE_OWNER;
        ReleaseOutcome::Freed
    }

    /// Drops every acquisition held by `process`, regardless of count.
    pub fn force_release(&mut self, process: ProcessId) -> bool {
        if self.owner != process || self.owner == FREE_OWNER {
            return false;
        }
        self.owner = FREE_OWNER;
        self.ref_count = 0;
        true
    }

    /// Transfers a free lock directly to a woken waiter.
    pub fn hand_off(&mut self, process: ProcessId) {
        self.owner = process;
        self.ref_count = 1;
    }

    /// Returns true if nobody owns the lock.
    pub const fn is_free(&self) -> bool {
        self.owner == FREE_OWNER
    }
}
