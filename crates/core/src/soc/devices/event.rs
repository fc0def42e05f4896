//! Broadcast events.
//!
//! An event has no signaled state. `Wait` always parks; `Signal` wakes every
//! process parked at that moment and is otherwise forgotten.

use super::device_id::DeviceId;

/// A condition-variable-like event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    /// Device handle; waiters are parked under it.
    pub handle: DeviceId,
}

impl Event {
    /// Creates event number `n`.
    pub const fn new(n: u32) -> Self {
        Self {
            handle: DeviceId::event(n),
        }
    }
}
