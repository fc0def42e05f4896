//! Blocking devices.
//!
//! This module contains the passive state of every device a process can
//! block on: reentrant locks, broadcast events, the sleep timer and the
//! terminal, plus the per-device wait queues. Waking parked processes and
//! putting them back on the ready queue is driven by the CPU.

/// Device identifiers and the flat numbering layout.
pub mod device_id;

/// Per-device FIFO wait queues.
pub mod device_queue;

/// Broadcast events.
pub mod event;

/// Reentrant locks.
pub mod lock;

/// Sleep timer and wake tokens.
pub mod sleep;

/// Terminal input/output.
pub mod terminal;

pub use device_id::{DeviceClass, DeviceId, DeviceLayout};
pub use device_queue::{DeviceQueue, Parked};
pub use event::Event;
pub use lock::{Lock, ReleaseOutcome};
pub use sleep::SleepTimer;
pub use terminal::{OutputSink, PendingWrite, Terminal};

use crate::config::Config;

/// Every blocking device of the machine.
#[derive(Debug)]
pub struct Devices {
    /// Numbering layout of locks and events.
    pub layout: DeviceLayout,
    /// Wait queues.
    pub queue: DeviceQueue,
    /// Locks, index `n - 1` holds lock `n`.
    pub locks: Vec<Lock>,
    /// Events, index `n - 1` holds event `n`.
    pub events: Vec<Event>,
    /// Sleep timer.
    pub sleep: SleepTimer,
    /// Terminal.
    pub terminal: Terminal,
}

impl Devices {
    /// Creates the device set described by the configuration.
    pub fn new(config: &Config) -> Self {
        let layout = DeviceLayout {
            locks: config.devices.lock_count,
            events: config.devices.event_count,
        };
        Self {
            layout,
            queue: DeviceQueue::new(),
            locks: (1..=layout.locks).map(|n| Lock::new(DeviceId::lock(n))).collect(),
            events: (1..=layout.events).map(Event::new).collect(),
            sleep: SleepTimer::new(),
            terminal: Terminal::new(),
        }
    }

    /// Lock number `n` (1-based), if in range.
    pub fn lock(&self, n: u32) -> Option<&Lock> {
        self.locks.get((n as usize).checked_sub(1)?)
    }

    /// Lock number `n` (1-based), mutably.
    pub fn lock_mut(&mut self, n: u32) -> Option<&mut Lock> {
        self.locks.get_mut((n as usize).checked_sub(1)?)
    }

    /// Event number `n` (1-based), if in range.
    pub fn event(&self, n: u32) -> Option<Event> {
        self.events.get((n as usize).checked_sub(1)?).copied()
    }
}
