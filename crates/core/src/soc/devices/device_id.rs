//! Device identifiers.
//!
//! Locks, events, the terminal and sleep wake tokens share one numbering
//! space. Inside the kernel a device is a `(class, index)` pair; the flat
//! integer form only exists at the encoding boundary, via [`DeviceLayout`].
//!
//! ```text
//! 1 ..= L              locks
//! L+1 ..= L+E          events
//! L+E+1                terminal
//! L+E+2 ..             sleep tokens (grow without bound)
//! ```

use std::fmt;

/// Kind of blocking device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceClass {
    /// Reentrant mutex.
    Lock,
    /// Broadcast event.
    Event,
    /// The terminal.
    Terminal,
    /// Wake token minted by the sleep timer.
    SleepToken,
}

/// Handle of a blocking device; also the key of its wait queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId {
    /// Device class.
    pub class: DeviceClass,
    /// 1-based index within the class.
    pub index: u32,
}

impl DeviceId {
    /// Lock number `n` (1-based).
    pub const fn lock(n: u32) -> Self {
        Self {
            class: DeviceClass::Lock,
            index: n,
        }
    }

    /// Event number `n` (1-based).
    pub const fn event(n: u32) -> Self {
        Self {
            class: DeviceClass::Event,
            index: n,
        }
    }

    /// The terminal.
    pub const fn terminal() -> Self {
        Self {
            class: DeviceClass::Terminal,
            index: 1,
        }
    }

    /// Sleep token number `n` (1-based).
    pub const fn sleep_token(n: u32) -> Self {
        Self {
            class: DeviceClass::SleepToken,
            index: n,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            DeviceClass::Lock => write!(f, "lock{}", self.index),
            DeviceClass::Event => write!(f, "event{}", self.index),
            DeviceClass::Terminal => f.write_str("terminal"),
            DeviceClass::SleepToken => write!(f, "sleep{}", self.index),
        }
    }
}

/// Sizes of the fixed device ranges; converts between `DeviceId` and the flat number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceLayout {
    /// Number of locks.
    pub locks: u32,
    /// Number of events.
    pub events: u32,
}

impl DeviceLayout {
    /// Flat number of the terminal.
    pub const fn terminal_number(&self) -> u32 {
        self.locks + self.events + 1
    }

    /// Combines a device id into its flat number.
    pub const fn encode(&self, id: DeviceId) -> u32 {
        match id.class {
            DeviceClass::Lock => id.index,
            DeviceClass::Event => self.locks + id.index,
            DeviceClass::Terminal => self.terminal_number(),
            DeviceClass::SleepToken => self.terminal_number() + id.index,
        }
    }

    /// Splits a flat number into a device id; `0` is no device.
    pub const fn decode(&self, number: u32) -> Option<DeviceId> {
        let terminal = self.terminal_number();
        if number == 0 {
            None
        } else if number <= self.locks {
            Some(DeviceId::lock(number))
        } else if number <= self.locks + self.events {
            Some(DeviceId::event(number - self.locks))
        } else if number == terminal {
            Some(DeviceId::terminal())
        } else {
            Some(DeviceId::sleep_token(number - terminal))
        }
    }
}
