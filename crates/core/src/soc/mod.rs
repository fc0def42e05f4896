//! Machine resources outside the CPU: physical memory and blocking devices.
//!
//! `System` bundles them so the CPU can borrow memory and devices
//! independently while executing a handler.

/// Blocking devices (locks, events, sleep timer, terminal) and wait queues.
pub mod devices;

/// Physical memory and the frame allocator.
pub mod memory;

use tracing::warn;

use crate::common::{KernelError, Result};
use crate::config::Config;
use devices::Devices;
use memory::Ram;

/// Physical memory plus devices.
#[derive(Debug)]
pub struct System {
    /// Physical memory.
    pub ram: Ram,
    /// Blocking devices.
    pub devices: Devices,
    /// Physical base address of the shared region, if one was pinned.
    pub shared_base: Option<u32>,
}

impl System {
    /// Builds memory and devices from a configuration and pins the shared region.
    pub fn new(config: &Config) -> Result<Self> {
        let mut ram = Ram::new(config.memory.frame_size, config.memory.frame_count)?;
        let shared_bytes = config
            .memory
            .shared_frames
            .checked_mul(config.memory.frame_size)
            .ok_or_else(|| KernelError::InvalidConfig("shared region size overflows".into()))?;
        let shared_base = if config.memory.shared_frames > 0 {
            let base = ram.allocate_shared(shared_bytes);
            if base.is_none() {
                warn!(frames = config.memory.shared_frames, "shared region does not fit");
            }
            base
        } else {
            None
        };
        Ok(Self {
            ram,
            devices: Devices::new(config),
            shared_base,
        })
    }
}
