//! Configuration system for the virtual machine.
//!
//! This module defines all configuration structures used to parameterize
//! the machine. It provides:
//! 1. **Defaults:** Baseline constants (frame geometry, scheduler levels, device counts).
//! 2. **Structures:** Hierarchical config for general, memory, scheduler and devices.
//! 3. **Validation:** Rejection of geometries the kernel cannot run with.
//!
//! Configuration is supplied as JSON (see [`Config::from_json`]) or built with
//! `Config::default()`.

use serde::Deserialize;

use crate::common::constants::MAX_FRAME_SIZE;
use crate::common::error::{KernelError, Result};

/// Default configuration constants for the machine.
mod defaults {
    /// Size of one physical frame (and page) in bytes.
    pub const FRAME_SIZE: u32 = 256;

    /// Number of physical frames.
    pub const FRAME_COUNT: u32 = 64;

    /// Frames pinned at boot for the shared memory region.
    pub const SHARED_FRAMES: u32 = 1;

    /// Stack segment size of every process in bytes.
    pub const STACK_SIZE: u32 = 256;

    /// Number of priority levels (priorities `1..=32`).
    pub const PRIORITY_LEVELS: u8 = 32;

    /// Instructions a process may execute before it is preempted.
    pub const QUANTUM: i32 = 5;

    /// Number of locks.
    pub const LOCK_COUNT: u32 = 10;

    /// Number of events.
    pub const EVENT_COUNT: u32 = 10;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use tvm_core::config::Config;
///
/// let json = r#"{
///     "general": { "trace_instructions": true },
///     "memory": { "frame_size": 64, "frame_count": 16 },
///     "scheduler": { "quantum": 3 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert!(config.general.trace_instructions);
/// assert_eq!(config.memory.frame_size, 64);
/// assert_eq!(config.scheduler.priority_levels, 32);
/// assert_eq!(config.devices.lock_count, 10);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Physical memory geometry.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Scheduler parameters.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Device counts.
    #[serde(default)]
    pub devices: DeviceConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| KernelError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration describes a runnable machine.
    pub fn validate(&self) -> Result<()> {
        let m = &self.memory;
        if !m.frame_size.is_power_of_two() || m.frame_size > MAX_FRAME_SIZE {
            return Err(KernelError::FrameSizeNotPowerOfTwo(m.frame_size));
        }
        if m.frame_count == 0 {
            return Err(KernelError::InvalidConfig("frame_count must be positive".into()));
        }
        if m.shared_frames >= m.frame_count {
            return Err(KernelError::InvalidConfig(format!(
                "shared_frames ({}) must leave frames for processes ({})",
                m.shared_frames, m.frame_count
            )));
        }
        if m.shared_frames.checked_mul(m.frame_size).is_none() {
            return Err(KernelError::InvalidConfig(format!(
                "shared region of {} frames of {} bytes overflows",
                m.shared_frames, m.frame_size
            )));
        }
        let s = &self.scheduler;
        if s.priority_levels == 0 {
            return Err(KernelError::InvalidConfig("priority_levels must be positive".into()));
        }
        if s.quantum <= 0 {
            return Err(KernelError::InvalidConfig("quantum must be positive".into()));
        }
        Ok(())
    }
}

/// General settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Record every executed instruction in the CPU's trace buffer.
    #[serde(default)]
    pub trace_instructions: bool,
}

/// Physical memory geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Frame size in bytes; must be a power of two.
    #[serde(default = "MemoryConfig::default_frame_size")]
    pub frame_size: u32,

    /// Number of frames.
    #[serde(default = "MemoryConfig::default_frame_count")]
    pub frame_count: u32,

    /// Frames pinned for the shared region at boot.
    #[serde(default = "MemoryConfig::default_shared_frames")]
    pub shared_frames: u32,

    /// Stack segment size per process in bytes.
    #[serde(default = "MemoryConfig::default_stack_size")]
    pub stack_size: u32,
}

impl MemoryConfig {
    /// Returns the default frame size.
    const fn default_frame_size() -> u32 {
        defaults::FRAME_SIZE
    }

    /// Returns the default frame count.
    const fn default_frame_count() -> u32 {
        defaults::FRAME_COUNT
    }

    /// Returns the default shared frame count.
    const fn default_shared_frames() -> u32 {
        defaults::SHARED_FRAMES
    }

    /// Returns the default stack size.
    const fn default_stack_size() -> u32 {
        defaults::STACK_SIZE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            frame_size: defaults::FRAME_SIZE,
            frame_count: defaults::FRAME_COUNT,
            shared_frames: defaults::SHARED_FRAMES,
            stack_size: defaults::STACK_SIZE,
        }
    }
}

/// Scheduler parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Number of priority levels; valid priorities are `1..=priority_levels`.
    #[serde(default = "SchedulerConfig::default_priority_levels")]
    pub priority_levels: u8,

    /// Instructions per time slice.
    #[serde(default = "SchedulerConfig::default_quantum")]
    pub quantum: i32,

    /// Priority for programs that request 0 or an out-of-range level.
    /// 0 selects the middle level.
    #[serde(default)]
    pub default_priority: u8,
}

impl SchedulerConfig {
    /// Returns the default number of priority levels.
    const fn default_priority_levels() -> u8 {
        defaults::PRIORITY_LEVELS
    }

    /// Returns the default quantum.
    const fn default_quantum() -> i32 {
        defaults::QUANTUM
    }

    /// Priority assigned to processes with a zero or out-of-range priority.
    pub const fn base_priority(&self) -> u8 {
        if self.default_priority > 0 && self.default_priority <= self.priority_levels {
            return self.default_priority;
        }
        let p = self.priority_levels / 2;
        if p == 0 { 1 } else { p }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            priority_levels: defaults::PRIORITY_LEVELS,
            quantum: defaults::QUANTUM,
            default_priority: 0,
        }
    }
}

/// Device counts.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Number of locks (lock numbers `1..=lock_count`).
    #[serde(default = "DeviceConfig::default_lock_count")]
    pub lock_count: u32,

    /// Number of events (event numbers `1..=event_count`).
    #[serde(default = "DeviceConfig::default_event_count")]
    pub event_count: u32,
}

impl DeviceConfig {
    /// Returns the default lock count.
    const fn default_lock_count() -> u32 {
        defaults::LOCK_COUNT
    }

    /// Returns the default event count.
    const fn default_event_count() -> u32 {
        defaults::EVENT_COUNT
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            lock_count: defaults::LOCK_COUNT,
            event_count: defaults::EVENT_COUNT,
        }
    }
}
