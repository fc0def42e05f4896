//! Per-device wait queues.
//!
//! A parked process sits in exactly one queue and nowhere else: it is neither
//! current nor on the ready queue until a device operation wakes it. Each
//! entry remembers where a delivered value (terminal input) must be written.

use std::collections::{HashMap, VecDeque};

use super::device_id::DeviceId;
use crate::common::ProcessId;
use crate::isa::AddressingKind;

/// A process parked on a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parked {
    /// Device the process waits on.
    pub device: DeviceId,
    /// The waiting process.
    pub process: ProcessId,
    /// How `argument` is interpreted when a value is delivered.
    pub kind: AddressingKind,
    /// Register index or linear virtual address for the delivered value.
    pub argument: u32,
}

/// FIFO wait queues keyed by device id.
#[derive(Debug, Default)]
pub struct DeviceQueue {
    queues: HashMap<DeviceId, VecDeque<Parked>>,
}

impl DeviceQueue {
    /// Creates empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a process on a device.
    pub fn enqueue(
        &mut self,
        device: DeviceId,
        process: ProcessId,
        kind: AddressingKind,
        argument: u32,
    ) {
        self.queues.entry(device).or_default().push_back(Parked {
            device,
            process,
            kind,
            argument,
        });
    }

    /// Pops the oldest process parked on a device.
    pub fn dequeue(&mut self, device: DeviceId) -> Option<Parked> {
        let queue = self.queues.get_mut(&device)?;
        let parked = queue.pop_front();
        if queue.is_empty() {
            let _ = self.queues.remove(&device);
        }
        parked
    }

    /// Removes and returns every process parked on a device, oldest first.
    pub fn drain(&mut self, device: DeviceId) -> Vec<Parked> {
        self.queues
            .remove(&device)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Number of processes parked on a device.
    pub fn waiting(&self, device: DeviceId) -> usize {
        self.queues.get(&device).map_or(0, VecDeque::len)
    }

    /// Returns the device a process is parked on, if any.
    pub fn find(&self, process: ProcessId) -> Option<DeviceId> {
        self.queues
            .values()
            .flatten()
            .find(|p| p.process == process)
            .map(|p| p.device)
    }

    /// Total number of parked processes.
    pub fn len(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Returns true if no process is parked anywhere.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
