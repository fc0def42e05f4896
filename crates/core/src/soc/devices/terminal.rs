//! Terminal device.
//!
//! Writes are queued and drained once per tick through the output sink,
//! giving every `Output` exactly one tick of latency. Reads park on the
//! terminal's device id; one input value is broadcast to every parked reader.

use std::collections::VecDeque;
use std::fmt;

use tracing::info;

use super::device_id::DeviceId;
use crate::common::ProcessId;

/// Callback receiving each value a process writes to the terminal.
pub type OutputSink = Box<dyn FnMut(ProcessId, u32)>;

/// A write waiting for the end-of-tick drain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingWrite {
    /// Writing process; parked until the write drains.
    pub process: ProcessId,
    /// Value written.
    pub value: u32,
}

/// The terminal.
pub struct Terminal {
    handle: DeviceId,
    input: VecDeque<u32>,
    writes: VecDeque<PendingWrite>,
    sink: OutputSink,
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("handle", &self.handle)
            .field("input", &self.input)
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal {
    /// Creates a terminal whose sink logs each value.
    pub fn new() -> Self {
        Self {
            handle: DeviceId::terminal(),
            input: VecDeque::new(),
            writes: VecDeque::new(),
            sink: Box::new(|pid, value| info!(pid, value, "terminal output")),
        }
    }

    /// Device id readers park on.
    pub const fn handle(&self) -> DeviceId {
        self.handle
    }

    /// Replaces the output sink.
    pub fn set_sink(&mut self, sink: OutputSink) {
        self.sink = sink;
    }

    /// Queues an input value.
    pub fn push_input(&mut self, value: u32) {
        self.input.push_back(value);
    }

    /// Takes the next input value.
    pub fn take_input(&mut self) -> Option<u32> {
        self.input.pop_front()
    }

    /// Number of input values not yet delivered.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Queues a write from `process`.
    pub fn queue_write(&mut self, process: ProcessId, value: u32) {
        self.writes.push_back(PendingWrite { process, value });
    }

    /// Number of writes waiting for the drain.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Sends every queued write to the sink.
    ///
    /// # Returns
    ///
    /// The drained writes, oldest first, so their writers can be woken.
    pub fn drain_writes(&mut self) -> Vec<PendingWrite> {
        let drained: Vec<PendingWrite> = self.writes.drain(..).collect();
        for w in &drained {
            (self.sink)(w.process, w.value);
        }
        drained
    }
}
