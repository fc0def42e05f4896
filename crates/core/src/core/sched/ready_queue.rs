//! Priority ready queue.
//!
//! One FIFO per priority level `1..=P`. Dequeue always serves the highest
//! non-empty level, so scheduling is strictly by priority with round-robin
//! among equals. There is no aging: low priorities starve while higher
//! levels have work.

use std::collections::VecDeque;

use crate::common::ProcessId;

/// Runnable processes ordered by priority.
#[derive(Debug, Clone)]
pub struct ReadyQueue {
    /// `levels[p - 1]` holds priority `p`.
    levels: Vec<VecDeque<ProcessId>>,
    default_priority: u8,
}

impl ReadyQueue {
    /// Creates a queue with priorities `1..=levels`.
    ///
    /// Zero or out-of-range priorities are clamped to `default_priority`,
    /// which itself falls back to `levels / 2` when out of range.
    pub fn new(levels: u8, default_priority: u8) -> Self {
        let levels = levels.max(1);
        let default_priority = if default_priority == 0 || default_priority > levels {
            (levels / 2).max(1)
        } else {
            default_priority
        };
        Self {
            levels: vec![VecDeque::new(); usize::from(levels)],
            default_priority,
        }
    }

    /// Number of priority levels.
    pub fn level_count(&self) -> u8 {
        self.levels.len() as u8
    }

    /// Maps a requested priority to the level actually used.
    pub fn effective_priority(&self, priority: u8) -> u8 {
        if priority == 0 || usize::from(priority) > self.levels.len() {
            self.default_priority
        } else {
            priority
        }
    }

    /// Appends a process to the FIFO of its priority.
    pub fn enqueue(&mut self, process: ProcessId, priority: u8) {
        let p = self.effective_priority(priority);
        self.levels[usize::from(p) - 1].push_back(process);
    }

    /// Pops the oldest process of the highest non-empty priority.
    pub fn dequeue(&mut self) -> Option<ProcessId> {
        self.levels.iter_mut().rev().find_map(VecDeque::pop_front)
    }

    /// Returns true if `process` is queued at any level.
    pub fn contains(&self, process: ProcessId) -> bool {
        self.levels.iter().any(|q| q.contains(&process))
    }

    /// Total number of queued processes.
    pub fn len(&self) -> usize {
        self.levels.iter().map(VecDeque::len).sum()
    }

    /// Returns true if no process is queued.
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(VecDeque::is_empty)
    }
}
