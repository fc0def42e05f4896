//! Process scheduling.

/// Priority-ordered FIFO ready queue.
pub mod ready_queue;

pub use ready_queue::ReadyQueue;
