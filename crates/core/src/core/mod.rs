//! Kernel core: the execution engine, process state and the scheduler.
//!
//! Contains:
//! 1. **CPU:** The tick-driven execution engine and opcode handlers.
//! 2. **Process:** Context blocks and per-process address spaces.
//! 3. **Scheduler:** The multilevel ready queue.

/// Execution engine.
pub mod cpu;

/// Process context blocks and page tables.
pub mod process;

/// Ready queue.
pub mod sched;

pub use cpu::Cpu;
