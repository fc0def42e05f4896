//! Tick-driven teaching virtual machine kernel.
//!
//! This crate implements a small multiprogramming kernel with the following:
//! 1. **ISA:** A fixed-width two-operand instruction set with register, indirect and literal operands.
//! 2. **Memory:** A paged frame allocator, per-process page tables and a pinned shared region.
//! 3. **Scheduling:** A strict-priority round-robin ready queue with an idle process fallback.
//! 4. **Devices:** Reentrant locks, broadcast events, a sleep timer and a terminal.
//! 5. **Simulation:** Program loading, configuration and statistics collection.
//!
//! # Examples
//!
//! ```
//! use tvm_core::isa::{Instruction, OpCode, Operand};
//! use tvm_core::sim::Program;
//! use tvm_core::{Config, Cpu};
//!
//! let mut cpu = Cpu::new(&Config::default()).unwrap();
//! let pid = cpu
//!     .load(&Program::new(vec![
//!         Instruction::new(OpCode::Mov, &[Operand::Register(1), Operand::Constant(6)]).unwrap(),
//!         Instruction::new(OpCode::Add, &[Operand::Register(1), Operand::Constant(5)]).unwrap(),
//!         Instruction::new(OpCode::Exit, &[Operand::Register(1)]).unwrap(),
//!     ]))
//!     .unwrap();
//!
//! cpu.run(100).unwrap();
//! assert_eq!(cpu.process(pid).unwrap().exit_code, Some(11));
//! ```

/// Common types and constants (addresses, registers, errors).
pub mod common;
/// Machine configuration (defaults and hierarchical config structures).
pub mod config;
/// Kernel core (execution engine, process state, scheduler).
pub mod core;
/// Instruction set (opcodes, encoding, disassembly).
pub mod isa;
/// Program description and loader.
pub mod sim;
/// Physical memory and blocking devices.
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Main CPU type; owns processes, scheduler, memory, devices and stats.
pub use crate::core::Cpu;
/// Physical memory plus devices; constructed by `Cpu::new`.
pub use crate::soc::System;
