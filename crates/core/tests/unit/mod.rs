//! # Unit Components
//!
//! This module is the hub for per-component tests: shared types, the
//! instruction set, memory and devices, and the kernel core.




/// Unit tests for the instruction set.
///
/// This module aggregates tests for:
/// - Instruction encoding and decoding.
/// - Disassembler output.
pub mod isa;

/// Unit tests for the program loader.
pub mod loader;

/// Unit tests for physical memory and devices.
pub mod soc;

/// Unit tests for statistics counters.
pub mod stats;
