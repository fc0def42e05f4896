//! Instruction set tests.

/// Unit tests for the text rendering of instructions.
pub mod disasm;
