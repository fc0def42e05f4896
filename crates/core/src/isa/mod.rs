//! Instruction set (opcodes, metadata table, encoding, disassembly).
//!
//! This module covers the wire/runtime representation of instructions:
//! 1. **Opcodes:** The closed opcode enum and its compile-time metadata table.
//! 2. **Encoding:** Control byte addressing kinds and fixed-width encode/decode.
//! 3. **Disassembly:** Text rendering for traces and listings.

/// Instruction disassembler for execution traces.
pub mod disasm;

/// Control byte, decoded instruction and wire format.
pub mod instruction;

/// Opcode enum and metadata table.
pub mod opcode;

pub use instruction::{AddressingKind, Instruction, Operand, addressing_kind};
pub use opcode::{OpCode, OpInfo, OperandRole};
