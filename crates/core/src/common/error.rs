//! Kernel Fault definitions.
//!
//! This module defines the fatal error conditions of the machine. It provides:
//! 1. **Decode Faults:** Unknown opcodes and operand/metadata mismatches.
//! 2. **Memory Faults:** Unmapped addresses, segment overflow, bad address construction.
//! 3. **Execution Faults:** Invalid registers, stack underflow, division by zero.
//!
//! Every variant aborts the current tick and is propagated to the caller of
//! [`Cpu::tick`](crate::core::Cpu::tick). Defined no-ops (releasing an unowned
//! lock, out-of-range device numbers) and allocation exhaustion are not errors.

use thiserror::Error;

use super::ProcessId;
use crate::isa::OpCode;

/// Fatal faults raised while decoding or executing instructions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KernelError {
    /// The opcode byte does not name any instruction.
    #[error("UnknownOpcode({0:#04x})")]
    UnknownOpcode(u8),

    /// An instruction was shorter than [`INSTRUCTION_SIZE`](super::constants::INSTRUCTION_SIZE).
    #[error("TruncatedInstruction(len={0})")]
    TruncatedInstruction(usize),

    /// Number of operands does not match the opcode metadata.
    #[error("OperandCountMismatch({opcode}: expected {expected}, found {found})")]
    OperandCountMismatch {
        /// Offending opcode.
        opcode: OpCode,
        /// Arity declared by the metadata table.
        expected: usize,
        /// Operands present in the instruction.
        found: usize,
    },

    /// A constant was used where the metadata requires a destination.
    #[error("ConstantDestination({opcode}, slot {slot})")]
    ConstantDestination {
        /// Offending opcode.
        opcode: OpCode,
        /// Operand slot index.
        slot: usize,
    },

    /// An operand word outside the declared arity carries a value.
    #[error("ExtraOperand({opcode}, slot {slot})")]
    ExtraOperand {
        /// Offending opcode.
        opcode: OpCode,
        /// Operand slot index.
        slot: usize,
    },

    /// A register operand names a register that does not exist.
    #[error("InvalidRegister({0})")]
    InvalidRegister(u32),

    /// No page of the process maps the virtual address.
    #[error("Unmapped(pid={process}, addr={address:#x})")]
    Unmapped {
        /// Process performing the access.
        process: ProcessId,
        /// Linear virtual address.
        address: u32,
    },

    /// A streamed access ran past the last page of a segment.
    #[error("SegmentOverflow(offset={offset}, len={len}, capacity={capacity})")]
    SegmentOverflow {
        /// Offset of the access within the segment.
        offset: usize,
        /// Length of the access.
        len: usize,
        /// Capacity of the segment in bytes.
        capacity: usize,
    },

    /// The frame size is not a power of two (or is out of range).
    #[error("FrameSizeNotPowerOfTwo({0})")]
    FrameSizeNotPowerOfTwo(u32),

    /// A virtual address was constructed with a negative or unrepresentable page number.
    #[error("InvalidPage({0})")]
    InvalidPage(i64),

    /// A virtual address was constructed with an offset outside the frame.
    #[error("OffsetOutOfRange(offset={offset}, frame_size={frame_size})")]
    OffsetOutOfRange {
        /// Requested in-page offset.
        offset: i64,
        /// Configured frame size.
        frame_size: u32,
    },

    /// A jump resolved to a negative instruction index.
    #[error("JumpOutOfRange(pid={process}, target={target})")]
    JumpOutOfRange {
        /// Process executing the jump.
        process: ProcessId,
        /// Resolved instruction index.
        target: i64,
    },

    /// An operation referred to a process id that was never created.
    #[error("UnknownProcess({0})")]
    UnknownProcess(ProcessId),

    /// `Ret` or `Pop` on an empty stack.
    #[error("StackUnderflow(pid={0})")]
    StackUnderflow(ProcessId),

    /// `Div` or `Rem` with a zero divisor.
    #[error("DivideByZero(pid={0})")]
    DivideByZero(ProcessId),

    /// Physical memory could not hold a program being loaded.
    #[error("OutOfMemory(requested={0} bytes)")]
    OutOfMemory(usize),

    /// A program description could not be parsed.
    #[error("InvalidProgram({0})")]
    InvalidProgram(String),

    /// The configuration failed validation.
    #[error("InvalidConfig({0})")]
    InvalidConfig(String),
}

/// Result alias used throughout the kernel.
pub type Result<T> = std::result::Result<T, KernelError>;
