//! Opcode set and metadata table.
//!
//! Every opcode maps to exactly one [`OpInfo`] entry: its mnemonic, a
//! human-readable comment, and the ordered roles of its operands. The table
//! is a `static` built at compile time and indexed by the opcode byte; the
//! handler half of the mapping lives in the engine's dispatcher.

use serde::Deserialize;
use std::fmt;

/// Role an operand plays for its opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperandRole {
    /// Written by the instruction; must be a register or memory operand.
    Destination,
    /// Only read by the instruction.
    Source,
}

use OperandRole::{Destination as D, Source as S};

/// Metadata for one opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpInfo {
    /// The opcode described by this entry.
    pub opcode: OpCode,
    /// Assembly mnemonic.
    pub name: &'static str,
    /// Short description used in listings.
    pub comment: &'static str,
    /// Operand roles in slot order; the length is the opcode's arity.
    pub roles: &'static [OperandRole],
}

impl OpInfo {
    /// Number of operands the opcode takes.
    #[inline]
    pub const fn arity(&self) -> usize {
        self.roles.len()
    }
}

/// Instruction opcodes. Byte values start at 1 so zeroed memory never decodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    /// No operation.
    Noop = 1,
    /// `d := s`.
    Mov,
    /// `d := d + s`.
    Add,
    /// `d := d - s`.
    Sub,
    /// `d := d * s`.
    Mul,
    /// `d := d / s`.
    Div,
    /// `d := d % s`.
    Rem,
    /// `d := !d`.
    Not,
    /// `d := -d`.
    Neg,
    /// `d := d & s`.
    And,
    /// `d := d | s`.
    Or,
    /// `d := d ^ s`.
    Xor,
    /// `d := d + 1`.
    Incr,
    /// `d := d - 1`.
    Decr,
    /// Compare and set the sign/zero flags.
    Cmp,
    /// Unconditional relative jump.
    Jmp,
    /// Jump if less.
    Jlt,
    /// Jump if greater.
    Jgt,
    /// Jump if equal.
    Je,
    /// Jump if not equal.
    Jne,
    /// Push the return address and jump.
    Call,
    /// Pop the return address.
    Ret,
    /// Push a word onto the stack.
    Push,
    /// Pop a word from the stack.
    Pop,
    /// Allocate a new memory segment.
    Alloc,
    /// Free the segment containing an address.
    Free,
    /// Map shared memory into the process.
    Map,
    /// Zero a byte range.
    Clear,
    /// Acquire a lock.
    Acquire,
    /// Release a lock.
    Release,
    /// Wake every waiter of an event.
    Signal,
    /// Wait on an event.
    Wait,
    /// Sleep for a number of ticks.
    Sleep,
    /// Read a value from the terminal.
    Input,
    /// Write a value to the terminal.
    Output,
    /// Read the current process id.
    Pid,
    /// Terminate the current process with an exit code.
    Exit,
    /// Terminate a process by id.
    TermP,
}

/// Number of opcodes in the table.
pub const OPCODE_COUNT: usize = 38;

const fn op(
    opcode: OpCode,
    name: &'static str,
    comment: &'static str,
    roles: &'static [OperandRole],
) -> OpInfo {
    OpInfo {
        opcode,
        name,
        comment,
        roles,
    }
}

/// The opcode metadata table, ordered by opcode byte.
pub static OPCODE_TABLE: [OpInfo; OPCODE_COUNT] = [
    op(OpCode::Noop, "Noop", "does nothing", &[]),
    op(OpCode::Mov, "Mov", "d := s", &[D, S]),
    op(OpCode::Add, "Add", "d += s", &[D, S]),
    op(OpCode::Sub, "Sub", "d -= s", &[D, S]),
    op(OpCode::Mul, "Mul", "d *= s", &[D, S]),
    op(OpCode::Div, "Div", "d /= s", &[D, S]),
    op(OpCode::Rem, "Rem", "d %= s", &[D, S]),
    op(OpCode::Not, "Not", "d := ~d", &[D]),
    op(OpCode::Neg, "Neg", "d := -d", &[D]),
    op(OpCode::And, "And", "d &= s", &[D, S]),
    op(OpCode::Or, "Or", "d |= s", &[D, S]),
    op(OpCode::Xor, "Xor", "d ^= s", &[D, S]),
    op(OpCode::Incr, "Incr", "d += 1", &[D]),
    op(OpCode::Decr, "Decr", "d -= 1", &[D]),
    op(OpCode::Cmp, "Cmp", "compare a with b, set sign/zero", &[S, S]),
    op(OpCode::Jmp, "Jmp", "jump by offset", &[S]),
    op(OpCode::Jlt, "Jlt", "jump by offset if sign", &[S]),
    op(OpCode::Jgt, "Jgt", "jump by offset if !sign and !zero", &[S]),
    op(OpCode::Je, "Je", "jump by offset if zero", &[S]),
    op(OpCode::Jne, "Jne", "jump by offset if !zero", &[S]),
    op(OpCode::Call, "Call", "push return address, jump by offset", &[S]),
    op(OpCode::Ret, "Ret", "pop return address", &[]),
    op(OpCode::Push, "Push", "push s", &[S]),
    op(OpCode::Pop, "Pop", "d := pop", &[D]),
    op(OpCode::Alloc, "Alloc", "d := address of s new bytes, 0 on failure", &[D, S]),
    op(OpCode::Free, "Free", "free the segment containing address s", &[S]),
    op(OpCode::Map, "Map", "d := address of s shared bytes, 0 on failure", &[D, S]),
    op(OpCode::Clear, "Clear", "zero b bytes at address a", &[S, S]),
    op(OpCode::Acquire, "Acquire", "acquire lock s", &[S]),
    op(OpCode::Release, "Release", "release lock s", &[S]),
    op(OpCode::Signal, "Signal", "wake all waiters of event s", &[S]),
    op(OpCode::Wait, "Wait", "wait on event s", &[S]),
    op(OpCode::Sleep, "Sleep", "sleep for s ticks", &[S]),
    op(OpCode::Input, "Input", "d := next terminal value", &[D]),
    op(OpCode::Output, "Output", "write s to the terminal", &[S]),
    op(OpCode::Pid, "Pid", "d := current process id", &[D]),
    op(OpCode::Exit, "Exit", "terminate with exit code s", &[S]),
    op(OpCode::TermP, "TermP", "terminate process s", &[S]),
];

impl OpCode {
    /// Decodes an opcode byte.
    ///
    /// # Returns
    ///
    /// `None` if the byte names no opcode.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let idx = usize::from(byte).checked_sub(1)?;
        OPCODE_TABLE.get(idx).map(|info| info.opcode)
    }

    /// Returns the opcode's byte encoding.
    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Returns the opcode's metadata entry.
    #[inline]
    pub fn info(self) -> &'static OpInfo {
        &OPCODE_TABLE[usize::from(self.byte()) - 1]
    }

    /// Returns the assembly mnemonic.
    #[inline]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Returns true for the relative control-flow opcodes.
    pub const fn is_jump(self) -> bool {
        matches!(
            self,
            Self::Jmp | Self::Jlt | Self::Jgt | Self::Je | Self::Jne | Self::Call
        )
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
