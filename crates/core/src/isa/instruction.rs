//! Instruction encoding and decoding.
//!
//! Provides the addressing-mode control byte, the decoded `Instruction`
//! structure, and the fixed-width wire format consumed by the loader.
//!
//! Wire layout (`INSTRUCTION_SIZE` bytes):
//!
//! ```text
//! [opcode:u8][control:u8][operand0:u32 LE][operand1:u32 LE]
//! ```
//!
//! The control byte holds two bits per operand slot (slot 0 in bits 0-1,
//! slot 1 in bits 2-3) and the signed-display flag in bit 7.

use serde::Deserialize;

use super::opcode::{OpCode, OperandRole};
use crate::common::constants::{INSTRUCTION_SIZE, MAX_OPERANDS, WORD_SIZE};
use crate::common::error::{KernelError, Result};

/// Bits per operand slot in the control byte.
const KIND_BITS: usize = 2;

/// Mask for one operand slot in the control byte.
const KIND_MASK: u8 = 0b11;

/// Control byte flag: render constants as signed values.
pub const SIGNED_FLAG: u8 = 0x80;

/// How an operand value is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AddressingKind {
    /// Slot unused.
    #[default]
    None,
    /// Operand is a register index.
    Register,
    /// Operand is a register index holding a virtual address.
    MemoryAddress,
    /// Operand is a literal.
    Constant,
}

impl AddressingKind {
    /// Decodes the two-bit slot value.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & KIND_MASK {
            1 => Self::Register,
            2 => Self::MemoryAddress,
            3 => Self::Constant,
            _ => Self::None,
        }
    }

    /// Returns the two-bit slot value.
    pub const fn bits(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Register => 1,
            Self::MemoryAddress => 2,
            Self::Constant => 3,
        }
    }
}

/// Extracts the addressing kind of an operand slot from a control byte.
///
/// Slots beyond [`MAX_OPERANDS`] are always [`AddressingKind::None`].
#[inline]
pub const fn addressing_kind(control_byte: u8, slot: usize) -> AddressingKind {
    if slot >= MAX_OPERANDS {
        return AddressingKind::None;
    }
    AddressingKind::from_bits(control_byte >> (slot * KIND_BITS))
}

/// Operand form used when building instructions (loader input, tests).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Operand {
    /// `rN`.
    Register(u32),
    /// `[rN]`.
    Memory(u32),
    /// Unsigned literal.
    Constant(u32),
    /// Signed literal; sets the signed-display flag.
    Signed(i32),
}

impl Operand {
    const fn kind(self) -> AddressingKind {
        match self {
            Self::Register(_) => AddressingKind::Register,
            Self::Memory(_) => AddressingKind::MemoryAddress,
            Self::Constant(_) | Self::Signed(_) => AddressingKind::Constant,
        }
    }

    const fn value(self) -> u32 {
        match self {
            Self::Register(v) | Self::Memory(v) | Self::Constant(v) => v,
            Self::Signed(v) => v as u32,
        }
    }
}

/// A decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    /// Operation to perform.
    pub opcode: OpCode,
    /// Addressing kinds of each slot plus display flags.
    pub control_byte: u8,
    /// Operand values, one per declared slot.
    pub operands: Vec<u32>,
}

impl Instruction {
    /// Builds and validates an instruction from operand forms.
    ///
    /// # Arguments
    ///
    /// * `opcode` - The operation.
    /// * `operands` - Operands in slot order.
    pub fn new(opcode: OpCode, operands: &[Operand]) -> Result<Self> {
        let mut control_byte = 0u8;
        for (slot, operand) in operands.iter().enumerate().take(MAX_OPERANDS) {
            control_byte |= operand.kind().bits() << (slot * KIND_BITS);
            if matches!(operand, Operand::Signed(_)) {
                control_byte |= SIGNED_FLAG;
            }
        }
        let inst = Self {
            opcode,
            control_byte,
            operands: operands.iter().map(|o| o.value()).collect(),
        };
        inst.validate()?;
        Ok(inst)
    }

    /// Returns the addressing kind of an operand slot.
    #[inline]
    pub const fn kind(&self, slot: usize) -> AddressingKind {
        addressing_kind(self.control_byte, slot)
    }

    /// Returns true if constants should be displayed as signed values.
    #[inline]
    pub const fn is_signed(&self) -> bool {
        self.control_byte & SIGNED_FLAG != 0
    }

    /// Checks operand count and kinds against the opcode metadata.
    pub fn validate(&self) -> Result<()> {
        let roles = self.opcode.info().roles;
        if self.operands.len() != roles.len() {
            return Err(KernelError::OperandCountMismatch {
                opcode: self.opcode,
                expected: roles.len(),
                found: self.operands.len(),
            });
        }
        check_kinds(self.opcode, self.control_byte)
    }

    /// Encodes the instruction into its fixed-width wire form.
    pub fn encode(&self) -> [u8; INSTRUCTION_SIZE] {
        let mut raw = [0u8; INSTRUCTION_SIZE];
        raw[0] = self.opcode.byte();
        raw[1] = self.control_byte;
        for (slot, value) in self.operands.iter().enumerate().take(MAX_OPERANDS) {
            let start = 2 + slot * WORD_SIZE;
            raw[start..start + WORD_SIZE].copy_from_slice(&value.to_le_bytes());
        }
        raw
    }

    /// Decodes an instruction from raw bytes.
    ///
    /// Only the first [`INSTRUCTION_SIZE`] bytes are read. Unknown opcodes,
    /// missing operands, operands beyond the opcode's arity and constant
    /// destinations are all rejected.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < INSTRUCTION_SIZE {
            return Err(KernelError::TruncatedInstruction(raw.len()));
        }
        let opcode = OpCode::from_byte(raw[0]).ok_or(KernelError::UnknownOpcode(raw[0]))?;
        let control_byte = raw[1];
        check_kinds(opcode, control_byte)?;

        let arity = opcode.info().arity();
        let mut operands = Vec::with_capacity(arity);
        for slot in 0..MAX_OPERANDS {
            let start = 2 + slot * WORD_SIZE;
            let mut word = [0u8; WORD_SIZE];
            word.copy_from_slice(&raw[start..start + WORD_SIZE]);
            let value = u32::from_le_bytes(word);
            if slot < arity {
                operands.push(value);
            } else if value != 0 {
                return Err(KernelError::ExtraOperand { opcode, slot });
            }
        }

        Ok(Self {
            opcode,
            control_byte,
            operands,
        })
    }
}

/// Validates the control byte's slot kinds against the opcode's operand roles.
fn check_kinds(opcode: OpCode, control_byte: u8) -> Result<()> {
    let roles = opcode.info().roles;
    let declared = (0..MAX_OPERANDS)
        .filter(|&slot| addressing_kind(control_byte, slot) != AddressingKind::None)
        .count();

    for slot in 0..MAX_OPERANDS {
        let kind = addressing_kind(control_byte, slot);
        match roles.get(slot) {
            Some(_) if kind == AddressingKind::None => {
                return Err(KernelError::OperandCountMismatch {
                    opcode,
                    expected: roles.len(),
                    found: declared,
                });
            }
            Some(OperandRole::Destination) if kind == AddressingKind::Constant => {
                return Err(KernelError::ConstantDestination { opcode, slot });
            }
            None if kind != AddressingKind::None => {
                return Err(KernelError::ExtraOperand { opcode, slot });
            }
            _ => {}
        }
    }
    Ok(())
}
