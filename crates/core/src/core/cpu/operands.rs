//! Operand resolution.
//!
//! Each operand slot is interpreted by the addressing kind recorded in the
//! instruction's control byte: a register, a word in memory addressed by a
//! register, or a literal.

use super::Cpu;
use crate::common::error::{KernelError, Result};
use crate::common::ProcessId;
use crate::isa::{AddressingKind, Instruction};

impl Cpu {
    /// Reads the value of operand `slot`.
    pub(crate) fn read_operand(
        &self,
        pid: ProcessId,
        inst: &Instruction,
        slot: usize,
    ) -> Result<u32> {
        let raw = raw_operand(inst, slot)?;
        match inst.kind(slot) {
            AddressingKind::Register => self.pcb(pid)?.registers.read(raw),
            AddressingKind::MemoryAddress => {
                let address = self.pcb(pid)?.registers.read(raw)?;
                self.read_word(pid, address)
            }
            AddressingKind::Constant => Ok(raw),
            AddressingKind::None => Err(missing(inst, slot)),
        }
    }

    /// Stores `value` into operand `slot`.
    pub(crate) fn write_operand(
        &mut self,
        pid: ProcessId,
        inst: &Instruction,
        slot: usize,
        value: u32,
    ) -> Result<()> {
        let raw = raw_operand(inst, slot)?;
        match inst.kind(slot) {
            AddressingKind::Register => self.pcb_mut(pid)?.registers.write(raw, value),
            AddressingKind::MemoryAddress => {
                let address = self.pcb(pid)?.registers.read(raw)?;
                self.write_word(pid, address, value)
            }
            AddressingKind::Constant => Err(KernelError::ConstantDestination {
                opcode: inst.opcode,
                slot,
            }),
            AddressingKind::None => Err(missing(inst, slot)),
        }
    }

    /// Resolves a destination slot to the form a parked reader is woken with:
    /// the register index, or the linear address the register points at.
    pub(crate) fn destination_target(
        &self,
        pid: ProcessId,
        inst: &Instruction,
        slot: usize,
    ) -> Result<(AddressingKind, u32)> {
        let raw = raw_operand(inst, slot)?;
        match inst.kind(slot) {
            AddressingKind::Register => Ok((AddressingKind::Register, raw)),
            AddressingKind::MemoryAddress => Ok((
                AddressingKind::MemoryAddress,
                self.pcb(pid)?.registers.read(raw)?,
            )),
            AddressingKind::Constant => Err(KernelError::ConstantDestination {
                opcode: inst.opcode,
                slot,
            }),
            AddressingKind::None => Err(missing(inst, slot)),
        }
    }
}

fn raw_operand(inst: &Instruction, slot: usize) -> Result<u32> {
    inst.operands
        .get(slot)
        .copied()
        .ok_or_else(|| missing(inst, slot))
}

fn missing(inst: &Instruction, slot: usize) -> KernelError {
    KernelError::OperandCountMismatch {
        opcode: inst.opcode,
        expected: inst.opcode.info().arity(),
        found: slot.min(inst.operands.len()),
    }
}
