//! Jumps, calls and the stack.
//!
//! Jump offsets are signed instruction counts relative to the jump itself:
//! `Jmp #0` loops forever and `Jmp #1` falls through. `ip` has already been
//! advanced past the jump when its handler runs.

use super::Cpu;
use crate::common::error::{KernelError, Result};
use crate::common::ProcessId;
use crate::isa::{Instruction, OpCode};

impl Cpu {
    /// `Jmp`, `Jlt`, `Jgt`, `Je`, `Jne`
    pub(crate) fn op_jump(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let offset = self.read_operand(pid, inst, 0)? as i32;
        let pcb = self.pcb(pid)?;
        let taken = match inst.opcode {
            OpCode::Jlt => pcb.sign,
            OpCode::Jgt => !pcb.sign && !pcb.zero,
            OpCode::Je => pcb.zero,
            OpCode::Jne => !pcb.zero,
            _ => true,
        };
        if taken {
            self.jump(pid, offset)?;
        }
        Ok(())
    }

    /// `Call off`
    pub(crate) fn op_call(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let offset = self.read_operand(pid, inst, 0)? as i32;
        let pcb = self
            .processes
            .get_mut(&pid)
            .ok_or(KernelError::UnknownProcess(pid))?;
        let return_ip = pcb.ip;
        pcb.push(&mut self.bus.ram, return_ip)?;
        self.jump(pid, offset)
    }

    /// `Ret`
    pub(crate) fn op_ret(&mut self, pid: ProcessId, _inst: &Instruction) -> Result<()> {
        let pcb = self
            .processes
            .get_mut(&pid)
            .ok_or(KernelError::UnknownProcess(pid))?;
        pcb.ip = pcb.pop(&self.bus.ram)?;
        Ok(())
    }

    /// `Push s`
    pub(crate) fn op_push(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let value = self.read_operand(pid, inst, 0)?;
        let pcb = self
            .processes
            .get_mut(&pid)
            .ok_or(KernelError::UnknownProcess(pid))?;
        pcb.push(&mut self.bus.ram, value)
    }

    /// `Pop d`
    pub(crate) fn op_pop(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let pcb = self
            .processes
            .get_mut(&pid)
            .ok_or(KernelError::UnknownProcess(pid))?;
        let value = pcb.pop(&self.bus.ram)?;
        self.write_operand(pid, inst, 0, value)
    }

    /// Moves `ip` to `offset` instructions from the instruction just executed.
    fn jump(&mut self, pid: ProcessId, offset: i32) -> Result<()> {
        let pcb = self.pcb_mut(pid)?;
        let target = i64::from(pcb.ip) - 1 + i64::from(offset);
        pcb.ip = u32::try_from(target).map_err(|_| KernelError::JumpOutOfRange {
            process: pid,
            target,
        })?;
        Ok(())
    }
}
