//! Arithmetic, logic and comparison handlers.
//!
//! All arithmetic wraps on overflow. `Div` and `Rem` treat operands as
//! signed 32-bit values; a zero divisor is fatal.

use super::Cpu;
use crate::common::error::{KernelError, Result};
use crate::common::ProcessId;
use crate::isa::{Instruction, OpCode};

impl Cpu {
    /// `Noop`
    #[allow(clippy::unnecessary_wraps, clippy::unused_self)]
    pub(crate) const fn op_noop(&mut self, _pid: ProcessId, _inst: &Instruction) -> Result<()> {
        Ok(())
    }

    /// `Mov d, s`
    pub(crate) fn op_mov(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let value = self.read_operand(pid, inst, 1)?;
        self.write_operand(pid, inst, 0, value)
    }

    /// Two-operand arithmetic and logic: `d := d <op> s`.
    pub(crate) fn op_binary(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let a = self.read_operand(pid, inst, 0)?;
        let b = self.read_operand(pid, inst, 1)?;
        let result = match inst.opcode {
            OpCode::Add => a.wrapping_add(b),
            OpCode::Sub => a.wrapping_sub(b),
            OpCode::Mul => a.wrapping_mul(b),
            OpCode::Div | OpCode::Rem => {
                if b == 0 {
                    return Err(KernelError::DivideByZero(pid));
                }
                let (a, b) = (a as i32, b as i32);
                if inst.opcode == OpCode::Div {
                    a.wrapping_div(b) as u32
                } else {
                    a.wrapping_rem(b) as u32
                }
            }
            OpCode::And => a & b,
            OpCode::Or => a | b,
            OpCode::Xor => a ^ b,
            _ => unreachable!("{} is not a binary ALU opcode", inst.opcode),
        };
        self.write_operand(pid, inst, 0, result)
    }

    /// One-operand arithmetic: `d := <op> d`.
    pub(crate) fn op_unary(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let a = self.read_operand(pid, inst, 0)?;
        let result = match inst.opcode {
            OpCode::Not => !a,
            OpCode::Neg => a.wrapping_neg(),
            OpCode::Incr => a.wrapping_add(1),
            OpCode::Decr => a.wrapping_sub(1),
            _ => unreachable!("{} is not a unary ALU opcode", inst.opcode),
        };
        self.write_operand(pid, inst, 0, result)
    }

    /// `Cmp a, b`
    pub(crate) fn op_cmp(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let a = self.read_operand(pid, inst, 0)?;
        let b = self.read_operand(pid, inst, 1)?;
        let pcb = self.pcb_mut(pid)?;
        pcb.zero = a == b;
        pcb.sign = (a as i32) < (b as i32);
        Ok(())
    }
}
