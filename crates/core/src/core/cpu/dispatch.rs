//! Opcode dispatch.
//!
//! Maps every opcode to its handler. The match is exhaustive, so adding an
//! opcode without a handler fails to compile.

use super::Cpu;
use crate::common::error::Result;
use crate::common::ProcessId;
use crate::isa::{Instruction, OpCode};

/// Signature shared by every instruction handler.
pub type Handler = fn(&mut Cpu, ProcessId, &Instruction) -> Result<()>;

/// Returns the handler for an opcode.
pub fn handler(opcode: OpCode) -> Handler {
    match opcode {
        OpCode::Noop => Cpu::op_noop,
        OpCode::Mov => Cpu::op_mov,
        OpCode::Add
        | OpCode::Sub
        | OpCode::Mul
        | OpCode::Div
        | OpCode::Rem
        | OpCode::And
        | OpCode::Or
        | OpCode::Xor => Cpu::op_binary,
        OpCode::Not | OpCode::Neg | OpCode::Incr | OpCode::Decr => Cpu::op_unary,
        OpCode::Cmp => Cpu::op_cmp,
        OpCode::Jmp | OpCode::Jlt | OpCode::Jgt | OpCode::Je | OpCode::Jne => Cpu::op_jump,
        OpCode::Call => Cpu::op_call,
        OpCode::Ret => Cpu::op_ret,
        OpCode::Push => Cpu::op_push,
        OpCode::Pop => Cpu::op_pop,
        OpCode::Alloc => Cpu::op_alloc,
        OpCode::Free => Cpu::op_free,
        OpCode::Map => Cpu::op_map,
        OpCode::Clear => Cpu::op_clear,
        OpCode::Acquire => Cpu::op_acquire,
        OpCode::Release => Cpu::op_release,
        OpCode::Signal => Cpu::op_signal,
        OpCode::Wait => Cpu::op_wait,
        OpCode::Sleep => Cpu::op_sleep,
        OpCode::Input => Cpu::op_input,
        OpCode::Output => Cpu::op_output,
        OpCode::Pid => Cpu::op_pid,
        OpCode::Exit => Cpu::op_exit,
        OpCode::TermP => Cpu::op_termp,
    }
}

impl Cpu {
    /// Executes one decoded instruction on behalf of `pid`.
    pub fn execute(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        handler(inst.opcode)(self, pid, inst)
    }
}
