//! Instruction disassembler.
//!
//! Converts decoded instructions into a short assembly-like string for the
//! execution trace and diagnostics. Register operands print as `rN`, memory
//! operands as `[rN]` and constants as `#N` (signed when the control byte's
//! signed-display flag is set).

use std::fmt;

use super::instruction::{AddressingKind, Instruction};

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode.name())?;
        for (slot, value) in self.operands.iter().enumerate() {
            f.write_str(if slot == 0 { " " } else { ", " })?;
            match self.kind(slot) {
                AddressingKind::Register => write!(f, "r{value}")?,
                AddressingKind::MemoryAddress => write!(f, "[r{value}]")?,
                AddressingKind::Constant if self.is_signed() => write!(f, "#{}", *value as i32)?,
                AddressingKind::Constant => write!(f, "#{value}")?,
                AddressingKind::None => f.write_str("?")?,
            }
        }
        Ok(())
    }
}

/// Produces a numbered listing of a program, one instruction per line,
/// with the opcode comment appended.
pub fn disassemble(program: &[Instruction]) -> String {
    let mut out = String::new();
    for (ip, inst) in program.iter().enumerate() {
        let text = inst.to_string();
        out.push_str(&format!("{ip:>4}: {text:<24} ; {}\n", inst.opcode.info().comment));
    }
    out
}
