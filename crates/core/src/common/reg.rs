//! Process Register File.
//!
//! This module provides the `RegisterFile` struct holding the general-purpose
//! registers of one process context. Indices arrive from decoded operands, so
//! every access is bounds-checked and reports [`KernelError::InvalidRegister`].

use super::constants::REGISTER_COUNT;
use super::error::{KernelError, Result};

/// General-purpose registers of a process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u32; REGISTER_COUNT],
}

impl RegisterFile {
    /// Creates a register file with all registers zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index taken from an operand.
    pub fn read(&self, idx: u32) -> Result<u32> {
        self.regs
            .get(idx as usize)
            .copied()
            .ok_or(KernelError::InvalidRegister(idx))
    }

    /// Writes a register.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index taken from an operand.
    /// * `val` - The value to store.
    pub fn write(&mut self, idx: u32, val: u32) -> Result<()> {
        let slot = self
            .regs
            .get_mut(idx as usize)
            .ok_or(KernelError::InvalidRegister(idx))?;
        *slot = val;
        Ok(())
    }

    /// Returns all registers as a slice, for inspection after a run.
    pub fn as_slice(&self) -> &[u32] {
        &self.regs
    }

    /// Dumps the registers to stdout.
    pub fn dump(&self) {
        for (i, chunk) in self.regs.chunks(4).enumerate() {
            let line: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(j, v)| format!("r{:<2} = {:#010x}", i * 4 + j, v))
                .collect();
            println!("{}", line.join("  "));
        }
    }
}
