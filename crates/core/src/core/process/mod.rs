//! Process state.
//!
//! This module defines the per-process context block saved and restored by
//! the scheduler. It provides:
//! 1. **Context:** Registers, instruction pointer and the `sign`/`zero` flags.
//! 2. **Scheduling State:** Priority, remaining quanta and liveness.
//! 3. **Ownership:** The address space and the set of held locks.
//! 4. **Stack Operations:** Word push/pop on the stack segment.

/// Segments and the per-process page table.
pub mod page_table;

pub use page_table::{PageInfo, PageTable};

use std::collections::BTreeSet;

use crate::common::constants::{INSTRUCTION_SIZE, WORD_SIZE};
use crate::common::error::{KernelError, Result};
use crate::common::{ProcessId, RegisterFile, VirtualAddressCalculator};
use crate::isa::Instruction;
use crate::soc::devices::DeviceId;
use crate::soc::memory::Ram;

/// Saved context of one process.
#[derive(Clone, Debug)]
pub struct ProcessContextBlock {
    /// Process identifier.
    pub id: ProcessId,
    /// General purpose registers.
    pub registers: RegisterFile,
    /// Index of the next instruction to execute.
    pub ip: u32,
    /// Set by `Cmp` when the first operand is less than the second (signed).
    pub sign: bool,
    /// Set by `Cmp` when both operands are equal.
    pub zero: bool,
    /// Scheduling priority, `1..=levels`.
    pub priority: u8,
    /// Instructions left in the current time slice.
    pub quanta: i32,
    /// Locks this process currently holds.
    pub owned_locks: BTreeSet<DeviceId>,
    /// Address space.
    pub page_table: PageTable,
    /// Byte offset of the next free stack slot.
    pub stack_pointer: u32,
    /// Number of instructions in the code segment.
    pub code_length: u32,
    /// Exit code set by `Exit`, if any.
    pub exit_code: Option<u32>,
    /// False once the process has halted or been terminated.
    pub running: bool,
}

impl ProcessContextBlock {
    /// Creates a runnable process with an empty address space.
    pub fn new(id: ProcessId, priority: u8) -> Self {
        Self {
            id,
            registers: RegisterFile::new(),
            ip: 0,
            sign: false,
            zero: false,
            priority,
            quanta: 0,
            owned_locks: BTreeSet::new(),
            page_table: PageTable::default(),
            stack_pointer: 0,
            code_length: 0,
            exit_code: None,
            running: true,
        }
    }

    /// Linear address of the first byte of the global data segment.
    pub fn global_data_base(&self, calc: &VirtualAddressCalculator) -> Option<u32> {
        self.page_table.global_data.base_address(calc)
    }

    /// Fetches and decodes the instruction at `ip`.
    ///
    /// # Returns
    ///
    /// `None` once `ip` runs past the loaded code.
    pub fn fetch(&self, ram: &Ram) -> Result<Option<Instruction>> {
        if self.ip >= self.code_length {
            return Ok(None);
        }
        let offset = self.ip as usize * INSTRUCTION_SIZE;
        let raw = self.page_table.code.read(ram, offset, INSTRUCTION_SIZE)?;
        Instruction::decode(&raw).map(Some)
    }

    /// Pushes a word onto the stack.
    pub fn push(&mut self, ram: &mut Ram, value: u32) -> Result<()> {
        self.page_table
            .stack
            .write(ram, self.stack_pointer as usize, &value.to_le_bytes())?;
        self.stack_pointer += WORD_SIZE as u32;
        Ok(())
    }

    /// Pops a word off the stack.
    pub fn pop(&mut self, ram: &Ram) -> Result<u32> {
        let sp = self
            .stack_pointer
            .checked_sub(WORD_SIZE as u32)
            .ok_or(KernelError::StackUnderflow(self.id))?;
        let raw = self.page_table.stack.read(ram, sp as usize, WORD_SIZE)?;
        self.stack_pointer = sp;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}
