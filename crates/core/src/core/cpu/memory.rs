//! Memory access through process address spaces.
//!
//! Linear addresses are split into `(page, offset)`, matched against the
//! process's segments and streamed through the frame table. This module also
//! implements the memory opcodes (`Alloc`, `Free`, `Map`, `Clear`) and the
//! code block allocation used by the loader.

use tracing::debug;

use super::Cpu;
use crate::common::constants::WORD_SIZE;
use crate::common::error::{KernelError, Result};
use crate::common::{ProcessId, VirtualAddress};
use crate::core::process::{PageInfo, ProcessContextBlock};
use crate::isa::Instruction;

impl Cpu {
    /// Allocates a code segment of `length` bytes for `process`.
    ///
    /// # Returns
    ///
    /// The segment to serialize instructions into, or
    /// [`KernelError::OutOfMemory`] if there are not enough free frames.
    pub fn allocate_code_block(&mut self, process: ProcessId, length: u32) -> Result<PageInfo> {
        self.allocate_segment(process, length)
            .ok_or(KernelError::OutOfMemory(length as usize))
    }

    pub(crate) fn allocate_segment(&mut self, process: ProcessId, size: u32) -> Option<PageInfo> {
        let ram = &mut self.bus.ram;
        let count = ram.pages_for(size);
        ram.allocate_pages(process, count)
            .map(|pages| PageInfo::new(pages, size))
    }

    /// Reads `len` bytes at a linear address of `process`.
    pub fn read_bytes(&self, process: ProcessId, address: u32, len: usize) -> Result<Vec<u8>> {
        let vaddr = self.bus.ram.calculator().from_linear(address);
        let pcb = self.pcb(process)?;
        let (segment, offset) = locate(pcb, vaddr, address)?;
        segment.read(&self.bus.ram, offset, len)
    }

    /// Writes bytes at a linear address of `process`.
    pub fn write_bytes(&mut self, process: ProcessId, address: u32, bytes: &[u8]) -> Result<()> {
        let vaddr = self.bus.ram.calculator().from_linear(address);
        let pcb = self
            .processes
            .get(&process)
            .ok_or(KernelError::UnknownProcess(process))?;
        let (segment, offset) = locate(pcb, vaddr, address)?;
        segment.write(&mut self.bus.ram, offset, bytes)
    }

    /// Reads a little-endian word at a linear address of `process`.
    pub fn read_word(&self, process: ProcessId, address: u32) -> Result<u32> {
        let raw = self.read_bytes(process, address, WORD_SIZE)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// Writes a little-endian word at a linear address of `process`.
    pub fn write_word(&mut self, process: ProcessId, address: u32, value: u32) -> Result<()> {
        self.write_bytes(process, address, &value.to_le_bytes())
    }

    /// `Alloc d, size`
    pub(crate) fn op_alloc(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let size = self.read_operand(pid, inst, 1)?;
        let segment = self.allocate_segment(pid, size);
        self.attach_dynamic(pid, inst, segment)
    }

    /// `Free addr`
    pub(crate) fn op_free(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let address = self.read_operand(pid, inst, 0)?;
        let vaddr = self.bus.ram.calculator().from_linear(address);
        let removed = self.pcb_mut(pid)?.page_table.remove_dynamic(vaddr);
        match removed {
            Some(segment) => {
                for page in segment.pages() {
                    self.bus.ram.free(page);
                }
                debug!(pid, address, pages = segment.pages().len(), "segment freed");
            }
            None => debug!(pid, address, "free of unmapped address ignored"),
        }
        Ok(())
    }

    /// `Map d, size`
    pub(crate) fn op_map(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let size = self.read_operand(pid, inst, 1)?;
        let segment = self
            .bus
            .ram
            .allocate_from_shared(pid, size)
            .map(|pages| PageInfo::new(pages, size));
        self.attach_dynamic(pid, inst, segment)
    }

    /// `Clear addr, len`
    pub(crate) fn op_clear(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let address = self.read_operand(pid, inst, 0)?;
        let len = self.read_operand(pid, inst, 1)?;
        if len == 0 {
            return Ok(());
        }
        let vaddr = self.bus.ram.calculator().from_linear(address);
        let pcb = self
            .processes
            .get(&pid)
            .ok_or(KernelError::UnknownProcess(pid))?;
        let (segment, offset) = locate(pcb, vaddr, address)?;
        segment.clear(&mut self.bus.ram, offset, len as usize)
    }

    /// Records a new dynamic segment and writes its base address (or 0) to slot 0.
    fn attach_dynamic(
        &mut self,
        pid: ProcessId,
        inst: &Instruction,
        segment: Option<PageInfo>,
    ) -> Result<()> {
        let calc = *self.bus.ram.calculator();
        let address = match segment {
            Some(segment) => {
                let base = segment.base_address(&calc).unwrap_or(0);
                self.pcb_mut(pid)?.page_table.dynamic.push(segment);
                self.stats.allocations += 1;
                base
            }
            None => {
                debug!(pid, opcode = %inst.opcode, "allocation failed");
                self.stats.allocation_failures += 1;
                0
            }
        };
        self.write_operand(pid, inst, 0, address)
    }
}

/// Finds the segment mapping `vaddr` and the offset of the address inside it.
fn locate(
    pcb: &ProcessContextBlock,
    vaddr: VirtualAddress,
    address: u32,
) -> Result<(&PageInfo, usize)> {
    let unmapped = KernelError::Unmapped {
        process: pcb.id,
        address,
    };
    let segment = pcb.page_table.find(vaddr).ok_or_else(|| unmapped.clone())?;
    let offset = segment.offset_of(vaddr).ok_or(unmapped)?;
    Ok((segment, offset))
}
