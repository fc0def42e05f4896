//! Global Machine Constants.
//!
//! This module defines machine-wide constants used across the kernel. It includes:
//! 1. **Encoding Constants:** Instruction and word widths.
//! 2. **Process Constants:** Register file size and reserved process identifiers.
//! 3. **Ownership Constants:** Sentinel owners used by the frame table.

use super::ProcessId;

/// Number of general-purpose registers in every process context.
pub const REGISTER_COUNT: usize = 16;

/// Size of a machine word (register, memory cell, operand) in bytes.
pub const WORD_SIZE: usize = 4;

/// Size of one encoded instruction in bytes: opcode, control byte, two operand words.
pub const INSTRUCTION_SIZE: usize = 2 + 2 * WORD_SIZE;

/// Maximum number of operand slots an instruction can carry.
pub const MAX_OPERANDS: usize = 2;

/// Owner id of a frame that belongs to nobody.
pub const FREE_OWNER: ProcessId = 0;

/// Owner id of pinned frames that back the shared memory region.
pub const SHARED_OWNER: ProcessId = ProcessId::MAX;

/// Process id reserved for the idle process.
pub const IDLE_PROCESS_ID: ProcessId = 1;

/// First process id handed out by the loader.
pub const FIRST_USER_PROCESS_ID: ProcessId = 2;

/// First page number assigned to a process; page 0 is never mapped so that
/// linear address 0 can signal allocation failure.
pub const FIRST_PAGE_NUMBER: u32 = 1;

/// Largest supported frame size; in-page offsets must fit in a `u16`.
pub const MAX_FRAME_SIZE: u32 = 1 << 16;
