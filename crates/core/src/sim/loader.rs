//! Program Loader and Process Initialization.
//!
//! This module turns a [`Program`] into a runnable process. It performs:
//! 1. **Validation:** Every instruction is checked against the opcode table before any memory is touched.
//! 2. **Code Placement:** Instructions are encoded and streamed into a freshly allocated code block.
//! 3. **Segments:** A zeroed stack and, when present, an initialized global data segment are allocated.
//! 4. **Rollback:** A load that runs out of frames releases whatever it already allocated.

use serde::Deserialize;
use tracing::debug;

use crate::common::constants::INSTRUCTION_SIZE;
use crate::common::error::{KernelError, Result};
use crate::common::ProcessId;
use crate::core::Cpu;
use crate::core::process::{PageInfo, PageTable, ProcessContextBlock};
use crate::isa::{Instruction, OpCode, Operand};

/// A program ready to be loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    /// Instructions in execution order.
    pub instructions: Vec<Instruction>,
    /// Requested priority; 0 selects the default.
    pub priority: u8,
    /// Initial contents of the global data segment.
    pub global_data: Vec<u8>,
}

/// One instruction as written in a program file.
#[derive(Clone, Debug, Deserialize)]
struct InstructionSource {
    op: OpCode,
    #[serde(default)]
    args: Vec<Operand>,
}

/// On-disk program description.
#[derive(Clone, Debug, Deserialize)]
struct ProgramSource {
    #[serde(default)]
    priority: u8,
    #[serde(default)]
    global_data: Vec<u8>,
    instructions: Vec<InstructionSource>,
}

impl Program {
    /// Builds a program from instructions with default priority and no global data.
    pub const fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            priority: 0,
            global_data: Vec::new(),
        }
    }

    /// Parses a JSON program description.
    ///
    /// # Examples
    ///
    /// ```
    /// use tvm_core::sim::Program;
    ///
    /// let json = r#"{
    ///     "priority": 4,
    ///     "instructions": [
    ///         { "op": "Mov", "args": [{ "Register": 1 }, { "Constant": 7 }] },
    ///         { "op": "Exit", "args": [{ "Register": 1 }] }
    ///     ]
    /// }"#;
    ///
    /// let program = Program::from_json(json).unwrap();
    /// assert_eq!(program.priority, 4);
    /// assert_eq!(program.instructions[0].to_string(), "Mov r1, #7");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let source: ProgramSource =
            serde_json::from_str(json).map_err(|e| KernelError::InvalidProgram(e.to_string()))?;
        let instructions = source
            .instructions
            .iter()
            .map(|i| Instruction::new(i.op, &i.args))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            instructions,
            priority: source.priority,
            global_data: source.global_data,
        })
    }

    /// Size of the encoded code segment in bytes.
    pub fn code_size(&self) -> u32 {
        (self.instructions.len() * INSTRUCTION_SIZE) as u32
    }
}

/// Allocates and fills the segments of a new process.
///
/// The returned context block is not yet registered with the CPU or the
/// ready queue.
///
/// # Arguments
///
/// * `cpu` - The machine whose memory receives the segments.
/// * `pid` - Id the new process will run under.
/// * `program` - What to load.
pub fn build_process(
    cpu: &mut Cpu,
    pid: ProcessId,
    program: &Program,
) -> Result<ProcessContextBlock> {
    for inst in &program.instructions {
        inst.validate()?;
    }

    let mut table = PageTable {
        code: cpu.allocate_code_block(pid, program.code_size())?,
        ..PageTable::default()
    };
    let code: Vec<u8> = program.instructions.iter().flat_map(Instruction::encode).collect();
    table.code.write(&mut cpu.bus.ram, 0, &code)?;

    let stack_size = cpu.stack_size;
    let Some(stack) = cpu.allocate_segment(pid, stack_size) else {
        rollback(cpu, pid, &mut table);
        return Err(KernelError::OutOfMemory(stack_size as usize));
    };
    table.stack = stack;

    if !program.global_data.is_empty() {
        let size = program.global_data.len() as u32;
        let Some(global_data) = cpu.allocate_segment(pid, size) else {
            rollback(cpu, pid, &mut table);
            return Err(KernelError::OutOfMemory(size as usize));
        };
        global_data.write(&mut cpu.bus.ram, 0, &program.global_data)?;
        table.global_data = global_data;
    }

    let mut pcb = ProcessContextBlock::new(pid, program.priority);
    pcb.code_length = program.instructions.len() as u32;
    pcb.page_table = table;
    debug!(pid, pages = pcb.page_table.page_count(), "process image built");
    Ok(pcb)
}

fn rollback(cpu: &mut Cpu, pid: ProcessId, table: &mut PageTable) {
    let segments: Vec<PageInfo> = table.take_all();
    for page in segments.iter().flat_map(PageInfo::pages) {
        cpu.bus.ram.free(page);
    }
    cpu.bus.ram.release_process(pid);
}
