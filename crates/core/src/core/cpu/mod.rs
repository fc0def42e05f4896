//! CPU Core Definition and Initialization.
//!
//! This module defines the central `Cpu` structure, the container for the
//! whole machine. It coordinates the following:
//! 1. **Process Management:** Owns every process context block and the ready queue.
//! 2. **Scheduling:** Tracks the current process, its time slice and the idle fallback.
//! 3. **System Integration:** Owns physical memory and the blocking devices.
//! 4. **Observability:** Statistics and the optional instruction trace buffer.

/// Opcode to handler table.
pub mod dispatch;

/// Tick loop, scheduling and device servicing.
pub mod execution;

/// Memory access through process address spaces and memory opcodes.
pub mod memory;

/// Operand resolution by addressing kind.
pub mod operands;

/// Arithmetic, logic and comparison handlers.
pub mod alu;

/// Jumps, calls and stack handlers.
pub mod control;

/// Blocking primitives, terminal I/O and process termination.
pub mod sync;

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::common::constants::{FIRST_USER_PROCESS_ID, IDLE_PROCESS_ID};
use crate::common::error::{KernelError, Result};
use crate::common::ProcessId;
use crate::config::Config;
use crate::core::process::ProcessContextBlock;
use crate::core::sched::ReadyQueue;
use crate::isa::{Instruction, OpCode, Operand};
use crate::sim::loader::{self, Program};
use crate::soc::devices::OutputSink;
use crate::soc::System;
use crate::stats::SimStats;

/// One executed instruction, recorded when tracing is enabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceEntry {
    /// Tick the instruction executed in.
    pub tick: u64,
    /// Process that executed it.
    pub process: ProcessId,
    /// Decoded instruction.
    pub instruction: Instruction,
}

/// The machine: processes, scheduler, memory and devices.
///
/// Exactly one instruction of one process executes per tick. When nothing is
/// ready the idle process runs a self-jump so ticks keep advancing and sleep
/// timers keep firing.
#[derive(Debug)]
pub struct Cpu {
    /// Physical memory and devices.
    pub bus: System,
    /// Every process ever created, live or dead.
    pub processes: BTreeMap<ProcessId, ProcessContextBlock>,
    /// Runnable processes.
    pub ready: ReadyQueue,
    /// Process executing this tick.
    pub current: Option<ProcessId>,
    /// Ticks elapsed since boot.
    pub ticks: u64,
    /// Instructions per time slice.
    pub quantum: i32,
    /// Stack segment size for new processes.
    pub stack_size: u32,
    /// Record executed instructions in `trace_log`.
    pub trace: bool,
    /// Executed instructions, oldest first.
    pub trace_log: Vec<TraceEntry>,
    /// Runtime statistics.
    pub stats: SimStats,
    next_pid: ProcessId,
}

impl Cpu {
    /// Boots a machine described by `config`.
    ///
    /// Physical memory and devices are created, the shared region is pinned
    /// and the idle process is loaded.
    ///
    /// # Arguments
    ///
    /// * `config` - Machine configuration; validated before use.
    ///
    /// # Returns
    ///
    /// The booted CPU, or the fault that prevented booting.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let bus = System::new(config)?;
        let mut cpu = Self {
            bus,
            processes: BTreeMap::new(),
            ready: ReadyQueue::new(
                config.scheduler.priority_levels,
                config.scheduler.base_priority(),
            ),
            current: None,
            ticks: 0,
            quantum: config.scheduler.quantum,
            stack_size: config.memory.stack_size,
            trace: config.general.trace_instructions,
            trace_log: Vec::new(),
            stats: SimStats::default(),
            next_pid: FIRST_USER_PROCESS_ID,
        };

        let idle = Program {
            instructions: vec![Instruction::new(OpCode::Jmp, &[Operand::Signed(0)])?],
            priority: 0,
            global_data: Vec::new(),
        };
        let pcb = loader::build_process(&mut cpu, IDLE_PROCESS_ID, &idle)?;
        let _ = cpu.processes.insert(IDLE_PROCESS_ID, pcb);

        info!(
            frames = cpu.bus.ram.frame_count(),
            frame_size = cpu.bus.ram.frame_size(),
            levels = cpu.ready.level_count(),
            "kernel booted"
        );
        Ok(cpu)
    }

    /// Loads a program as a new process and makes it ready.
    ///
    /// # Returns
    ///
    /// The new process id, or [`KernelError::OutOfMemory`] if its segments do not fit.
    pub fn load(&mut self, program: &Program) -> Result<ProcessId> {
        let pid = self.next_pid;
        let mut pcb = loader::build_process(self, pid, program)?;
        pcb.priority = self.ready.effective_priority(program.priority);
        self.ready.enqueue(pid, pcb.priority);
        let _ = self.processes.insert(pid, pcb);
        self.next_pid += 1;
        self.stats.processes_loaded += 1;
        debug!(
            pid,
            priority = program.priority,
            len = program.instructions.len(),
            "process loaded"
        );
        Ok(pid)
    }

    /// Queues a value for the terminal's input stream.
    pub fn push_input(&mut self, value: u32) {
        self.bus.devices.terminal.push_input(value);
    }

    /// Replaces the terminal output sink.
    pub fn set_output_sink(&mut self, sink: OutputSink) {
        self.bus.devices.terminal.set_sink(sink);
    }

    /// Returns a process context block.
    pub fn process(&self, id: ProcessId) -> Option<&ProcessContextBlock> {
        self.processes.get(&id)
    }

    /// Returns runtime statistics.
    pub const fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Returns true if `id` names a process that has not terminated.
    pub fn is_live(&self, id: ProcessId) -> bool {
        self.processes.get(&id).is_some_and(|p| p.running)
    }

    /// Returns true once every user process has terminated.
    pub fn is_finished(&self) -> bool {
        !self
            .processes
            .values()
            .any(|p| p.id != IDLE_PROCESS_ID && p.running)
    }

    /// Prints the current process's registers and flags to stdout.
    pub fn dump_state(&self) {
        println!("tick {}  current {:?}", self.ticks, self.current);
        if let Some(pcb) = self.current.and_then(|pid| self.processes.get(&pid)) {
            println!(
                "pid {}  ip {}  sign {}  zero {}  quanta {}",
                pcb.id, pcb.ip, pcb.sign, pcb.zero, pcb.quanta
            );
            pcb.registers.dump();
        }
    }

    pub(crate) fn pcb(&self, id: ProcessId) -> Result<&ProcessContextBlock> {
        self.processes.get(&id).ok_or(KernelError::UnknownProcess(id))
    }

    pub(crate) fn pcb_mut(&mut self, id: ProcessId) -> Result<&mut ProcessContextBlock> {
        self.processes
            .get_mut(&id)
            .ok_or(KernelError::UnknownProcess(id))
    }
}
