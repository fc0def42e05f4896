//! Main Execution Loop.
//!
//! This module implements the tick cycle of the machine. Each tick performs:
//! 1. **Scheduling:** Rotates the current process out when its slice is used up.
//! 2. **Fetch:** Decodes the instruction at `ip`, or halts a process that ran off its code.
//! 3. **Execute:** Advances `ip`, charges one quantum and dispatches the handler.
//! 4. **Devices:** Fires due sleep tokens, delivers terminal input and drains terminal output.

use tracing::{debug, trace, warn};

use super::{Cpu, TraceEntry};
use crate::common::constants::IDLE_PROCESS_ID;
use crate::common::error::{KernelError, Result};
use crate::common::ProcessId;
use crate::isa::{AddressingKind, OpCode};
use crate::soc::devices::Parked;

impl Cpu {
    /// Runs one tick.
    ///
    /// # Returns
    ///
    /// `Ok(())`, or the fatal fault raised by the executing instruction. A
    /// fault aborts the rest of the tick, including device servicing.
    pub fn tick(&mut self) -> Result<()> {
        let pid = self.schedule()?;
        if pid == IDLE_PROCESS_ID {
            self.stats.idle_ticks += 1;
        }

        let fetched = {
            let pcb = self.pcb(pid)?;
            pcb.fetch(&self.bus.ram)?
        };
        match fetched {
            None => {
                debug!(pid, "ran past end of code");
                self.terminate(pid, None);
            }
            Some(inst) => {
                let pcb = self.pcb_mut(pid)?;
                pcb.ip += 1;
                pcb.quanta -= 1;
                trace!(tick = self.ticks, pid, "{inst}");
                if self.trace {
                    self.trace_log.push(TraceEntry {
                        tick: self.ticks,
                        process: pid,
                        instruction: inst.clone(),
                    });
                }
                self.stats.instructions_executed += 1;
                self.execute(pid, &inst)?;
            }
        }

        self.service_devices()?;
        self.ticks += 1;
        self.stats.ticks = self.ticks;
        Ok(())
    }

    /// Ticks until every user process has terminated or `max_ticks` elapse.
    ///
    /// # Returns
    ///
    /// The number of ticks run.
    pub fn run(&mut self, max_ticks: u64) -> Result<u64> {
        let mut ran = 0;
        while ran < max_ticks && !self.is_finished() {
            self.tick()?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Picks the process to run this tick and returns its id.
    ///
    /// The current process keeps the CPU while it has quanta left. Otherwise
    /// it goes to the back of its level and the next live process is
    /// dispatched with a fresh slice; the idle process runs when nothing is
    /// ready and is preempted as soon as something is.
    fn schedule(&mut self) -> Result<ProcessId> {
        let previous = self.current;
        if let Some(pid) = previous
            && pid != IDLE_PROCESS_ID
            && self.processes.get(&pid).is_some_and(|p| p.running && p.quanta > 0)
        {
            return Ok(pid);
        }

        if let Some(pid) = previous
            && pid != IDLE_PROCESS_ID
            && let Some(pcb) = self.processes.get(&pid).filter(|p| p.running)
        {
            self.ready.enqueue(pid, pcb.priority);
        }

        let next = loop {
            match self.ready.dequeue() {
                Some(pid) if self.is_live(pid) => break pid,
                Some(pid) => debug!(pid, "dropped dead process from ready queue"),
                None => break IDLE_PROCESS_ID,
            }
        };

        let quantum = self.quantum;
        self.pcb_mut(next)?.quanta = quantum;
        if previous != Some(next) {
            self.stats.context_switches += 1;
            debug!(from = ?previous, to = next, tick = self.ticks, "context switch");
        }
        self.current = Some(next);
        Ok(next)
    }

    /// End-of-tick device servicing.
    ///
    /// Every drained reader is woken even if delivering to one of them
    /// faults; the first fault is returned after the tick's devices are
    /// serviced.
    fn service_devices(&mut self) -> Result<()> {
        if let Some(token) = self.bus.devices.sleep.expire(self.ticks) {
            for parked in self.bus.devices.queue.drain(token) {
                self.wake(parked.process);
            }
        }

        let mut fault = None;
        let terminal = self.bus.devices.terminal.handle();
        if self.bus.devices.queue.waiting(terminal) > 0
            && let Some(value) = self.bus.devices.terminal.take_input()
        {
            for parked in self.bus.devices.queue.drain(terminal) {
                if let Err(e) = self.deliver(&parked, value) {
                    warn!(pid = parked.process, %e, "terminal input delivery failed");
                    if fault.is_none() {
                        fault = Some(e);
                    }
                }
                self.wake(parked.process);
            }
        }

        for write in self.bus.devices.terminal.drain_writes() {
            self.wake(write.process);
        }
        fault.map_or(Ok(()), Err)
    }

    /// Stores a terminal input value where a parked reader asked for it.
    fn deliver(&mut self, parked: &Parked, value: u32) -> Result<()> {
        if !self.is_live(parked.process) {
            return Ok(());
        }
        match parked.kind {
            AddressingKind::Register => self
                .pcb_mut(parked.process)?
                .registers
                .write(parked.argument, value),
            AddressingKind::MemoryAddress => {
                self.write_word(parked.process, parked.argument, value)
            }
            AddressingKind::Constant | AddressingKind::None => {
                Err(KernelError::ConstantDestination {
                    opcode: OpCode::Input,
                    slot: 0,
                })
            }
        }
    }
}
