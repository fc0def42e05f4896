//! Blocking primitives, terminal I/O and process termination.
//!
//! A process that blocks is parked on a device queue (or, for `Output`, on
//! the terminal's write queue) and stops being current. It is absent from
//! the ready queue until a device wakes it. Out-of-range lock and event
//! numbers are ignored.

use tracing::{debug, warn};

use super::Cpu;
use crate::common::constants::{IDLE_PROCESS_ID, WORD_SIZE};
use crate::common::error::Result;
use crate::common::ProcessId;
use crate::isa::{AddressingKind, Instruction};
use crate::soc::devices::{DeviceId, ReleaseOutcome};

impl Cpu {
    /// `Acquire n`
    pub(crate) fn op_acquire(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let n = self.read_operand(pid, inst, 0)?;
        let Some(lock) = self.bus.devices.lock_mut(n) else {
            warn!(pid, lock = n, "acquire of unknown lock ignored");
            return Ok(());
        };
        let handle = lock.handle;
        if lock.try_acquire(pid) {
            let _ = self.pcb_mut(pid)?.owned_locks.insert(handle);
        } else {
            self.block(pid, handle, AddressingKind::None, 0);
        }
        Ok(())
    }

    /// `Release n`
    pub(crate) fn op_release(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let n = self.read_operand(pid, inst, 0)?;
        let Some(lock) = self.bus.devices.lock_mut(n) else {
            warn!(pid, lock = n, "release of unknown lock ignored");
            return Ok(());
        };
        let handle = lock.handle;
        match lock.release(pid) {
            ReleaseOutcome::NotOwner => warn!(pid, lock = n, "release of unowned lock ignored"),
            ReleaseOutcome::StillHeld => {}
            ReleaseOutcome::Freed => {
                let _ = self.pcb_mut(pid)?.owned_locks.remove(&handle);
                self.hand_off_lock(n);
            }
        }
        Ok(())
    }

    /// `Signal n`
    pub(crate) fn op_signal(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let n = self.read_operand(pid, inst, 0)?;
        let Some(event) = self.bus.devices.event(n) else {
            warn!(pid, event = n, "signal of unknown event ignored");
            return Ok(());
        };
        for parked in self.bus.devices.queue.drain(event.handle) {
            self.wake(parked.process);
        }
        Ok(())
    }

    /// `Wait n`
    pub(crate) fn op_wait(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let n = self.read_operand(pid, inst, 0)?;
        let Some(event) = self.bus.devices.event(n) else {
            warn!(pid, event = n, "wait on unknown event ignored");
            return Ok(());
        };
        self.block(pid, event.handle, AddressingKind::None, 0);
        Ok(())
    }

    /// `Sleep ticks`
    pub(crate) fn op_sleep(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let duration = self.read_operand(pid, inst, 0)?;
        let token = self.bus.devices.sleep.register(self.ticks, duration);
        self.block(pid, token, AddressingKind::None, 0);
        Ok(())
    }

    /// `Input d`
    pub(crate) fn op_input(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let (kind, target) = self.destination_target(pid, inst, 0)?;
        if kind == AddressingKind::MemoryAddress {
            let _ = self.read_bytes(pid, target, WORD_SIZE)?;
        } else {
            let _ = self.pcb(pid)?.registers.read(target)?;
        }
        let terminal = self.bus.devices.terminal.handle();
        self.block(pid, terminal, kind, target);
        Ok(())
    }

    /// `Output s`
    pub(crate) fn op_output(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let value = self.read_operand(pid, inst, 0)?;
        self.bus.devices.terminal.queue_write(pid, value);
        self.suspend(pid);
        Ok(())
    }

    /// `Pid d`
    pub(crate) fn op_pid(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        self.write_operand(pid, inst, 0, pid)
    }

    /// `Exit s`
    pub(crate) fn op_exit(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let code = self.read_operand(pid, inst, 0)?;
        self.terminate(pid, Some(code));
        Ok(())
    }

    /// `TermP pid`
    pub(crate) fn op_termp(&mut self, pid: ProcessId, inst: &Instruction) -> Result<()> {
        let target = self.read_operand(pid, inst, 0)?;
        if target == IDLE_PROCESS_ID || !self.is_live(target) {
            warn!(pid, target, "termination of unknown or dead process ignored");
            return Ok(());
        }
        self.terminate(target, None);
        Ok(())
    }

    /// Parks `pid` on `device` and takes it off the CPU.
    pub(crate) fn block(
        &mut self,
        pid: ProcessId,
        device: DeviceId,
        kind: AddressingKind,
        argument: u32,
    ) {
        self.bus.devices.queue.enqueue(device, pid, kind, argument);
        debug!(pid, %device, "blocked");
        self.suspend(pid);
    }

    /// Takes `pid` off the CPU without queueing it anywhere.
    fn suspend(&mut self, pid: ProcessId) {
        if self.current == Some(pid) {
            self.current = None;
        }
        self.stats.blocks += 1;
    }

    /// Puts a parked process back on the ready queue. Dead processes are dropped.
    pub(crate) fn wake(&mut self, pid: ProcessId) {
        match self.processes.get(&pid) {
            Some(pcb) if pcb.running => {
                self.ready.enqueue(pid, pcb.priority);
                self.stats.wakes += 1;
                debug!(pid, "woken");
            }
            _ => debug!(pid, "dropped wake of dead process"),
        }
    }

    /// Gives a free lock to its first live waiter, if any.
    fn hand_off_lock(&mut self, n: u32) {
        let Some(handle) = self.bus.devices.lock(n).map(|l| l.handle) else {
            return;
        };
        while let Some(parked) = self.bus.devices.queue.dequeue(handle) {
            let Some(pcb) = self.processes.get_mut(&parked.process).filter(|p| p.running) else {
                continue;
            };
            let _ = pcb.owned_locks.insert(handle);
            if let Some(lock) = self.bus.devices.lock_mut(n) {
                lock.hand_off(parked.process);
            }
            debug!(pid = parked.process, lock = n, "lock handed off");
            self.wake(parked.process);
            return;
        }
    }

    /// Terminates a process: frees its pages, releases its locks and takes it
    /// off the CPU. It stays in any ready or device queue it is parked on.
    pub(crate) fn terminate(&mut self, pid: ProcessId, exit_code: Option<u32>) {
        let Some(pcb) = self.processes.get_mut(&pid) else {
            return;
        };
        if !pcb.running {
            return;
        }
        pcb.running = false;
        if exit_code.is_some() {
            pcb.exit_code = exit_code;
        }
        let segments = pcb.page_table.take_all();
        let locks = std::mem::take(&mut pcb.owned_locks);

        for segment in &segments {
            for page in segment.pages() {
                self.bus.ram.free(page);
            }
        }
        self.bus.ram.release_process(pid);

        for handle in locks {
            let n = handle.index;
            let freed = self
                .bus
                .devices
                .lock_mut(n)
                .is_some_and(|lock| lock.force_release(pid));
            if freed {
                self.hand_off_lock(n);
            }
        }

        if self.current == Some(pid) {
            self.current = None;
        }
        self.stats.processes_exited += 1;
        debug!(pid, ?exit_code, "process terminated");
    }
}
