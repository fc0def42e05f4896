//! Simulation statistics collection and reporting.
//!
//! This module tracks what the kernel did while running. It provides:
//! 1. **Throughput:** Ticks, executed instructions and idle ticks.
//! 2. **Scheduling:** Context switches, blocks and wake-ups.
//! 3. **Memory:** Dynamic allocations and allocation failures.
//! 4. **Lifecycle:** Processes loaded and exited.

use std::time::Instant;

/// Counters updated by the CPU as it ticks.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Ticks elapsed.
    pub ticks: u64,
    /// Instructions executed by any process, including the idle process.
    pub instructions_executed: u64,
    /// Ticks in which the idle process was current.
    pub idle_ticks: u64,

    /// Times the current process changed.
    pub context_switches: u64,
    /// Times a process parked on a device or the terminal.
    pub blocks: u64,
    /// Times a parked process was put back on the ready queue.
    pub wakes: u64,

    /// Successful `Alloc` and `Map` instructions.
    pub allocations: u64,
    /// `Alloc` and `Map` instructions that returned 0.
    pub allocation_failures: u64,

    /// Processes created by the loader (excluding the idle process).
    pub processes_loaded: u64,
    /// Processes that halted, exited or were terminated.
    pub processes_exited: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            ticks: 0,
            instructions_executed: 0,
            idle_ticks: 0,
            context_switches: 0,
            blocks: 0,
            wakes: 0,
            allocations: 0,
            allocation_failures: 0,
            processes_loaded: 0,
            processes_exited: 0,
        }
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"scheduler"`, `"memory"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "scheduler", "memory"];

impl SimStats {
    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.start_time.elapsed().as_secs_f64();
        let ticks = self.ticks.max(1) as f64;

        if want("summary") {
            let busy = self.ticks.saturating_sub(self.idle_ticks);
            let khz = (self.ticks as f64 / seconds) / 1000.0;
            println!("\n==========================================================");
            println!("TVM KERNEL STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {seconds:.4} s");
            println!("sim_ticks                {}", self.ticks);
            println!("sim_freq                 {khz:.2} kHz");
            println!("sim_insts                {}", self.instructions_executed);
            println!(
                "ticks.busy               {busy} ({:.2}%)",
                (busy as f64 / ticks) * 100.0
            );
            println!(
                "ticks.idle               {} ({:.2}%)",
                self.idle_ticks,
                (self.idle_ticks as f64 / ticks) * 100.0
            );
            println!("----------------------------------------------------------");
        }
        if want("scheduler") {
            println!("SCHEDULER");
            println!("  sched.switches         {}", self.context_switches);
            println!("  sched.blocks           {}", self.blocks);
            println!("  sched.wakes            {}", self.wakes);
            println!("  proc.loaded            {}", self.processes_loaded);
            println!("  proc.exited            {}", self.processes_exited);
            println!("----------------------------------------------------------");
        }
        if want("memory") {
            let total = self.allocations + self.allocation_failures;
            let fail_rate = if total > 0 {
                100.0 * (self.allocation_failures as f64 / total as f64)
            } else {
                0.0
            };
            println!("MEMORY");
            println!("  alloc.ok               {}", self.allocations);
            println!("  alloc.failed           {}", self.allocation_failures);
            println!("  alloc.fail_rate        {fail_rate:.2}%");
            println!("==========================================================");
        }
    }

    /// Prints every section.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
