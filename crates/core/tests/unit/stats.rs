//! # Statistics Tests

use pretty_assertions::assert_eq;
use tvm_core::isa::OpCode::*;
use tvm_core::stats::SimStats;

use crate::common::builder::{ProgramBuilder, c, r};
use crate::common::harness::TestContext;

#[test]
fn test_counters_after_simple_run() {
    let mut ctx = TestContext::new();
    let _ = ctx.load(
        ProgramBuilder::new()
            .op(Alloc, &[r(1), c(4)])
            .op(Sleep, &[c(2)])
            .op(Exit, &[c(0)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);

    let stats = ctx.cpu.stats();
    assert_eq!(stats.ticks, 5);
    assert_eq!(stats.instructions_executed, 5);
    assert_eq!(stats.idle_ticks, 2);
    assert_eq!(stats.allocations, 1);
    assert_eq!(stats.blocks, 1);
    assert_eq!(stats.wakes, 1);
    assert_eq!(stats.processes_loaded, 1);
    assert_eq!(stats.processes_exited, 1);
}

#[test]
fn test_fresh_stats_are_zero() {
    let stats = SimStats::default();
    assert_eq!(stats.ticks, 0);
    assert_eq!(stats.context_switches, 0);
    assert_eq!(stats.allocation_failures, 0);
}
