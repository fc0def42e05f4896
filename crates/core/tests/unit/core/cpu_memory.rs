//! # Memory Instruction Tests
//!
//! `Alloc`, `Free`, `Map`, `Clear` and global data, run end to end.

use pretty_assertions::assert_eq;
use tvm_core::common::KernelError;
use tvm_core::config::Config;
use tvm_core::isa::OpCode::*;

use crate::common::builder::{ProgramBuilder, c, m, r};
use crate::common::harness::TestContext;

#[test]
fn test_alloc_store_load_exit_code() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Alloc, &[r(1), c(4)])
            .op(Mov, &[m(1), c(99)])
            .op(Mov, &[r(2), m(1)])
            .op(Exit, &[r(2)])
            .build(),
    );
    ctx.step(3);
    assert_ne!(ctx.reg(pid, 1), 0);
    assert_eq!(ctx.process(pid).page_table.dynamic.len(), 1);

    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(99));
    assert_eq!(ctx.cpu.stats().allocations, 1);
}

#[test]
fn test_alloc_failure_writes_zero() {
    let mut config = Config::default();
    config.memory.frame_count = 6;
    let mut ctx = TestContext::with_config(config);
    // shared region, idle process and this program leave one frame free
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Alloc, &[r(1), c(256)])
            .op(Alloc, &[r(2), c(1)])
            .op(Exit, &[r(2)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(0));
    assert_eq!(ctx.cpu.stats().allocations, 1);
    assert_eq!(ctx.cpu.stats().allocation_failures, 1);
}

#[test]
fn test_free_returns_frames() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Alloc, &[r(1), c(600)])
            .op(Free, &[r(1)])
            .op(Free, &[c(12345)])
            .op(Exit, &[c(0)])
            .build(),
    );
    let after_load = ctx.cpu.bus.ram.free_frames();
    ctx.step(1);
    assert_eq!(ctx.cpu.bus.ram.free_frames(), after_load - 3);
    ctx.step(2);
    assert_eq!(ctx.cpu.bus.ram.free_frames(), after_load);
    assert!(ctx.process(pid).page_table.dynamic.is_empty());
}

#[test]
fn test_free_of_address_inside_segment() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Alloc, &[r(1), c(512)])
            .op(Add, &[r(1), c(300)])
            .op(Free, &[r(1)])
            .op(Exit, &[c(0)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(0));
    assert_eq!(ctx.cpu.stats().allocations, 1);
}

#[test]
fn test_word_straddling_pages() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Alloc, &[r(1), c(512)])
            .op(Add, &[r(1), c(254)])
            .op(Mov, &[m(1), c(0x0102_0304)])
            .op(Mov, &[r(2), m(1)])
            .op(Exit, &[r(2)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(0x0102_0304));
}

#[test]
fn test_clear_zeroes_bytes() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Alloc, &[r(1), c(8)])
            .op(Mov, &[m(1), c(5)])
            .op(Clear, &[r(1), c(4)])
            .op(Mov, &[r(2), m(1)])
            .op(Exit, &[r(2)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(0));
}

#[test]
fn test_clear_past_segment_end_is_fatal() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Alloc, &[r(1), c(8)])
            .op(Clear, &[r(1), c(u32::MAX)])
            .op(Exit, &[c(0)])
            .build(),
    );
    assert_eq!(
        ctx.cpu.run(10),
        Err(KernelError::SegmentOverflow {
            offset: 0,
            len: u32::MAX as usize,
            capacity: 256
        })
    );
    assert!(ctx.process(pid).running);
}

#[test]
fn test_shared_memory_visible_across_processes() {
    let mut ctx = TestContext::new();
    let writer = ctx.load(
        ProgramBuilder::new()
            .priority(10)
            .op(Map, &[r(1), c(4)])
            .op(Mov, &[m(1), c(77)])
            .op(Exit, &[c(0)])
            .build(),
    );
    let reader = ctx.load(
        ProgramBuilder::new()
            .priority(5)
            .op(Map, &[r(1), c(4)])
            .op(Mov, &[r(2), m(1)])
            .op(Exit, &[r(2)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(writer), Some(0));
    assert_eq!(ctx.exit_code(reader), Some(77));
}

#[test]
fn test_map_larger_than_region_fails() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Map, &[r(1), c(10_000)])
            .op(Exit, &[r(1)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(0));
    assert_eq!(ctx.cpu.stats().allocation_failures, 1);
}

#[test]
fn test_global_data_is_loaded_and_addressable() {
    let mut ctx = TestContext::new();
    let program = ProgramBuilder::new()
        .global_data(&[1, 0, 0, 0, 2, 0, 0, 0])
        .op(Mov, &[r(1), c(768)])
        .op(Mov, &[r(2), m(1)])
        .op(Add, &[r(1), c(4)])
        .op(Add, &[r(2), m(1)])
        .op(Exit, &[r(2)])
        .build();
    let pid = ctx.load(program);

    let calc = *ctx.cpu.bus.ram.calculator();
    assert_eq!(ctx.process(pid).global_data_base(&calc), Some(768));

    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(3));
}

#[test]
fn test_exit_releases_every_page() {
    let mut ctx = TestContext::new();
    let before = ctx.cpu.bus.ram.free_frames();
    let pid = ctx.load(
        ProgramBuilder::new()
            .global_data(&[9; 300])
            .op(Alloc, &[r(1), c(1000)])
            .op(Map, &[r(2), c(4)])
            .op(Exit, &[c(0)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(0));
    assert_eq!(ctx.cpu.bus.ram.free_frames(), before);
}
