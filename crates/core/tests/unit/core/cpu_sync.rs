//! # Blocking Primitive Tests
//!
//! Locks, events, sleep, terminal I/O and process termination, run end to end.

use pretty_assertions::assert_eq;
use tvm_core::common::KernelError;
use tvm_core::common::constants::FREE_OWNER;
use tvm_core::isa::AddressingKind;
use tvm_core::isa::OpCode::*;
use tvm_core::soc::devices::DeviceId;

use crate::common::builder::{ProgramBuilder, c, m, r, s};
use crate::common::harness::TestContext;

fn lock_owner(ctx: &TestContext, n: u32) -> u32 {
    ctx.cpu.bus.devices.lock(n).unwrap().owner
}

#[test]
fn test_lock_is_handed_off_to_waiter() {
    let mut ctx = TestContext::new();
    let a = ctx.load(
        ProgramBuilder::new()
            .op(Acquire, &[c(1)])
            .op(Sleep, &[c(5)])
            .op(Release, &[c(1)])
            .op(Exit, &[c(1)])
            .build(),
    );
    let b = ctx.load(
        ProgramBuilder::new()
            .op(Acquire, &[c(1)])
            .op(Pid, &[r(2)])
            .op(Exit, &[c(2)])
            .build(),
    );

    ctx.step(3);
    assert_eq!(lock_owner(&ctx, 1), a);
    assert_eq!(ctx.cpu.bus.devices.queue.waiting(DeviceId::lock(1)), 1);
    assert!(!ctx.cpu.ready.contains(b));

    // a wakes at the end of tick 6 and releases in tick 7
    ctx.step(5);
    assert_eq!(lock_owner(&ctx, 1), b);
    assert!(ctx.process(b).owned_locks.contains(&DeviceId::lock(1)));
    assert!(ctx.process(a).owned_locks.is_empty());
    assert!(ctx.cpu.ready.contains(b));

    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(a), Some(1));
    assert_eq!(ctx.exit_code(b), Some(2));
    assert_eq!(lock_owner(&ctx, 1), FREE_OWNER);
}

#[test]
fn test_lock_is_reentrant() {
    let mut ctx = TestContext::new();
    let owner = ctx.load(
        ProgramBuilder::new()
            .op(Acquire, &[c(2)])
            .op(Acquire, &[c(2)])
            .op(Release, &[c(2)])
            .op(Sleep, &[c(3)])
            .op(Release, &[c(2)])
            .op(Exit, &[c(0)])
            .build(),
    );
    let contender = ctx.load(
        ProgramBuilder::new()
            .op(Acquire, &[c(2)])
            .op(Exit, &[c(9)])
            .build(),
    );

    ctx.step(3);
    let lock = ctx.cpu.bus.devices.lock(2).unwrap();
    assert_eq!(lock.owner, owner);
    assert_eq!(lock.ref_count, 1);

    // owner sleeps in tick 3; contender tries the lock in tick 4
    ctx.step(2);
    assert_eq!(lock_owner(&ctx, 2), owner);
    assert_eq!(ctx.cpu.bus.devices.queue.waiting(DeviceId::lock(2)), 1);
    assert!(!ctx.cpu.ready.contains(contender));
    assert!(ctx.process(contender).running);

    // owner wakes at the end of tick 6 and releases the last hold in tick 7
    ctx.step(3);
    let lock = ctx.cpu.bus.devices.lock(2).unwrap();
    assert_eq!(lock.owner, contender);
    assert_eq!(lock.ref_count, 1);
    assert!(ctx.process(owner).owned_locks.is_empty());
    assert!(ctx.cpu.ready.contains(contender));

    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(contender), Some(9));
    assert!(ctx.cpu.bus.devices.lock(2).unwrap().is_free());
}

#[test]
fn test_exit_force_releases_held_locks() {
    let mut ctx = TestContext::new();
    let holder = ctx.load(
        ProgramBuilder::new()
            .op(Acquire, &[c(1)])
            .op(Acquire, &[c(1)])
            .op(Sleep, &[c(2)])
            .op(Exit, &[c(7)])
            .build(),
    );
    let waiter = ctx.load(
        ProgramBuilder::new()
            .op(Acquire, &[c(1)])
            .op(Exit, &[c(8)])
            .build(),
    );

    // holder exits in tick 5 without releasing
    ctx.step(6);
    assert_eq!(ctx.exit_code(holder), Some(7));
    assert_eq!(lock_owner(&ctx, 1), waiter);
    assert_eq!(ctx.cpu.bus.devices.lock(1).unwrap().ref_count, 1);

    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(waiter), Some(8));
    assert_eq!(lock_owner(&ctx, 1), FREE_OWNER);
}

#[test]
fn test_unknown_devices_and_unowned_release_are_ignored() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Acquire, &[c(99)])
            .op(Release, &[c(3)])
            .op(Signal, &[c(0)])
            .op(Wait, &[c(1000)])
            .op(Exit, &[c(5)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(5));
}

#[test]
fn test_sleepers_with_same_wake_tick_merge() {
    let mut ctx = TestContext::new();
    let a = ctx.load(ProgramBuilder::new().op(Sleep, &[c(4)]).op(Exit, &[c(1)]).build());
    let b = ctx.load(ProgramBuilder::new().op(Sleep, &[c(3)]).op(Exit, &[c(2)]).build());

    ctx.step(2);
    let token = DeviceId::sleep_token(1);
    assert_eq!(ctx.cpu.bus.devices.sleep.pending(), 1);
    assert_eq!(ctx.cpu.bus.devices.sleep.target_of(token), Some(4));
    assert_eq!(ctx.cpu.bus.devices.queue.waiting(token), 2);

    ctx.step(2);
    assert!(ctx.cpu.ready.is_empty());
    ctx.step(1);
    assert!(ctx.cpu.ready.contains(a));
    assert!(ctx.cpu.ready.contains(b));
    assert!(ctx.cpu.bus.devices.queue.is_empty());

    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(a), Some(1));
    assert_eq!(ctx.exit_code(b), Some(2));
}

#[test]
fn test_sleep_zero_wakes_next_tick() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(ProgramBuilder::new().op(Sleep, &[c(0)]).op(Exit, &[c(3)]).build());
    ctx.step(2);
    assert_eq!(ctx.exit_code(pid), Some(3));
}

#[test]
fn test_signal_wakes_every_waiter() {
    let mut ctx = TestContext::new();
    let a = ctx.load(ProgramBuilder::new().op(Wait, &[c(1)]).op(Exit, &[c(1)]).build());
    let b = ctx.load(ProgramBuilder::new().op(Wait, &[c(1)]).op(Exit, &[c(2)]).build());
    let signaller = ctx.load(
        ProgramBuilder::new()
            .op(Noop, &[])
            .op(Signal, &[c(1)])
            .op(Exit, &[c(3)])
            .build(),
    );

    ctx.step(2);
    assert_eq!(ctx.cpu.bus.devices.queue.waiting(DeviceId::event(1)), 2);

    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(a), Some(1));
    assert_eq!(ctx.exit_code(b), Some(2));
    assert_eq!(ctx.exit_code(signaller), Some(3));
    assert_eq!(ctx.cpu.stats().wakes, 2);
}

#[test]
fn test_signal_without_waiters_is_lost() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Signal, &[c(1)])
            .op(Wait, &[c(1)])
            .op(Exit, &[c(1)])
            .build(),
    );
    let ran = ctx.cpu.run(50).unwrap();
    assert_eq!(ran, 50);
    assert!(!ctx.cpu.is_finished());
    assert_eq!(ctx.exit_code(pid), None);
    assert_eq!(ctx.cpu.stats().idle_ticks, 48);
}

#[test]
fn test_output_reaches_sink_after_one_tick() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Mov, &[r(1), c(7)])
            .op(Output, &[r(1)])
            .op(Output, &[c(8)])
            .op(Exit, &[c(0)])
            .build(),
    );
    ctx.step(2);
    assert_eq!(ctx.outputs(), vec![(pid, 7)]);
    assert!(ctx.cpu.ready.contains(pid));

    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.outputs(), vec![(pid, 7), (pid, 8)]);
}

#[test]
fn test_input_into_register() {
    let mut ctx = TestContext::new();
    ctx.cpu.push_input(5);
    let pid = ctx.load(ProgramBuilder::new().op(Input, &[r(3)]).op(Exit, &[r(3)]).build());
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(5));
}

#[test]
fn test_input_into_memory() {
    let mut ctx = TestContext::new();
    ctx.cpu.push_input(31);
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Alloc, &[r(1), c(4)])
            .op(Input, &[m(1)])
            .op(Mov, &[r(2), m(1)])
            .op(Exit, &[r(2)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(31));
}

#[test]
fn test_input_waits_for_a_reader() {
    let mut ctx = TestContext::new();
    ctx.cpu.push_input(9);
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Noop, &[])
            .op(Noop, &[])
            .op(Input, &[r(1)])
            .op(Exit, &[r(1)])
            .build(),
    );
    ctx.step(2);
    assert_eq!(ctx.cpu.bus.devices.terminal.pending_input(), 1);
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), Some(9));
}

#[test]
fn test_one_input_is_broadcast_to_all_readers() {
    let mut ctx = TestContext::new();
    let a = ctx.load(ProgramBuilder::new().op(Input, &[r(1)]).op(Exit, &[r(1)]).build());
    let b = ctx.load(ProgramBuilder::new().op(Input, &[r(1)]).op(Exit, &[r(1)]).build());
    ctx.step(3);
    assert_eq!(ctx.cpu.bus.devices.queue.waiting(DeviceId::terminal()), 2);

    ctx.cpu.push_input(4);
    ctx.cpu.push_input(6);
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(a), Some(4));
    assert_eq!(ctx.exit_code(b), Some(4));
    assert_eq!(ctx.cpu.bus.devices.terminal.pending_input(), 1);
}

#[test]
fn test_unmapped_input_destination_faults_in_input_tick() {
    let mut ctx = TestContext::new();
    let reader = ctx.load(ProgramBuilder::new().op(Input, &[r(2)]).op(Exit, &[r(2)]).build());
    let bad = ctx.load(
        ProgramBuilder::new()
            .op(Mov, &[r(1), c(0)])
            .op(Input, &[m(1)])
            .build(),
    );

    ctx.step(2);
    assert_eq!(
        ctx.cpu.tick(),
        Err(KernelError::Unmapped {
            process: bad,
            address: 0
        })
    );
    assert_eq!(ctx.cpu.bus.devices.queue.waiting(DeviceId::terminal()), 1);

    ctx.cpu.push_input(42);
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(reader), Some(42));
}

#[test]
fn test_invalid_input_register_faults_in_input_tick() {
    let mut ctx = TestContext::new();
    let _ = ctx.load(ProgramBuilder::new().op(Input, &[r(20)]).build());
    assert_eq!(ctx.cpu.tick(), Err(KernelError::InvalidRegister(20)));
    assert_eq!(ctx.cpu.bus.devices.queue.waiting(DeviceId::terminal()), 0);
}

#[test]
fn test_failed_delivery_still_wakes_other_readers() {
    let mut ctx = TestContext::new();
    let bad = ctx.load(ProgramBuilder::new().op(Wait, &[c(1)]).op(Exit, &[c(0)]).build());
    let reader = ctx.load(ProgramBuilder::new().op(Input, &[r(2)]).op(Exit, &[r(2)]).build());

    // park `bad` on the terminal with a destination it has no page for
    ctx.step(1);
    ctx.cpu
        .bus
        .devices
        .queue
        .enqueue(DeviceId::terminal(), bad, AddressingKind::MemoryAddress, 0);
    ctx.step(1);
    assert_eq!(ctx.cpu.bus.devices.queue.waiting(DeviceId::terminal()), 2);

    ctx.cpu.push_input(42);
    assert_eq!(
        ctx.cpu.tick(),
        Err(KernelError::Unmapped {
            process: bad,
            address: 0
        })
    );
    assert_eq!(ctx.cpu.bus.devices.queue.waiting(DeviceId::terminal()), 0);
    assert_eq!(ctx.reg(reader, 2), 42);
    assert!(ctx.cpu.ready.contains(reader));

    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(reader), Some(42));
}

#[test]
fn test_termp_leaves_victim_queued_until_dequeued() {
    let mut ctx = TestContext::new();
    let victim = ctx.load(ProgramBuilder::new().priority(1).op(Jmp, &[s(0)]).build());
    let killer = ctx.load(
        ProgramBuilder::new()
            .priority(10)
            .op(TermP, &[c(victim)])
            .op(TermP, &[c(4242)])
            .op(Exit, &[c(0)])
            .build(),
    );

    ctx.step(1);
    assert!(!ctx.process(victim).running);
    assert_eq!(ctx.exit_code(victim), None);
    assert!(ctx.cpu.ready.contains(victim));

    ctx.step(2);
    assert_eq!(ctx.exit_code(killer), Some(0));
    assert!(ctx.cpu.is_finished());

    ctx.step(1);
    assert!(ctx.cpu.ready.is_empty());
    assert_eq!(ctx.cpu.current, Some(tvm_core::common::constants::IDLE_PROCESS_ID));
}

#[test]
fn test_termp_self_terminates() {
    let mut ctx = TestContext::new();
    let pid = ctx.load(
        ProgramBuilder::new()
            .op(Pid, &[r(1)])
            .op(TermP, &[r(1)])
            .op(Exit, &[c(1)])
            .build(),
    );
    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(pid), None);
}

#[test]
fn test_terminated_waiter_is_skipped_on_hand_off() {
    let mut ctx = TestContext::new();
    let holder = ctx.load(
        ProgramBuilder::new()
            .priority(20)
            .op(Acquire, &[c(1)])
            .op(Sleep, &[c(3)])
            .op(Release, &[c(1)])
            .op(Exit, &[c(0)])
            .build(),
    );
    let doomed = ctx.load(ProgramBuilder::new().priority(15).op(Acquire, &[c(1)]).build());
    let next = ctx.load(
        ProgramBuilder::new()
            .priority(15)
            .op(Acquire, &[c(1)])
            .op(Exit, &[c(2)])
            .build(),
    );
    let killer = ctx.load(
        ProgramBuilder::new()
            .priority(10)
            .op(TermP, &[c(doomed)])
            .op(Exit, &[c(3)])
            .build(),
    );

    let _ = ctx.run_to_completion(100);
    assert_eq!(ctx.exit_code(holder), Some(0));
    assert_eq!(ctx.exit_code(killer), Some(3));
    assert_eq!(ctx.exit_code(next), Some(2));
    assert_eq!(ctx.exit_code(doomed), None);
    assert_eq!(lock_owner(&ctx, 1), FREE_OWNER);
}
