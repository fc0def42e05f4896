//! # Ready Queue Tests

use pretty_assertions::assert_eq;
use rstest::rstest;
use tvm_core::core::sched::ReadyQueue;

#[test]
fn test_dequeue_follows_priority_then_fifo() {
    let mut q = ReadyQueue::new(32, 16);
    for (pid, priority) in [(2, 3), (3, 31), (4, 1), (5, 31)] {
        q.enqueue(pid, priority);
    }
    let order: Vec<u32> = std::iter::from_fn(|| q.dequeue()).collect();
    assert_eq!(order, vec![3, 5, 2, 4]);
    assert!(q.is_empty());
}

#[rstest]
#[case(0, 16)]
#[case(33, 16)]
#[case(255, 16)]
#[case(1, 1)]
#[case(32, 32)]
fn test_effective_priority(#[case] requested: u8, #[case] expected: u8) {
    let q = ReadyQueue::new(32, 16);
    assert_eq!(q.effective_priority(requested), expected);
}

#[test]
fn test_out_of_range_default_falls_back_to_half() {
    let q = ReadyQueue::new(8, 0);
    assert_eq!(q.effective_priority(0), 4);
    assert_eq!(q.level_count(), 8);
}

#[test]
fn test_clamped_priority_shares_default_level() {
    let mut q = ReadyQueue::new(32, 16);
    q.enqueue(2, 0);
    q.enqueue(3, 16);
    q.enqueue(4, 99);
    assert_eq!(q.len(), 3);
    assert!(q.contains(4));
    assert_eq!(q.dequeue(), Some(2));
    assert_eq!(q.dequeue(), Some(3));
    assert_eq!(q.dequeue(), Some(4));
    assert_eq!(q.dequeue(), None);
}
