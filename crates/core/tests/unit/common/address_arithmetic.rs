//! # Address Arithmetic Tests
//!
//! Verifies the shift/mask calculator derived from the frame size.

use pretty_assertions::assert_eq;
use rstest::rstest;
use tvm_core::common::{KernelError, VirtualAddress, VirtualAddressCalculator};

#[rstest]
#[case(1)]
#[case(64)]
#[case(256)]
#[case(4096)]
#[case(65536)]
fn test_power_of_two_frame_sizes_accepted(#[case] size: u32) {
    let calc = VirtualAddressCalculator::new(size).unwrap();
    assert_eq!(calc.frame_size(), size);
}

#[rstest]
#[case(0)]
#[case(3)]
#[case(100)]
#[case(1 << 17)]
fn test_bad_frame_sizes_rejected(#[case] size: u32) {
    assert_eq!(
        VirtualAddressCalculator::new(size),
        Err(KernelError::FrameSizeNotPowerOfTwo(size))
    );
}

#[test]
fn test_linear_split_and_join() {
    let calc = VirtualAddressCalculator::new(256).unwrap();
    let vaddr = calc.from_linear(0x0312);
    assert_eq!(
        vaddr,
        VirtualAddress {
            page_number: 3,
            offset: 0x12
        }
    );
    assert_eq!(calc.to_linear(vaddr), 0x0312);
}

#[test]
fn test_address_validates_page_and_offset() {
    let calc = VirtualAddressCalculator::new(64).unwrap();
    assert_eq!(
        calc.address(2, 63).unwrap(),
        VirtualAddress {
            page_number: 2,
            offset: 63
        }
    );
    assert_eq!(calc.address(-1, 0), Err(KernelError::InvalidPage(-1)));
    assert_eq!(
        calc.address(1, 64),
        Err(KernelError::OffsetOutOfRange {
            offset: 64,
            frame_size: 64
        })
    );
    assert_eq!(
        calc.address(1, -5),
        Err(KernelError::OffsetOutOfRange {
            offset: -5,
            frame_size: 64
        })
    );
}

#[test]
fn test_page_zero_is_address_zero() {
    let calc = VirtualAddressCalculator::new(128).unwrap();
    assert_eq!(calc.to_linear(calc.address(0, 0).unwrap()), 0);
}
