//! Virtual address types.
//!
//! This module defines the split form of a process-relative address and the
//! calculator that converts between split and linear forms. It provides the following:
//! 1. **Type Safety:** A `VirtualAddress` is always a valid `(page, offset)` pair.
//! 2. **Address Manipulation:** Shift/mask conversion derived once from the frame size.
//! 3. **Paging Integration:** Acts as the key for frame lookup in physical memory.

use super::constants::MAX_FRAME_SIZE;
use super::error::{KernelError, Result};

/// A process-relative address split into page number and in-page offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualAddress {
    /// Process-relative page number.
    pub page_number: u32,
    /// Byte offset within the page.
    pub offset: u16,
}

/// Converts between linear `u32` addresses and [`VirtualAddress`] pairs.
///
/// The frame size must be a power of two; the shift and mask are computed
/// once at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VirtualAddressCalculator {
    frame_size: u32,
    shift: u32,
    mask: u32,
}

impl VirtualAddressCalculator {
    /// Creates a calculator for the given frame size.
    ///
    /// # Arguments
    ///
    /// * `frame_size` - Frame size in bytes; must be a power of two no larger than 64 KiB.
    ///
    /// # Returns
    ///
    /// The calculator, or [`KernelError::FrameSizeNotPowerOfTwo`].
    pub fn new(frame_size: u32) -> Result<Self> {
        if !frame_size.is_power_of_two() || frame_size > MAX_FRAME_SIZE {
            return Err(KernelError::FrameSizeNotPowerOfTwo(frame_size));
        }
        Ok(Self {
            frame_size,
            shift: frame_size.trailing_zeros(),
            mask: frame_size - 1,
        })
    }

    /// Returns the frame size this calculator was built for.
    #[inline]
    pub const fn frame_size(&self) -> u32 {
        self.frame_size
    }

    /// Builds a validated virtual address.
    ///
    /// Negative pages and offsets outside `0..frame_size` are rejected.
    pub fn address(&self, page: i64, offset: i64) -> Result<VirtualAddress> {
        if page < 0 || page > i64::from(u32::MAX >> self.shift) {
            return Err(KernelError::InvalidPage(page));
        }
        if offset < 0 || offset >= i64::from(self.frame_size) {
            return Err(KernelError::OffsetOutOfRange {
                offset,
                frame_size: self.frame_size,
            });
        }
        Ok(VirtualAddress {
            page_number: page as u32,
            offset: offset as u16,
        })
    }

    /// Combines a page number and offset into a linear address.
    #[inline]
    pub const fn to_linear(&self, address: VirtualAddress) -> u32 {
        (address.page_number << self.shift) | address.offset as u32
    }

    /// Splits a linear address into page number and offset.
    #[inline]
    pub const fn from_linear(&self, linear: u32) -> VirtualAddress {
        VirtualAddress {
            page_number: linear >> self.shift,
            offset: (linear & self.mask) as u16,
        }
    }
}
