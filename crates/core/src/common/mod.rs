//! Common types used throughout the kernel.
//!
//! This module provides the building blocks shared by every component:
//! 1. **Address Types:** Split virtual addresses and the shift/mask calculator.
//! 2. **Constants:** Encoding widths, reserved process ids, frame sentinels.
//! 3. **Error Handling:** The fatal `KernelError` and the crate `Result` alias.
//! 4. **Register Management:** The per-process register file.

/// Virtual address types and translation arithmetic.
pub mod addr;

/// Machine-wide constants.
pub mod constants;

/// Fatal fault definitions.
pub mod error;

/// Register file implementation.
pub mod reg;

pub use addr::{VirtualAddress, VirtualAddressCalculator};
pub use error::{KernelError, Result};
pub use reg::RegisterFile;

/// Identifier of a simulated process. `0` is reserved for "no process".
pub type ProcessId = u32;
