//! Physical memory subsystem.
//!
//! Provides the frame table and the first-fit frame allocator, including the
//! pinned shared region.

/// Frame table entries and pages.
pub mod frame;

/// Physical memory and frame allocator.
pub mod ram;

pub use frame::{Frame, FrameAlias, Page};
pub use ram::Ram;
