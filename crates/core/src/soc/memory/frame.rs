//! Frame table entries and process pages.

use crate::common::ProcessId;
use crate::common::constants::FREE_OWNER;

/// A process-relative page backed by exactly one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Page {
    /// Process that owns this mapping.
    pub owner: ProcessId,
    /// Process-relative page number.
    pub page_number: u32,
    /// Backing frame.
    pub frame_number: u32,
    /// Page size in bytes (equal to the frame size).
    pub size: u32,
}

/// An additional `(owner, page)` mapping onto a pinned frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameAlias {
    /// Process the alias belongs to.
    pub owner: ProcessId,
    /// Page number inside that process.
    pub page_number: u32,
}

/// One physical frame slot.
///
/// A free frame has owner [`FREE_OWNER`]. Pinned frames back the shared
/// region: their base state is never reset, and each process mapping them
/// is recorded as an alias.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Index of the frame in physical memory.
    pub frame_number: u32,
    /// Owning process, [`FREE_OWNER`] or the shared sentinel.
    pub owner: ProcessId,
    /// Page number within the owner.
    pub page_number: u32,
    /// Pinned frames are never returned to the free pool.
    pub pinned: bool,
    /// Extra mappings onto this frame.
    pub aliases: Vec<FrameAlias>,
}

impl Frame {
    /// Creates a free frame.
    pub const fn new(frame_number: u32) -> Self {
        Self {
            frame_number,
            owner: FREE_OWNER,
            page_number: 0,
            pinned: false,
            aliases: Vec::new(),
        }
    }

    /// Returns true if the frame can be handed to a process.
    #[inline]
    pub const fn is_free(&self) -> bool {
        self.owner == FREE_OWNER && !self.pinned
    }
}
