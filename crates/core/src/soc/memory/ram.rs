//! Physical memory and frame allocator.
//!
//! `Ram` is a fixed arena of equally sized frames. Frames are handed out
//! first-fit to processes, one page at a time, with per-process page numbers
//! starting at [`FIRST_PAGE_NUMBER`]. There is no eviction and no swapping:
//! allocation simply fails once every frame is owned.
//!
//! A run of frames can be pinned as a shared region; pages handed out from
//! it alias the same frames in every process that maps them.

use std::collections::HashMap;

use tracing::debug;

use super::frame::{Frame, FrameAlias, Page};
use crate::common::constants::{FIRST_PAGE_NUMBER, FREE_OWNER, SHARED_OWNER};
use crate::common::error::{KernelError, Result};
use crate::common::{ProcessId, VirtualAddress, VirtualAddressCalculator};

/// Simulated physical memory.
#[derive(Debug)]
pub struct Ram {
    calc: VirtualAddressCalculator,
    data: Vec<u8>,
    frames: Vec<Frame>,
    /// `(owner, page)` to frame index, covering both base owners and aliases.
    mappings: HashMap<(ProcessId, u32), u32>,
    next_page: HashMap<ProcessId, u32>,
    /// Pinned frames in pin order.
    shared: Vec<u32>,
}

impl Ram {
    /// Creates physical memory with `frame_count` frames of `frame_size` bytes.
    ///
    /// # Returns
    ///
    /// The memory, or [`KernelError::FrameSizeNotPowerOfTwo`].
    pub fn new(frame_size: u32, frame_count: u32) -> Result<Self> {
        let calc = VirtualAddressCalculator::new(frame_size)?;
        Ok(Self {
            calc,
            data: vec![0; frame_size as usize * frame_count as usize],
            frames: (0..frame_count).map(Frame::new).collect(),
            mappings: HashMap::new(),
            next_page: HashMap::new(),
            shared: Vec::new(),
        })
    }

    /// Returns the address calculator for this memory's frame size.
    #[inline]
    pub const fn calculator(&self) -> &VirtualAddressCalculator {
        &self.calc
    }

    /// Returns the frame size in bytes.
    #[inline]
    pub const fn frame_size(&self) -> u32 {
        self.calc.frame_size()
    }

    /// Returns the total number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns the number of frames not owned by anyone.
    pub fn free_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.is_free()).count()
    }

    /// Returns a frame table entry.
    pub fn frame(&self, frame_number: u32) -> Option<&Frame> {
        self.frames.get(frame_number as usize)
    }

    /// Allocates one frame to `owner` as its next page.
    ///
    /// # Returns
    ///
    /// The new page, or `None` when memory is exhausted.
    pub fn allocate(&mut self, owner: ProcessId) -> Option<Page> {
        let idx = self.frames.iter().position(Frame::is_free)?;
        let page_number = self.take_page_number(owner);
        let frame_size = self.frame_size();

        let frame = &mut self.frames[idx];
        frame.owner = owner;
        frame.page_number = page_number;
        let frame_number = frame.frame_number;

        self.frame_bytes_mut(frame_number).fill(0);
        let _ = self.mappings.insert((owner, page_number), frame_number);

        Some(Page {
            owner,
            page_number,
            frame_number,
            size: frame_size,
        })
    }

    /// Allocates `count` pages to `owner`, all or nothing.
    pub fn allocate_pages(&mut self, owner: ProcessId, count: usize) -> Option<Vec<Page>> {
        if self.free_frames() < count {
            return None;
        }
        (0..count).map(|_| self.allocate(owner)).collect()
    }

    /// Returns a page's frame to the pool.
    ///
    /// For pinned shared frames only the page's alias is removed; the frame
    /// itself stays pinned. Stale pages (already freed) are ignored.
    pub fn free(&mut self, page: &Page) {
        let key = (page.owner, page.page_number);
        if self.mappings.get(&key) != Some(&page.frame_number) {
            return;
        }
        let _ = self.mappings.remove(&key);

        let Some(frame) = self.frames.get_mut(page.frame_number as usize) else {
            return;
        };
        if frame.pinned {
            frame
                .aliases
                .retain(|a| !(a.owner == page.owner && a.page_number == page.page_number));
        } else {
            frame.owner = FREE_OWNER;
            frame.page_number = 0;
        }
    }

    /// Pins enough free frames to hold `size` bytes as shared memory.
    ///
    /// # Returns
    ///
    /// The physical address of the first pinned frame, or `None` if there are
    /// not enough free frames.
    pub fn allocate_shared(&mut self, size: u32) -> Option<u32> {
        let count = self.pages_for(size);
        let free: Vec<usize> = self
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_free())
            .map(|(i, _)| i)
            .take(count)
            .collect();
        if free.len() < count {
            return None;
        }

        for &idx in &free {
            let region_index = self.shared.len() as u32;
            let frame = &mut self.frames[idx];
            frame.owner = SHARED_OWNER;
            frame.page_number = region_index;
            frame.pinned = true;
            let frame_number = frame.frame_number;
            self.frame_bytes_mut(frame_number).fill(0);
            self.shared.push(frame_number);
        }

        let base = free[0] as u32 * self.frame_size();
        debug!(frames = count, base, "pinned shared region");
        Some(base)
    }

    /// Maps the first `size` bytes of the shared region into `owner`.
    ///
    /// # Returns
    ///
    /// Pages aliasing the pinned frames in pin order, or `None` if the shared
    /// region is smaller than requested.
    pub fn allocate_from_shared(&mut self, owner: ProcessId, size: u32) -> Option<Vec<Page>> {
        let count = self.pages_for(size);
        if count > self.shared.len() {
            return None;
        }
        let frame_size = self.frame_size();
        let mut pages = Vec::with_capacity(count);
        for i in 0..count {
            let frame_number = self.shared[i];
            let page_number = self.take_page_number(owner);
            self.frames[frame_number as usize].aliases.push(FrameAlias { owner, page_number });
            let _ = self.mappings.insert((owner, page_number), frame_number);
            pages.push(Page {
                owner,
                page_number,
                frame_number,
                size: frame_size,
            });
        }
        Some(pages)
    }

    /// Translates a process-relative address into a physical byte address.
    ///
    /// # Returns
    ///
    /// The physical address, or [`KernelError::Unmapped`].
    pub fn to_physical_address(&self, owner: ProcessId, vaddr: VirtualAddress) -> Result<usize> {
        let frame = self
            .mappings
            .get(&(owner, vaddr.page_number))
            .ok_or(KernelError::Unmapped {
                process: owner,
                address: self.calc.to_linear(vaddr),
            })?;
        Ok(*frame as usize * self.frame_size() as usize + usize::from(vaddr.offset))
    }

    /// Reads bytes at a physical address.
    pub fn read(&self, paddr: usize, len: usize) -> Option<&[u8]> {
        self.data.get(paddr..paddr.checked_add(len)?)
    }

    /// Writes bytes at a physical address; out-of-range writes are dropped.
    pub fn write(&mut self, paddr: usize, bytes: &[u8]) -> bool {
        let Some(end) = paddr.checked_add(bytes.len()) else {
            return false;
        };
        match self.data.get_mut(paddr..end) {
            Some(dst) => {
                dst.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    /// Returns the bytes of one frame.
    pub fn frame_bytes(&self, frame_number: u32) -> &[u8] {
        let size = self.frame_size() as usize;
        let start = frame_number as usize * size;
        &self.data[start..start + size]
    }

    /// Returns the bytes of one frame, mutably.
    pub fn frame_bytes_mut(&mut self, frame_number: u32) -> &mut [u8] {
        let size = self.frame_size() as usize;
        let start = frame_number as usize * size;
        &mut self.data[start..start + size]
    }

    /// Forgets a terminated process's page counter.
    pub fn release_process(&mut self, owner: ProcessId) {
        let _ = self.next_page.remove(&owner);
    }

    /// Number of frames needed for `size` bytes (at least one).
    pub fn pages_for(&self, size: u32) -> usize {
        size.div_ceil(self.frame_size()).max(1) as usize
    }

    fn take_page_number(&mut self, owner: ProcessId) -> u32 {
        let next = self.next_page.entry(owner).or_insert(FIRST_PAGE_NUMBER);
        let page_number = *next;
        *next += 1;
        page_number
    }
}
