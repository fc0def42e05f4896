//! Per-process address space.
//!
//! A process owns its `PageTable` by value and the table owns its segments
//! (`PageInfo`) by value. A segment is an ordered list of pages; streamed
//! reads and writes walk the list in sequence order, so a segment does not
//! need to be contiguous in physical memory.

use crate::common::error::{KernelError, Result};
use crate::common::{VirtualAddress, VirtualAddressCalculator};
use crate::soc::memory::{Page, Ram};

/// One logical segment (code, stack, global data, heap or shared mapping).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageInfo {
    pages: Vec<Page>,
    size: u32,
}

impl PageInfo {
    /// Wraps allocated pages as a segment of `size` requested bytes.
    pub const fn new(pages: Vec<Page>, size: u32) -> Self {
        Self { pages, size }
    }

    /// Pages of the segment in sequence order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Requested size in bytes.
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Bytes addressable through the segment's pages.
    pub fn capacity(&self) -> usize {
        self.pages.iter().map(|p| p.size as usize).sum()
    }

    /// Returns true if the segment has no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Linear address of the segment's first byte.
    pub fn base_address(&self, calc: &VirtualAddressCalculator) -> Option<u32> {
        self.pages.first().map(|p| {
            calc.to_linear(VirtualAddress {
                page_number: p.page_number,
                offset: 0,
            })
        })
    }

    /// Offset within the segment of a virtual address, if one of its pages maps it.
    pub fn offset_of(&self, vaddr: VirtualAddress) -> Option<usize> {
        let mut base = 0usize;
        for page in &self.pages {
            if page.page_number == vaddr.page_number {
                return Some(base + usize::from(vaddr.offset));
            }
            base += page.size as usize;
        }
        None
    }

    /// Returns true if one of the segment's pages maps the address.
    pub fn contains(&self, vaddr: VirtualAddress) -> bool {
        self.pages.iter().any(|p| p.page_number == vaddr.page_number)
    }

    /// Reads `len` bytes starting `offset` bytes into the segment.
    pub fn read(&self, ram: &Ram, offset: usize, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len);
        self.walk(ram, offset, len, |paddr, chunk| {
            let bytes = ram.read(paddr, chunk).unwrap_or(&[]);
            out.extend_from_slice(bytes);
        })?;
        Ok(out)
    }

    /// Writes `bytes` starting `offset` bytes into the segment.
    pub fn write(&self, ram: &mut Ram, offset: usize, bytes: &[u8]) -> Result<()> {
        let mut spans = Vec::new();
        self.walk(ram, offset, bytes.len(), |paddr, chunk| spans.push((paddr, chunk)))?;
        let mut written = 0;
        for (paddr, chunk) in spans {
            let _ = ram.write(paddr, &bytes[written..written + chunk]);
            written += chunk;
        }
        Ok(())
    }

    /// Zeroes `len` bytes starting `offset` bytes into the segment.
    ///
    /// The range is checked against the segment before any byte is touched.
    pub fn clear(&self, ram: &mut Ram, offset: usize, len: usize) -> Result<()> {
        let mut spans = Vec::new();
        self.walk(ram, offset, len, |paddr, chunk| spans.push((paddr, chunk)))?;
        let zeros = vec![0u8; ram.frame_size() as usize];
        for (paddr, chunk) in spans {
            let _ = ram.write(paddr, &zeros[..chunk]);
        }
        Ok(())
    }

    /// Resolves `[offset, offset + len)` into physical spans, page by page.
    ///
    /// Each page boundary moves to the next page in sequence order; the
    /// physical address of every span is resolved through the frame table so
    /// a freed page faults instead of touching a reused frame.
    fn walk(
        &self,
        ram: &Ram,
        offset: usize,
        len: usize,
        mut span: impl FnMut(usize, usize),
    ) -> Result<()> {
        let overflow = || KernelError::SegmentOverflow {
            offset,
            len,
            capacity: self.capacity(),
        };
        let end = offset.checked_add(len).ok_or_else(overflow)?;
        if end > self.capacity() {
            return Err(overflow());
        }

        let mut skip = offset;
        let mut remaining = len;
        for page in &self.pages {
            if remaining == 0 {
                break;
            }
            let page_size = page.size as usize;
            if skip >= page_size {
                skip -= page_size;
                continue;
            }
            let chunk = (page_size - skip).min(remaining);
            let vaddr = VirtualAddress {
                page_number: page.page_number,
                offset: skip as u16,
            };
            span(ram.to_physical_address(page.owner, vaddr)?, chunk);
            remaining -= chunk;
            skip = 0;
        }
        Ok(())
    }
}

/// All segments of one process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageTable {
    /// Encoded instructions.
    pub code: PageInfo,
    /// Call/push stack.
    pub stack: PageInfo,
    /// Initialized global data.
    pub global_data: PageInfo,
    /// Segments created by `Alloc` and `Map`.
    pub dynamic: Vec<PageInfo>,
}

impl PageTable {
    /// Iterates over every segment.
    pub fn segments(&self) -> impl Iterator<Item = &PageInfo> {
        [&self.code, &self.stack, &self.global_data]
            .into_iter()
            .chain(self.dynamic.iter())
    }

    /// Finds the segment mapping a virtual address.
    pub fn find(&self, vaddr: VirtualAddress) -> Option<&PageInfo> {
        self.segments().find(|s| s.contains(vaddr))
    }

    /// Detaches the dynamic segment mapping `vaddr`.
    pub fn remove_dynamic(&mut self, vaddr: VirtualAddress) -> Option<PageInfo> {
        let idx = self.dynamic.iter().position(|s| s.contains(vaddr))?;
        Some(self.dynamic.remove(idx))
    }

    /// Detaches every segment, leaving the table empty.
    pub fn take_all(&mut self) -> Vec<PageInfo> {
        let mut all = vec![
            std::mem::take(&mut self.code),
            std::mem::take(&mut self.stack),
            std::mem::take(&mut self.global_data),
        ];
        all.append(&mut self.dynamic);
        all
    }

    /// Total number of mapped pages.
    pub fn page_count(&self) -> usize {
        self.segments().map(|s| s.pages().len()).sum()
    }
}
