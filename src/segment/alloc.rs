//! segment/alloc: page allocation at the segment tail.
//!
//! The next page number is `file_size / PAGE_SIZE`; the new page is written
//! immediately so the file size stays a multiple of `PAGE_SIZE`.
//! There is no free-list: free_page is a hook only.

use log::debug;

use crate::consts::PAGE_SIZE;
use crate::error::{Result, StorageError};
use crate::metrics::record_seg_alloc;
use crate::page::{Page, PageId, PageType};

use super::core::SegmentManager;

impl SegmentManager {
    /// Allocate the next page of a segment and persist it as a blank TableHeap page.
    pub fn allocate_page(&self, segment_id: u32) -> Result<PageId> {
        let mut table = self.segments.lock();
        let f = self.segment_locked(&mut table, segment_id)?;

        let size = f
            .metadata()
            .map_err(|e| StorageError::io(segment_id, self.segment_path(segment_id), e))?
            .len();
        let page_number = u32::try_from(size / PAGE_SIZE as u64).map_err(|_| {
            StorageError::corrupt(format!("segment {segment_id} exceeds addressable pages"))
        })?;

        let pid = PageId::new(segment_id, page_number);
        let page = Page::new(pid, PageType::TableHeap);
        self.write_locked(f, &page)?;

        record_seg_alloc();
        debug!("allocated page {} (segment size was {} B)", pid, size);
        Ok(pid)
    }

    /// Reserved hook: pages are never reclaimed.
    pub fn free_page(&self, pid: PageId) {
        let _ = pid;
    }

    /// Allocated pages in a segment (`file_size / PAGE_SIZE`). Missing file -> 0.
    pub fn page_count(&self, segment_id: u32) -> Result<u32> {
        let table = self.segments.lock();
        let len = match table.get(&segment_id) {
            Some(f) => f.metadata().map(|m| m.len()),
            None => match std::fs::metadata(self.segment_path(segment_id)) {
                Ok(m) => Ok(m.len()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
                Err(e) => Err(e),
            },
        }
        .map_err(|e| StorageError::io(segment_id, self.segment_path(segment_id), e))?;
        Ok((len / PAGE_SIZE as u64).min(u32::MAX as u64) as u32)
    }
}
