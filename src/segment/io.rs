//! segment/io: page reads and writes at `page_number * PAGE_SIZE`.
//!
//! - read_page: short file (or an all-zero hole left by a sparse write) is
//!   `PageNotFound`, never a corruption.
//! - write_page: in-place overwrite at the offset derived from the page header,
//!   flushed to the OS; `sync_data` as well when data_fsync is on.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use log::warn;

use crate::consts::{PAGE_HEADER_SIZE, PAGE_SIZE};
use crate::error::{Result, StorageError};
use crate::metrics::{record_seg_fsync, record_seg_read, record_seg_write};
use crate::page::{Page, PageId};

use super::core::SegmentManager;

impl SegmentManager {
    /// Read one full page.
    pub fn read_page(&self, pid: PageId) -> Result<Page> {
        let mut table = self.segments.lock();
        let f = self.segment_locked(&mut table, pid.segment_id)?;
        let page = self.read_locked(f, pid)?;
        record_seg_read();
        Ok(page)
    }

    /// Write the page at the position named by its own header.
    pub fn write_page(&self, page: &Page) -> Result<()> {
        let pid = page.id();
        let mut table = self.segments.lock();
        let f = self.segment_locked(&mut table, pid.segment_id)?;
        self.write_locked(f, page)
    }

    /// fsync every open segment (shutdown path).
    pub fn sync_all(&self) -> Result<()> {
        let table = self.segments.lock();
        for (&segment_id, f) in table.iter() {
            f.sync_all()
                .map_err(|e| StorageError::io(segment_id, self.segment_path(segment_id), e))?;
            record_seg_fsync();
        }
        Ok(())
    }

    // ---------------- internal helpers (segment lock held) ----------------

    pub(crate) fn read_locked(&self, f: &mut File, pid: PageId) -> Result<Page> {
        let io_err = |e| StorageError::io(pid.segment_id, self.segment_path(pid.segment_id), e);

        let off = pid.file_offset();
        let len = f.metadata().map_err(io_err)?.len();
        if len < off + PAGE_SIZE as u64 {
            return Err(StorageError::PageNotFound {
                segment_id: pid.segment_id,
                page_number: pid.page_number,
            });
        }

        let mut page = Page::zeroed();
        f.seek(SeekFrom::Start(off)).map_err(io_err)?;
        match f.read_exact(page.as_bytes_mut()) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(StorageError::PageNotFound {
                    segment_id: pid.segment_id,
                    page_number: pid.page_number,
                });
            }
            Err(e) => return Err(io_err(e)),
        }

        // A hole below the file tail (page never written) reads as zeros,
        // including at page 0 where a zero header would match its own position.
        if page.as_bytes()[..PAGE_HEADER_SIZE].iter().all(|b| *b == 0) {
            return Err(StorageError::PageNotFound {
                segment_id: pid.segment_id,
                page_number: pid.page_number,
            });
        }

        let stored = page.id();
        if stored != pid {
            return Err(StorageError::corrupt(format!(
                "page at {} carries header id {}",
                pid, stored
            )));
        }
        Ok(page)
    }

    pub(crate) fn write_locked(&self, f: &mut File, page: &Page) -> Result<()> {
        let pid = page.id();
        let io_err = |e| StorageError::io(pid.segment_id, self.segment_path(pid.segment_id), e);

        f.seek(SeekFrom::Start(pid.file_offset())).map_err(io_err)?;
        f.write_all(page.as_bytes()).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        if self.data_fsync {
            if let Err(e) = f.sync_data() {
                warn!("sync_data failed for segment {}: {}", pid.segment_id, e);
                return Err(io_err(e));
            }
            record_seg_fsync();
        }
        record_seg_write();
        Ok(())
    }
}
