//! Row storage inside a page payload.
//!
//! Layout of a `TableHeap` payload:
//!   [used_bytes u32 LE]
//!   [len u32 LE][record bytes] ... repeated
//!
//! `used_bytes` counts the bytes after the cursor field (prefixes included).
//! A record is appended only while `4 + len + 4 <= payload_size - used_bytes`,
//! which keeps `used_bytes + 4 <= payload_size` at all times.

use std::hash::Hasher;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use parking_lot::Mutex;
use twox_hash::XxHash64;

use crate::buffer::BufferPool;
use crate::consts::{MAX_RECORD_LEN, PAGE_PAYLOAD_SIZE, RECORD_LEN_PREFIX, USED_BYTES_LEN};
use crate::error::{Result, StorageError};
use crate::page::{Page, PageId};
use crate::tuple::Tuple;

#[inline]
pub fn used_bytes(page: &Page) -> u32 {
    LittleEndian::read_u32(&page.payload()[..USED_BYTES_LEN])
}

#[inline]
pub fn set_used_bytes(page: &mut Page, used: u32) {
    LittleEndian::write_u32(&mut page.payload_mut()[..USED_BYTES_LEN], used);
}

/// Whether a record of `len` bytes fits behind the current cursor.
pub fn can_append(page: &Page, len: usize) -> bool {
    let used = used_bytes(page) as usize;
    let avail = PAGE_PAYLOAD_SIZE.saturating_sub(used);
    USED_BYTES_LEN + RECORD_LEN_PREFIX + len <= avail
}

/// Records must be non-empty (zero length ends iteration) and fit an empty page.
fn check_record_len(len: usize) -> Result<()> {
    if len == 0 {
        return Err(StorageError::EmptyRecord);
    }
    if len > MAX_RECORD_LEN {
        return Err(StorageError::RecordTooLarge {
            len,
            max: MAX_RECORD_LEN,
        });
    }
    Ok(())
}

/// Append one length-prefixed record. Ok(false) when it does not fit.
pub fn append_record(page: &mut Page, rec: &[u8]) -> Result<bool> {
    check_record_len(rec.len())?;
    if !can_append(page, rec.len()) {
        return Ok(false);
    }

    let used = used_bytes(page) as usize;
    let off = USED_BYTES_LEN + used;
    {
        let payload = page.payload_mut();
        LittleEndian::write_u32(&mut payload[off..off + RECORD_LEN_PREFIX], rec.len() as u32);
        payload[off + RECORD_LEN_PREFIX..off + RECORD_LEN_PREFIX + rec.len()].copy_from_slice(rec);
    }
    set_used_bytes(page, (used + RECORD_LEN_PREFIX + rec.len()) as u32);
    Ok(true)
}

/// Iterate the records of one page in append order.
pub fn records(page: &Page) -> RecordIter<'_> {
    let payload = page.payload();
    let used = used_bytes(page) as usize;
    RecordIter {
        payload,
        pos: USED_BYTES_LEN,
        end: USED_BYTES_LEN.saturating_add(used),
        done: false,
    }
}

pub struct RecordIter<'a> {
    payload: &'a [u8],
    pos: usize,
    end: usize,
    done: bool,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.end > self.payload.len() {
            self.done = true;
            return Some(Err(StorageError::corrupt(format!(
                "used_bytes {} exceeds payload",
                self.end - USED_BYTES_LEN
            ))));
        }
        if self.pos + RECORD_LEN_PREFIX > self.end {
            self.done = true;
            return None;
        }

        let len = LittleEndian::read_u32(&self.payload[self.pos..self.pos + RECORD_LEN_PREFIX]) as usize;
        if len == 0 {
            self.done = true;
            return None;
        }
        let start = self.pos + RECORD_LEN_PREFIX;
        let stop = match start.checked_add(len) {
            Some(s) if s <= self.end => s,
            _ => {
                self.done = true;
                return Some(Err(StorageError::corrupt(format!(
                    "record at offset {} has length {} past the cursor",
                    self.pos, len
                ))));
            }
        };
        self.pos = stop;
        Some(Ok(&self.payload[start..stop]))
    }
}

/// Stable table name -> segment id mapping (xxhash64, seed 0, folded to 32 bits).
pub fn segment_id_for_table(name: &str) -> u32 {
    let mut h = XxHash64::with_seed(0);
    h.write(name.as_bytes());
    let v = h.finish();
    (v ^ (v >> 32)) as u32
}

/// Append-only record heap over the pages of one segment.
pub struct TableHeap {
    segment_id: u32,
    append_lock: Mutex<()>,
}

impl TableHeap {
    pub fn new(segment_id: u32) -> Self {
        Self {
            segment_id,
            append_lock: Mutex::new(()),
        }
    }

    pub fn for_table(name: &str) -> Self {
        Self::new(segment_id_for_table(name))
    }

    #[inline]
    pub fn segment_id(&self) -> u32 {
        self.segment_id
    }

    /// Append raw record bytes, rolling over to a fresh page when the tail is full.
    pub fn append_record(&self, pool: &BufferPool, rec: &[u8]) -> Result<PageId> {
        check_record_len(rec.len())?;

        let _g = self.append_lock.lock();
        let count = pool.page_count(self.segment_id)?;
        let mut pid = PageId::new(self.segment_id, count.saturating_sub(1));

        loop {
            let mut h = pool.fetch_or_allocate_page(pid, true)?;
            let appended = {
                let mut page = h.write();
                append_record(&mut page, rec)?
            };
            if appended {
                pool.unpin_page(h, true);
                return Ok(pid);
            }
            pool.unpin_page(h, false);
            debug!("page {} full, rolling over to {}", pid, pid.next());
            pid = pid.next();
        }
    }

    pub fn insert(&self, pool: &BufferPool, tuple: &Tuple) -> Result<PageId> {
        let bytes = tuple.serialize()?;
        self.append_record(pool, &bytes)
    }

    /// Every record of the segment, page by page.
    pub fn scan_records(&self, pool: &BufferPool) -> Result<Vec<Vec<u8>>> {
        let count = pool.page_count(self.segment_id)?;
        let mut out = Vec::new();
        for page_number in 0..count {
            let h = pool.fetch_page(PageId::new(self.segment_id, page_number), false)?;
            let res = {
                let page = h.read();
                records(&page)
                    .map(|r| r.map(|b| b.to_vec()))
                    .collect::<Result<Vec<_>>>()
            };
            pool.unpin_page(h, false);
            out.extend(res?);
        }
        Ok(out)
    }

    pub fn scan(&self, pool: &BufferPool) -> Result<Vec<Tuple>> {
        self.scan_records(pool)?
            .iter()
            .map(|r| Tuple::from_bytes(r))
            .collect()
    }
}
