//! page: fixed-size on-disk page: 16-byte header + opaque payload.
//!
//! Layout:
//! ```text
//! 0      4        8     10    14        16                     4096
//! [seg u32][page u32][type u16][lsn u32][rsv 2][ payload (4080 bytes) ]
//! ```
//! All integers are little-endian. The layout is the on-disk contract of
//! `seg_<id>.dat` files and must not change.

pub mod header;

use std::fmt;

use crate::consts::{PAGE_HEADER_SIZE, PAGE_SIZE, OFF_LSN};
use crate::error::{Result, StorageError};

pub use header::PageHeader;

/// (segment, page number) pair identifying a page engine-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub segment_id: u32,
    pub page_number: u32,
}

impl PageId {
    #[inline]
    pub const fn new(segment_id: u32, page_number: u32) -> Self {
        Self {
            segment_id,
            page_number,
        }
    }

    /// Packed cache key: segment id in the high 32 bits.
    #[inline]
    pub const fn key(&self) -> u64 {
        ((self.segment_id as u64) << 32) | self.page_number as u64
    }

    #[inline]
    pub const fn from_key(key: u64) -> Self {
        Self::new((key >> 32) as u32, key as u32)
    }

    /// Byte offset of this page inside its segment file.
    #[inline]
    pub const fn file_offset(&self) -> u64 {
        self.page_number as u64 * PAGE_SIZE as u64
    }

    #[inline]
    pub const fn next(&self) -> Self {
        Self::new(self.segment_id, self.page_number + 1)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment_id, self.page_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PageType {
    Invalid = 0,
    TableHeap = 1,
    // Reserved for index pages; not produced by this crate.
    IndexInternal = 2,
    IndexLeaf = 3,
}

impl PageType {
    #[inline]
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Unknown tags return None.
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(PageType::Invalid),
            1 => Some(PageType::TableHeap),
            2 => Some(PageType::IndexInternal),
            3 => Some(PageType::IndexLeaf),
            _ => None,
        }
    }
}

/// One page image. Always exactly `PAGE_SIZE` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Page {
    buf: Box<[u8; PAGE_SIZE]>,
}

impl Page {
    /// Zeroed page stamped with `pid` and `page_type`.
    pub fn new(pid: PageId, page_type: PageType) -> Self {
        let mut p = Self::zeroed();
        p.reset(pid, page_type);
        p
    }

    /// All-zero image (header included). Reads back as `Invalid` 0:0.
    pub fn zeroed() -> Self {
        Self {
            buf: Box::new([0u8; PAGE_SIZE]),
        }
    }

    /// Zero the payload and stamp a fresh header (lsn=0, reserved=0).
    pub fn reset(&mut self, pid: PageId, page_type: PageType) {
        self.buf.fill(0);
        PageHeader::new(pid, page_type).write(&mut self.buf[..PAGE_HEADER_SIZE]);
    }

    /// Build a page from a full on-disk image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PAGE_SIZE {
            return Err(StorageError::InvalidPageSize {
                expected: PAGE_SIZE,
                actual: bytes.len(),
            });
        }
        let mut p = Self::zeroed();
        p.buf.copy_from_slice(bytes);
        Ok(p)
    }

    #[inline]
    pub fn header(&self) -> PageHeader {
        PageHeader::read(&self.buf[..PAGE_HEADER_SIZE])
    }

    #[inline]
    pub fn id(&self) -> PageId {
        self.header().page_id()
    }

    /// Unknown on-disk tags read back as `Invalid`.
    #[inline]
    pub fn page_type(&self) -> PageType {
        PageType::from_u16(self.header().page_type).unwrap_or(PageType::Invalid)
    }

    #[inline]
    pub fn lsn(&self) -> u32 {
        self.header().lsn
    }

    pub fn set_lsn(&mut self, lsn: u32) {
        self.buf[OFF_LSN..OFF_LSN + 4].copy_from_slice(&lsn.to_le_bytes());
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.buf[PAGE_HEADER_SIZE..]
    }

    #[inline]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buf[PAGE_HEADER_SIZE..]
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..]
    }

    #[inline]
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..]
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("header", &self.header())
            .finish_non_exhaustive()
    }
}
