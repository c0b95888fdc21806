use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{
    OFF_LSN, OFF_PAGE_NUMBER, OFF_RESERVED, OFF_SEGMENT_ID, OFF_TYPE, PAGE_HEADER_SIZE,
    RESERVED_LEN,
};

use super::{PageId, PageType};

/// Decoded page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub segment_id: u32,
    pub page_number: u32,
    pub page_type: u16,
    pub lsn: u32,
    pub reserved: [u8; RESERVED_LEN],
}

impl PageHeader {
    pub fn new(pid: PageId, page_type: PageType) -> Self {
        Self {
            segment_id: pid.segment_id,
            page_number: pid.page_number,
            page_type: page_type.as_u16(),
            lsn: 0,
            reserved: [0; RESERVED_LEN],
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        PageId::new(self.segment_id, self.page_number)
    }

    /// Read the header from the first 16 bytes of `buf`.
    pub fn read(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= PAGE_HEADER_SIZE);
        let mut reserved = [0u8; RESERVED_LEN];
        reserved.copy_from_slice(&buf[OFF_RESERVED..OFF_RESERVED + RESERVED_LEN]);
        Self {
            segment_id: LittleEndian::read_u32(&buf[OFF_SEGMENT_ID..OFF_SEGMENT_ID + 4]),
            page_number: LittleEndian::read_u32(&buf[OFF_PAGE_NUMBER..OFF_PAGE_NUMBER + 4]),
            page_type: LittleEndian::read_u16(&buf[OFF_TYPE..OFF_TYPE + 2]),
            lsn: LittleEndian::read_u32(&buf[OFF_LSN..OFF_LSN + 4]),
            reserved,
        }
    }

    /// Write the header into the first 16 bytes of `buf`.
    pub fn write(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= PAGE_HEADER_SIZE);
        LittleEndian::write_u32(&mut buf[OFF_SEGMENT_ID..OFF_SEGMENT_ID + 4], self.segment_id);
        LittleEndian::write_u32(&mut buf[OFF_PAGE_NUMBER..OFF_PAGE_NUMBER + 4], self.page_number);
        LittleEndian::write_u16(&mut buf[OFF_TYPE..OFF_TYPE + 2], self.page_type);
        LittleEndian::write_u32(&mut buf[OFF_LSN..OFF_LSN + 4], self.lsn);
        buf[OFF_RESERVED..OFF_RESERVED + RESERVED_LEN].copy_from_slice(&self.reserved);
    }

    pub fn to_bytes(&self) -> [u8; PAGE_HEADER_SIZE] {
        let mut out = [0u8; PAGE_HEADER_SIZE];
        self.write(&mut out);
        out
    }
}
