//! Shared format constants (pages, segments, data directory).

// -------- Pages --------
pub const PAGE_SIZE: usize = 4096;

/// Header layout (16 bytes, LE, no padding):
/// [segment_id u32][page_number u32][type u16][lsn u32][reserved 2]
pub const PAGE_HEADER_SIZE: usize = 16;
pub const PAGE_PAYLOAD_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE;

pub const OFF_SEGMENT_ID: usize = 0;
pub const OFF_PAGE_NUMBER: usize = 4;
pub const OFF_TYPE: usize = 8;
pub const OFF_LSN: usize = 10;
pub const OFF_RESERVED: usize = 14;
pub const RESERVED_LEN: usize = 2;

const _: () = assert!(OFF_RESERVED + RESERVED_LEN == PAGE_HEADER_SIZE);
const _: () = assert!(PAGE_HEADER_SIZE == 16);
const _: () = assert!(PAGE_HEADER_SIZE + PAGE_PAYLOAD_SIZE == PAGE_SIZE);

// -------- Row storage (inside payload) --------
/// used_bytes cursor (u32) at payload offset 0.
pub const USED_BYTES_LEN: usize = 4;
/// Per-record length prefix (u32).
pub const RECORD_LEN_PREFIX: usize = 4;
/// Largest record an empty page accepts: prefix + record + next-probe margin.
pub const MAX_RECORD_LEN: usize = PAGE_PAYLOAD_SIZE - USED_BYTES_LEN - RECORD_LEN_PREFIX;

// -------- Segments --------
pub const SEG_PREFIX: &str = "seg_";
pub const SEG_EXT: &str = "dat";

// -------- Data directory --------
/// Owned by the external catalog; listed here only so tools skip it.
pub const CATALOG_FILE: &str = "catalog.meta";
pub const LOCK_FILE: &str = "LOCK";
