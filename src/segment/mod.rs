//! segment: one file per segment, page-aligned reads and writes.
//!
//! Submodules:
//! - core.rs : SegmentManager: data directory, lazy open/create, shared lock.
//! - io.rs   : read_page / write_page / sync_all.
//! - alloc.rs: allocate_page / free_page / page_count.
//!
//! File name: `<root>/seg_<segment_id>.dat`; page N lives at byte offset
//! `N * PAGE_SIZE`. File sizes stay a multiple of `PAGE_SIZE`.

pub mod core;
pub mod io;
pub mod alloc;

pub use self::core::SegmentManager;
