//! Lightweight global metrics for StrataDB.
//!
//! Thread-safe atomic counters for:
//! - Buffer pool (hits, misses, evictions, write-backs)
//! - Segment I/O (reads, writes, allocations)

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// ----- Buffer pool -----
static POOL_HITS: AtomicU64 = AtomicU64::new(0);
static POOL_MISSES: AtomicU64 = AtomicU64::new(0);
static POOL_EVICTIONS: AtomicU64 = AtomicU64::new(0);
static POOL_WRITE_BACKS: AtomicU64 = AtomicU64::new(0);
static POOL_BLANK_PAGES: AtomicU64 = AtomicU64::new(0);
static POOL_EXHAUSTED: AtomicU64 = AtomicU64::new(0);

// ----- Segments -----
static SEG_PAGE_READS: AtomicU64 = AtomicU64::new(0);
static SEG_PAGE_WRITES: AtomicU64 = AtomicU64::new(0);
static SEG_PAGE_ALLOCS: AtomicU64 = AtomicU64::new(0);
static SEG_FSYNC_CALLS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    // Buffer pool
    pub pool_hits: u64,
    pub pool_misses: u64,
    pub pool_evictions: u64,
    pub pool_write_backs: u64,
    pub pool_blank_pages: u64,
    pub pool_exhausted: u64,

    // Segments
    pub seg_page_reads: u64,
    pub seg_page_writes: u64,
    pub seg_page_allocs: u64,
    pub seg_fsync_calls: u64,
}

impl MetricsSnapshot {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.pool_hits + self.pool_misses;
        if total == 0 {
            0.0
        } else {
            self.pool_hits as f64 / total as f64
        }
    }
}

// ----- Recorders (Buffer pool) -----
pub fn record_pool_hit() {
    POOL_HITS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_pool_miss() {
    POOL_MISSES.fetch_add(1, Ordering::Relaxed);
}
pub fn record_pool_eviction() {
    POOL_EVICTIONS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_pool_write_back() {
    POOL_WRITE_BACKS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_pool_blank_page() {
    POOL_BLANK_PAGES.fetch_add(1, Ordering::Relaxed);
}
pub fn record_pool_exhausted() {
    POOL_EXHAUSTED.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Segments) -----
pub fn record_seg_read() {
    SEG_PAGE_READS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_seg_write() {
    SEG_PAGE_WRITES.fetch_add(1, Ordering::Relaxed);
}
pub fn record_seg_alloc() {
    SEG_PAGE_ALLOCS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_seg_fsync() {
    SEG_FSYNC_CALLS.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        pool_hits: POOL_HITS.load(Ordering::Relaxed),
        pool_misses: POOL_MISSES.load(Ordering::Relaxed),
        pool_evictions: POOL_EVICTIONS.load(Ordering::Relaxed),
        pool_write_backs: POOL_WRITE_BACKS.load(Ordering::Relaxed),
        pool_blank_pages: POOL_BLANK_PAGES.load(Ordering::Relaxed),
        pool_exhausted: POOL_EXHAUSTED.load(Ordering::Relaxed),

        seg_page_reads: SEG_PAGE_READS.load(Ordering::Relaxed),
        seg_page_writes: SEG_PAGE_WRITES.load(Ordering::Relaxed),
        seg_page_allocs: SEG_PAGE_ALLOCS.load(Ordering::Relaxed),
        seg_fsync_calls: SEG_FSYNC_CALLS.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    POOL_HITS.store(0, Ordering::Relaxed);
    POOL_MISSES.store(0, Ordering::Relaxed);
    POOL_EVICTIONS.store(0, Ordering::Relaxed);
    POOL_WRITE_BACKS.store(0, Ordering::Relaxed);
    POOL_BLANK_PAGES.store(0, Ordering::Relaxed);
    POOL_EXHAUSTED.store(0, Ordering::Relaxed);

    SEG_PAGE_READS.store(0, Ordering::Relaxed);
    SEG_PAGE_WRITES.store(0, Ordering::Relaxed);
    SEG_PAGE_ALLOCS.store(0, Ordering::Relaxed);
    SEG_FSYNC_CALLS.store(0, Ordering::Relaxed);
}
