//! BufferPool: fixed-capacity page cache with pinning and LRU eviction.
//!
//! Locking:
//! - One pool mutex guards the frame table, pin counts, dirty flags and LRU order.
//! - The disk read for a miss runs outside the pool mutex. The frame is
//!   pre-inserted as a pinned `Loading` placeholder; concurrent fetchers of the
//!   same page pin it and wait until it is populated.
//! - Eviction write-back and allocation run under the pool mutex
//!   (lock order: pool -> segment manager).
//! - Page memory is latched per frame (RwLock) and only reachable via a pinned
//!   `PageHandle`, so an unpinned frame's latch is always free.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::error::{Result, StorageError};
use crate::metrics::{
    record_pool_blank_page, record_pool_eviction, record_pool_exhausted, record_pool_hit,
    record_pool_miss, record_pool_write_back,
};
use crate::page::{Page, PageId, PageType};
use crate::segment::SegmentManager;

use super::frame::{Frame, LoadState};
use super::handle::PageHandle;
use super::lru::LruList;

struct Entry {
    frame: Arc<Frame>,
    pin_count: u32,
    dirty: bool,
}

struct PoolState {
    table: HashMap<u64, Entry>,
    lru: LruList,
}

pub(crate) struct PoolShared {
    capacity: usize,
    sm: Arc<SegmentManager>,
    state: Mutex<PoolState>,
}

/// The only cache of, and gateway to, page memory.
///
/// Every successful `fetch_page` / `fetch_or_allocate_page` / `allocate_page`
/// must be matched by one `unpin_page` (or the handle's drop).
pub struct BufferPool {
    shared: Arc<PoolShared>,
}

impl BufferPool {
    pub fn new(capacity: usize, sm: Arc<SegmentManager>) -> Self {
        info!("buffer pool: capacity={} page(s)", capacity);
        Self {
            shared: Arc::new(PoolShared {
                capacity,
                sm,
                state: Mutex::new(PoolState {
                    table: HashMap::with_capacity(capacity),
                    lru: LruList::with_capacity(capacity),
                }),
            }),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    #[inline]
    pub fn segment_manager(&self) -> &Arc<SegmentManager> {
        &self.shared.sm
    }

    /// Logical pages of a segment: allocated on disk, or cached past the
    /// disk tail (blank pages installed by a miss and not yet written back).
    pub fn page_count(&self, segment_id: u32) -> Result<u32> {
        let st = self.shared.state.lock();
        self.shared.page_count_locked(&st, segment_id)
    }

    /// Cached frames (pinned or not).
    pub fn len(&self) -> usize {
        self.shared.state.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_cached(&self, pid: PageId) -> bool {
        self.shared.state.lock().table.contains_key(&pid.key())
    }

    /// None if the page is not cached.
    pub fn pin_count(&self, pid: PageId) -> Option<u32> {
        self.shared
            .state
            .lock()
            .table
            .get(&pid.key())
            .map(|e| e.pin_count)
    }

    /// None if the page is not cached.
    pub fn is_dirty(&self, pid: PageId) -> Option<bool> {
        self.shared
            .state
            .lock()
            .table
            .get(&pid.key())
            .map(|e| e.dirty)
    }

    /// Fetch and pin a page.
    ///
    /// A page that does not exist on disk yet comes back as a blank
    /// `TableHeap` page, already marked dirty.
    pub fn fetch_page(&self, pid: PageId, for_write: bool) -> Result<PageHandle> {
        let key = pid.key();
        let mut st = self.shared.state.lock();

        if let Some(e) = st.table.get_mut(&key) {
            e.pin_count += 1;
            let frame = Arc::clone(&e.frame);
            st.lru.touch(key);
            drop(st);
            record_pool_hit();
            frame.wait_loaded()?;
            return Ok(PageHandle::new(Arc::clone(&self.shared), frame, for_write));
        }

        self.shared.make_room_locked(&mut st)?;
        let frame = Arc::new(Frame::loading(pid));
        st.table.insert(
            key,
            Entry {
                frame: Arc::clone(&frame),
                pin_count: 1,
                dirty: false,
            },
        );
        st.lru.push_front(key);
        drop(st);
        record_pool_miss();

        match self.shared.sm.read_page(pid) {
            Ok(page) => {
                *frame.page.write() = page;
            }
            Err(e) if e.is_page_not_found() => {
                frame.page.write().reset(pid, PageType::TableHeap);
                if let Some(en) = self.shared.state.lock().table.get_mut(&key) {
                    en.dirty = true;
                }
                record_pool_blank_page();
                debug!("page {} not on disk, installed blank page (for_write={})", pid, for_write);
            }
            Err(e) => {
                {
                    let mut st = self.shared.state.lock();
                    let same = st
                        .table
                        .get(&key)
                        .map(|en| Arc::ptr_eq(&en.frame, &frame))
                        .unwrap_or(false);
                    if same {
                        st.table.remove(&key);
                        st.lru.remove(key);
                    }
                }
                frame.finish_load(LoadState::Failed(e.to_string()));
                return Err(e);
            }
        }

        frame.finish_load(LoadState::Ready);
        Ok(PageHandle::new(Arc::clone(&self.shared), frame, for_write))
    }

    /// Like `fetch_page`, but a page at or below the logical tail is first
    /// materialized on disk. Pages cached past the disk tail are allocated
    /// along the way; a page number beyond the logical tail is a gap and
    /// fails with `AllocationMismatch`.
    pub fn fetch_or_allocate_page(&self, pid: PageId, for_write: bool) -> Result<PageHandle> {
        {
            let st = self.shared.state.lock();
            let logical = self.shared.page_count_locked(&st, pid.segment_id)?;
            if pid.page_number > logical {
                return Err(StorageError::AllocationMismatch {
                    segment_id: pid.segment_id,
                    expected: pid.page_number,
                    actual: logical,
                });
            }

            let mut on_disk = self.shared.sm.page_count(pid.segment_id)?;
            while on_disk <= pid.page_number {
                let got = self.shared.sm.allocate_page(pid.segment_id)?;
                if got.page_number != on_disk {
                    return Err(StorageError::AllocationMismatch {
                        segment_id: pid.segment_id,
                        expected: on_disk,
                        actual: got.page_number,
                    });
                }
                on_disk += 1;
            }
        }
        self.fetch_page(pid, for_write)
    }

    /// Allocate a new page on disk and return it pinned and dirty.
    pub fn allocate_page(&self, segment_id: u32) -> Result<PageHandle> {
        let mut st = self.shared.state.lock();
        self.shared.make_room_locked(&mut st)?;

        let pid = self.shared.sm.allocate_page(segment_id)?;
        let key = pid.key();

        // Already cached (fetched before it existed on disk): the cached image wins.
        if let Some(e) = st.table.get_mut(&key) {
            e.pin_count += 1;
            e.dirty = true;
            let frame = Arc::clone(&e.frame);
            st.lru.touch(key);
            drop(st);
            frame.wait_loaded()?;
            return Ok(PageHandle::new(Arc::clone(&self.shared), frame, true));
        }

        let frame = Arc::new(Frame::ready(Page::new(pid, PageType::TableHeap)));
        st.table.insert(
            key,
            Entry {
                frame: Arc::clone(&frame),
                pin_count: 1,
                dirty: true,
            },
        );
        st.lru.push_front(key);
        Ok(PageHandle::new(Arc::clone(&self.shared), frame, true))
    }

    /// Release one pin; `is_dirty` marks the frame for write-back. Never flushes.
    pub fn unpin_page(&self, mut handle: PageHandle, is_dirty: bool) {
        handle.released = true;
        self.shared.unpin(&handle.frame, is_dirty);
    }

    /// Write the page back if dirty. The handle stays pinned.
    pub fn flush_page(&self, handle: &PageHandle) -> Result<()> {
        self.shared.flush_frame(&handle.frame)
    }

    /// Write back a cached page by id; no-op if it is not cached.
    pub fn flush_page_id(&self, pid: PageId) -> Result<()> {
        let frame = {
            let mut st = self.shared.state.lock();
            match st.table.get_mut(&pid.key()) {
                Some(e) => {
                    e.pin_count += 1;
                    Arc::clone(&e.frame)
                }
                None => return Ok(()),
            }
        };
        let handle = PageHandle::new(Arc::clone(&self.shared), frame, false);
        let res = handle
            .frame
            .wait_loaded()
            .and_then(|_| self.shared.flush_frame(&handle.frame));
        self.unpin_page(handle, false);
        res
    }

    /// Write back every dirty frame.
    pub fn flush_all(&self) -> Result<usize> {
        self.shared.flush_all()
    }
}

impl PoolShared {
    /// max(disk pages, highest cached page number + 1). Caller holds the pool lock.
    fn page_count_locked(&self, st: &PoolState, segment_id: u32) -> Result<u32> {
        let on_disk = self.sm.page_count(segment_id)?;
        let cached = st
            .table
            .keys()
            .map(|&k| PageId::from_key(k))
            .filter(|p| p.segment_id == segment_id)
            .map(|p| p.page_number.saturating_add(1))
            .max()
            .unwrap_or(0);
        Ok(on_disk.max(cached))
    }

    pub(crate) fn unpin(&self, frame: &Arc<Frame>, is_dirty: bool) {
        let mut st = self.state.lock();
        match st.table.get_mut(&frame.pid().key()) {
            Some(e) if Arc::ptr_eq(&e.frame, frame) => {
                if e.pin_count == 0 {
                    warn!("unpin of page {} with pin_count 0", frame.pid());
                }
                e.pin_count = e.pin_count.saturating_sub(1);
                if is_dirty {
                    e.dirty = true;
                }
            }
            _ => warn!("unpin of page {} that is no longer cached", frame.pid()),
        }
    }

    /// Evict until there is room for one more frame. Caller holds the pool lock.
    fn make_room_locked(&self, st: &mut PoolState) -> Result<()> {
        while st.table.len() >= self.capacity {
            let victim = st
                .lru
                .iter_lru()
                .find(|k| st.table.get(k).map(|e| e.pin_count == 0).unwrap_or(false));

            let key = match victim {
                Some(k) => k,
                None => {
                    record_pool_exhausted();
                    return Err(StorageError::BufferPoolExhausted {
                        capacity: self.capacity,
                    });
                }
            };

            if let Some(e) = st.table.get_mut(&key) {
                if e.dirty {
                    // pin_count == 0: no handle exists, so the latch is free.
                    self.sm.write_page(&e.frame.page.read())?;
                    e.dirty = false;
                    record_pool_write_back();
                }
            }
            st.table.remove(&key);
            st.lru.remove(key);
            record_pool_eviction();
            debug!("evicted page {}", PageId::from_key(key));
        }
        Ok(())
    }

    /// Write back one frame the caller keeps pinned.
    fn flush_frame(&self, frame: &Arc<Frame>) -> Result<()> {
        let key = frame.pid().key();
        {
            let mut st = self.state.lock();
            match st.table.get_mut(&key) {
                Some(e) if Arc::ptr_eq(&e.frame, frame) && e.dirty => e.dirty = false,
                _ => return Ok(()),
            }
        }

        // Recursive read: the caller may hold a read guard on this same handle.
        let res = self.sm.write_page(&frame.page.read_recursive());
        match res {
            Ok(()) => {
                record_pool_write_back();
                Ok(())
            }
            Err(err) => {
                if let Some(e) = self.state.lock().table.get_mut(&key) {
                    e.dirty = true;
                }
                Err(err)
            }
        }
    }

    fn flush_all(&self) -> Result<usize> {
        let frames: Vec<Arc<Frame>> = {
            let mut st = self.state.lock();
            st.table
                .values_mut()
                .filter(|e| e.dirty)
                .map(|e| {
                    e.pin_count += 1;
                    Arc::clone(&e.frame)
                })
                .collect()
        };

        let mut flushed = 0usize;
        let mut first_err = None;
        for frame in &frames {
            let res = frame.wait_loaded().and_then(|_| self.flush_frame(frame));
            self.unpin(frame, false);
            match res {
                Ok(()) => flushed += 1,
                Err(e) => {
                    warn!("flush of page {} failed: {}", frame.pid(), e);
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(flushed),
        }
    }
}

impl Drop for PoolShared {
    fn drop(&mut self) {
        match self.flush_all() {
            Ok(0) => {}
            Ok(n) => info!("buffer pool shutdown: flushed {} dirty page(s)", n),
            Err(e) => warn!("buffer pool shutdown flush failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_root(prefix: &str) -> PathBuf {
        let t = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let root = std::env::temp_dir().join(format!("strata-{}-{}-{}", prefix, std::process::id(), t));
        std::fs::create_dir_all(&root).unwrap();
        root
    }

    fn pool(prefix: &str, cap: usize) -> BufferPool {
        let sm = SegmentManager::open(&unique_root(prefix)).unwrap();
        BufferPool::new(cap, Arc::new(sm))
    }

    #[test]
    fn missing_page_is_blank_and_dirty() {
        let bp = pool("pool-blank", 4);
        let pid = PageId::new(3, 0);
        let h = bp.fetch_page(pid, false).unwrap();
        assert_eq!(h.read().id(), pid);
        assert_eq!(h.read().page_type(), PageType::TableHeap);
        assert_eq!(bp.pin_count(pid), Some(1));
        assert_eq!(bp.is_dirty(pid), Some(true));
        bp.unpin_page(h, false);
        assert_eq!(bp.pin_count(pid), Some(0));
    }

    #[test]
    fn pins_accumulate_and_drop_unpins() {
        let bp = pool("pool-pins", 2);
        let pid = PageId::new(1, 0);
        let a = bp.fetch_page(pid, false).unwrap();
        let b = bp.fetch_page(pid, false).unwrap();
        assert_eq!(bp.pin_count(pid), Some(2));
        drop(a);
        assert_eq!(bp.pin_count(pid), Some(1));
        bp.unpin_page(b, false);
        assert_eq!(bp.pin_count(pid), Some(0));
    }

    #[test]
    fn exhausted_when_all_pinned() {
        let bp = pool("pool-exhaust", 1);
        let h = bp.allocate_page(1).unwrap();
        let err = bp.fetch_page(PageId::new(1, 5), false).unwrap_err();
        assert!(matches!(err, StorageError::BufferPoolExhausted { capacity: 1 }));
        bp.unpin_page(h, true);
        let h2 = bp.fetch_page(PageId::new(1, 5), false).unwrap();
        assert_eq!(bp.len(), 1);
        bp.unpin_page(h2, false);
    }

    #[test]
    fn eviction_writes_back_dirty_page() {
        let bp = pool("pool-evict", 1);
        let mut h = bp.allocate_page(2).unwrap();
        let pid = h.id();
        h.write().payload_mut()[0] = 0xAB;
        bp.unpin_page(h, true);

        let other = bp.allocate_page(2).unwrap();
        assert!(!bp.is_cached(pid));
        bp.unpin_page(other, false);

        let on_disk = bp.segment_manager().read_page(pid).unwrap();
        assert_eq!(on_disk.payload()[0], 0xAB);
    }

    #[test]
    fn flush_page_clears_dirty() {
        let bp = pool("pool-flush", 2);
        let mut h = bp.allocate_page(9).unwrap();
        h.write().payload_mut()[10] = 7;
        bp.flush_page(&h).unwrap();
        assert_eq!(bp.is_dirty(h.id()), Some(false));
        let pid = h.id();
        bp.unpin_page(h, false);
        assert_eq!(bp.segment_manager().read_page(pid).unwrap().payload()[10], 7);
        bp.flush_page_id(PageId::new(9, 42)).unwrap();
    }

    #[test]
    fn fetch_or_allocate_rejects_gap() {
        let bp = pool("pool-gap", 2);
        let err = bp.fetch_or_allocate_page(PageId::new(4, 3), true).unwrap_err();
        assert!(matches!(
            err,
            StorageError::AllocationMismatch { expected: 3, actual: 0, .. }
        ));
        assert_eq!(bp.segment_manager().page_count(4).unwrap(), 0);

        let h = bp.fetch_or_allocate_page(PageId::new(4, 0), true).unwrap();
        bp.unpin_page(h, false);
        let h = bp.fetch_or_allocate_page(PageId::new(4, 1), true).unwrap();
        assert_eq!(bp.segment_manager().page_count(4).unwrap(), 2);
        bp.unpin_page(h, false);
    }

    #[test]
    fn cached_blank_pages_count_and_get_materialized() {
        let bp = pool("pool-logical", 4);
        let h = bp.fetch_page(PageId::new(6, 0), true).unwrap();
        bp.unpin_page(h, true);
        assert_eq!(bp.segment_manager().page_count(6).unwrap(), 0);
        assert_eq!(bp.page_count(6).unwrap(), 1);

        let h = bp.fetch_or_allocate_page(PageId::new(6, 1), true).unwrap();
        assert_eq!(bp.segment_manager().page_count(6).unwrap(), 2);
        assert_eq!(bp.page_count(6).unwrap(), 2);
        bp.unpin_page(h, false);
    }
}
