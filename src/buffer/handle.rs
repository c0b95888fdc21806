//! PageHandle: a pinned frame handed out by the pool.
//!
//! The handle is the only way to reach page memory. `read()`/`write()` take the
//! frame's page latch for the guard's lifetime. Release it with
//! `BufferPool::unpin_page(handle, dirty)`; a handle dropped without that call
//! is unpinned on drop, dirty if `write()` was ever taken.

use std::fmt;
use std::sync::Arc;

use log::debug;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::page::{Page, PageId};

use super::frame::Frame;
use super::pool::PoolShared;

pub struct PageHandle {
    pub(crate) pool: Arc<PoolShared>,
    pub(crate) frame: Arc<Frame>,
    for_write: bool,
    wrote: bool,
    pub(crate) released: bool,
}

impl PageHandle {
    pub(crate) fn new(pool: Arc<PoolShared>, frame: Arc<Frame>, for_write: bool) -> Self {
        Self {
            pool,
            frame,
            for_write,
            wrote: false,
            released: false,
        }
    }

    #[inline]
    pub fn id(&self) -> PageId {
        self.frame.pid()
    }

    /// Intent the page was fetched with (advisory).
    #[inline]
    pub fn for_write(&self) -> bool {
        self.for_write
    }

    /// Shared access to the page image.
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.frame.page.read()
    }

    /// Exclusive access to the page image.
    pub fn write(&mut self) -> RwLockWriteGuard<'_, Page> {
        self.wrote = true;
        self.frame.page.write()
    }
}

impl Drop for PageHandle {
    fn drop(&mut self) {
        if !self.released {
            debug!(
                "page {} handle dropped without unpin_page (dirty={})",
                self.id(),
                self.wrote
            );
            self.pool.unpin(&self.frame, self.wrote);
        }
    }
}

impl fmt::Debug for PageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageHandle")
            .field("page", &self.id())
            .field("for_write", &self.for_write)
            .finish()
    }
}
