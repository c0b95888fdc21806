//! Buffer pool frame: the cached page image plus its load state.
//!
//! Pin count and dirty flag are not stored here; they live in the pool table
//! and change only under the pool lock.

use parking_lot::{Condvar, Mutex, RwLock};

use crate::error::{Result, StorageError};
use crate::page::{Page, PageId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoadState {
    /// Placeholder: inserted in the table, disk read still in flight.
    Loading,
    Ready,
    Failed(String),
}

pub(crate) struct Frame {
    pid: PageId,
    pub(crate) page: RwLock<Page>,
    state: Mutex<LoadState>,
    loaded: Condvar,
}

impl Frame {
    /// Placeholder for a miss; populated by `finish_load`.
    pub(crate) fn loading(pid: PageId) -> Self {
        Self {
            pid,
            page: RwLock::new(Page::zeroed()),
            state: Mutex::new(LoadState::Loading),
            loaded: Condvar::new(),
        }
    }

    /// Frame that is ready immediately (fresh allocation).
    pub(crate) fn ready(page: Page) -> Self {
        Self {
            pid: page.id(),
            page: RwLock::new(page),
            state: Mutex::new(LoadState::Ready),
            loaded: Condvar::new(),
        }
    }

    #[inline]
    pub(crate) fn pid(&self) -> PageId {
        self.pid
    }

    pub(crate) fn finish_load(&self, state: LoadState) {
        debug_assert!(state != LoadState::Loading);
        let mut st = self.state.lock();
        *st = state;
        self.loaded.notify_all();
    }

    /// Block until the placeholder is populated.
    pub(crate) fn wait_loaded(&self) -> Result<()> {
        let mut st = self.state.lock();
        loop {
            match &*st {
                LoadState::Loading => self.loaded.wait(&mut st),
                LoadState::Ready => return Ok(()),
                LoadState::Failed(reason) => {
                    return Err(StorageError::LoadFailed {
                        segment_id: self.pid.segment_id,
                        page_number: self.pid.page_number,
                        reason: reason.clone(),
                    })
                }
            }
        }
    }
}
