//! Engine: wires a SegmentManager and a BufferPool from one StrataConfig.

use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;

use crate::buffer::BufferPool;
use crate::config::{EngineBuilder, StrataConfig};
use crate::error::Result;
use crate::heap::{segment_id_for_table, TableHeap};
use crate::segment::SegmentManager;

pub struct Engine {
    cfg: StrataConfig,
    sm: Arc<SegmentManager>,
    pool: BufferPool,
    // One heap per segment so appends share its append lock.
    heaps: Mutex<HashMap<u32, Arc<TableHeap>>>,
}

impl Engine {
    pub fn open(cfg: StrataConfig) -> Result<Self> {
        let sm = Arc::new(SegmentManager::open_with_config(&cfg)?);
        let capacity = if cfg.pool_pages == 0 {
            warn!("pool_pages=0 is unusable, using 1 frame");
            1
        } else {
            cfg.pool_pages
        };
        let pool = BufferPool::new(capacity, Arc::clone(&sm));
        info!("engine open: {}", cfg);
        Ok(Self {
            cfg,
            sm,
            pool,
            heaps: Mutex::new(HashMap::new()),
        })
    }

    /// Builder seeded from the environment.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &StrataConfig {
        &self.cfg
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn segments(&self) -> &Arc<SegmentManager> {
        &self.sm
    }

    /// Heap for a table name, placed by `segment_id_for_table`. Repeated
    /// calls for the same segment return the same heap.
    pub fn table(&self, name: &str) -> Arc<TableHeap> {
        let segment_id = segment_id_for_table(name);
        let mut heaps = self.heaps.lock();
        Arc::clone(
            heaps
                .entry(segment_id)
                .or_insert_with(|| Arc::new(TableHeap::new(segment_id))),
        )
    }

    /// Write back dirty frames, then fsync open segments if data_fsync is on.
    pub fn flush(&self) -> Result<usize> {
        let n = self.pool.flush_all()?;
        if self.sm.data_fsync() {
            self.sm.sync_all()?;
        }
        Ok(n)
    }
}
