#![allow(non_snake_case)]

// Layout and codecs
pub mod consts;
pub mod error;
pub mod page;
pub mod tuple;

// Storage
pub mod segment;
pub mod buffer;
pub mod heap;

// Wiring
pub mod config;
pub mod engine;
pub mod lock;
pub mod metrics;

pub use buffer::{BufferPool, PageHandle};
pub use config::{EngineBuilder, StrataConfig};
pub use engine::Engine;
pub use error::{Result, StorageError};
pub use heap::{segment_id_for_table, TableHeap};
pub use page::{Page, PageHeader, PageId, PageType};
pub use segment::SegmentManager;
pub use tuple::{Tuple, Value};
