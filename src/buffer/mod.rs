//! Buffer management: a fixed number of in-memory frames caching segment
//! pages, handed out as pinned `PageHandle`s and evicted in LRU order.

mod frame;
mod lru;

pub mod handle;
pub mod pool;

pub use handle::PageHandle;
pub use pool::BufferPool;
