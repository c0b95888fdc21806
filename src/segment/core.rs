//! segment/core: SegmentManager structure, open(), segment table helpers.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use log::{debug, info};
use parking_lot::Mutex;

use crate::config::StrataConfig;
use crate::consts::{SEG_EXT, SEG_PREFIX};
use crate::error::{Result, StorageError};

/// Owner of every open segment file.
///
/// One mutex guards the segment table and all physical I/O, so every
/// read/write/allocate call is serialized engine-wide.
pub struct SegmentManager {
    root: PathBuf,
    // Whether write_page calls sync_data before returning.
    pub(crate) data_fsync: bool,
    pub(crate) segments: Mutex<HashMap<u32, File>>,
}

impl SegmentManager {
    /// Open (and create if missing) a data directory. fsync is off.
    pub fn open(root: &Path) -> Result<Self> {
        Self::open_with_fsync(root, false)
    }

    pub fn open_with_config(cfg: &StrataConfig) -> Result<Self> {
        Self::open_with_fsync(&cfg.data_dir, cfg.data_fsync)
    }

    pub fn open_with_fsync(root: &Path, data_fsync: bool) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        info!(
            "segment manager open: root={}, data_fsync={}",
            root.display(),
            data_fsync
        );
        Ok(Self {
            root: root.to_path_buf(),
            data_fsync,
            segments: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_fsync(&self) -> bool {
        self.data_fsync
    }

    /// Path of the backing file for a segment.
    pub fn segment_path(&self, segment_id: u32) -> PathBuf {
        self.root
            .join(format!("{}{}.{}", SEG_PREFIX, segment_id, SEG_EXT))
    }

    /// Segment ids that have a file on disk, ascending.
    pub fn segment_ids(&self) -> Result<Vec<u32>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(id) = parse_segment_file_name(&name.to_string_lossy()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Get the open handle for a segment, creating the file on first touch.
    /// Caller holds the segment table lock.
    pub(crate) fn segment_locked<'a>(
        &self,
        table: &'a mut HashMap<u32, File>,
        segment_id: u32,
    ) -> Result<&'a mut File> {
        if !table.contains_key(&segment_id) {
            let path = self.segment_path(segment_id);
            let f = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)
                .map_err(|e| StorageError::io(segment_id, &path, e))?;
            debug!("segment {} opened at {}", segment_id, path.display());
            table.insert(segment_id, f);
        }
        table
            .get_mut(&segment_id)
            .ok_or_else(|| StorageError::corrupt(format!("segment {segment_id} vanished")))
    }
}

impl Drop for SegmentManager {
    fn drop(&mut self) {
        let n = self.segments.get_mut().len();
        if n > 0 {
            debug!("segment manager closing {} segment(s)", n);
        }
    }
}

/// `seg_<id>.dat` -> id
pub fn parse_segment_file_name(name: &str) -> Option<u32> {
    name.strip_prefix(SEG_PREFIX)?
        .strip_suffix(SEG_EXT)?
        .strip_suffix('.')?
        .parse::<u32>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::parse_segment_file_name;

    #[test]
    fn segment_file_names() {
        assert_eq!(parse_segment_file_name("seg_0.dat"), Some(0));
        assert_eq!(parse_segment_file_name("seg_4294967295.dat"), Some(u32::MAX));
        assert_eq!(parse_segment_file_name("seg_x.dat"), None);
        assert_eq!(parse_segment_file_name("seg_1.bak"), None);
        assert_eq!(parse_segment_file_name("catalog.meta"), None);
    }
}
