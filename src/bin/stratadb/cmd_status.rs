use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use StrataDB::consts::PAGE_SIZE;
use StrataDB::lock::{try_acquire, LockMode};
use StrataDB::segment::SegmentManager;

#[derive(Serialize)]
struct SegmentStatus {
    segment_id: u32,
    pages: u32,
    bytes: u64,
}

#[derive(Serialize)]
struct Status {
    path: String,
    page_size: usize,
    segments: Vec<SegmentStatus>,
    total_pages: u64,
}

pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    let _lock = try_acquire(&path, LockMode::Shared)?;
    let sm = SegmentManager::open(&path)?;

    let mut segments = Vec::new();
    for id in sm.segment_ids()? {
        let bytes = std::fs::metadata(sm.segment_path(id))?.len();
        segments.push(SegmentStatus {
            segment_id: id,
            pages: sm.page_count(id)?,
            bytes,
        });
    }
    let status = Status {
        path: path.display().to_string(),
        page_size: PAGE_SIZE,
        total_pages: segments.iter().map(|s| s.pages as u64).sum(),
        segments,
    };

    if json {
        println!("{}", serde_json::to_string(&status)?);
        return Ok(());
    }

    println!("path        = {}", status.path);
    println!("page_size   = {}", status.page_size);
    println!("segments    = {}", status.segments.len());
    println!("total_pages = {}", status.total_pages);
    for s in &status.segments {
        println!("  seg {:>10}: {:>6} page(s), {} B", s.segment_id, s.pages, s.bytes);
    }
    Ok(())
}
