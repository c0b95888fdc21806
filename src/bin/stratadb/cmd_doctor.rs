use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use StrataDB::consts::PAGE_SIZE;
use StrataDB::lock::{try_acquire, LockMode};
use StrataDB::metrics::{self, MetricsSnapshot};
use StrataDB::page::PageId;
use StrataDB::segment::SegmentManager;

#[derive(Serialize)]
struct Issue {
    segment_id: u32,
    page_number: Option<u32>,
    problem: String,
}

#[derive(Serialize)]
struct Report {
    ok: bool,
    segments: usize,
    pages_checked: u64,
    issues: Vec<Issue>,
    io: MetricsSnapshot,
}

pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    let _lock = try_acquire(&path, LockMode::Shared)?;
    let sm = SegmentManager::open(&path)?;

    let ids = sm.segment_ids()?;
    let mut issues = Vec::new();
    let mut pages_checked = 0u64;

    for &id in &ids {
        let len = std::fs::metadata(sm.segment_path(id))?.len();
        if len % PAGE_SIZE as u64 != 0 {
            issues.push(Issue {
                segment_id: id,
                page_number: None,
                problem: format!("size {} is not a multiple of {}", len, PAGE_SIZE),
            });
        }
        for n in 0..sm.page_count(id)? {
            pages_checked += 1;
            if let Err(e) = sm.read_page(PageId::new(id, n)) {
                issues.push(Issue {
                    segment_id: id,
                    page_number: Some(n),
                    problem: e.to_string(),
                });
            }
        }
    }

    let report = Report {
        ok: issues.is_empty(),
        segments: ids.len(),
        pages_checked,
        issues,
        io: metrics::snapshot(),
    };

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!(
            "doctor: {} segment(s), {} page(s) checked, {} issue(s)",
            report.segments,
            report.pages_checked,
            report.issues.len()
        );
        println!(
            "io: {} page read(s), {} page write(s)",
            report.io.seg_page_reads, report.io.seg_page_writes
        );
        for i in &report.issues {
            match i.page_number {
                Some(n) => println!("  seg {} page {}: {}", i.segment_id, n, i.problem),
                None => println!("  seg {}: {}", i.segment_id, i.problem),
            }
        }
    }

    if !report.ok {
        std::process::exit(2);
    }
    Ok(())
}
