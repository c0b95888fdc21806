use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use StrataDB::consts::PAGE_SIZE;
use StrataDB::page::{PageId, PageType};
use StrataDB::segment::SegmentManager;
use StrataDB::StorageError;

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("strata-{}-{}-{}", prefix, pid, t))
}

#[test]
fn allocations_are_sequential_and_page_aligned() -> Result<()> {
    let root = unique_root("seg-alloc");
    let sm = SegmentManager::open(&root)?;

    for n in 0..8u32 {
        let pid = sm.allocate_page(5)?;
        assert_eq!(pid, PageId::new(5, n));
        let len = fs::metadata(sm.segment_path(5))?.len();
        assert_eq!(len, (n as u64 + 1) * PAGE_SIZE as u64);
    }
    assert_eq!(sm.page_count(5)?, 8);
    assert_eq!(sm.page_count(6)?, 0);

    let page = sm.read_page(PageId::new(5, 3))?;
    assert_eq!(page.id(), PageId::new(5, 3));
    assert_eq!(page.page_type(), PageType::TableHeap);
    assert!(page.payload().iter().all(|b| *b == 0));
    Ok(())
}

#[test]
fn read_past_tail_is_page_not_found() -> Result<()> {
    let root = unique_root("seg-missing");
    let sm = SegmentManager::open(&root)?;
    sm.allocate_page(1)?;

    let err = sm.read_page(PageId::new(1, 1)).unwrap_err();
    assert!(err.is_page_not_found());
    let err = sm.read_page(PageId::new(77, 0)).unwrap_err();
    assert!(err.is_page_not_found());
    Ok(())
}

#[test]
fn write_then_read_persists_across_reopen() -> Result<()> {
    let root = unique_root("seg-reopen");
    {
        let sm = SegmentManager::open(&root)?;
        let pid = sm.allocate_page(2)?;
        let mut page = sm.read_page(pid)?;
        page.payload_mut()[..5].copy_from_slice(b"hello");
        page.set_lsn(9);
        sm.write_page(&page)?;
    }
    let sm = SegmentManager::open(&root)?;
    let page = sm.read_page(PageId::new(2, 0))?;
    assert_eq!(&page.payload()[..5], b"hello");
    assert_eq!(page.lsn(), 9);
    assert_eq!(sm.segment_ids()?, vec![2]);
    Ok(())
}

#[test]
fn mismatched_header_is_corrupt() -> Result<()> {
    let root = unique_root("seg-corrupt");
    let sm = SegmentManager::open(&root)?;
    sm.allocate_page(3)?;
    sm.allocate_page(3)?;

    // Copy page 0's image over page 1.
    let mut patched = fs::read(sm.segment_path(3))?;
    patched.copy_within(0..PAGE_SIZE, PAGE_SIZE);
    drop(sm);
    fs::write(root.join("seg_3.dat"), &patched)?;

    let sm = SegmentManager::open(&root)?;
    let err = sm.read_page(PageId::new(3, 1)).unwrap_err();
    assert!(matches!(err, StorageError::CorruptEncoding(_)));
    Ok(())
}

#[test]
fn zero_filled_first_page_is_page_not_found() -> Result<()> {
    let root = unique_root("seg-zero-hole");
    fs::create_dir_all(&root)?;
    fs::write(root.join("seg_4.dat"), vec![0u8; 2 * PAGE_SIZE])?;

    let sm = SegmentManager::open(&root)?;
    assert_eq!(sm.page_count(4)?, 2);
    for n in 0..2 {
        let err = sm.read_page(PageId::new(4, n)).unwrap_err();
        assert!(err.is_page_not_found(), "page {}: {}", n, err);
    }
    Ok(())
}
