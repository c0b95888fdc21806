use anyhow::Result;
use std::path::PathBuf;

use StrataDB::consts::PAGE_PAYLOAD_SIZE;
use StrataDB::heap::{append_record, records, TableHeap};
use StrataDB::page::PageId;
use StrataDB::tuple::{Tuple, Value};
use StrataDB::{EngineBuilder, StorageError};

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("strata-{}-{}-{}", prefix, pid, t))
}

#[test]
fn records_roll_over_to_next_page() -> Result<()> {
    let engine = EngineBuilder::from_default()
        .data_dir(unique_root("heap-rollover"))
        .pool_pages(4)
        .open()?;
    let heap = engine.table("events");
    let pool = engine.pool();

    let p0 = heap.append_record(pool, &[1u8; 10])?;
    let p1 = heap.append_record(pool, &[2u8; 20])?;
    let p2 = heap.append_record(pool, &vec![3u8; PAGE_PAYLOAD_SIZE - 40])?;
    let seg = heap.segment_id();
    assert_eq!(p0, PageId::new(seg, 0));
    assert_eq!(p1, PageId::new(seg, 0));
    assert_eq!(p2, PageId::new(seg, 1));

    let h = pool.fetch_page(PageId::new(seg, 0), false)?;
    assert_eq!(records(&h.read()).count(), 2);
    pool.unpin_page(h, false);
    let h = pool.fetch_page(PageId::new(seg, 1), false)?;
    assert_eq!(records(&h.read()).count(), 1);
    pool.unpin_page(h, false);

    let all = heap.scan_records(pool)?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[1], vec![2u8; 20]);
    Ok(())
}

#[test]
fn oversized_record_rejected() -> Result<()> {
    let engine = EngineBuilder::from_default()
        .data_dir(unique_root("heap-big"))
        .open()?;
    let heap = engine.table("t");
    let err = heap
        .append_record(engine.pool(), &vec![0u8; PAGE_PAYLOAD_SIZE])
        .unwrap_err();
    assert!(matches!(err, StorageError::RecordTooLarge { .. }));
    assert_eq!(engine.pool().page_count(heap.segment_id())?, 0);
    Ok(())
}

#[test]
fn rows_survive_reopen() -> Result<()> {
    let root = unique_root("heap-reopen");
    {
        let engine = EngineBuilder::from_default().data_dir(&root).pool_pages(2).open()?;
        let heap = engine.table("users");
        for i in 0..300 {
            let row = Tuple::new(vec![Value::Int(i), Value::Text(format!("user-{i}"))]);
            heap.insert(engine.pool(), &row)?;
        }
        engine.flush()?;
    }
    let engine = EngineBuilder::from_default().data_dir(&root).open()?;
    let rows = engine.table("users").scan(engine.pool())?;
    assert_eq!(rows.len(), 300);
    assert_eq!(rows[299].get(1), Some(&Value::Text("user-299".into())));
    assert_eq!(rows[7].get(0).map(|v| v.as_int().unwrap()), Some(7));
    Ok(())
}

#[test]
fn scan_sees_rows_on_pages_only_in_the_pool() -> Result<()> {
    let root = unique_root("heap-cached-tail");
    {
        let engine = EngineBuilder::from_default().data_dir(&root).pool_pages(8).open()?;
        let pool = engine.pool();
        let seg = 2u32;

        // Page 0 never existed on disk: the pool hands back a blank dirty page.
        let mut h = pool.fetch_page(PageId::new(seg, 0), true)?;
        assert!(append_record(&mut h.write(), b"row-1")?);
        pool.unpin_page(h, true);
        assert_eq!(pool.segment_manager().page_count(seg)?, 0);
        assert_eq!(pool.page_count(seg)?, 1);

        let heap = TableHeap::new(seg);
        assert_eq!(heap.scan_records(pool)?, vec![b"row-1".to_vec()]);

        assert_eq!(heap.append_record(pool, &[9u8; 4000])?, PageId::new(seg, 0));
        assert_eq!(heap.scan_records(pool)?.len(), 2);

        assert_eq!(heap.append_record(pool, &[8u8; 4000])?, PageId::new(seg, 1));
        assert_eq!(pool.segment_manager().page_count(seg)?, 2);
        assert_eq!(heap.scan_records(pool)?.len(), 3);
    }

    let engine = EngineBuilder::from_default().data_dir(&root).open()?;
    let all = TableHeap::new(2).scan_records(engine.pool())?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0], b"row-1".to_vec());
    Ok(())
}

#[test]
fn one_heap_per_table_name() -> Result<()> {
    let engine = EngineBuilder::from_default()
        .data_dir(unique_root("heap-shared"))
        .open()?;
    let a = engine.table("orders");
    let b = engine.table("orders");
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    assert!(!std::sync::Arc::ptr_eq(&a, &engine.table("users")));
    Ok(())
}
