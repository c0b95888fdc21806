use anyhow::{Context, Result};
use std::path::PathBuf;

use StrataDB::lock::{try_acquire, LockMode};
use StrataDB::tuple::Tuple;

use crate::util::{open_engine, parse_value_arg};

pub fn exec(path: PathBuf, table: String, values: Vec<String>) -> Result<()> {
    let _lock = try_acquire(&path, LockMode::Exclusive)?;

    let values = values
        .iter()
        .map(|v| parse_value_arg(v))
        .collect::<Result<Vec<_>>>()?;
    let tuple = Tuple::new(values);

    let engine = open_engine(&path)?;
    let heap = engine.table(&table);
    let pid = heap
        .insert(engine.pool(), &tuple)
        .with_context(|| format!("append to table '{}'", table))?;
    engine.flush()?;

    println!(
        "appended to {} (segment {}) at page {}: ({})",
        table,
        heap.segment_id(),
        pid.page_number,
        tuple
    );
    Ok(())
}
