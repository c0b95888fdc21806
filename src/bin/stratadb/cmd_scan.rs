use anyhow::{Context, Result};
use std::path::PathBuf;

use StrataDB::lock::{try_acquire, LockMode};

use crate::util::{open_engine, value_json};

pub fn exec(path: PathBuf, table: String, json: bool) -> Result<()> {
    let _lock = try_acquire(&path, LockMode::Shared)?;
    let engine = open_engine(&path)?;
    let heap = engine.table(&table);
    let rows = heap
        .scan(engine.pool())
        .with_context(|| format!("scan table '{}'", table))?;

    if json {
        let arr: Vec<serde_json::Value> = rows
            .iter()
            .map(|t| serde_json::Value::Array(t.values().iter().map(value_json).collect()))
            .collect();
        println!("{}", serde_json::to_string(&arr)?);
        return Ok(());
    }

    for t in &rows {
        println!("({})", t);
    }
    println!("-- {} row(s) in segment {}", rows.len(), heap.segment_id());
    Ok(())
}
