use anyhow::{anyhow, Context, Result};
use std::path::Path;

use StrataDB::config::StrataConfig;
use StrataDB::tuple::Value;
use StrataDB::Engine;

/// `i:<int>` or `t:<text>`.
pub fn parse_value_arg(arg: &str) -> Result<Value> {
    if let Some(n) = arg.strip_prefix("i:") {
        let v = n
            .trim()
            .parse::<i32>()
            .with_context(|| format!("invalid int value '{}'", n))?;
        return Ok(Value::Int(v));
    }
    if let Some(s) = arg.strip_prefix("t:") {
        return Ok(Value::Text(s.to_string()));
    }
    Err(anyhow!("value '{}' must be prefixed with i: or t:", arg))
}

/// Engine over `path`; other settings come from the environment.
pub fn open_engine(path: &Path) -> Result<Engine> {
    let cfg = StrataConfig::from_env().with_data_dir(path);
    Engine::open(cfg).with_context(|| format!("open data dir {}", path.display()))
}

pub fn value_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Int(i) => serde_json::json!({ "int": i }),
        Value::Text(s) => serde_json::json!({ "text": s }),
    }
}
