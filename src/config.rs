//! Centralized configuration and builder for StrataDB.
//!
//! - StrataConfig::from_env() reads the STRATA_* variables.
//! - EngineBuilder starts from env (or clean defaults) and produces the
//!   StrataConfig that Engine::open consumes.
//!
//! Defaults:
//! - data_dir = ./data
//! - pool_pages = 256
//! - data_fsync = false (write_page flushes to the OS only)

use std::fmt;
use std::path::{Path, PathBuf};

use crate::engine::Engine;
use crate::error::Result;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_POOL_PAGES: usize = 256;

/// Top-level configuration for the storage core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrataConfig {
    /// Directory holding seg_<id>.dat files.
    /// Env: STRATA_DATA_DIR (default ./data)
    pub data_dir: PathBuf,

    /// Buffer pool capacity in frames.
    /// Env: STRATA_POOL_PAGES (default 256; 0 is ignored)
    pub pool_pages: usize,

    /// Whether write_page calls sync_data before returning.
    /// Env: STRATA_DATA_FSYNC (default false; "1|true|on|yes" => true)
    pub data_fsync: bool,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            pool_pages: DEFAULT_POOL_PAGES,
            data_fsync: false,
        }
    }
}

fn parse_flag(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

impl StrataConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same parsing as `from_env`, over an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = get("STRATA_DATA_DIR") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.data_dir = PathBuf::from(s);
            }
        }

        if let Some(v) = get("STRATA_POOL_PAGES") {
            if let Ok(n) = v.trim().parse::<usize>() {
                if n > 0 {
                    cfg.pool_pages = n;
                }
            }
        }

        if let Some(v) = get("STRATA_DATA_FSYNC") {
            cfg.data_fsync = parse_flag(&v);
        }

        cfg
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_pool_pages(mut self, pages: usize) -> Self {
        self.pool_pages = pages;
        self
    }

    pub fn with_data_fsync(mut self, on: bool) -> Self {
        self.data_fsync = on;
        self
    }

    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for StrataConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StrataConfig {{ data_dir: {}, pool_pages: {}, data_fsync: {} }}",
            self.data_dir.display(),
            self.pool_pages,
            self.data_fsync,
        )
    }
}

/// Builder returned by `Engine::builder()`.
#[derive(Clone, Debug)]
pub struct EngineBuilder {
    cfg: StrataConfig,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        // Env first, explicit setters override.
        Self {
            cfg: StrataConfig::from_env(),
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: StrataConfig::default(),
        }
    }

    pub fn data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cfg.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn pool_pages(mut self, pages: usize) -> Self {
        self.cfg.pool_pages = pages;
        self
    }

    pub fn data_fsync(mut self, on: bool) -> Self {
        self.cfg.data_fsync = on;
        self
    }

    pub fn build(self) -> StrataConfig {
        self.cfg
    }

    pub fn open(self) -> Result<Engine> {
        Engine::open(self.cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn defaults_when_env_empty() {
        let cfg = StrataConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, StrataConfig::default());
        assert_eq!(cfg.pool_pages, 256);
        assert!(!cfg.data_fsync);
    }

    #[test]
    fn env_values_parsed() {
        let cfg = StrataConfig::from_lookup(lookup(&[
            ("STRATA_DATA_DIR", " /tmp/strata "),
            ("STRATA_POOL_PAGES", "64"),
            ("STRATA_DATA_FSYNC", "Yes"),
        ]));
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/strata"));
        assert_eq!(cfg.pool_pages, 64);
        assert!(cfg.data_fsync);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let cfg = StrataConfig::from_lookup(lookup(&[
            ("STRATA_POOL_PAGES", "lots"),
            ("STRATA_DATA_FSYNC", "maybe"),
            ("STRATA_DATA_DIR", "  "),
        ]));
        assert_eq!(cfg, StrataConfig::default());

        let zero = StrataConfig::from_lookup(lookup(&[("STRATA_POOL_PAGES", "0")]));
        assert_eq!(zero.pool_pages, DEFAULT_POOL_PAGES);
    }

    #[test]
    fn builder_overrides() {
        let cfg = EngineBuilder::from_default()
            .data_dir("x")
            .pool_pages(8)
            .data_fsync(true)
            .build();
        assert_eq!(cfg.data_dir, PathBuf::from("x"));
        assert_eq!(cfg.pool_pages, 8);
        assert!(cfg.data_fsync);
        assert!(cfg.to_string().contains("pool_pages: 8"));
    }
}
