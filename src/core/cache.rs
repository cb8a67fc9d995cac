use crate::core::price::CASH_SYMBOL;
use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CACHE_FILE_NAME: &str = ".quotecache.json";

/// Cached prices are good for this long after they were fetched.
pub fn freshness_window() -> Duration {
    Duration::hours(6)
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to access quote cache at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Quote cache at {} is malformed", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize quote cache")]
    Serialize(#[source] serde_json::Error),
}

/// A price and the Unix time (seconds) it was fetched at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedQuote {
    pub price: Decimal,
    pub time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedPrice {
    pub price: Decimal,
    pub fresh: bool,
}

/// Last fetched price per symbol, persisted as one flat JSON file.
///
/// Entries are never evicted. A stale entry stays around until the next
/// successful fetch of the same symbol overwrites it.
#[derive(Debug, Clone)]
pub struct QuoteCache {
    entries: BTreeMap<String, CachedQuote>,
    window: Duration,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::with_window(freshness_window())
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            window,
        }
    }

    /// Returns the cached price for `symbol` and whether it is still fresh at `now`.
    ///
    /// A quote fetched at `t` is fresh for `now` in `[t, t + window)`. `_cash` is
    /// always fresh at a price of 1, whatever the cache holds.
    pub fn get(&self, symbol: &str, now: i64) -> Option<CachedPrice> {
        if symbol == CASH_SYMBOL {
            return Some(CachedPrice {
                price: Decimal::ONE,
                fresh: true,
            });
        }

        let Some(cached) = self.entries.get(symbol) else {
            debug!("Cache MISS for symbol: {}", symbol);
            return None;
        };
        let fresh = cached.time.saturating_add(self.window.num_seconds()) > now;
        debug!(fresh, "Cache HIT for symbol: {}", symbol);
        Some(CachedPrice {
            price: cached.price,
            fresh,
        })
    }

    pub fn put(&mut self, symbol: &str, price: Decimal, now: i64) {
        debug!("Cache PUT for symbol: {}", symbol);
        self.entries
            .insert(symbol.to_string(), CachedQuote { price, time: now });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads the cache from `path`. A missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No quote cache exists yet at {}", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let entries = serde_json::from_slice(&bytes).map_err(|source| CacheError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            entries,
            window: freshness_window(),
        })
    }

    /// Writes the whole cache to `path`, creating parent directories as needed.
    pub fn persist(&self, path: &Path) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec_pretty(&self.entries).map_err(CacheError::Serialize)?;
        let io_err = |source: std::io::Error| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, bytes).map_err(io_err)?;
        debug!(entries = self.entries.len(), "Persisted quote cache");
        Ok(())
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}
