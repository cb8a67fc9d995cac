//! Builds the price list for a run from the quote cache and a price provider.

use crate::core::cache::{CacheError, QuoteCache};
use crate::core::price::{PriceProvider, Quote};
use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Loads the quote cache, starting over when the file exists but can't be read.
///
/// A file that can be read but doesn't parse is still an error: silently
/// replacing it would throw away every cached timestamp.
pub fn load_cache(path: &Path) -> Result<QuoteCache> {
    match QuoteCache::load(path) {
        Ok(cache) => {
            debug!(entries = cache.len(), "Loaded quote cache");
            Ok(cache)
        }
        Err(e @ CacheError::Io { .. }) => {
            warn!(error = %e, "Ignoring unreadable quote cache");
            Ok(QuoteCache::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Prices every symbol, one at a time.
///
/// Fresh cached prices (and `_cash`) are used as is. Everything else is fetched
/// from `provider`, written to the cache and persisted to `cache_path` right
/// away, followed by a `delay` pause to stay under the provider's rate limit.
/// Symbols that fail to fetch are left out of the returned list.
pub async fn fetch_quotes(
    symbols: &[String],
    provider: &(dyn PriceProvider + Send + Sync),
    cache: &mut QuoteCache,
    cache_path: &Path,
    delay: Duration,
    on_progress: &(dyn Fn() + Sync),
) -> Result<Vec<Quote>> {
    let mut quotes = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        if let Some(cached) = cache.get(symbol, Utc::now().timestamp())
            && cached.fresh
        {
            debug!("Cached price for {}: {}", symbol, cached.price);
            quotes.push(Quote::new(symbol.as_str(), cached.price));
            on_progress();
            continue;
        }

        debug!("Attempting to get price for symbol {}", symbol);
        match provider.fetch_price(symbol).await {
            Ok(price) => {
                info!("The latest price for {} is {}", symbol, price);
                cache.put(symbol, price, Utc::now().timestamp());
                cache.persist(cache_path)?;
                quotes.push(Quote::new(symbol.as_str(), price));
            }
            Err(e) => warn!(error = %e, "Failed to fetch price for {}", symbol),
        }
        on_progress();

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    cache.persist(cache_path)?;
    Ok(quotes)
}
