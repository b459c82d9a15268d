use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::QuoteError;
use crate::models::Quote;
use crate::yahoo::QuoteProvider;

/// Maximum age a cached quote may reach before the next lookup refreshes
/// it. The window doubles as the minimum retry interval after a failed
/// refresh: a symbol is fetched at most once per window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// A quote as handed out by the cache.
#[derive(Debug, Clone)]
pub struct CachedQuote {
    pub quote: Quote,
    pub fetched_at: Instant,
    /// True when this is an expired entry served because the refresh
    /// failed. Consumers decide whether to annotate it as "last known".
    pub stale: bool,
}

impl CachedQuote {
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

struct Entry {
    quote: Quote,
    fetched_at: Instant,
}

#[derive(Default)]
struct Slot {
    entry: Option<Entry>,
}

/// Process-wide quote cache in front of the upstream provider.
///
/// Constructed once at startup and shared behind an `Arc`. Lookups for the
/// same symbol serialize on a per-symbol slot, so concurrent callers during
/// a refresh wait for it and reuse its result instead of issuing their own
/// fetch; at most one upstream call per symbol is in flight at any instant.
/// Lookups for different symbols never contend.
pub struct QuoteCache {
    provider: Arc<dyn QuoteProvider>,
    ttl: Duration,
    serve_stale: bool,
    slots: Mutex<HashMap<String, Arc<Mutex<Slot>>>>,
}

impl QuoteCache {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self::with_config(provider, DEFAULT_TTL, true)
    }

    /// `serve_stale` controls the degraded fallback: when the refresh for
    /// an expired entry fails, serve the old value flagged stale instead of
    /// erroring.
    pub fn with_config(provider: Arc<dyn QuoteProvider>, ttl: Duration, serve_stale: bool) -> Self {
        Self {
            provider,
            ttl,
            serve_stale,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a quote, fetching from the provider only when the cached
    /// entry is missing or older than the TTL.
    pub async fn get_quote(&self, symbol: &str) -> Result<CachedQuote, QuoteError> {
        let slot = self.slot(symbol).await;
        // Per-symbol critical section. Callers queued here while a refresh
        // is in flight see the new entry on the re-check below instead of
        // triggering another upstream call.
        let mut slot = slot.lock().await;

        if let Some(entry) = &slot.entry {
            let age = entry.fetched_at.elapsed();
            if age < self.ttl {
                debug!(symbol, age_ms = age.as_millis() as u64, "quote cache hit");
                return Ok(CachedQuote {
                    quote: entry.quote.clone(),
                    fetched_at: entry.fetched_at,
                    stale: false,
                });
            }
        }

        match self.provider.fetch_quote(symbol).await {
            Ok(quote) => {
                let fetched_at = Instant::now();
                slot.entry = Some(Entry {
                    quote: quote.clone(),
                    fetched_at,
                });
                debug!(symbol, "quote cache refreshed");
                Ok(CachedQuote {
                    quote,
                    fetched_at,
                    stale: false,
                })
            }
            Err(err) => {
                // No retry here; the next attempt happens on the first
                // lookup after the entry is seen expired again.
                if self.serve_stale {
                    if let Some(entry) = &slot.entry {
                        let age = entry.fetched_at.elapsed();
                        warn!(
                            symbol,
                            age_ms = age.as_millis() as u64,
                            error = %err,
                            "refresh failed, serving stale quote"
                        );
                        return Ok(CachedQuote {
                            quote: entry.quote.clone(),
                            fetched_at: entry.fetched_at,
                            stale: true,
                        });
                    }
                }
                warn!(symbol, error = %err, "quote unavailable");
                Err(QuoteError::Unavailable {
                    symbol: symbol.to_string(),
                })
            }
        }
    }

    async fn slot(&self, symbol: &str) -> Arc<Mutex<Slot>> {
        let mut slots = self.slots.lock().await;
        slots.entry(symbol.to_string()).or_default().clone()
    }
}
