//! TTL read-through cache store with last-known-good fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use mediastore_core::config::cache::CacheConfig;
use mediastore_core::error::AppError;
use mediastore_core::result::AppResult;
use mediastore_core::traits::cache::KeyValueStore;

use crate::file::FileKeyValueStore;
use crate::keys;
use crate::memory::MemoryKeyValueStore;

const STATE_CREATED: u8 = 0;
const STATE_READY: u8 = 1;
const STATE_DISPOSED: u8 = 2;

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead<T> {
    /// A fresh cached value.
    Hit(T),
    /// No fresh value; the caller must fetch.
    Miss,
}

/// Generation marker taken before a fetch; see [`CacheStore::fill_ticket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket(u64);

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Fresh reads served from cache.
    pub hits: u64,
    /// Reads that required a fetch.
    pub misses: u64,
    /// Values served by the last-known-good fallback.
    pub fallbacks: u64,
    /// Entries invalidated.
    pub invalidations: u64,
    /// Values written through.
    pub writes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    fallbacks: AtomicU64,
    invalidations: AtomicU64,
    writes: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedPayload {
    json: Arc<String>,
    cached_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner {
    durable: Arc<dyn KeyValueStore>,
    hot: Cache<String, CachedPayload>,
    generations: DashMap<String, u64>,
    default_ttl: Duration,
    prefix: String,
    state: AtomicU8,
    counters: Counters,
}

/// The cache layer shared by every gateway in the process.
///
/// Constructed once, initialised with [`CacheStore::init`], and shut down
/// with [`CacheStore::dispose`]. Cloning shares the same store.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<Inner>,
}

impl CacheStore {
    /// Create a cache store from configuration.
    pub fn new(config: &CacheConfig) -> AppResult<Self> {
        let durable: Arc<dyn KeyValueStore> = match config.provider.as_str() {
            "memory" => {
                info!("Initializing in-memory cache store");
                Arc::new(MemoryKeyValueStore::new())
            }
            "file" => {
                info!(directory = %config.file.directory, "Initializing file cache store");
                Arc::new(FileKeyValueStore::new(&config.file.directory))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, file"
                )));
            }
        };

        Ok(Self::with_store(
            durable,
            config.ttl(),
            config.hot_capacity,
            &config.key_prefix,
        ))
    }

    /// Create a cache store over an existing durable store.
    pub fn with_store(
        durable: Arc<dyn KeyValueStore>,
        default_ttl: Duration,
        hot_capacity: u64,
        prefix: &str,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                durable,
                hot: Cache::builder().max_capacity(hot_capacity).build(),
                generations: DashMap::new(),
                default_ttl,
                prefix: prefix.to_string(),
                state: AtomicU8::new(STATE_CREATED),
                counters: Counters::default(),
            }),
        }
    }

    /// Prepare the durable store. Idempotent.
    pub async fn init(&self) -> AppResult<()> {
        match self.inner.state.load(Ordering::Acquire) {
            STATE_READY => return Ok(()),
            STATE_DISPOSED => return Err(AppError::cache("Cache store has been disposed")),
            _ => {}
        }
        self.inner.durable.init().await?;
        self.inner.state.store(STATE_READY, Ordering::Release);
        debug!(store = self.inner.durable.store_type(), "Cache store ready");
        Ok(())
    }

    /// Flush the hot tier and refuse further use. Durable contents remain.
    pub async fn dispose(&self) {
        self.inner.state.store(STATE_DISPOSED, Ordering::Release);
        self.inner.hot.invalidate_all();
        self.inner.hot.run_pending_tasks().await;
        info!("Cache store disposed");
    }

    fn ensure_ready(&self) -> AppResult<()> {
        match self.inner.state.load(Ordering::Acquire) {
            STATE_READY => Ok(()),
            STATE_DISPOSED => Err(AppError::cache("Cache store has been disposed")),
            _ => Err(AppError::cache("Cache store used before init")),
        }
    }

    /// The configured freshness window.
    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// Entry key for a collection snapshot.
    pub fn collection_key(&self, collection: &str) -> String {
        keys::collection(&self.inner.prefix, collection)
    }

    /// Entry key for a singleton document.
    pub fn document_key(&self, collection: &str, id: &str) -> String {
        keys::document(&self.inner.prefix, collection, id)
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.counters.snapshot()
    }

    /// Return the cached value when present, younger than `ttl`, and not
    /// bypassed by `force`.
    pub async fn read<T: DeserializeOwned>(
        &self,
        key: &str,
        ttl: Duration,
        force: bool,
    ) -> AppResult<CacheRead<T>> {
        self.ensure_ready()?;
        if force {
            Counters::bump(&self.inner.counters.misses);
            debug!(key, "Cache bypassed");
            return Ok(CacheRead::Miss);
        }

        let payload = match self.inner.hot.get(key).await {
            Some(payload) => Some(payload),
            None => self.load_durable(key).await?,
        };

        let Some(payload) = payload.filter(|p| is_fresh(p.cached_at, ttl)) else {
            Counters::bump(&self.inner.counters.misses);
            debug!(key, "Cache miss");
            return Ok(CacheRead::Miss);
        };

        match serde_json::from_str(&payload.json) {
            Ok(value) => {
                Counters::bump(&self.inner.counters.hits);
                debug!(key, "Cache hit");
                Ok(CacheRead::Hit(value))
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                self.inner.hot.invalidate(key).await;
                Counters::bump(&self.inner.counters.misses);
                Ok(CacheRead::Miss)
            }
        }
    }

    async fn load_durable(&self, key: &str) -> AppResult<Option<CachedPayload>> {
        let durable = &self.inner.durable;
        let Some(json) = durable.get(key).await? else {
            return Ok(None);
        };
        let cached_at = durable
            .get(&keys::timestamp(key))
            .await?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|t| t.with_timezone(&Utc));

        let Some(cached_at) = cached_at else {
            return Ok(None);
        };
        let payload = CachedPayload {
            json: Arc::new(json),
            cached_at,
        };
        self.inner
            .hot
            .insert(key.to_string(), payload.clone())
            .await;
        Ok(Some(payload))
    }

    /// Take a ticket before fetching so that a fill racing with an
    /// invalidation can be discarded.
    pub fn fill_ticket(&self, key: &str) -> FillTicket {
        FillTicket(self.inner.generations.get(key).map(|g| *g).unwrap_or(0))
    }

    /// Store a freshly fetched value with the current time.
    pub async fn write_through<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        self.ensure_ready()?;
        let json = serde_json::to_string(value)?;
        let cached_at = Utc::now();
        let durable = &self.inner.durable;

        durable.set(key, &json).await?;
        durable
            .set(&keys::timestamp(key), &cached_at.to_rfc3339())
            .await?;
        durable.set(&keys::last_known_good(key), &json).await?;

        self.inner
            .hot
            .insert(
                key.to_string(),
                CachedPayload {
                    json: Arc::new(json),
                    cached_at,
                },
            )
            .await;
        Counters::bump(&self.inner.counters.writes);
        Ok(())
    }

    /// Write through only if no invalidation happened since the ticket was
    /// taken. Returns whether the value was stored.
    pub async fn write_through_if_current<T: Serialize + ?Sized>(
        &self,
        key: &str,
        ticket: FillTicket,
        value: &T,
    ) -> AppResult<bool> {
        if self.fill_ticket(key) != ticket {
            debug!(key, "Skipping stale cache fill");
            return Ok(false);
        }
        self.write_through(key, value).await?;
        if self.fill_ticket(key) != ticket {
            // Invalidated while the write was in progress.
            self.drop_entry(key).await?;
            debug!(key, "Discarded cache fill overtaken by invalidation");
            return Ok(false);
        }
        Ok(true)
    }

    async fn drop_entry(&self, key: &str) -> AppResult<()> {
        self.inner.hot.invalidate(key).await;
        self.inner.durable.delete(key).await?;
        self.inner.durable.delete(&keys::timestamp(key)).await
    }

    /// The last value written through for `key`, regardless of age or
    /// invalidation.
    pub async fn fallback<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        self.ensure_ready()?;
        let Some(json) = self.inner.durable.get(&keys::last_known_good(key)).await? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&json)?;
        Counters::bump(&self.inner.counters.fallbacks);
        Ok(Some(value))
    }

    /// Remove the cached payload and its timestamp from both tiers.
    pub async fn invalidate(&self, key: &str) -> AppResult<()> {
        self.ensure_ready()?;
        *self.inner.generations.entry(key.to_string()).or_insert(0) += 1;
        self.drop_entry(key).await?;
        Counters::bump(&self.inner.counters.invalidations);
        debug!(key, "Cache invalidated");
        Ok(())
    }
}

fn is_fresh(cached_at: DateTime<Utc>, ttl: Duration) -> bool {
    let Ok(ttl) = chrono::Duration::from_std(ttl) else {
        return true;
    };
    Utc::now().signed_duration_since(cached_at) < ttl
}
