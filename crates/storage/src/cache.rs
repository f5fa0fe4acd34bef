use chrono::Utc;
use idscan_core::{CacheConfig, ExtractedRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::{self, DbPool};

/// Key of the single last-result slot.
pub const LAST_RESULT_KEY: &str = "lastResult";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Cache entry could not be encoded or decoded: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Minimal async string store behind the result cache.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, CacheError>> + Send;
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), CacheError>> + Send;
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// SQLite-backed store (`kv_store` table).
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn open(path: &Path) -> Result<Self, CacheError> {
        Ok(Self::new(db::create_db(path).await?))
    }

    pub async fn in_memory() -> Result<Self, CacheError> {
        Ok(Self::new(db::create_memory_db().await?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(db::kv_get(&self.pool, key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        Ok(db::kv_set(&self.pool, key, &value).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        db::kv_delete(&self.pool, key).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Envelope stored under [`LAST_RESULT_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResult {
    pub record: ExtractedRecord,
    pub saved_at_epoch_millis: i64,
}

impl CachedResult {
    pub fn is_expired(&self, now_epoch_millis: i64, ttl: Duration) -> bool {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_epoch_millis.saturating_sub(self.saved_at_epoch_millis) > ttl_millis
    }
}

/// Single-slot cache of the most recent scan, expiring after a TTL.
///
/// Storage failures never reach the caller: they are logged and read as a
/// miss (or a skipped write).
pub struct ResultCache<S> {
    store: S,
    ttl: Duration,
}

impl<S: KeyValueStore> ResultCache<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn from_config(store: S, config: &CacheConfig) -> Self {
        Self::new(store, Duration::from_secs(config.ttl_hours.saturating_mul(3600)))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Save `record` stamped with the current time. Returns whether it was written.
    pub async fn save(&self, record: &ExtractedRecord) -> bool {
        self.save_at(record, Utc::now().timestamp_millis()).await
    }

    pub async fn save_at(&self, record: &ExtractedRecord, now_epoch_millis: i64) -> bool {
        let envelope = CachedResult { record: record.clone(), saved_at_epoch_millis: now_epoch_millis };
        let result = match serde_json::to_string(&envelope) {
            Ok(json) => self.store.set(LAST_RESULT_KEY, json).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => {
                debug!(doc_type = %record.doc_type, "cached last result");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to cache result");
                false
            }
        }
    }

    /// The cached result, unless absent or older than the TTL.
    pub async fn load(&self) -> Option<CachedResult> {
        self.load_at(Utc::now().timestamp_millis()).await
    }

    /// Like [`load`](Self::load) with an explicit clock. Expired or corrupt
    /// entries are deleted.
    pub async fn load_at(&self, now_epoch_millis: i64) -> Option<CachedResult> {
        let raw = match self.store.get(LAST_RESULT_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read cached result");
                return None;
            }
        };

        let cached = match serde_json::from_str::<CachedResult>(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "discarding corrupt cached result");
                self.clear().await;
                return None;
            }
        };

        if cached.is_expired(now_epoch_millis, self.ttl) {
            debug!(saved_at = cached.saved_at_epoch_millis, "cached result expired");
            self.clear().await;
            return None;
        }
        Some(cached)
    }

    pub async fn clear(&self) {
        if let Err(e) = self.store.delete(LAST_RESULT_KEY).await {
            warn!(error = %e, "failed to clear cached result");
        }
    }
}
