pub mod cache;
pub mod db;

pub use cache::{
    CacheError, CachedResult, KeyValueStore, MemoryStore, ResultCache, SqliteStore,
    LAST_RESULT_KEY,
};
pub use db::{create_db, create_memory_db, kv_delete, kv_get, kv_set, DbPool};
