//! Result caching
//!
//! The [`Cache`] trait is the seam for any key/value store. Two stores ship
//! with the crate: [`MemoryCache`] for a single process and [`SqliteCache`]
//! for results that should survive between runs.

pub mod fetch;
pub mod key;
pub mod memory;
pub mod storage;

use std::time::Duration;

use crate::client::FetchResult;
use crate::error::CacheError;

/// Cache TTL configuration for the SQLite store
pub struct CacheTtl;

impl CacheTtl {
    // Snapshots are written once per day
    pub const GITHUB_SNAPSHOT: Duration = Duration::from_secs(24 * 60 * 60); // 24 hr

    // Team membership changes rarely, but 2FA status matters
    pub const HEROKU_MEMBERS: Duration = Duration::from_secs(60 * 60); // 1 hr

    pub const DEFAULT: Duration = Self::HEROKU_MEMBERS;
}

/// A key/value store for fetch results.
///
/// No eviction, TTL or atomicity contract is imposed; probing and storing
/// are separate calls and may race when the store is shared.
pub trait Cache: Send + Sync {
    /// Look up a value. `Ok(None)` is a miss.
    fn get(&self, key: &str) -> Result<Option<FetchResult>, CacheError>;

    /// Store a value under `key`, replacing any previous one.
    fn set(&self, key: &str, value: &FetchResult) -> Result<(), CacheError>;
}

// Re-export main types
pub use fetch::cache_or_fetch;
pub use key::{KeyPolicy, cache_key, cache_key_with_args};
pub use memory::MemoryCache;
pub use storage::SqliteCache;
