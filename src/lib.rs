//! orgmeta - cache-or-fetch access to organization metadata for security
//! metrics
//!
//! Two sources are supported:
//!
//! - GitHub organization snapshots stored as JSON objects in object storage
//!   ([`GithubSnapshots`]).
//! - Heroku team membership from the Platform API ([`AdminClient`],
//!   [`get_heroku_resource`]).
//!
//! Both go through the same accessor: derive a cache key from the
//! organization and method name, return a cached result when there is one,
//! otherwise fetch and store it.
//!
//! ```ignore
//! let config = Config::load()?;
//! let api = HerokuClient::from_config(&config.heroku)?;
//! let mut client = AdminClient::new("acme", api).configure(&config);
//! if let Some(cache) = config.cache.open()? {
//!     client = client.with_cache(cache);
//! }
//!
//! let members = client
//!     .get("listUsers", &CallArgs::new(), GetOptions::default())
//!     .await?
//!     .extract_key("user", Value::Null)?
//!     .values();
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;

pub use cache::{Cache, KeyPolicy, MemoryCache, SqliteCache, cache_key};
pub use client::{
    AdminClient, BlobStore, CallArgs, DataSetKind, DataSets, DebugFlags, FetchOptions,
    FetchResult, GetOptions, GithubSnapshots, HerokuApi, HerokuClient, HttpBlobStore, ResultSet,
    get_heroku_resource,
};
pub use config::Config;
pub use error::{ApiError, Error, Result};
