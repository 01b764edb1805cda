//! External data sources: GitHub snapshots in object storage and the Heroku
//! Platform API, plus the result pipeline built on top of them.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::{Cache, KeyPolicy};
use crate::error::{ApiError, Result};

pub mod admin;
pub mod blob;
pub mod datasets;
pub mod github;
pub mod heroku;
#[cfg(test)]
pub mod mock;
pub mod pagination;
pub mod rate_limit;
pub mod results;

pub use admin::{AdminClient, GetOptions};
pub use blob::{BlobStore, HttpBlobStore};
pub use datasets::{DataSetKind, DataSets};
pub use github::GithubSnapshots;
pub use heroku::{HerokuApi, HerokuClient, get_heroku_resource};
#[cfg(test)]
#[allow(unused_imports)]
pub use mock::{MockBlobStore, MockHerokuClient};
pub use results::ResultSet;

/// A JSON mapping with string keys, as returned by the Heroku API
pub type Record = Map<String, Value>;

/// Result of one fetch, in the shape of the source it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum FetchResult {
    /// Raw object contents (GitHub snapshots)
    Text(String),
    /// Ordered records (Heroku data sets)
    Records(Vec<Value>),
}

impl FetchResult {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FetchResult::Text(text) => Some(text),
            FetchResult::Records(_) => None,
        }
    }

    pub fn as_records(&self) -> Option<&[Value]> {
        match self {
            FetchResult::Records(records) => Some(records),
            FetchResult::Text(_) => None,
        }
    }

    /// Flatten into a sequence of values.
    ///
    /// Text becomes a single string element.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            FetchResult::Records(records) => records,
            FetchResult::Text(text) => vec![Value::String(text)],
        }
    }

    /// Parse the result as one JSON document.
    ///
    /// Text is parsed as JSON (snapshot files are JSON objects); records are
    /// returned as a JSON array.
    pub fn into_json(self) -> Result<Value> {
        match self {
            FetchResult::Text(text) => Ok(serde_json::from_str(&text)?),
            FetchResult::Records(records) => Ok(Value::Array(records)),
        }
    }
}

/// Positional and keyword arguments passed through to a fetch.
///
/// They only reach the cache key under [`KeyPolicy::IncludeArgs`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArgs {
    pub args: Vec<Value>,
    pub kwargs: Record,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Canonical text form, stable across calls (keyword keys are sorted).
    pub fn canonical(&self) -> String {
        let args = Value::Array(self.args.clone());
        let kwargs = Value::Object(self.kwargs.clone());
        format!("{}|{}", args, kwargs)
    }
}

/// Diagnostic switches for fetch calls and cache traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugFlags {
    /// Log every fetch call
    #[serde(default)]
    pub calls: bool,
    /// Log cache hits and stores
    #[serde(default)]
    pub cache: bool,
}

/// Per-call options for the cache-or-fetch accessors.
///
/// Defaults: no cache, no debug output, method-only cache keys.
#[derive(Clone, Copy, Default)]
pub struct FetchOptions<'a> {
    pub cache: Option<&'a dyn Cache>,
    pub debug: DebugFlags,
    pub key_policy: KeyPolicy,
}

impl<'a> FetchOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(mut self, cache: &'a dyn Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn debug(mut self, debug: DebugFlags) -> Self {
        self.debug = debug;
        self
    }

    pub fn key_policy(mut self, policy: KeyPolicy) -> Self {
        self.key_policy = policy;
        self
    }
}

/// Map a non-success HTTP response to an [`ApiError`].
pub(crate) async fn error_for_response(response: Response) -> ApiError {
    let status = response.status();
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::NOT_FOUND => {
            let url = response.url().path().to_string();
            let body = response.text().await.unwrap_or_default();
            if body.trim().is_empty() {
                ApiError::NotFound(url)
            } else {
                ApiError::NotFound(body)
            }
        }
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            ApiError::RateLimit(Duration::from_secs(retry_after))
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Bad request".to_string());
            ApiError::BadRequest(error_msg)
        }
        status if status.is_server_error() => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| format!("Server error: {}", status));
            ApiError::ServerError(error_msg)
        }
        _ => ApiError::InvalidResponse(format!("Unexpected status code: {}", status)),
    }
}
