//! Cache-or-fetch accessor shared by every data source
//!
//! Probe the cache, fetch on miss, store the fresh result, return it. Cache
//! failures are logged and treated as a miss so a broken cache never hides
//! the data source.

use std::future::Future;

use log::{debug, warn};

use crate::client::{CallArgs, FetchOptions, FetchResult};
use crate::error::Result;

/// Return the cached result for `(organization, method_name)` or run `fetch`.
///
/// `fetch` is awaited at most once and only on a miss (or when no cache is
/// given). Its errors are returned unchanged and nothing is stored.
pub async fn cache_or_fetch<F, Fut>(
    organization: &str,
    method_name: &str,
    args: &CallArgs,
    options: &FetchOptions<'_>,
    fetch: F,
) -> Result<FetchResult>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<FetchResult>>,
{
    if options.debug.calls {
        debug!("calling {} on {}", method_name, organization);
    }

    let Some(cache) = options.cache else {
        return fetch().await;
    };

    let key = options.key_policy.key_for(organization, method_name, args);

    match cache.get(&key) {
        Ok(Some(cached)) => {
            if options.debug.cache {
                debug!("found cached value for {}", key);
            }
            return Ok(cached);
        }
        Ok(None) => {}
        Err(e) => warn!("Cache read failed for {}: {}", key, e),
    }

    let result = fetch().await?;

    if options.debug.cache {
        debug!("setting cache value for {}", key);
    }
    if let Err(e) = cache.set(&key, &result) {
        warn!("Cache write failed for {}: {}", key, e);
    }

    Ok(result)
}
