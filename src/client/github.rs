//! GitHub organization snapshots kept in object storage
//!
//! A collector uploads one JSON object per organization per day. This module
//! builds the object key, downloads the object into a scratch file and reads
//! it back as text.

use std::fmt::Display;

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use super::blob::BlobStore;
use super::{CallArgs, FetchOptions, FetchResult};
use crate::cache::cache_or_fetch;
use crate::config::BlobConfig;
use crate::error::{Error, Result};

/// Snapshot accessor bound to one object store and bucket.
pub struct GithubSnapshots<B: BlobStore> {
    store: B,
    provider: String,
    bucket: String,
    namespace: String,
}

impl<B: BlobStore> GithubSnapshots<B> {
    /// Accessor using the default provider, bucket and namespace
    pub fn new(store: B) -> Self {
        Self::from_config(store, &BlobConfig::default())
    }

    pub fn from_config(store: B, config: &BlobConfig) -> Self {
        Self {
            store,
            provider: config.provider.clone(),
            bucket: config.bucket.clone(),
            namespace: config.namespace.clone(),
        }
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    /// Object key of the snapshot for `organization` on `date`:
    /// `{namespace}/object_json/{YYYY-MM-DD}-{organization}.db.obj.json`
    pub fn object_key(&self, organization: &str, date: NaiveDate) -> String {
        format!(
            "{}/object_json/{}-{}.db.obj.json",
            self.namespace,
            date.format("%Y-%m-%d"),
            organization
        )
    }

    /// Return the snapshot text, from the cache or from object storage.
    ///
    /// Any failure to download or read the object is reported as
    /// [`Error::DataNotFound`] carrying the cause's text.
    pub async fn get_data_file(
        &self,
        organization: &str,
        date: NaiveDate,
        method_name: &str,
        args: &CallArgs,
        options: &FetchOptions<'_>,
    ) -> Result<FetchResult> {
        // The date only reaches the key when arguments are part of it
        let keyed_args = args
            .clone()
            .kwarg("date", date.format("%Y-%m-%d").to_string());

        cache_or_fetch(organization, method_name, &keyed_args, options, || async move {
            let text = self.download_text(&self.object_key(organization, date)).await?;
            Ok(FetchResult::Text(text))
        })
        .await
    }

    /// Download an object into a scratch file and read it as UTF-8.
    ///
    /// The scratch file is removed when this returns, on every path.
    async fn download_text(&self, object_key: &str) -> Result<String> {
        let scratch = NamedTempFile::new().map_err(not_found)?;

        self.store
            .download(scratch.path(), &self.provider, &self.bucket, object_key)
            .await
            .map_err(not_found)?;

        tokio::fs::read_to_string(scratch.path())
            .await
            .map_err(not_found)
    }
}

fn not_found(cause: impl Display) -> Error {
    Error::DataNotFound(cause.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, KeyPolicy, MemoryCache, cache_key};
    use crate::client::mock::MockBlobStore;
    use crate::error::ApiError;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn test_object_key_layout() {
        let snapshots = GithubSnapshots::new(MockBlobStore::new());
        assert_eq!(
            snapshots.object_key("mozilla", date()),
            "github/object_json/2024-03-07-mozilla.db.obj.json"
        );
    }

    #[test]
    fn test_object_key_uses_configured_namespace() {
        let config = BlobConfig {
            namespace: "ghe".to_string(),
            ..BlobConfig::default()
        };
        let snapshots = GithubSnapshots::from_config(MockBlobStore::new(), &config);
        assert!(snapshots.object_key("mozilla", date()).starts_with("ghe/object_json/"));
    }

    #[tokio::test]
    async fn test_download_reads_text_and_removes_scratch_file() {
        let store = MockBlobStore::new().with_contents(r#"{"repos": []}"#).await;
        let snapshots = GithubSnapshots::new(store);

        let result = snapshots
            .get_data_file("mozilla", date(), "repos", &CallArgs::new(), &FetchOptions::new())
            .await
            .unwrap();

        assert_eq!(result, FetchResult::Text(r#"{"repos": []}"#.to_string()));

        let downloads = snapshots.store().downloads().await;
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].provider, "s3");
        assert_eq!(downloads[0].bucket, "foxsec-metrics");
        assert_eq!(
            downloads[0].object_key,
            "github/object_json/2024-03-07-mozilla.db.obj.json"
        );
        assert!(!downloads[0].target.exists());
    }

    #[tokio::test]
    async fn test_download_failure_is_data_not_found() {
        let store = MockBlobStore::new()
            .with_error(ApiError::Network("timeout".to_string()))
            .await;
        let snapshots = GithubSnapshots::new(store);

        let err = snapshots
            .get_data_file("mozilla", date(), "repos", &CallArgs::new(), &FetchOptions::new())
            .await
            .unwrap_err();

        match &err {
            Error::DataNotFound(msg) => assert!(msg.contains("timeout")),
            other => panic!("Expected DataNotFound, got {:?}", other),
        }

        let downloads = snapshots.store().downloads().await;
        assert!(!downloads[0].target.exists());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_data_not_found() {
        let store = MockBlobStore::new().with_contents(vec![0xff, 0xfe, 0x00]).await;
        let snapshots = GithubSnapshots::new(store);

        let err = snapshots
            .get_data_file("mozilla", date(), "repos", &CallArgs::new(), &FetchOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DataNotFound(_)));
        let downloads = snapshots.store().downloads().await;
        assert_eq!(downloads.len(), 1);
        assert!(!downloads[0].target.exists());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_download() {
        let cache = MemoryCache::new();
        let cached = FetchResult::Text("cached".to_string());
        cache.set(&cache_key("mozilla", "repos"), &cached).unwrap();
        let snapshots = GithubSnapshots::new(MockBlobStore::new());

        let options = FetchOptions::new().cache(&cache);
        let result = snapshots
            .get_data_file("mozilla", date(), "repos", &CallArgs::new(), &options)
            .await
            .unwrap();

        assert_eq!(result, cached);
        assert!(snapshots.store().downloads().await.is_empty());
    }

    #[tokio::test]
    async fn test_include_args_keys_by_date() {
        let cache = MemoryCache::new();
        let snapshots = GithubSnapshots::new(MockBlobStore::new().with_contents("{}").await);
        let options = FetchOptions::new()
            .cache(&cache)
            .key_policy(KeyPolicy::IncludeArgs);

        let other_day = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        for day in [date(), other_day] {
            snapshots
                .get_data_file("mozilla", day, "repos", &CallArgs::new(), &options)
                .await
                .unwrap();
        }

        assert_eq!(cache.len(), 2);
        assert_eq!(snapshots.store().downloads().await.len(), 2);
    }
}
