//! Mock collaborators for testing
//!
//! Provides in-memory implementations of [`HerokuApi`] and [`BlobStore`] so
//! the accessors can be exercised without network access.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::blob::BlobStore;
use super::heroku::HerokuApi;
use crate::error::{ApiError, Result};

/// Mock Heroku API client.
///
/// Configure responses via builder methods, then use in tests.
///
/// # Example
/// ```ignore
/// let mock = MockHerokuClient::new()
///     .with_members(vec![json!({"email": "a@example.com"})])
///     .await;
///
/// let members = mock.list_team_members("acme").await?;
/// assert_eq!(members.len(), 1);
/// ```
#[derive(Default)]
pub struct MockHerokuClient {
    /// Records to return from list_team_members
    members: Arc<Mutex<Vec<Value>>>,
    /// Records to return from list_team_apps
    apps: Arc<Mutex<Vec<Value>>>,
    /// Collaborators per app name
    collaborators: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    /// Error to return (if any) - consumed on first use
    error: Arc<Mutex<Option<ApiError>>>,
    /// Track number of calls for verification
    call_count: Arc<Mutex<CallCounts>>,
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub list_team_members: usize,
    pub list_team_apps: usize,
    pub list_app_collaborators: usize,
}

impl CallCounts {
    /// Get total number of API calls made.
    pub fn total(&self) -> usize {
        self.list_team_members + self.list_team_apps + self.list_app_collaborators
    }
}

impl MockHerokuClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure records to return from list_team_members.
    pub async fn with_members(self, members: Vec<Value>) -> Self {
        *self.members.lock().await = members;
        self
    }

    /// Configure records to return from list_team_apps.
    pub async fn with_apps(self, apps: Vec<Value>) -> Self {
        *self.apps.lock().await = apps;
        self
    }

    /// Configure collaborators returned for one app.
    pub async fn with_collaborators(self, app: &str, collaborators: Vec<Value>) -> Self {
        self.collaborators
            .lock()
            .await
            .insert(app.to_string(), collaborators);
        self
    }

    /// Configure an error to return on the next API call.
    /// The error is consumed after one use.
    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    /// Get the call counts for verification in tests.
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    async fn check_error(&self) -> Result<()> {
        if let Some(e) = self.error.lock().await.take() {
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl HerokuApi for MockHerokuClient {
    async fn list_team_members(&self, _team: &str) -> Result<Vec<Value>> {
        self.check_error().await?;
        self.call_count.lock().await.list_team_members += 1;
        Ok(self.members.lock().await.clone())
    }

    async fn list_team_apps(&self, _team: &str) -> Result<Vec<Value>> {
        self.check_error().await?;
        self.call_count.lock().await.list_team_apps += 1;
        Ok(self.apps.lock().await.clone())
    }

    async fn list_app_collaborators(&self, app: &str) -> Result<Vec<Value>> {
        self.check_error().await?;
        self.call_count.lock().await.list_app_collaborators += 1;
        Ok(self
            .collaborators
            .lock()
            .await
            .get(app)
            .cloned()
            .unwrap_or_default())
    }
}

/// A captured download request.
#[derive(Debug, Clone)]
pub struct CapturedDownload {
    pub target: PathBuf,
    pub provider: String,
    pub bucket: String,
    pub object_key: String,
}

/// Mock object store writing fixed contents to the target path.
#[derive(Default)]
pub struct MockBlobStore {
    contents: Arc<Mutex<Vec<u8>>>,
    error: Arc<Mutex<Option<ApiError>>>,
    downloads: Arc<Mutex<Vec<CapturedDownload>>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the bytes every download writes.
    pub async fn with_contents(self, contents: impl Into<Vec<u8>>) -> Self {
        *self.contents.lock().await = contents.into();
        self
    }

    /// Configure an error for the next download.
    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    /// All downloads requested so far.
    pub async fn downloads(&self) -> Vec<CapturedDownload> {
        self.downloads.lock().await.clone()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn download(
        &self,
        target: &Path,
        provider: &str,
        bucket: &str,
        object_key: &str,
    ) -> Result<()> {
        self.downloads.lock().await.push(CapturedDownload {
            target: target.to_path_buf(),
            provider: provider.to_string(),
            bucket: bucket.to_string(),
            object_key: object_key.to_string(),
        });

        if let Some(e) = self.error.lock().await.take() {
            return Err(e.into());
        }

        let contents = self.contents.lock().await.clone();
        tokio::fs::write(target, contents).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_client_default_empty() {
        let mock = MockHerokuClient::new();
        assert!(mock.list_team_members("acme").await.unwrap().is_empty());
        assert!(mock.list_app_collaborators("web").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_client_error_consumed_once() {
        let mock = MockHerokuClient::new()
            .with_members(vec![json!({"id": 1})])
            .await
            .with_error(ApiError::Unauthorized)
            .await;

        assert!(mock.list_team_members("acme").await.is_err());
        assert_eq!(mock.list_team_members("acme").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_client_call_counts() {
        let mock = MockHerokuClient::new();
        let _ = mock.list_team_members("acme").await;
        let _ = mock.list_team_apps("acme").await;
        let _ = mock.list_team_apps("acme").await;

        let counts = mock.call_counts().await;
        assert_eq!(counts.list_team_members, 1);
        assert_eq!(counts.list_team_apps, 2);
        assert_eq!(counts.total(), 3);
    }

    #[tokio::test]
    async fn test_mock_blob_store_writes_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("out.json");
        let store = MockBlobStore::new().with_contents("{}").await;

        store.download(&target, "s3", "bucket", "key").await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{}");
        assert_eq!(store.downloads().await[0].object_key, "key");
    }
}
