//! Object storage downloads

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::error_for_response;
use crate::config::BlobConfig;
use crate::error::{ApiError, ConfigError, Result};

/// Default endpoint of the `s3` provider
pub const S3_ENDPOINT: &str = "https://s3.amazonaws.com";

/// Downloads objects from a storage provider into local files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download `object_key` from `bucket` at `provider` into `target`.
    async fn download(
        &self,
        target: &Path,
        provider: &str,
        bucket: &str,
        object_key: &str,
    ) -> Result<()>;
}

/// Object store reached over plain HTTP(S) with path-style URLs:
/// `{endpoint}/{bucket}/{object_key}`.
pub struct HttpBlobStore {
    http: HttpClient,
    endpoints: BTreeMap<String, String>,
}

impl HttpBlobStore {
    /// Create a store knowing the `s3` provider
    pub fn new() -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let mut endpoints = BTreeMap::new();
        endpoints.insert("s3".to_string(), S3_ENDPOINT.to_string());

        Ok(Self { http, endpoints })
    }

    /// Create a store with the provider endpoints from configuration
    pub fn from_config(config: &BlobConfig) -> Result<Self> {
        let mut store = Self::new()?;
        for (provider, endpoint) in &config.endpoints {
            store = store.with_endpoint(provider, endpoint);
        }
        Ok(store)
    }

    /// Register or replace the endpoint of a provider
    pub fn with_endpoint(mut self, provider: &str, endpoint: &str) -> Self {
        self.endpoints.insert(
            provider.to_string(),
            endpoint.trim_end_matches('/').to_string(),
        );
        self
    }

    /// URL of an object, or an error for an unknown provider
    pub fn object_url(&self, provider: &str, bucket: &str, object_key: &str) -> Result<String> {
        let endpoint = self.endpoints.get(provider).ok_or_else(|| {
            ConfigError::Invalid(format!("unknown storage provider '{}'", provider))
        })?;
        Ok(format!("{}/{}/{}", endpoint, bucket, object_key))
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn download(
        &self,
        target: &Path,
        provider: &str,
        bucket: &str,
        object_key: &str,
    ) -> Result<()> {
        let url = self.object_url(provider, bucket, object_key)?;

        let response = self.http.get(&url).send().await.map_err(ApiError::from)?;
        if !response.status().is_success() {
            return Err(error_for_response(response).await.into());
        }

        let body = response.bytes().await.map_err(ApiError::from)?;
        tokio::fs::write(target, &body).await?;
        Ok(())
    }
}
