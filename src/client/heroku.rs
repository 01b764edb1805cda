//! Heroku Platform API client and the team data accessor

use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use reqwest::header::{ACCEPT, AUTHORIZATION, RANGE, USER_AGENT};
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use urlencoding::encode;

use super::datasets::{self, DataSetKind, DataSets};
use super::pagination::{self, Page, RangeParams};
use super::rate_limit::ReactiveRateLimiter;
use super::{CallArgs, FetchOptions, FetchResult, Record, error_for_response};
use crate::cache::cache_or_fetch;
use crate::config::HerokuConfig;
use crate::error::{ApiError, Result};

/// Heroku Platform API base URL
pub const API_BASE_URL: &str = "https://api.heroku.com";

/// Accept header selecting version 3 of the API
const ACCEPT_V3: &str = "application/vnd.heroku+json; version=3";

/// Administrative API for a Heroku team.
///
/// Records are returned as the API sends them; their schema is not
/// interpreted beyond the fields the data set projections read.
#[async_trait]
pub trait HerokuApi: Send + Sync {
    /// List the members of a team
    async fn list_team_members(&self, team: &str) -> Result<Vec<Value>>;

    /// List the apps owned by a team
    async fn list_team_apps(&self, team: &str) -> Result<Vec<Value>>;

    /// List the collaborators of a team app
    async fn list_app_collaborators(&self, app: &str) -> Result<Vec<Value>>;
}

/// Fetch the data sets of a Heroku team, going through the cache.
///
/// The result is always one mapping keyed by [`DataSetKind`]: `user` holds
/// the member records, `role_user` and `app_user` are present when selected
/// in `sets`. Errors from `api` propagate unchanged.
pub async fn get_heroku_resource<A: HerokuApi + ?Sized>(
    api: &A,
    organization: &str,
    method_name: &str,
    args: &CallArgs,
    options: &FetchOptions<'_>,
    sets: DataSets,
) -> Result<FetchResult> {
    cache_or_fetch(organization, method_name, args, options, || {
        collect_data_sets(api, organization, sets)
    })
    .await
}

async fn collect_data_sets<A: HerokuApi + ?Sized>(
    api: &A,
    team: &str,
    sets: DataSets,
) -> Result<FetchResult> {
    let members = api.list_team_members(team).await?;
    let mut result = Record::new();

    if sets.role_users {
        result.insert(
            DataSetKind::RoleUser.key().to_string(),
            Value::Object(datasets::role_users(&members)),
        );
    }

    if sets.app_users {
        let affected = datasets::missing_2fa_emails(&members);
        let mut apps = Vec::new();
        // Skip the per-app requests when nobody is affected
        if !affected.is_empty() {
            for app in api.list_team_apps(team).await? {
                let Some(name) = app.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let collaborators = api.list_app_collaborators(name).await?;
                apps.push((name.to_string(), collaborators));
            }
        }
        result.insert(
            DataSetKind::AppUser.key().to_string(),
            Value::Object(datasets::app_users(&apps, &affected)),
        );
    }

    result.insert(DataSetKind::User.key().to_string(), Value::Array(members));

    Ok(FetchResult::Records(vec![Value::Object(result)]))
}

/// Heroku Platform API client
pub struct HerokuClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    page_size: usize,
    rate_limiter: ReactiveRateLimiter,
}

impl HerokuClient {
    /// Create a new client authenticating with `api_key`
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: API_BASE_URL.to_string(),
            api_key: api_key.into(),
            page_size: pagination::MAX_PAGE_SIZE,
            rate_limiter: ReactiveRateLimiter::new(),
        })
    }

    /// Create a client from configuration (API key resolved from env or file)
    pub fn from_config(config: &HerokuConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(api_key)?
            .with_base_url(&config.api_url)
            .with_page_size(config.page_size))
    }

    /// Point the client at another API host
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Items requested per page, clamped to the API maximum
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = RangeParams::new().max(page_size).max;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[cfg(test)]
    fn rate_limiter(&self) -> &ReactiveRateLimiter {
        &self.rate_limiter
    }

    /// Fetch every page of a ranged listing, one request at a time.
    ///
    /// Stops on the last page or when the server hands back the range it was
    /// just asked for.
    async fn get_all(&self, path: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut range = Some(RangeParams::new().max(self.page_size).header_value());

        while let Some(current) = range.take() {
            let page = self.get_page(path, &current).await?;
            items.extend(page.items);
            range = page.next_range.filter(|next| {
                let repeated = *next == current;
                if repeated {
                    warn!("Next-Range repeats {:?} for {}, stopping", next, path);
                }
                !repeated
            });
        }

        Ok(items)
    }

    /// Fetch one page of a listing
    async fn get_page(&self, path: &str, range: &str) -> Result<Page> {
        self.rate_limiter.wait_if_active().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, ACCEPT_V3)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(USER_AGENT, concat!("orgmeta/", env!("CARGO_PKG_VERSION")))
            .header(RANGE, range)
            .send()
            .await
            .map_err(ApiError::from)?;

        self.rate_limiter.observe(response.headers());

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => {
                let next_range = pagination::next_range(status, response.headers());
                let items = response.json::<Vec<Value>>().await.map_err(|e| {
                    ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
                })?;
                Ok(Page { items, next_range })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                self.rate_limiter.activate();
                Err(error_for_response(response).await.into())
            }
            _ => Err(error_for_response(response).await.into()),
        }
    }
}

#[async_trait]
impl HerokuApi for HerokuClient {
    async fn list_team_members(&self, team: &str) -> Result<Vec<Value>> {
        self.get_all(&format!("/teams/{}/members", encode(team))).await
    }

    async fn list_team_apps(&self, team: &str) -> Result<Vec<Value>> {
        self.get_all(&format!("/teams/{}/apps", encode(team))).await
    }

    async fn list_app_collaborators(&self, app: &str) -> Result<Vec<Value>> {
        self.get_all(&format!("/teams/apps/{}/collaborators", encode(app)))
            .await
    }
}
