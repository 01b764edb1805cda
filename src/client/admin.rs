//! Heroku team client producing [`ResultSet`] pipelines

use std::sync::Arc;

use super::datasets::DataSets;
use super::heroku::{HerokuApi, get_heroku_resource};
use super::results::ResultSet;
use super::{CallArgs, DebugFlags, FetchOptions};
use crate::cache::{Cache, KeyPolicy};
use crate::config::Config;
use crate::error::Result;

/// Per-call options for [`AdminClient::get`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    /// Bypass the cache for this call (no probe, no store)
    pub skip_cache: bool,
}

impl GetOptions {
    pub fn skip_cache() -> Self {
        Self { skip_cache: true }
    }
}

/// Fetches data sets for one Heroku team.
pub struct AdminClient<A: HerokuApi> {
    organization: String,
    api: A,
    cache: Option<Arc<dyn Cache>>,
    debug: DebugFlags,
    offline: bool,
    key_policy: KeyPolicy,
    data_sets: DataSets,
}

impl<A: HerokuApi> AdminClient<A> {
    /// Client for `organization` with no cache, online, members only
    pub fn new(organization: impl Into<String>, api: A) -> Self {
        Self {
            organization: organization.into(),
            api,
            cache: None,
            debug: DebugFlags::default(),
            offline: false,
            key_policy: KeyPolicy::default(),
            data_sets: DataSets::default(),
        }
    }

    /// Apply debug, offline, key policy and data set settings from `config`.
    pub fn configure(mut self, config: &Config) -> Self {
        self.debug = config.debug;
        self.offline = config.offline;
        self.key_policy = config.cache.key_policy;
        self.data_sets = config.heroku.data_sets;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_debug(mut self, debug: DebugFlags) -> Self {
        self.debug = debug;
        self
    }

    /// Offline clients never reach the cache or the API.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_key_policy(mut self, policy: KeyPolicy) -> Self {
        self.key_policy = policy;
        self
    }

    pub fn with_data_sets(mut self, data_sets: DataSets) -> Self {
        self.data_sets = data_sets;
        self
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Start a pipeline with the team's data sets.
    ///
    /// Offline clients return an empty set. Otherwise the result holds the
    /// single data set mapping, read from the cache unless
    /// `options.skip_cache` is set.
    pub async fn get(
        &self,
        method_name: &str,
        args: &CallArgs,
        options: GetOptions,
    ) -> Result<ResultSet> {
        if self.offline {
            return Ok(ResultSet::empty());
        }

        let cache = match &self.cache {
            Some(cache) if !options.skip_cache => Some(cache.as_ref()),
            _ => None,
        };
        let fetch_options = FetchOptions {
            cache,
            debug: self.debug,
            key_policy: self.key_policy,
        };

        let result = get_heroku_resource(
            &self.api,
            &self.organization,
            method_name,
            args,
            &fetch_options,
            self.data_sets,
        )
        .await?;

        Ok(ResultSet::new(result.into_values()))
    }
}
