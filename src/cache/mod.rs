//! The cache façade.
//!
//! [`Cache`] owns one wire client and the key namespace. Operations are
//! grouped the same way the store groups its data models:
//!
//! - [`Cache::key`]: scalar values with optional expiry
//! - [`Cache::hash`]: field/value maps
//! - [`Cache::set`]: unordered unique members
//! - [`Cache::sorted`]: scored members queried by rank
//! - [`Cache::hyperlog`]: distinct-count estimators
//! - [`Cache::search`]: search indexes over hashes
//!
//! Key, sorted and hyperlog operations contain wire failures and report
//! them as [`Outcome::Failed`]. Hash, set and search operations return the
//! error. An empty key is always rejected with [`CacheError::MissingKey`].

pub mod hash;
pub mod hyperlog;
pub mod key;
pub mod search;
pub mod set;
pub mod sorted;

pub use hash::HashStore;
pub use hyperlog::HyperLogStore;
pub use key::KeyStore;
pub use search::{IndexDefinition, SearchIndex, SearchPage, SearchQuery};
pub use set::SetStore;
pub use sorted::{RangeQuery, RangeReply, SortedStore};

use crate::client::{RespClient, WireClient};
use crate::command::Command;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::observability::metrics::{
    METRIC_COMMANDS_TOTAL, METRIC_COMMAND_ERRORS_TOTAL, METRIC_COMMAND_LATENCY, METRIC_CONTAINED_FAILURES_TOTAL,
};
use crate::outcome::Outcome;
use crate::resp::RespValue;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

struct LatencyGuard {
    start: Instant,
}

impl Drop for LatencyGuard {
    fn drop(&mut self) {
        histogram!(METRIC_COMMAND_LATENCY).record(self.start.elapsed().as_secs_f64());
    }
}

/// Data-access handle over one store.
///
/// Cheap to clone; clones share the same client.
#[derive(Clone)]
pub struct Cache {
    client: Arc<dyn WireClient>,
    prefix: Arc<str>,
}

impl Cache {
    /// Wrap an existing client. Every key is sent as `{prefix}{key}`.
    pub fn new(client: Arc<dyn WireClient>, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Cache {
            client,
            prefix: prefix.into(),
        }
    }

    /// Build a RESP client from configuration. The connection is opened on
    /// first use.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let (prefix, _) = config.validate()?;
        let client = RespClient::new(config)?;
        Ok(Cache::new(Arc::new(client), prefix))
    }

    /// Like [`Cache::from_config`], but connects immediately.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let (prefix, _) = config.validate()?;
        let client = RespClient::connect(config).await?;
        Ok(Cache::new(Arc::new(client), prefix))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn key(&self) -> KeyStore<'_> {
        KeyStore { cache: self }
    }

    pub fn hash(&self) -> HashStore<'_> {
        HashStore { cache: self }
    }

    pub fn set(&self) -> SetStore<'_> {
        SetStore { cache: self }
    }

    pub fn sorted(&self) -> SortedStore<'_> {
        SortedStore { cache: self }
    }

    pub fn hyperlog(&self) -> HyperLogStore<'_> {
        HyperLogStore { cache: self }
    }

    pub fn search(&self) -> SearchIndex<'_> {
        SearchIndex { cache: self }
    }

    /// Apply the namespace; empty keys are rejected.
    pub(crate) fn namespaced(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(CacheError::MissingKey);
        }
        Ok(format!("{}{}", self.prefix, key))
    }

    pub(crate) async fn dispatch(&self, command: Command) -> Result<RespValue> {
        counter!(METRIC_COMMANDS_TOTAL, "command" => command.name).increment(1);
        let _guard = LatencyGuard { start: Instant::now() };
        debug!(command = %command, "Sending command");

        let result = self.client.call(&command).await;
        if result.is_err() {
            counter!(METRIC_COMMAND_ERRORS_TOTAL, "command" => command.name).increment(1);
        }
        result
    }

    /// Send a command whose failure is absorbed: any wire or decode error is
    /// logged and turned into [`Outcome::Failed`].
    pub(crate) async fn contained<T, F>(&self, command: Command, decode: F) -> Outcome<T>
    where
        F: FnOnce(&str, RespValue) -> Result<Outcome<T>>,
    {
        let name = command.name;
        let key = command.args.first().cloned().unwrap_or_default();
        match self.dispatch(command).await.and_then(|reply| decode(name, reply)) {
            Ok(outcome) => outcome,
            Err(e) => {
                counter!(METRIC_CONTAINED_FAILURES_TOTAL, "command" => name).increment(1);
                warn!(command = name, key = %key, error = %e, "Cache operation failed");
                Outcome::Failed(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("prefix", &self.prefix).finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::MemoryClient;

    pub(crate) fn memory_cache() -> (Cache, Arc<MemoryClient>) {
        let client = Arc::new(MemoryClient::new());
        (Cache::new(client.clone(), "app:"), client)
    }

    #[tokio::test]
    async fn test_caches_do_not_share_state() {
        let (a, _) = memory_cache();
        let (b, _) = memory_cache();
        a.key().set("k", "from-a", None).await.unwrap();
        assert_eq!(b.key().get("k").await.unwrap(), Outcome::Empty);
    }

    #[tokio::test]
    async fn test_namespace_applied_to_wire() {
        let (cache, client) = memory_cache();
        cache.key().exists("user:1").await.unwrap();
        assert_eq!(client.last_command().unwrap().args, vec!["app:user:1"]);
    }

    #[tokio::test]
    async fn test_empty_key_rejected_before_round_trip() {
        let (cache, client) = memory_cache();
        assert_eq!(cache.key().get("").await.unwrap_err(), CacheError::MissingKey);
        assert_eq!(cache.hash().get("").await.unwrap_err(), CacheError::MissingKey);
        assert!(client.history().is_empty());
    }

    #[test]
    fn test_from_config_requires_prefix_and_url() {
        let err = Cache::from_config(&CacheConfig::default()).unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));
        let cache = Cache::from_config(&CacheConfig::new("app:", "redis://127.0.0.1:6379")).unwrap();
        assert_eq!(cache.prefix(), "app:");
    }

    #[tokio::test]
    async fn test_clones_share_client() {
        let (cache, client) = memory_cache();
        let other = cache.clone();
        let (cache_keys, other_keys) = (cache.key(), other.key());
        let (x, y) = tokio::join!(cache_keys.set("x", "1", None), other_keys.set("y", "2", None));
        assert!(x.unwrap().succeeded() && y.unwrap().succeeded());
        assert_eq!(client.history().len(), 2);
    }
}
