//! Distinct-count estimators. Wire failures are contained.

use super::Cache;
use crate::command::hyperloglog;
use crate::error::{CacheError, Result};
use crate::outcome::Outcome;
use crate::reply;

pub struct HyperLogStore<'a> {
    pub(super) cache: &'a Cache,
}

impl HyperLogStore<'_> {
    /// `Done(true)` when the estimate may have changed.
    pub async fn add<I, S>(&self, key: &str, items: I) -> Result<Outcome<bool>>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let key = self.cache.namespaced(key)?;
        let items: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
        Ok(self
            .cache
            .contained(hyperloglog::pfadd(&key, &items), |cmd, r| {
                Ok(Outcome::Done(reply::into_integer(cmd, r)? == 1))
            })
            .await)
    }

    /// Approximate number of distinct items added.
    pub async fn count(&self, key: &str) -> Result<Outcome<u64>> {
        let key = self.cache.namespaced(key)?;
        Ok(self.pfcount(&key).await)
    }

    /// Merge every estimator into the first key and return its count.
    pub async fn merge<S: AsRef<str>>(&self, keys: &[S]) -> Result<Outcome<u64>> {
        let keys = keys
            .iter()
            .map(|k| self.cache.namespaced(k.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let Some((dest, sources)) = keys.split_first() else {
            return Err(CacheError::InvalidArgument("merge needs at least one key".to_string()));
        };

        let merged = self
            .cache
            .contained(hyperloglog::pfmerge(dest, sources), |cmd, r| {
                reply::expect_ok(cmd, r).map(Outcome::Done)
            })
            .await;
        match merged {
            Outcome::Failed(msg) => Ok(Outcome::Failed(msg)),
            _ => Ok(self.pfcount(dest).await),
        }
    }

    async fn pfcount(&self, key: &str) -> Outcome<u64> {
        self.cache
            .contained(hyperloglog::pfcount(key), |cmd, r| {
                let n = reply::into_integer(cmd, r)?;
                Ok(Outcome::Done(u64::try_from(n).map_err(|_| CacheError::unexpected(cmd, n))?))
            })
            .await
    }
}
