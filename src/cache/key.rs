//! Scalar key/value operations.

use super::Cache;
use crate::command::key;
use crate::error::Result;
use crate::outcome::Outcome;
use crate::reply;

pub struct KeyStore<'a> {
    pub(super) cache: &'a Cache,
}

impl KeyStore<'_> {
    /// Store `value`, expiring after `ttl_seconds` when given (zero means
    /// no expiry).
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<Outcome<()>> {
        let key = self.cache.namespaced(key)?;
        let ttl = ttl_seconds.filter(|t| *t > 0);
        Ok(self
            .cache
            .contained(key::set(&key, value, ttl), |cmd, r| reply::expect_ok(cmd, r).map(Outcome::Done))
            .await)
    }

    /// `Empty` when the key does not exist. A stored `"null"` string comes
    /// back as `Done("null")`.
    pub async fn get(&self, key: &str) -> Result<Outcome<String>> {
        let key = self.cache.namespaced(key)?;
        Ok(self
            .cache
            .contained(key::get(&key), |cmd, r| reply::into_optional_string(cmd, r).map(Outcome::from))
            .await)
    }

    pub async fn exists(&self, key: &str) -> Result<Outcome<bool>> {
        let key = self.cache.namespaced(key)?;
        Ok(self
            .cache
            .contained(key::exists(&key), |cmd, r| Ok(Outcome::Done(reply::into_integer(cmd, r)? == 1)))
            .await)
    }

    /// Succeeds whenever the round trip completes, whether or not the key
    /// was there.
    pub async fn delete(&self, key: &str) -> Result<Outcome<()>> {
        let key = self.cache.namespaced(key)?;
        Ok(self.cache.contained(key::del(&key), |_, _| Ok(Outcome::Done(()))).await)
    }

    /// `Done(false)` when the key does not exist.
    pub async fn expire(&self, key: &str, seconds: u64) -> Result<Outcome<bool>> {
        let key = self.cache.namespaced(key)?;
        Ok(self
            .cache
            .contained(key::expire(&key, seconds), |cmd, r| Ok(Outcome::Done(reply::into_integer(cmd, r)? == 1)))
            .await)
    }
}
