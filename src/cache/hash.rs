//! Hash operations. Errors are returned to the caller.

use super::Cache;
use crate::command::hash;
use crate::error::{CacheError, Result};
use crate::reply;
use std::collections::HashMap;

pub struct HashStore<'a> {
    pub(super) cache: &'a Cache,
}

impl HashStore<'_> {
    /// Write every field in one round trip. Returns how many fields were new.
    pub async fn set<I, K, V>(&self, key: &str, data: I) -> Result<i64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString,
    {
        let key = self.cache.namespaced(key)?;
        let pairs: Vec<(String, String)> = data
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if pairs.is_empty() {
            return Err(CacheError::InvalidArgument("hash data is empty".to_string()));
        }
        let cmd = hash::hset(&key, pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        reply::into_integer(cmd.name, self.cache.dispatch(cmd).await?)
    }

    pub async fn remove<S: AsRef<str>>(&self, key: &str, fields: &[S]) -> Result<i64> {
        let key = self.cache.namespaced(key)?;
        let cmd = hash::hdel(&key, &owned(fields)?);
        reply::into_integer(cmd.name, self.cache.dispatch(cmd).await?)
    }

    /// Add `amount` to an integer field, returning the new value.
    pub async fn incrby(&self, key: &str, field: &str, amount: i64) -> Result<i64> {
        let key = self.cache.namespaced(key)?;
        let cmd = hash::hincrby(&key, field, amount);
        reply::into_integer(cmd.name, self.cache.dispatch(cmd).await?)
    }

    pub async fn incr(&self, key: &str, field: &str) -> Result<i64> {
        self.incrby(key, field, 1).await
    }

    /// All fields; empty when the key does not exist.
    pub async fn get(&self, key: &str) -> Result<HashMap<String, String>> {
        let key = self.cache.namespaced(key)?;
        let cmd = hash::hgetall(&key);
        reply::into_field_map(cmd.name, self.cache.dispatch(cmd).await?)
    }

    pub async fn get_field(&self, key: &str, field: &str) -> Result<Option<String>> {
        let key = self.cache.namespaced(key)?;
        let cmd = hash::hget(&key, field);
        reply::into_optional_string(cmd.name, self.cache.dispatch(cmd).await?)
    }

    pub async fn set_field(&self, key: &str, field: &str, value: impl ToString) -> Result<i64> {
        let key = self.cache.namespaced(key)?;
        let value = value.to_string();
        let cmd = hash::hset(&key, [(field, value.as_str())]);
        reply::into_integer(cmd.name, self.cache.dispatch(cmd).await?)
    }

    /// Read several fields at once, in the order they were asked for.
    /// Missing fields are present with `None`.
    pub async fn get_fields<S: AsRef<str>>(&self, key: &str, fields: &[S]) -> Result<Vec<(String, Option<String>)>> {
        let key = self.cache.namespaced(key)?;
        let fields = owned(fields)?;
        let cmd = hash::hmget(&key, &fields);
        let values = reply::into_optional_strings(cmd.name, self.cache.dispatch(cmd).await?)?;
        Ok(reply::zip_fields(&fields, values))
    }
}

fn owned<S: AsRef<str>>(fields: &[S]) -> Result<Vec<String>> {
    if fields.is_empty() {
        return Err(CacheError::InvalidArgument("no fields given".to_string()));
    }
    Ok(fields.iter().map(|f| f.as_ref().to_string()).collect())
}
