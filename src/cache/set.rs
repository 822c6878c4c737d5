//! Set operations. Errors are returned to the caller.

use super::Cache;
use crate::command::set;
use crate::error::{CacheError, Result};
use crate::reply;

pub struct SetStore<'a> {
    pub(super) cache: &'a Cache,
}

impl SetStore<'_> {
    /// Returns how many members were not already present.
    pub async fn add<I, S>(&self, key: &str, members: I) -> Result<i64>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let key = self.cache.namespaced(key)?;
        let cmd = set::sadd(&key, &members_of(members)?);
        reply::into_integer(cmd.name, self.cache.dispatch(cmd).await?)
    }

    pub async fn remove<I, S>(&self, key: &str, members: I) -> Result<i64>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let key = self.cache.namespaced(key)?;
        let cmd = set::srem(&key, &members_of(members)?);
        reply::into_integer(cmd.name, self.cache.dispatch(cmd).await?)
    }

    /// Every member, in no particular order.
    pub async fn get(&self, key: &str) -> Result<Vec<String>> {
        let key = self.cache.namespaced(key)?;
        let cmd = set::smembers(&key);
        reply::into_strings(cmd.name, self.cache.dispatch(cmd).await?)
    }
}

fn members_of<I, S>(members: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    let members: Vec<String> = members.into_iter().map(|m| m.to_string()).collect();
    if members.is_empty() {
        return Err(CacheError::InvalidArgument("no members given".to_string()));
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use crate::cache::tests::memory_cache;
    use crate::error::CacheError;

    #[tokio::test]
    async fn test_add_remove_get() {
        let (cache, client) = memory_cache();
        assert_eq!(cache.set().add("classroom:7:students", ["s1", "s2", "s2"]).await.unwrap(), 2);
        assert_eq!(client.last_command().unwrap().to_string(), "SADD app:classroom:7:students s1 s2 s2");
        assert_eq!(cache.set().remove("classroom:7:students", ["s1"]).await.unwrap(), 1);

        let mut members = cache.set().get("classroom:7:students").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["s2"]);
        assert!(cache.set().get("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_numeric_members_and_validation() {
        let (cache, _) = memory_cache();
        assert_eq!(cache.set().add("ids", [3, 1, 3]).await.unwrap(), 2);
        let none: Vec<String> = Vec::new();
        assert!(matches!(cache.set().add("ids", none).await, Err(CacheError::InvalidArgument(_))));
        assert_eq!(cache.set().add("", ["x"]).await.unwrap_err(), CacheError::MissingKey);
    }
}
