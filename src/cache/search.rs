//! Search index lifecycle and queries.
//!
//! An index is a rebuildable projection over the hashes whose keys start
//! with its prefix. Defining an index that already exists drops it first;
//! there is no schema migration, and the drop/create pair is not atomic.

use super::Cache;
use crate::command::search::{self, SchemaField};
use crate::error::{CacheError, Result};
use crate::observability::metrics::METRIC_SEARCHES_TOTAL;
use crate::reply::{self, SearchDoc};
use metrics::counter;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Definition passed to [`SearchIndex::create_index`]. The index name and
/// the document prefix are both namespaced by the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub index: String,
    /// Key prefix (before namespacing) of the hashes to index.
    pub prefix: String,
    pub schema: Vec<SchemaField>,
}

/// Paginated query. Defaults: offset 0, limit 50, every field returned.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub index: String,
    /// Restrict the fields returned per document.
    pub populate: Option<Vec<String>>,
    pub offset: usize,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(index: impl Into<String>, query: impl Into<String>) -> Self {
        SearchQuery {
            query: query.into(),
            index: index.into(),
            populate: None,
            offset: 0,
            limit: 50,
        }
    }

    pub fn populate<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.populate = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Total matches, not just the ones on this page.
    pub count: u64,
    pub docs: Vec<SearchDoc>,
    pub elapsed: Duration,
}

impl SearchPage {
    /// Elapsed time as whole milliseconds, e.g. `"3ms"`.
    pub fn time(&self) -> String {
        format!("{}ms", self.elapsed.as_millis())
    }
}

pub struct SearchIndex<'a> {
    pub(super) cache: &'a Cache,
}

impl SearchIndex<'_> {
    /// Define `index`, replacing any existing definition of the same name.
    pub async fn create_index(&self, def: &IndexDefinition) -> Result<()> {
        if def.index.is_empty() || def.prefix.is_empty() || def.schema.is_empty() {
            return Err(CacheError::InvalidArgument(
                "index, prefix and schema are required".to_string(),
            ));
        }
        let index = self.cache.namespaced(&def.index)?;
        let prefix = self.cache.namespaced(&def.prefix)?;

        let cmd = search::ft_list();
        let existing = reply::into_strings(cmd.name, self.cache.dispatch(cmd).await?)?;
        debug!(indices = ?existing, "Existing search indices");

        if existing.iter().any(|name| name == &index) {
            let cmd = search::ft_dropindex(&index);
            reply::expect_ok(cmd.name, self.cache.dispatch(cmd).await?)?;
            info!(index = %index, "Dropped search index before redefinition");
        }

        let cmd = search::ft_create(&index, &prefix, &def.schema);
        reply::expect_ok(cmd.name, self.cache.dispatch(cmd).await?)?;
        info!(index = %index, prefix = %prefix, fields = def.schema.len(), "Created search index");
        Ok(())
    }

    /// Run a query. Failures are returned, never reported as zero results.
    pub async fn find(&self, query: &SearchQuery) -> Result<SearchPage> {
        if query.index.is_empty() {
            return Err(CacheError::InvalidArgument("search index is required".to_string()));
        }
        let index = self.cache.namespaced(&query.index)?;
        counter!(METRIC_SEARCHES_TOTAL).increment(1);
        let start = Instant::now();

        let cmd = search::ft_search(
            &index,
            &query.query,
            query.offset,
            query.limit,
            query.populate.as_deref(),
        );
        debug!(search = %cmd, "Searching");
        let name = cmd.name;
        let (count, docs) = reply::into_search_page(name, self.cache.dispatch(cmd).await?, self.cache.prefix())?;

        Ok(SearchPage {
            count,
            docs,
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::memory_cache;
    use crate::client::MemoryClient;
    use crate::command::search::FieldType;
    use std::sync::Arc;

    fn users_index() -> IndexDefinition {
        IndexDefinition {
            index: "user:index".to_string(),
            prefix: "user:".to_string(),
            schema: vec![
                SchemaField::new("name", FieldType::Text).sortable(),
                SchemaField::new("role", FieldType::Tag),
            ],
        }
    }

    #[tokio::test]
    async fn test_create_index_wire_format() {
        let (cache, client) = memory_cache();
        cache.search().create_index(&users_index()).await.unwrap();
        assert_eq!(
            client.last_command().unwrap().to_string(),
            "FT.CREATE app:user:index ON HASH PREFIX 1 app:user: SCHEMA name TEXT SORTABLE role TAG"
        );
    }

    #[tokio::test]
    async fn test_create_index_twice_is_idempotent() {
        let (cache, client) = memory_cache();
        cache.search().create_index(&users_index()).await.unwrap();
        cache.search().create_index(&users_index()).await.unwrap();

        let names: Vec<&str> = client.history().iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["FT._LIST", "FT.CREATE", "FT._LIST", "FT.DROPINDEX", "FT.CREATE"]);

        cache.hash().set("user:1", [("name", "Jo"), ("role", "admin")]).await.unwrap();
        let page = cache.search().find(&SearchQuery::new("user:index", "*")).await.unwrap();
        assert_eq!(page.count, 1);
    }

    #[tokio::test]
    async fn test_create_index_validates() {
        let (cache, client) = memory_cache();
        let mut def = users_index();
        def.schema.clear();
        assert!(matches!(cache.search().create_index(&def).await, Err(CacheError::InvalidArgument(_))));
        assert!(client.history().is_empty());
    }

    #[tokio::test]
    async fn test_find_decodes_documents() {
        let (cache, _) = memory_cache();
        cache.search().create_index(&users_index()).await.unwrap();
        cache.hash().set("user:1", [("name", "Jo"), ("role", "admin")]).await.unwrap();
        cache.hash().set("user:2", [("name", "Al"), ("role", "staff")]).await.unwrap();
        cache.hash().set("school:1", [("name", "Jo"), ("role", "admin")]).await.unwrap();

        let page = cache
            .search()
            .find(&SearchQuery::new("user:index", "@role:{admin}"))
            .await
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.docs[0].key, "user:1");
        assert_eq!(page.docs[0].fields["name"], "Jo");
        assert!(page.time().ends_with("ms"));
    }

    #[tokio::test]
    async fn test_find_paging_and_populate() {
        let (cache, client) = memory_cache();
        cache.search().create_index(&users_index()).await.unwrap();
        for i in 0..5 {
            cache
                .hash()
                .set(&format!("user:{}", i), [("name", format!("student {}", i)), ("role", "student".to_string())])
                .await
                .unwrap();
        }

        let query = SearchQuery::new("user:index", "student").page(1, 2).populate(["name"]);
        let page = cache.search().find(&query).await.unwrap();
        assert_eq!(
            client.last_command().unwrap().to_string(),
            "FT.SEARCH app:user:index student LIMIT 1 2 RETURN 1 name"
        );
        assert_eq!(page.count, 5);
        assert_eq!(page.docs.len(), 2);
        assert_eq!(page.docs[0].key, "user:1");
        assert!(page.docs.iter().all(|d| d.fields.len() == 1 && d.fields.contains_key("name")));
    }

    #[tokio::test]
    async fn test_find_without_matches() {
        let (cache, _) = memory_cache();
        cache.search().create_index(&users_index()).await.unwrap();
        let page = cache.search().find(&SearchQuery::new("user:index", "nobody")).await.unwrap();
        assert_eq!(page.count, 0);
        assert!(page.docs.is_empty());
        assert!(page.time().ends_with("ms"));
    }

    #[tokio::test]
    async fn test_find_surfaces_errors() {
        let (cache, client) = memory_cache();
        let err = cache.search().find(&SearchQuery::new("missing", "*")).await.unwrap_err();
        assert_eq!(err, CacheError::Server("Unknown Index name".to_string()));

        client.set_offline(true);
        let err = cache.search().find(&SearchQuery::new("user:index", "*")).await.unwrap_err();
        assert_eq!(err, CacheError::Offline);
    }

    #[tokio::test]
    async fn test_tenants_sharing_a_store_keep_their_indexes_apart() {
        let client = Arc::new(MemoryClient::new());
        let t1 = Cache::new(client.clone(), "t1:");
        let t2 = Cache::new(client.clone(), "t2:");

        t1.search().create_index(&users_index()).await.unwrap();
        t1.hash().set("user:1", [("name", "tenant-one")]).await.unwrap();
        t2.search().create_index(&users_index()).await.unwrap();
        t2.hash().set("user:9", [("name", "tenant-two")]).await.unwrap();

        let names: Vec<&str> = client.history().iter().map(|c| c.name).collect();
        assert!(!names.contains(&"FT.DROPINDEX"));

        let page = t1.search().find(&SearchQuery::new("user:index", "*")).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.docs[0].key, "user:1");
        assert_eq!(page.docs[0].fields["name"], "tenant-one");

        let page = t2.search().find(&SearchQuery::new("user:index", "*")).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.docs[0].key, "user:9");
    }

    #[test]
    fn test_time_formatting() {
        let page = SearchPage {
            count: 0,
            docs: Vec::new(),
            elapsed: Duration::from_micros(12_900),
        };
        assert_eq!(page.time(), "12ms");
    }
}
