//! HexagonDB cache layer.
//!
//! A typed data-access façade over a RESP in-memory store. Calls are
//! composed into wire commands, sent through a [`WireClient`], and the flat
//! replies are decoded back into maps, lists and scored members.
//!
//! ```ignore
//! use hexagon_cache::{Cache, CacheConfig};
//!
//! let cache = Cache::from_config(&CacheConfig::new("app:", "redis://127.0.0.1:6379"))?;
//! cache.hash().set("user:1", [("name", "Jo"), ("role", "admin")]).await?;
//! let role = cache.hash().get_field("user:1", "role").await?;
//! ```

pub mod cache;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod observability;
pub mod outcome;
pub mod reply;
pub mod resp;

pub use cache::{Cache, IndexDefinition, RangeQuery, RangeReply, SearchPage, SearchQuery};
pub use client::{MemoryClient, RespClient, WireClient};
pub use command::search::{FieldType, SchemaField};
pub use command::zset::{ScoredMember, SortOrder};
pub use command::Command;
pub use config::{CacheConfig, Config, LoggingConfig};
pub use error::CacheError;
pub use outcome::Outcome;
pub use reply::SearchDoc;
