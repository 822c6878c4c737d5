//! Sorted set operations. Wire failures are contained.

use super::Cache;
use crate::command::zset::{self, ScoredMember, SortOrder};
use crate::error::{CacheError, Result};
use crate::outcome::Outcome;
use crate::reply;
use std::collections::HashMap;
use tracing::debug;

/// Rank range to read from a sorted set.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub key: String,
    pub sort: SortOrder,
    pub start: i64,
    pub end: i64,
    pub with_scores: bool,
    /// Keep at most this many entries of the reply.
    pub limit: Option<usize>,
}

impl RangeQuery {
    /// Ranks `0..=50`, highest score first, members only.
    pub fn new(key: impl Into<String>) -> Self {
        RangeQuery {
            key: key.into(),
            sort: SortOrder::default(),
            start: 0,
            end: 50,
            with_scores: false,
            limit: None,
        }
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn range(mut self, start: i64, end: i64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_scores(mut self) -> Self {
        self.with_scores = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Decoded `ZRANGE` reply.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeReply {
    Members(Vec<String>),
    /// Members with their scores, in rank order.
    Scores(Vec<ScoredMember>),
}

impl RangeReply {
    pub fn members(&self) -> Vec<&str> {
        match self {
            RangeReply::Members(members) => members.iter().map(String::as_str).collect(),
            RangeReply::Scores(scored) => scored.iter().map(|s| s.member.as_str()).collect(),
        }
    }

    /// Member → score. Empty for a members-only reply.
    pub fn scores_map(&self) -> HashMap<String, f64> {
        match self {
            RangeReply::Members(_) => HashMap::new(),
            RangeReply::Scores(scored) => scored.iter().map(|s| (s.member.clone(), s.score)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RangeReply::Members(m) => m.len(),
            RangeReply::Scores(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn truncate(&mut self, limit: usize) {
        match self {
            RangeReply::Members(m) => m.truncate(limit),
            RangeReply::Scores(s) => s.truncate(limit),
        }
    }
}

pub struct SortedStore<'a> {
    pub(super) cache: &'a Cache,
}

impl SortedStore<'_> {
    pub async fn get(&self, query: &RangeQuery) -> Result<Outcome<RangeReply>> {
        let key = self.cache.namespaced(&query.key)?;
        let cmd = zset::zrange(&key, query.start, query.end, query.sort, query.with_scores);
        let with_scores = query.with_scores;
        let limit = query.limit;
        Ok(self
            .cache
            .contained(cmd, |cmd, r| {
                let mut decoded = if with_scores {
                    RangeReply::Scores(reply::into_scored(cmd, r)?)
                } else {
                    RangeReply::Members(reply::into_strings(cmd, r)?)
                };
                if let Some(limit) = limit {
                    decoded.truncate(limit);
                }
                Ok(Outcome::Done(decoded))
            })
            .await)
    }

    /// Insert or overwrite scores. Returns how many members were new.
    pub async fn update(&self, key: &str, members: &[ScoredMember]) -> Result<Outcome<i64>> {
        self.zadd(key, members, false).await
    }

    /// Same as [`SortedStore::update`].
    pub async fn set(&self, key: &str, members: &[ScoredMember]) -> Result<Outcome<i64>> {
        self.zadd(key, members, false).await
    }

    /// Insert only members that are not there yet; existing scores stay.
    pub async fn add_if_not_exists(&self, key: &str, members: &[ScoredMember]) -> Result<Outcome<i64>> {
        self.zadd(key, members, true).await
    }

    async fn zadd(&self, key: &str, members: &[ScoredMember], only_new: bool) -> Result<Outcome<i64>> {
        let key = self.cache.namespaced(key)?;
        if members.is_empty() {
            return Err(CacheError::InvalidArgument("no scored members given".to_string()));
        }
        Ok(self
            .cache
            .contained(zset::zadd(&key, members, only_new), |cmd, r| {
                reply::into_integer(cmd, r).map(Outcome::Done)
            })
            .await)
    }

    /// Add `score` to a member's score, returning the new score.
    pub async fn incr_by(&self, key: &str, member: &str, score: f64) -> Result<Outcome<f64>> {
        let key = self.cache.namespaced(key)?;
        Ok(self
            .cache
            .contained(zset::zincrby(&key, member, score), |cmd, r| {
                reply::into_float(cmd, r).map(Outcome::Done)
            })
            .await)
    }

    /// `Done(true)` when the member was there.
    pub async fn remove(&self, key: &str, member: &str) -> Result<Outcome<bool>> {
        let key = self.cache.namespaced(key)?;
        Ok(self
            .cache
            .contained(zset::zrem(&key, member), |cmd, r| {
                Ok(Outcome::Done(reply::into_integer(cmd, r)? > 0))
            })
            .await)
    }

    /// Up to `count` distinct random members (a negative count allows
    /// repeats).
    pub async fn get_random(&self, key: &str, count: i64) -> Result<Outcome<Vec<String>>> {
        let key = self.cache.namespaced(key)?;
        debug!(key = %key, count, "Returning ZRANDMEMBER reply to caller");
        Ok(self
            .cache
            .contained(zset::zrandmember(&key, count), |cmd, r| {
                reply::into_strings(cmd, r).map(Outcome::Done)
            })
            .await)
    }
}
