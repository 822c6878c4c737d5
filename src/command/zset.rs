//! Sorted set commands.

use super::Command;
use crate::error::CacheError;
use std::str::FromStr;

/// Iteration order of a rank range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Lowest score first (`"L2H"`).
    LowToHigh,
    /// Highest score first (`"H2L"`), sent as `REV`.
    #[default]
    HighToLow,
}

impl FromStr for SortOrder {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "L2H" => Ok(SortOrder::LowToHigh),
            "H2L" => Ok(SortOrder::HighToLow),
            other => Err(CacheError::InvalidArgument(format!("unknown sort order '{}'", other))),
        }
    }
}

/// A member paired with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    pub member: String,
    pub score: f64,
}

impl ScoredMember {
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        ScoredMember {
            member: member.into(),
            score,
        }
    }
}

/// Render a score the way the store parses it.
pub fn format_score(score: f64) -> String {
    if score == f64::INFINITY {
        "+inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        score.to_string()
    }
}

/// `ZRANGE key start end [REV] [WITHSCORES]`
pub fn zrange(key: &str, start: i64, end: i64, order: SortOrder, with_scores: bool) -> Command {
    Command::new("ZRANGE")
        .arg(key)
        .arg(start)
        .arg(end)
        .flag("REV", order == SortOrder::HighToLow)
        .flag("WITHSCORES", with_scores)
}

/// `ZADD key [NX] score member ...`
pub fn zadd(key: &str, members: &[ScoredMember], only_new: bool) -> Command {
    let mut cmd = Command::new("ZADD").arg(key).flag("NX", only_new);
    for m in members {
        cmd = cmd.arg(format_score(m.score)).arg(&m.member);
    }
    cmd
}

/// `ZINCRBY key increment member`
pub fn zincrby(key: &str, member: &str, increment: f64) -> Command {
    Command::new("ZINCRBY").arg(key).arg(format_score(increment)).arg(member)
}

pub fn zrem(key: &str, member: &str) -> Command {
    Command::new("ZREM").arg(key).arg(member)
}

pub fn zrandmember(key: &str, count: i64) -> Command {
    Command::new("ZRANDMEMBER").arg(key).arg(count)
}
