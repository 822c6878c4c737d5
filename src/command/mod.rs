//! Command builders.
//!
//! One module per data model. Every builder returns a [`Command`] whose
//! arguments are already in the order the store expects; keys passed in are
//! final (namespacing happens in the façade).
//!
//! - key: SET/GET/EXISTS/DEL/EXPIRE
//! - hash: HSET/HDEL/HINCRBY/HGETALL/HGET/HMGET
//! - set: SADD/SREM/SMEMBERS
//! - zset: ZRANGE/ZADD/ZINCRBY/ZREM/ZRANDMEMBER
//! - hyperloglog: PFADD/PFCOUNT/PFMERGE
//! - search: FT._LIST/FT.DROPINDEX/FT.CREATE/FT.SEARCH

pub mod hash;
pub mod hyperloglog;
pub mod key;
pub mod search;
pub mod set;
pub mod zset;

use std::fmt;

/// A command ready to be sent: name plus ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: &'static str,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: &'static str) -> Self {
        Command { name, args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }

    /// Append `flag` only when `on` is set.
    pub fn flag(mut self, flag: &str, on: bool) -> Self {
        if on {
            self.args.push(flag.to_string());
        }
        self
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_composition() {
        let cmd = Command::new("ZRANGE")
            .arg("board")
            .args([0, 50])
            .flag("REV", true)
            .flag("WITHSCORES", false);
        assert_eq!(cmd.args, vec!["board", "0", "50", "REV"]);
        assert_eq!(cmd.to_string(), "ZRANGE board 0 50 REV");
    }
}
