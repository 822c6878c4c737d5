//! Hash commands.

use super::Command;

/// `HSET key f1 v1 f2 v2 ...`, all fields in one round trip.
pub fn hset<'a, I>(key: &str, pairs: I) -> Command
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut cmd = Command::new("HSET").arg(key);
    for (field, value) in pairs {
        cmd = cmd.arg(field).arg(value);
    }
    cmd
}

pub fn hdel(key: &str, fields: &[String]) -> Command {
    Command::new("HDEL").arg(key).args(fields)
}

pub fn hincrby(key: &str, field: &str, amount: i64) -> Command {
    Command::new("HINCRBY").arg(key).arg(field).arg(amount)
}

pub fn hgetall(key: &str) -> Command {
    Command::new("HGETALL").arg(key)
}

pub fn hget(key: &str, field: &str) -> Command {
    Command::new("HGET").arg(key).arg(field)
}

pub fn hmget(key: &str, fields: &[String]) -> Command {
    Command::new("HMGET").arg(key).args(fields)
}
