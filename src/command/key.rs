//! Scalar key commands.

use super::Command;

/// `SET key value [EX ttl]`
pub fn set(key: &str, value: &str, ttl_seconds: Option<u64>) -> Command {
    let cmd = Command::new("SET").arg(key).arg(value);
    match ttl_seconds {
        Some(ttl) => cmd.arg("EX").arg(ttl),
        None => cmd,
    }
}

pub fn get(key: &str) -> Command {
    Command::new("GET").arg(key)
}

pub fn exists(key: &str) -> Command {
    Command::new("EXISTS").arg(key)
}

pub fn del(key: &str) -> Command {
    Command::new("DEL").arg(key)
}

pub fn expire(key: &str, seconds: u64) -> Command {
    Command::new("EXPIRE").arg(key).arg(seconds)
}
