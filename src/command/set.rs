//! Set commands.

use super::Command;

pub fn sadd(key: &str, members: &[String]) -> Command {
    Command::new("SADD").arg(key).args(members)
}

pub fn srem(key: &str, members: &[String]) -> Command {
    Command::new("SREM").arg(key).args(members)
}

pub fn smembers(key: &str) -> Command {
    Command::new("SMEMBERS").arg(key)
}
