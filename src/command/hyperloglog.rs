//! HyperLogLog commands.

use super::Command;

pub fn pfadd(key: &str, items: &[String]) -> Command {
    Command::new("PFADD").arg(key).args(items)
}

pub fn pfcount(key: &str) -> Command {
    Command::new("PFCOUNT").arg(key)
}

/// `PFMERGE destkey sourcekey ...`
pub fn pfmerge(dest: &str, sources: &[String]) -> Command {
    Command::new("PFMERGE").arg(dest).args(sources)
}
