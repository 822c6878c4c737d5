//! Wire clients.
//!
//! The façade only needs one primitive: send a [`Command`] and get the raw
//! reply back. [`RespClient`] speaks RESP over TCP; [`MemoryClient`] keeps
//! everything in process.

pub mod memory;
pub mod tcp;

pub use memory::MemoryClient;
pub use tcp::RespClient;

use crate::command::Command;
use crate::error::{CacheError, Result};
use crate::resp::RespValue;
use async_trait::async_trait;

#[async_trait]
pub trait WireClient: Send + Sync {
    /// Send one command and wait for its reply.
    ///
    /// Error replies from the store come back as [`CacheError::Server`].
    async fn call(&self, command: &Command) -> Result<RespValue>;
}

/// Turn an error reply into an `Err`.
pub(crate) fn reject_error(reply: RespValue) -> Result<RespValue> {
    match reply {
        RespValue::Error(msg) => Err(CacheError::Server(msg)),
        other => Ok(other),
    }
}
