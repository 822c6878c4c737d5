use thiserror::Error;

/// Errors raised by the cache layer.
///
/// Configuration and argument errors are returned straight away. Wire errors
/// are either propagated (hash, set, search) or folded into an
/// [`Outcome::Failed`](crate::outcome::Outcome::Failed) by the contained
/// operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cache key is missing")]
    MissingKey,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    /// Error reply sent back by the store (`-ERR ...`).
    #[error("{0}")]
    Server(String),

    #[error("unexpected reply to {command}: {reply}")]
    UnexpectedReply { command: String, reply: String },

    #[error("store is offline")]
    Offline,
}

impl CacheError {
    pub fn unexpected(command: impl Into<String>, reply: impl std::fmt::Debug) -> Self {
        CacheError::UnexpectedReply {
            command: command.into(),
            reply: format!("{:?}", reply),
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
