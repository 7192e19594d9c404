use thiserror::Error;

use crate::io::{IoError, JournalError};

/// Error taxonomy for the bootstrap pipeline. Every stage surfaces one
/// of these to the coordinator, which routes to the close-remote
/// unwind (if anything was opened) and then completes with the
/// corresponding status code.
#[derive(Debug, Error)]
pub enum Error {
    /// Local image absent, client record absent, remote mirror not
    /// initialized. Terminal unless the specific stage documents a
    /// same-stage recovery (create-local, register-client).
    #[error("not found: {0}")]
    NotFound(String),

    /// Remote image exists but its promotion state is not primary.
    #[error("remote image is not primary")]
    RemoteNotPrimary,

    /// Local open returned the dedicated sentinel indicating the
    /// local side is primary.
    #[error("local image is primary")]
    LocalIsPrimary,

    /// Local and remote mirroring modes disagree.
    #[error("local and remote mirror modes disagree")]
    SplitBrain,

    /// Peer client data could not be decoded; requires operator
    /// intervention.
    #[error("peer client record is corrupt")]
    BadMessage,

    /// Remote mode is Snapshot in a codepath that doesn't support it
    /// yet.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Cooperative cancellation was observed.
    #[error("cancelled")]
    Cancelled,

    /// Any lower-layer RPC or journal error, surfaced verbatim.
    #[error(transparent)]
    Transport(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// The integer status delivered to the completion callback. `0`
    /// is reserved for success and is never produced here.
    pub fn status_code(&self) -> i32 {
        match self {
            Error::NotFound(_) => -1,
            Error::RemoteNotPrimary => -2,
            Error::LocalIsPrimary => -3,
            Error::SplitBrain => -4,
            Error::BadMessage => -5,
            Error::Unsupported(_) => -6,
            Error::Cancelled => -7,
            Error::Transport(_) => -8,
        }
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        match err {
            IoError::NotFound(what) => Error::NotFound(what),
            IoError::IsPrimary => Error::LocalIsPrimary,
            IoError::Other(e) => Error::Transport(e),
        }
    }
}

impl From<JournalError> for Error {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::NotFound => Error::NotFound("journal client record".into()),
            JournalError::Other(e) => Error::Transport(e),
        }
    }
}
