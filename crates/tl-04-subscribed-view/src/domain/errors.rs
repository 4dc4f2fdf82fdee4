use shared_types::{BoardName, IdentityId, MessageId};
use thiserror::Error;

/// Errors returned by view queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("identity {viewer} is not subscribed to board {board}")]
    NotSubscribed { viewer: IdentityId, board: BoardName },

    #[error("thread {thread} not found in board {board}")]
    ThreadNotFound { board: BoardName, thread: MessageId },
}

pub type ViewResult<T> = Result<T, ViewError>;
