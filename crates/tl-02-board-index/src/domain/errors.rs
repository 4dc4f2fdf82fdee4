//! Error types for the board index.

use shared_types::{BoardName, MessageId};
use thiserror::Error;

/// Board index errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardIndexError {
    /// The message does not target this board.
    #[error("Message {message} does not target board {board}")]
    WrongBoard { board: BoardName, message: MessageId },

    /// No such message in this board.
    #[error("Message {0} not found")]
    MessageNotFound(MessageId),

    /// The id is not a thread entry of this board.
    #[error("No thread {0}")]
    ThreadNotFound(MessageId),
}

/// Result type for board index operations.
pub type BoardIndexResult<T> = Result<T, BoardIndexError>;
