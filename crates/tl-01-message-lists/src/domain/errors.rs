//! Error types for the message list index.

use shared_types::{MessageId, MessageListId, ValidationError};
use thiserror::Error;

/// Errors raised while accepting a message list.
///
/// A rejected list is dropped entirely; none of its references are kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageListError {
    /// A reference names a message authored by someone else.
    #[error("List {list} references foreign message {message}")]
    ForeignReference { list: MessageListId, message: MessageId },

    /// A reference names an invalid board.
    #[error("List {list} has invalid board: {source}")]
    InvalidBoard {
        list: MessageListId,
        #[source]
        source: ValidationError,
    },

    /// The list exceeds the reference limit.
    #[error("List {list} has {count} references, limit is {max}")]
    TooManyReferences { list: MessageListId, count: usize, max: usize },
}

/// Result type for message list operations.
pub type MessageListResult<T> = Result<T, MessageListError>;
