//! Error types for the engine facade.

use shared_types::{BoardName, IdentityId, MessageId, ValidationError};
use thiserror::Error;
use tl_01_message_lists::MessageListError;
use tl_02_board_index::BoardIndexError;
use tl_04_subscribed_view::ViewError;

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Message rejected by structural validation; never stored or retried.
    #[error("Message rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    MessageList(#[from] MessageListError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    BoardIndex(#[from] BoardIndexError),

    /// Content authored by an identity that has been deleted.
    #[error("Identity {0} has been deleted")]
    DeletedIdentity(IdentityId),

    #[error("Unknown board {0}")]
    UnknownBoard(BoardName),

    /// `unsend` on a message that is not in the outbox.
    #[error("Message {0} is not queued")]
    NotQueued(MessageId),

    /// `unsend` on a message already handed to the content store.
    #[error("Message {0} is already published")]
    AlreadyPublished(MessageId),

    #[error("Unsupported snapshot version {found}, expected {expected}")]
    SnapshotVersion { found: u32, expected: u32 },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
