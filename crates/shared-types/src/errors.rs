//! # Error Types
//!
//! Defines error types shared across subsystems.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural validation failures.
///
/// A message or list that fails validation is rejected outright: never
/// stored and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title longer than the configured limit.
    #[error("Title too long: {length} chars exceeds {max}")]
    TitleTooLong { length: usize, max: usize },

    /// Body longer than the configured limit.
    #[error("Body too long: {length} bytes exceeds {max}")]
    BodyTooLong { length: usize, max: usize },

    /// Forbidden control character in a text field.
    #[error("Control character U+{code:04X} in {field}")]
    ControlCharacter { field: &'static str, code: u32 },

    /// Bidirectional embedding/isolate markers do not balance.
    #[error("Unbalanced bidi control characters in {field}")]
    UnbalancedBidi { field: &'static str },

    /// Interlinear annotation markers are not properly paired.
    #[error("Unpaired annotation characters in {field}")]
    UnpairedAnnotation { field: &'static str },

    /// Message targets no board.
    #[error("Message targets no board")]
    NoBoards,

    /// Message targets too many boards.
    #[error("Message targets {count} boards, limit is {max}")]
    TooManyBoards { count: usize, max: usize },

    /// Board name fails the naming rules.
    #[error("Invalid board name: {0:?}")]
    InvalidBoardName(String),

    /// `reply_to_board` is not among the target boards.
    #[error("Reply-to board {0} is not a target board")]
    ReplyToBoardNotTargeted(String),

    /// Message names itself as parent or thread.
    #[error("Message {0} references itself")]
    SelfReference(String),

    /// Declared author differs from the author embedded in the id.
    #[error("Author mismatch: expected {expected}, found {found}")]
    AuthorMismatch { expected: String, found: String },

    /// Id text could not be parsed.
    #[error("Malformed id: {0}")]
    MalformedId(String),

    /// Too many attachments.
    #[error("Too many attachments: {count} exceeds {max}")]
    TooManyAttachments { count: usize, max: usize },
}

impl ValidationError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TitleTooLong { .. } | Self::BodyTooLong { .. } => "oversize",
            Self::ControlCharacter { .. } | Self::UnbalancedBidi { .. } | Self::UnpairedAnnotation { .. } => {
                "text"
            }
            Self::NoBoards | Self::TooManyBoards { .. } | Self::InvalidBoardName(_) | Self::ReplyToBoardNotTargeted(_) => {
                "boards"
            }
            Self::SelfReference(_) | Self::AuthorMismatch { .. } | Self::MalformedId(_) => "identity",
            Self::TooManyAttachments { .. } => "attachments",
        }
    }
}

/// Why a fetch from the content store failed.
///
/// Both reasons feed the same backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchReason {
    /// The store does not (yet) have the content.
    NotFound,
    /// Network or store hiccup.
    Transient,
}

/// Failure returned by the content store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Transient fetch failure: {0}")]
    Transient(String),

    /// Fetched content failed validation; never retried.
    #[error("Fetched content invalid: {0}")]
    Invalid(#[from] ValidationError),
}

impl FetchError {
    /// Backoff reason, or `None` for failures that must not be retried.
    pub fn reason(&self) -> Option<FetchReason> {
        match self {
            FetchError::NotFound(_) => Some(FetchReason::NotFound),
            FetchError::Transient(_) => Some(FetchReason::Transient),
            FetchError::Invalid(_) => None,
        }
    }
}
