//! # Core Domain Entities
//!
//! Defines the entities every subsystem agrees on.
//!
//! ## Clusters
//!
//! - **Identity**: `IdentityId`, the `Identity` capability trait and its variants
//! - **Messages**: `MessageId`, `Message`, `Attachment`
//! - **Announcements**: `MessageListId`, `MessageListReference`
//! - **Boards**: `BoardName`

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ValidationError;

/// Seconds since the Unix epoch (UTC).
pub type Timestamp = u64;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Public identifier of a pseudonymous identity (hash of its public key).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct IdentityId(pub [u8; 32]);

impl IdentityId {
    /// Short hex prefix used in log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityId({})", self.short())
    }
}

impl FromStr for IdentityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| ValidationError::MalformedId(s.to_string()))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ValidationError::MalformedId(s.to_string()))?;
        Ok(Self(array))
    }
}

/// Capability interface shared by every identity variant.
///
/// The engine only ever needs the id and a display name; trust decisions are
/// delegated to the trust oracle.
pub trait Identity: Send + Sync {
    /// The identity's public id.
    fn id(&self) -> IdentityId;

    /// Human-readable nickname, if one was published.
    fn nickname(&self) -> Option<&str>;

    /// Whether this identity is owned by the local user.
    fn is_own(&self) -> bool;
}

/// An identity controlled by the local user (a viewer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnIdentity {
    pub id: IdentityId,
    pub nickname: String,
}

impl Identity for OwnIdentity {
    fn id(&self) -> IdentityId {
        self.id
    }

    fn nickname(&self) -> Option<&str> {
        Some(&self.nickname)
    }

    fn is_own(&self) -> bool {
        true
    }
}

/// An identity learned from the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIdentity {
    pub id: IdentityId,
    pub nickname: Option<String>,
}

impl Identity for RemoteIdentity {
    fn id(&self) -> IdentityId {
        self.id
    }

    fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    fn is_own(&self) -> bool {
        false
    }
}

// =============================================================================
// CLUSTER B: MESSAGES
// =============================================================================

/// Globally unique message id, derived from its author and a random token.
///
/// Ordering is total (author first, then token) so that ties between equal
/// dates are broken deterministically everywhere.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId {
    pub author: IdentityId,
    pub token: Uuid,
}

impl MessageId {
    pub fn new(author: IdentityId, token: Uuid) -> Self {
        Self { author, token }
    }

    /// Fresh id with a random token.
    pub fn generate(author: IdentityId) -> Self {
        Self::new(author, Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.token, self.author)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.token.simple().to_string();
        write!(f, "MessageId({}@{})", &token[..8], self.author.short())
    }
}

impl FromStr for MessageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (token, author) = s
            .split_once('@')
            .ok_or_else(|| ValidationError::MalformedId(s.to_string()))?;
        let token = Uuid::parse_str(token).map_err(|_| ValidationError::MalformedId(s.to_string()))?;
        Ok(Self::new(author.parse()?, token))
    }
}

/// A file attached to a message, referenced by its content key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub key: String,
    pub size: u64,
}

/// An immutable board message.
///
/// `thread_id` is `None` exactly when the message is a thread root. A reply
/// may know its thread without knowing its direct parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub title: String,
    pub body: String,
    pub created: Timestamp,
    pub attachments: Vec<Attachment>,
    pub boards: BTreeSet<BoardName>,
    /// Board the author was reading when replying. Carried, never used for
    /// placement.
    pub reply_to_board: Option<BoardName>,
    pub parent_id: Option<MessageId>,
    pub thread_id: Option<MessageId>,
    /// The list this message was announced in, as set by the producer that
    /// delivered it. Not part of the message content.
    pub message_list: Option<MessageListId>,
}

impl Message {
    /// Create a thread root.
    pub fn new_thread(
        id: MessageId,
        title: impl Into<String>,
        body: impl Into<String>,
        created: Timestamp,
        boards: BTreeSet<BoardName>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            body: body.into(),
            created,
            attachments: Vec::new(),
            boards,
            reply_to_board: None,
            parent_id: None,
            thread_id: None,
            message_list: None,
        }
    }

    /// Create a reply to `parent` inside `thread`.
    pub fn new_reply(
        id: MessageId,
        thread: MessageId,
        parent: MessageId,
        body: impl Into<String>,
        created: Timestamp,
        boards: BTreeSet<BoardName>,
    ) -> Self {
        Self {
            id,
            title: String::new(),
            body: body.into(),
            created,
            attachments: Vec::new(),
            boards,
            reply_to_board: None,
            parent_id: Some(parent),
            thread_id: Some(thread),
            message_list: None,
        }
    }

    pub fn author(&self) -> IdentityId {
        self.id.author
    }

    /// True for thread roots.
    pub fn is_thread(&self) -> bool {
        self.thread_id.is_none()
    }

    /// Parent set but thread missing: an upstream producer bug.
    pub fn has_inconsistent_reference(&self) -> bool {
        self.thread_id.is_none() && self.parent_id.is_some()
    }

    /// Equal in everything but the delivery back-reference.
    pub fn same_content(&self, other: &Self) -> bool {
        Self {
            message_list: other.message_list,
            ..self.clone()
        } == *other
    }

    pub fn targets(&self, board: &BoardName) -> bool {
        self.boards.contains(board)
    }

    pub fn with_reply_to_board(mut self, board: BoardName) -> Self {
        self.reply_to_board = Some(board);
        self
    }

    pub fn with_message_list(mut self, list: MessageListId) -> Self {
        self.message_list = Some(list);
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

// =============================================================================
// CLUSTER C: ANNOUNCEMENTS
// =============================================================================

/// Identifies one published batch of message announcements.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Debug)]
pub struct MessageListId {
    pub author: IdentityId,
    pub edition: u64,
}

impl MessageListId {
    pub fn new(author: IdentityId, edition: u64) -> Self {
        Self { author, edition }
    }
}

impl fmt::Display for MessageListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.author.short(), self.edition)
    }
}

/// One announced message inside a message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageListReference {
    pub message_id: MessageId,
    pub board: BoardName,
    pub announced: Timestamp,
    /// Where the content store is expected to find the message.
    pub location_hint: String,
    pub downloaded: bool,
}

impl MessageListReference {
    pub fn new(message_id: MessageId, board: BoardName, announced: Timestamp) -> Self {
        Self {
            message_id,
            board,
            announced,
            location_hint: String::new(),
            downloaded: false,
        }
    }
}

// =============================================================================
// CLUSTER D: BOARDS
// =============================================================================

/// Maximum length of a board name.
pub const MAX_BOARD_NAME_LENGTH: usize = 64;

/// A validated, human-typeable board name such as `en.freenet` or `test`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoardName(String);

impl BoardName {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        crate::validation::validate_board_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BoardName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BoardName> for String {
    fn from(name: BoardName) -> Self {
        name.0
    }
}

impl FromStr for BoardName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for BoardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BoardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoardName({})", self.0)
    }
}
