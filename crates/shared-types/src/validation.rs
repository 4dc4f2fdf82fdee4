//! # Structural Validation
//!
//! Checks applied to every message before it reaches the reconciliation
//! engine. A message that fails here is rejected, never stored and never
//! retried.
//!
//! ## Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | title | at most `max_title_chars`, no control characters |
//! | body | at most `max_body_bytes`, control characters except `\n` and `\t` rejected |
//! | text | bidi embeddings/isolates balanced, annotation markers paired |
//! | boards | non-empty, at most `max_boards`, every name valid |
//! | reply_to_board | member of `boards` |
//! | parent/thread | never the message itself |

use serde::{Deserialize, Serialize};

use crate::entities::{IdentityId, Message, MAX_BOARD_NAME_LENGTH};
use crate::errors::ValidationError;

/// Tunable validation limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub max_title_chars: usize,
    pub max_body_bytes: usize,
    pub max_boards: usize,
    pub max_attachments: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_title_chars: 256,
            max_body_bytes: 64 * 1024,
            max_boards: 16,
            max_attachments: 256,
        }
    }
}

/// Validate a board name.
pub fn validate_board_name(name: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidBoardName(name.to_string());

    if name.is_empty() || name.len() > MAX_BOARD_NAME_LENGTH {
        return Err(invalid());
    }

    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '_');
    if !name.chars().all(allowed) {
        return Err(invalid());
    }

    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !edge_ok(name.chars().next()) || !edge_ok(name.chars().last()) {
        return Err(invalid());
    }

    if name.contains("..") {
        return Err(invalid());
    }

    Ok(())
}

/// Validate a message as authored by `expected_author`.
pub fn validate_message(
    message: &Message,
    expected_author: Option<IdentityId>,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    if let Some(expected) = expected_author {
        if message.author() != expected {
            return Err(ValidationError::AuthorMismatch {
                expected: expected.to_string(),
                found: message.author().to_string(),
            });
        }
    }

    let title_len = message.title.chars().count();
    if title_len > limits.max_title_chars {
        return Err(ValidationError::TitleTooLong {
            length: title_len,
            max: limits.max_title_chars,
        });
    }
    if message.body.len() > limits.max_body_bytes {
        return Err(ValidationError::BodyTooLong {
            length: message.body.len(),
            max: limits.max_body_bytes,
        });
    }

    validate_text("title", &message.title, false)?;
    validate_text("body", &message.body, true)?;

    if message.attachments.len() > limits.max_attachments {
        return Err(ValidationError::TooManyAttachments {
            count: message.attachments.len(),
            max: limits.max_attachments,
        });
    }

    if message.boards.is_empty() {
        return Err(ValidationError::NoBoards);
    }
    if message.boards.len() > limits.max_boards {
        return Err(ValidationError::TooManyBoards {
            count: message.boards.len(),
            max: limits.max_boards,
        });
    }
    // BoardName is validated on construction; re-check in case of deserialized input.
    for board in &message.boards {
        validate_board_name(board.as_str())?;
    }
    if let Some(reply_to) = &message.reply_to_board {
        if !message.boards.contains(reply_to) {
            return Err(ValidationError::ReplyToBoardNotTargeted(reply_to.to_string()));
        }
    }

    if message.parent_id == Some(message.id) || message.thread_id == Some(message.id) {
        return Err(ValidationError::SelfReference(message.id.to_string()));
    }

    Ok(())
}

/// Validate free text: control characters, bidi balance, annotation pairing.
pub fn validate_text(field: &'static str, text: &str, multiline: bool) -> Result<(), ValidationError> {
    let mut embeddings: usize = 0;
    let mut isolates: usize = 0;
    let mut annotation = AnnotationState::Outside;

    for c in text.chars() {
        if c.is_control() && !(multiline && (c == '\n' || c == '\t')) {
            return Err(ValidationError::ControlCharacter {
                field,
                code: c as u32,
            });
        }

        match c {
            // LRE, RLE, LRO, RLO
            '\u{202A}' | '\u{202B}' | '\u{202D}' | '\u{202E}' => embeddings += 1,
            // PDF
            '\u{202C}' => {
                embeddings = embeddings
                    .checked_sub(1)
                    .ok_or(ValidationError::UnbalancedBidi { field })?;
            }
            // LRI, RLI, FSI
            '\u{2066}' | '\u{2067}' | '\u{2068}' => isolates += 1,
            // PDI
            '\u{2069}' => {
                isolates = isolates
                    .checked_sub(1)
                    .ok_or(ValidationError::UnbalancedBidi { field })?;
            }
            '\u{FFF9}' | '\u{FFFA}' | '\u{FFFB}' => {
                annotation = annotation
                    .advance(c)
                    .ok_or(ValidationError::UnpairedAnnotation { field })?;
            }
            _ => {}
        }
    }

    if embeddings != 0 || isolates != 0 {
        return Err(ValidationError::UnbalancedBidi { field });
    }
    if annotation != AnnotationState::Outside {
        return Err(ValidationError::UnpairedAnnotation { field });
    }
    Ok(())
}

/// Interlinear annotation: anchor (FFF9), separator (FFFA), terminator (FFFB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnnotationState {
    Outside,
    Annotated,
    Annotation,
}

impl AnnotationState {
    fn advance(self, c: char) -> Option<Self> {
        match (self, c) {
            (AnnotationState::Outside, '\u{FFF9}') => Some(AnnotationState::Annotated),
            (AnnotationState::Annotated, '\u{FFFA}') => Some(AnnotationState::Annotation),
            (AnnotationState::Annotation, '\u{FFFB}') => Some(AnnotationState::Outside),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BoardName, MessageId};
    use std::collections::BTreeSet;

    fn boards(names: &[&str]) -> BTreeSet<BoardName> {
        names.iter().map(|n| BoardName::new(*n).unwrap()).collect()
    }

    fn message(title: &str, body: &str) -> Message {
        Message::new_thread(
            MessageId::generate(IdentityId([1; 32])),
            title,
            body,
            100,
            boards(&["test"]),
        )
    }

    #[test]
    fn test_board_names() {
        for ok in ["a", "test", "en.freenet", "my_board-2", "x9"] {
            assert!(validate_board_name(ok).is_ok(), "{ok} should be valid");
        }
        for bad in ["", "Test", ".test", "test.", "a..b", "has space", "-a", &"a".repeat(65)] {
            assert!(validate_board_name(bad).is_err(), "{bad} should be invalid");
        }
    }

    #[test]
    fn test_plain_message_passes() {
        let msg = message("Hello", "line one\n\tline two");
        assert!(validate_message(&msg, Some(IdentityId([1; 32])), &ValidationLimits::default()).is_ok());
    }

    #[test]
    fn test_newline_in_title_rejected() {
        let msg = message("Hello\nWorld", "");
        assert!(matches!(
            validate_message(&msg, None, &ValidationLimits::default()),
            Err(ValidationError::ControlCharacter { field: "title", .. })
        ));
    }

    #[test]
    fn test_bidi_must_balance() {
        assert!(validate_text("body", "a\u{202E}b\u{202C}c", true).is_ok());
        assert!(validate_text("body", "a\u{202E}b", true).is_err());
        assert!(validate_text("body", "\u{202C}", true).is_err());
        assert!(validate_text("body", "\u{2067}x\u{2069}", true).is_ok());
        assert!(validate_text("body", "\u{2067}x", true).is_err());
    }

    #[test]
    fn test_annotation_must_pair() {
        assert!(validate_text("body", "\u{FFF9}kanji\u{FFFA}reading\u{FFFB}", true).is_ok());
        assert!(validate_text("body", "\u{FFF9}kanji", true).is_err());
        assert!(validate_text("body", "\u{FFFB}", true).is_err());
    }

    #[test]
    fn test_oversize_fields_rejected() {
        let limits = ValidationLimits::default();
        let msg = message(&"t".repeat(257), "");
        assert!(matches!(
            validate_message(&msg, None, &limits),
            Err(ValidationError::TitleTooLong { .. })
        ));
        let msg = message("", &"b".repeat(64 * 1024 + 1));
        assert!(matches!(
            validate_message(&msg, None, &limits),
            Err(ValidationError::BodyTooLong { .. })
        ));
    }

    #[test]
    fn test_attachment_count_bounded() {
        let limits = ValidationLimits {
            max_attachments: 2,
            ..ValidationLimits::default()
        };
        let file = |n: u64| crate::entities::Attachment {
            key: format!("CHK@file{n}"),
            size: n * 1024,
        };
        let msg = message("t", "b").with_attachment(file(1)).with_attachment(file(2));
        assert!(validate_message(&msg, None, &limits).is_ok());
        let msg = msg.with_attachment(file(3));
        assert!(matches!(
            validate_message(&msg, None, &limits),
            Err(ValidationError::TooManyAttachments { count: 3, max: 2 })
        ));
    }

    #[test]
    fn test_board_set_rules() {
        let limits = ValidationLimits::default();
        let mut msg = message("t", "b");
        msg.boards.clear();
        assert_eq!(validate_message(&msg, None, &limits), Err(ValidationError::NoBoards));

        let names: Vec<String> = (0..17).map(|i| format!("b{i}")).collect();
        msg.boards = names.iter().map(|n| BoardName::new(n.as_str()).unwrap()).collect();
        assert!(matches!(
            validate_message(&msg, None, &limits),
            Err(ValidationError::TooManyBoards { count: 17, .. })
        ));

        let mut msg = message("t", "b").with_reply_to_board(BoardName::new("other").unwrap());
        assert!(matches!(
            validate_message(&msg, None, &limits),
            Err(ValidationError::ReplyToBoardNotTargeted(_))
        ));
        msg.boards.insert(BoardName::new("other").unwrap());
        assert!(validate_message(&msg, None, &limits).is_ok());
    }

    #[test]
    fn test_author_mismatch_and_self_reference() {
        let limits = ValidationLimits::default();
        let msg = message("t", "b");
        assert!(matches!(
            validate_message(&msg, Some(IdentityId([9; 32])), &limits),
            Err(ValidationError::AuthorMismatch { .. })
        ));

        let mut looped = message("t", "b");
        looped.thread_id = Some(looped.id);
        looped.parent_id = Some(looped.id);
        assert!(matches!(
            validate_message(&looped, None, &limits),
            Err(ValidationError::SelfReference(_))
        ));
    }
}
