//! # Test Fixtures
//!
//! Builders shared by the integration tests and the benchmarks.

use engine_runtime::{BoardEngine, EngineConfig};
use proptest::prelude::*;
use shared_types::{BoardName, IdentityId, Message, MessageId, Timestamp};
use std::collections::BTreeSet;
use std::sync::Arc;
use tl_03_fetch_retry::ManualTimeSource;
use tl_04_subscribed_view::{BoardThreadLink, TrustEveryone};
use uuid::Uuid;

/// Boards used by generated forests.
pub const BOARDS: [&str; 3] = ["en.alpha", "en.beta", "en.gamma"];

/// The identity every test views boards as.
pub const VIEWER: IdentityId = IdentityId([0xEE; 32]);

pub fn board(name: &str) -> BoardName {
    BoardName::new(name).expect("valid board name")
}

pub fn boards(names: &[&str]) -> BTreeSet<BoardName> {
    names.iter().map(|n| board(n)).collect()
}

pub fn author(byte: u8) -> IdentityId {
    IdentityId([byte; 32])
}

/// Deterministic id: the same `(author, n)` always yields the same id.
pub fn message_id(by: u8, n: u128) -> MessageId {
    MessageId::new(author(by), Uuid::from_u128(n))
}

pub fn root(by: u8, created: Timestamp, targets: &[&str]) -> Message {
    Message::new_thread(MessageId::generate(author(by)), "title", "body", created, boards(targets))
}

pub fn reply(by: u8, thread: &Message, parent: &Message, created: Timestamp) -> Message {
    Message::new_reply(
        MessageId::generate(author(by)),
        thread.id,
        parent.id,
        "reply",
        created,
        thread.boards.clone(),
    )
}

/// Engine on a manual clock, trusting everyone, with `VIEWER` subscribed to `BOARDS`.
pub fn engine() -> BoardEngine {
    let engine = BoardEngine::new(
        EngineConfig::default(),
        Arc::new(TrustEveryone),
        Arc::new(ManualTimeSource::new(1_000_000)),
    );
    for name in BOARDS {
        engine.subscribe(VIEWER, board(name));
    }
    engine
}

/// Everything a viewer sees in one board: each thread link with its reply ids.
pub fn board_view(engine: &BoardEngine, name: &str) -> Vec<(BoardThreadLink, Vec<MessageId>)> {
    let board = board(name);
    engine
        .get_threads(&VIEWER, &board)
        .expect("subscribed board")
        .into_iter()
        .map(|link| {
            let replies = engine
                .get_replies(&VIEWER, &board, &link.thread_id)
                .expect("listed thread")
                .iter()
                .map(|r| r.id())
                .collect();
            (link, replies)
        })
        .collect()
}

/// Every board as the viewer sees it.
pub fn full_view(engine: &BoardEngine) -> Vec<Vec<(BoardThreadLink, Vec<MessageId>)>> {
    BOARDS.iter().map(|name| board_view(engine, name)).collect()
}

/// Shape of one generated message.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub author: u8,
    /// Index of an earlier message to reply to; `None` starts a thread.
    pub parent: Option<usize>,
    /// Bit mask over `BOARDS`; zero is treated as the first board.
    pub boards: u8,
}

/// Build messages from blueprints. Creation dates follow the index, so a
/// parent is always older than its replies.
pub fn build_forest(blueprints: &[Blueprint]) -> Vec<Message> {
    let mut messages: Vec<Message> = Vec::with_capacity(blueprints.len());
    for (i, bp) in blueprints.iter().enumerate() {
        let targets: BTreeSet<BoardName> = BOARDS
            .iter()
            .enumerate()
            .filter(|(bit, _)| bp.boards & (1 << bit) != 0)
            .map(|(_, name)| board(name))
            .collect();
        let targets = if targets.is_empty() { boards(&BOARDS[..1]) } else { targets };
        let id = message_id(bp.author, i as u128 + 1);
        let created = 100 + i as Timestamp * 10;

        let message = match bp.parent.and_then(|p| messages.get(p % i.max(1))) {
            Some(parent) if i > 0 => {
                let thread = parent.thread_id.unwrap_or(parent.id);
                Message::new_reply(id, thread, parent.id, "reply", created, targets)
            }
            _ => Message::new_thread(id, "title", "body", created, targets),
        };
        messages.push(message);
    }
    messages
}

pub fn blueprint_strategy(max: usize) -> impl Strategy<Value = Vec<Blueprint>> {
    prop::collection::vec(
        (0u8..4, prop::option::weighted(0.75, 0usize..64), 0u8..8).prop_map(|(author, parent, boards)| Blueprint {
            author,
            parent,
            boards,
        }),
        1..max,
    )
}
