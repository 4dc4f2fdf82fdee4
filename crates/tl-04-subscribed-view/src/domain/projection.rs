//! # Projections
//!
//! Pure functions from a board graph to what one viewer sees. Each call
//! walks the graph afresh; nothing is cached between queries.

use crate::domain::errors::{ViewError, ViewResult};
use crate::domain::links::{BoardReplyLink, BoardThreadLink};
use crate::ports::outbound::TrustOracle;
use shared_types::{IdentityId, Message, MessageId};
use tl_02_board_index::BoardGraph;

fn is_visible(viewer: &IdentityId, oracle: &dyn TrustOracle, message: &Message) -> bool {
    let author = message.author();
    author == *viewer || oracle.wants(viewer, &author)
}

/// Thread links of `graph`, most recently active first.
pub fn project_threads(viewer: &IdentityId, graph: &BoardGraph, oracle: &dyn TrustOracle) -> Vec<BoardThreadLink> {
    let mut links: Vec<BoardThreadLink> = graph
        .thread_entries()
        .into_iter()
        .filter_map(|entry| {
            let last_activity = entry
                .messages()
                .filter(|m| is_visible(viewer, oracle, m))
                .map(|m| m.created)
                .max()?;
            Some(BoardThreadLink {
                board: graph.name().clone(),
                thread_id: entry.id,
                kind: entry.kind.into(),
                head: entry.head.filter(|m| is_visible(viewer, oracle, m)).cloned(),
                last_activity,
                visible_replies: entry
                    .replies
                    .iter()
                    .filter(|m| is_visible(viewer, oracle, m))
                    .count(),
            })
        })
        .collect();

    links.sort_by(|a, b| {
        b.last_activity
            .cmp(&a.last_activity)
            .then_with(|| a.thread_id.cmp(&b.thread_id))
    });
    links
}

/// Visible replies of one thread entry, oldest first.
pub fn project_replies(
    viewer: &IdentityId,
    graph: &BoardGraph,
    thread_id: &MessageId,
    oracle: &dyn TrustOracle,
) -> ViewResult<Vec<BoardReplyLink>> {
    let entry = graph.thread(thread_id).map_err(|_| ViewError::ThreadNotFound {
        board: graph.name().clone(),
        thread: *thread_id,
    })?;

    let mut replies: Vec<&Message> = entry
        .replies
        .iter()
        .copied()
        .filter(|m| is_visible(viewer, oracle, m))
        .collect();
    replies.sort_by_key(|m| (m.created, m.id));

    Ok(replies
        .into_iter()
        .map(|message| BoardReplyLink {
            board: graph.name().clone(),
            thread_id: entry.id,
            message: message.clone(),
        })
        .collect())
}

/// Messages in `graph` the viewer can see.
pub fn visible_message_count(viewer: &IdentityId, graph: &BoardGraph, oracle: &dyn TrustOracle) -> usize {
    graph
        .messages()
        .filter(|m| is_visible(viewer, oracle, m))
        .count()
}
