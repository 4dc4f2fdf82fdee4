//! Which own identity follows which board.

use serde::{Deserialize, Serialize};
use shared_types::{BoardName, IdentityId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriptions {
    by_viewer: BTreeMap<IdentityId, BTreeSet<BoardName>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if already subscribed.
    pub fn subscribe(&mut self, viewer: IdentityId, board: BoardName) -> bool {
        self.by_viewer.entry(viewer).or_default().insert(board)
    }

    /// Returns false if not subscribed.
    pub fn unsubscribe(&mut self, viewer: &IdentityId, board: &BoardName) -> bool {
        let Some(boards) = self.by_viewer.get_mut(viewer) else {
            return false;
        };
        let removed = boards.remove(board);
        if boards.is_empty() {
            self.by_viewer.remove(viewer);
        }
        removed
    }

    pub fn is_subscribed(&self, viewer: &IdentityId, board: &BoardName) -> bool {
        self.by_viewer
            .get(viewer)
            .is_some_and(|boards| boards.contains(board))
    }

    pub fn boards_of(&self, viewer: &IdentityId) -> BTreeSet<BoardName> {
        self.by_viewer.get(viewer).cloned().unwrap_or_default()
    }

    pub fn subscribers_of(&self, board: &BoardName) -> Vec<IdentityId> {
        self.by_viewer
            .iter()
            .filter(|(_, boards)| boards.contains(board))
            .map(|(viewer, _)| *viewer)
            .collect()
    }

    /// Drop every subscription of a deleted own identity. Returns how many
    /// boards it followed.
    pub fn remove_viewer(&mut self, viewer: &IdentityId) -> usize {
        self.by_viewer.remove(viewer).map_or(0, |boards| boards.len())
    }

    pub fn len(&self) -> usize {
        self.by_viewer.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_viewer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(name: &str) -> BoardName {
        BoardName::new(name).unwrap()
    }

    #[test]
    fn test_subscribe_unsubscribe() {
        let mut subs = Subscriptions::new();
        let viewer = IdentityId([1; 32]);

        assert!(subs.subscribe(viewer, board("a")));
        assert!(!subs.subscribe(viewer, board("a")));
        assert!(subs.subscribe(viewer, board("b")));
        assert_eq!(subs.len(), 2);
        assert_eq!(subs.subscribers_of(&board("a")), vec![viewer]);

        assert!(subs.unsubscribe(&viewer, &board("a")));
        assert!(!subs.unsubscribe(&viewer, &board("a")));
        assert!(!subs.is_subscribed(&viewer, &board("a")));
        assert!(subs.is_subscribed(&viewer, &board("b")));

        assert_eq!(subs.remove_viewer(&viewer), 1);
        assert!(subs.is_empty());
    }
}
