//! # Message List Index
//!
//! Lists are stored per `(author, edition)`. A message can be announced
//! before or after its body arrives, so the set of downloaded ids is tracked
//! independently of the lists: a reference to an already downloaded message
//! is never wanted.

use super::errors::{MessageListError, MessageListResult};
use super::list::MessageList;
use serde::{Deserialize, Serialize};
use shared_types::{
    validate_board_name, IdentityId, MessageId, MessageListId, MessageListReference, Timestamp,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Limits for accepted lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageListConfig {
    /// Maximum references in one list.
    pub max_references_per_list: usize,
    /// How far below the latest edition gaps are reported.
    pub edition_gap_window: u64,
}

impl Default for MessageListConfig {
    fn default() -> Self {
        Self {
            max_references_per_list: 4096,
            edition_gap_window: 64,
        }
    }
}

/// What an identity deletion removed from the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovedLists {
    pub lists: Vec<MessageListId>,
    pub references: usize,
}

/// All known message lists.
#[derive(Debug, Clone, Default)]
pub struct MessageListIndex {
    lists: BTreeMap<MessageListId, MessageList>,
    /// Every id announced by at least one list, with the lists announcing it.
    announced: BTreeMap<MessageId, BTreeSet<MessageListId>>,
    downloaded: HashSet<MessageId>,
    config: MessageListConfig,
}

impl MessageListIndex {
    pub fn new(config: MessageListConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Accept a list and return the message ids that became wanted.
    ///
    /// A list already known by `(author, edition)` is a no-op returning an
    /// empty set.
    pub fn on_message_list_received(
        &mut self,
        list_id: MessageListId,
        references: Vec<MessageListReference>,
        received: Timestamp,
    ) -> MessageListResult<Vec<MessageId>> {
        if self.lists.contains_key(&list_id) {
            return Ok(Vec::new());
        }

        self.validate(list_id, &references)?;

        let mut seen = HashSet::new();
        let mut newly_wanted = Vec::new();
        let mut kept = Vec::with_capacity(references.len());

        for mut reference in references {
            if !seen.insert(reference.message_id) {
                continue;
            }
            reference.downloaded = self.downloaded.contains(&reference.message_id);

            let lists = self.announced.entry(reference.message_id).or_default();
            if lists.is_empty() && !reference.downloaded {
                newly_wanted.push(reference.message_id);
            }
            lists.insert(list_id);
            kept.push(reference);
        }

        self.lists
            .insert(list_id, MessageList::new(list_id, kept, received));
        Ok(newly_wanted)
    }

    fn validate(&self, list_id: MessageListId, references: &[MessageListReference]) -> MessageListResult<()> {
        if references.len() > self.config.max_references_per_list {
            return Err(MessageListError::TooManyReferences {
                list: list_id,
                count: references.len(),
                max: self.config.max_references_per_list,
            });
        }
        for reference in references {
            if reference.message_id.author != list_id.author {
                return Err(MessageListError::ForeignReference {
                    list: list_id,
                    message: reference.message_id,
                });
            }
            validate_board_name(reference.board.as_str())
                .map_err(|source| MessageListError::InvalidBoard { list: list_id, source })?;
        }
        Ok(())
    }

    /// Flip the downloaded flag for `message_id`.
    ///
    /// Returns true the first time only.
    pub fn mark_downloaded(&mut self, message_id: &MessageId) -> bool {
        if !self.downloaded.insert(*message_id) {
            return false;
        }
        if let Some(list_ids) = self.announced.get(message_id) {
            for list_id in list_ids {
                if let Some(list) = self.lists.get_mut(list_id) {
                    for reference in list.references.iter_mut().filter(|r| r.message_id == *message_id) {
                        reference.downloaded = true;
                    }
                }
            }
        }
        true
    }

    pub fn is_downloaded(&self, message_id: &MessageId) -> bool {
        self.downloaded.contains(message_id)
    }

    /// References whose message has not been downloaded, oldest announcement first.
    pub fn messages_to_fetch(&self) -> Vec<MessageListReference> {
        let mut pending: BTreeMap<MessageId, &MessageListReference> = BTreeMap::new();
        for list in self.lists.values() {
            for reference in list.references.iter().filter(|r| !r.downloaded) {
                pending
                    .entry(reference.message_id)
                    .and_modify(|existing| {
                        if reference.announced < existing.announced {
                            *existing = reference;
                        }
                    })
                    .or_insert(reference);
            }
        }
        let mut out: Vec<MessageListReference> = pending.into_values().cloned().collect();
        out.sort_by_key(|r| (r.announced, r.message_id));
        out
    }

    pub fn latest_edition(&self, author: &IdentityId) -> Option<u64> {
        self.lists_of(author).map(|l| l.id.edition).max()
    }

    /// Editions below the latest one that were never received.
    ///
    /// Only the `edition_gap_window` editions below the latest are examined.
    pub fn missing_editions(&self, author: &IdentityId) -> Vec<u64> {
        let Some(latest) = self.latest_edition(author) else {
            return Vec::new();
        };
        let lowest = latest.saturating_sub(self.config.edition_gap_window);
        (lowest..latest)
            .filter(|edition| !self.lists.contains_key(&MessageListId::new(*author, *edition)))
            .collect()
    }

    /// Remove every list authored by `author`.
    pub fn remove_author(&mut self, author: &IdentityId) -> RemovedLists {
        let ids: Vec<MessageListId> = self.lists_of(author).map(|l| l.id).collect();
        let mut removed = RemovedLists::default();

        for id in ids {
            if let Some(list) = self.lists.remove(&id) {
                removed.references += list.references.len();
                for reference in &list.references {
                    if let Some(lists) = self.announced.get_mut(&reference.message_id) {
                        lists.remove(&id);
                        if lists.is_empty() {
                            self.announced.remove(&reference.message_id);
                        }
                    }
                }
                removed.lists.push(id);
            }
        }
        self.downloaded.retain(|m| m.author != *author);
        removed
    }

    pub fn lists_of<'a>(&'a self, author: &'a IdentityId) -> impl Iterator<Item = &'a MessageList> + 'a {
        let start = MessageListId::new(*author, 0);
        let end = MessageListId::new(*author, u64::MAX);
        self.lists.range(start..=end).map(|(_, list)| list)
    }

    pub fn get(&self, id: &MessageListId) -> Option<&MessageList> {
        self.lists.get(id)
    }

    /// Lists announcing `message_id`.
    pub fn announcing(&self, message_id: &MessageId) -> impl Iterator<Item = &MessageListId> {
        self.announced.get(message_id).into_iter().flatten()
    }

    pub fn lists(&self) -> impl Iterator<Item = &MessageList> {
        self.lists.values()
    }

    /// Count of lists and references authored by `author`.
    pub fn count_for(&self, author: &IdentityId) -> (usize, usize) {
        self.lists_of(author)
            .fold((0, 0), |(lists, refs), l| (lists + 1, refs + l.references.len()))
    }

    /// Re-insert a persisted list verbatim, downloaded flags included.
    pub fn restore(&mut self, list: MessageList) {
        for reference in &list.references {
            self.announced
                .entry(reference.message_id)
                .or_default()
                .insert(list.id);
            if reference.downloaded {
                self.downloaded.insert(reference.message_id);
            }
        }
        self.lists.insert(list.id, list);
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::BoardName;

    fn author(byte: u8) -> IdentityId {
        IdentityId([byte; 32])
    }

    fn reference(id: MessageId, board: &str, announced: Timestamp) -> MessageListReference {
        MessageListReference::new(id, BoardName::new(board).unwrap(), announced)
    }

    #[test]
    fn test_new_list_returns_wanted_ids() {
        let mut index = MessageListIndex::default();
        let a = author(1);
        let m1 = MessageId::generate(a);
        let m2 = MessageId::generate(a);

        let wanted = index
            .on_message_list_received(
                MessageListId::new(a, 0),
                vec![reference(m1, "test", 10), reference(m2, "other", 11)],
                20,
            )
            .unwrap();

        assert_eq!(wanted, vec![m1, m2]);
        assert_eq!(index.messages_to_fetch().len(), 2);
    }

    #[test]
    fn test_duplicate_edition_is_noop() {
        let mut index = MessageListIndex::default();
        let a = author(1);
        let list_id = MessageListId::new(a, 3);
        let refs = vec![reference(MessageId::generate(a), "test", 1)];

        assert_eq!(index.on_message_list_received(list_id, refs.clone(), 5).unwrap().len(), 1);
        assert!(index.on_message_list_received(list_id, refs, 6).unwrap().is_empty());
        assert_eq!(index.get(&list_id).unwrap().received, 5);
    }

    #[test]
    fn test_foreign_reference_rejects_whole_list() {
        let mut index = MessageListIndex::default();
        let list_id = MessageListId::new(author(1), 0);
        let refs = vec![
            reference(MessageId::generate(author(1)), "test", 1),
            reference(MessageId::generate(author(2)), "test", 1),
        ];

        let err = index.on_message_list_received(list_id, refs, 5).unwrap_err();
        assert!(matches!(err, MessageListError::ForeignReference { .. }));
        assert!(index.is_empty());
        assert!(index.messages_to_fetch().is_empty());
    }

    #[test]
    fn test_too_many_references_rejected() {
        let mut index = MessageListIndex::new(MessageListConfig {
            max_references_per_list: 1,
            ..MessageListConfig::default()
        });
        let a = author(1);
        let refs = vec![
            reference(MessageId::generate(a), "test", 1),
            reference(MessageId::generate(a), "test", 1),
        ];
        assert!(matches!(
            index.on_message_list_received(MessageListId::new(a, 0), refs, 1),
            Err(MessageListError::TooManyReferences { count: 2, .. })
        ));
    }

    #[test]
    fn test_mark_downloaded_flips_once() {
        let mut index = MessageListIndex::default();
        let a = author(1);
        let m = MessageId::generate(a);
        index
            .on_message_list_received(MessageListId::new(a, 0), vec![reference(m, "test", 1)], 1)
            .unwrap();

        assert!(index.mark_downloaded(&m));
        assert!(!index.mark_downloaded(&m));
        assert!(index.messages_to_fetch().is_empty());
        assert!(index.get(&MessageListId::new(a, 0)).unwrap().is_complete());
    }

    #[test]
    fn test_message_before_list_is_not_wanted() {
        let mut index = MessageListIndex::default();
        let a = author(1);
        let m = MessageId::generate(a);
        index.mark_downloaded(&m);

        let wanted = index
            .on_message_list_received(MessageListId::new(a, 0), vec![reference(m, "test", 1)], 1)
            .unwrap();
        assert!(wanted.is_empty());
        assert!(index.get(&MessageListId::new(a, 0)).unwrap().references[0].downloaded);
    }

    #[test]
    fn test_reannounced_message_wanted_once() {
        let mut index = MessageListIndex::default();
        let a = author(1);
        let m = MessageId::generate(a);

        let first = index
            .on_message_list_received(MessageListId::new(a, 0), vec![reference(m, "test", 1)], 1)
            .unwrap();
        let second = index
            .on_message_list_received(MessageListId::new(a, 1), vec![reference(m, "test", 2)], 2)
            .unwrap();

        assert_eq!(first, vec![m]);
        assert!(second.is_empty());
        let to_fetch = index.messages_to_fetch();
        assert_eq!(to_fetch.len(), 1);
        assert_eq!(to_fetch[0].announced, 1);
    }

    #[test]
    fn test_editions_and_gaps() {
        let mut index = MessageListIndex::default();
        let a = author(1);
        for edition in [0, 2, 5] {
            index
                .on_message_list_received(MessageListId::new(a, edition), Vec::new(), 1)
                .unwrap();
        }

        assert_eq!(index.latest_edition(&a), Some(5));
        assert_eq!(index.missing_editions(&a), vec![1, 3, 4]);
        assert_eq!(index.latest_edition(&author(2)), None);
        assert!(index.missing_editions(&author(2)).is_empty());
    }

    #[test]
    fn test_gap_window_bounds_report() {
        let mut index = MessageListIndex::new(MessageListConfig {
            edition_gap_window: 3,
            ..MessageListConfig::default()
        });
        let a = author(1);
        index
            .on_message_list_received(MessageListId::new(a, 1_000_000), Vec::new(), 1)
            .unwrap();
        assert_eq!(index.missing_editions(&a), vec![999_997, 999_998, 999_999]);
    }

    #[test]
    fn test_remove_author_only_touches_author() {
        let mut index = MessageListIndex::default();
        let (a, b) = (author(1), author(2));
        let ma = MessageId::generate(a);
        let mb = MessageId::generate(b);
        index
            .on_message_list_received(MessageListId::new(a, 0), vec![reference(ma, "test", 1)], 1)
            .unwrap();
        index
            .on_message_list_received(MessageListId::new(b, 0), vec![reference(mb, "test", 1)], 1)
            .unwrap();

        let removed = index.remove_author(&a);
        assert_eq!(removed.lists, vec![MessageListId::new(a, 0)]);
        assert_eq!(removed.references, 1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.announcing(&ma).count(), 0);
        assert_eq!(index.messages_to_fetch()[0].message_id, mb);
    }

    #[test]
    fn test_restore_keeps_flags() {
        let a = author(1);
        let m = MessageId::generate(a);
        let mut original = MessageListIndex::default();
        original
            .on_message_list_received(MessageListId::new(a, 0), vec![reference(m, "test", 1)], 1)
            .unwrap();
        original.mark_downloaded(&m);

        let mut restored = MessageListIndex::default();
        for list in original.lists().cloned() {
            restored.restore(list);
        }
        assert!(restored.is_downloaded(&m));
        assert!(restored.messages_to_fetch().is_empty());
    }

    proptest! {
        /// Lists and downloads can interleave in any order: what remains to
        /// fetch depends only on the final sets.
        #[test]
        fn prop_wanted_set_ignores_arrival_order(
            editions in prop::collection::btree_map(0u64..8, prop::collection::vec(0u8..12, 0..6), 1..6),
            downloaded in prop::collection::btree_set(0u8..12, 0..8),
            downloads_first in any::<bool>(),
        ) {
            let a = author(1);
            let ids: Vec<MessageId> = (0..12).map(|_| MessageId::generate(a)).collect();
            let mut index = MessageListIndex::default();

            let download = |index: &mut MessageListIndex| {
                for n in &downloaded {
                    index.mark_downloaded(&ids[*n as usize]);
                }
            };
            if downloads_first {
                download(&mut index);
            }
            for (edition, picks) in &editions {
                let references = picks.iter().map(|n| reference(ids[*n as usize], "test", *edition)).collect();
                index
                    .on_message_list_received(MessageListId::new(a, *edition), references, 100)
                    .unwrap();
            }
            if !downloads_first {
                download(&mut index);
            }

            let expected: BTreeSet<MessageId> = editions
                .values()
                .flatten()
                .filter(|n| !downloaded.contains(n))
                .map(|n| ids[*n as usize])
                .collect();
            let wanted: BTreeSet<MessageId> = index.messages_to_fetch().iter().map(|r| r.message_id).collect();
            prop_assert_eq!(wanted, expected);
        }
    }
}
