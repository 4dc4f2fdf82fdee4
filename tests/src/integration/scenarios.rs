//! # Delivery Scenarios
//!
//! Worked examples routed through the event router, the way the content
//! store and the identity manager reach the engine at runtime.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use engine_runtime::{BoardEngine, EngineConfig, EventRouter};
    use shared_bus::{BoardEvent, InMemoryEventBus};
    use shared_types::{Message, MessageListId, MessageListReference};
    use std::sync::Arc;
    use tl_04_subscribed_view::ThreadKindTag;
    use tokio::sync::Notify;

    fn router() -> (Arc<BoardEngine>, EventRouter, Arc<Notify>) {
        let engine = Arc::new(engine());
        let resync = Arc::new(Notify::new());
        let router = EventRouter::new(Arc::clone(&engine), Arc::new(InMemoryEventBus::new()), Arc::clone(&resync));
        (engine, router, resync)
    }

    fn received(message: &Message) -> BoardEvent {
        BoardEvent::MessageReceived {
            message: message.clone(),
            announced_by: Some(message.author()),
        }
    }

    fn ghost_resolutions(events: &[BoardEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                BoardEvent::GhostResolved { board, .. } => Some(board.as_str().to_string()),
                _ => None,
            })
            .collect()
    }

    // =========================================================================
    // REVERSE DELIVERY ACROSS CROSSPOSTS
    // =========================================================================

    #[test]
    fn test_reverse_crossposted_chain_settles_per_board() {
        let (engine, router, _) = router();
        let t = root(1, 100, &["en.alpha", "en.beta"]);
        let r1 = reply(2, &t, &t, 200);
        let mut r2 = reply(3, &t, &r1, 300);
        r2.boards = boards(&["en.alpha", "en.beta", "en.gamma"]);

        let events = router.apply(received(&r2));
        assert_eq!(events.len(), 3);
        assert!(ghost_resolutions(&events).is_empty());

        let events = router.apply(received(&r1));
        assert_eq!(ghost_resolutions(&events), vec!["en.alpha", "en.beta"]);

        router.apply(received(&t));

        for name in ["en.alpha", "en.beta"] {
            let view = board_view(&engine, name);
            assert_eq!(view.len(), 1, "{name}");
            let (link, replies) = &view[0];
            assert_eq!(link.thread_id, t.id);
            assert_eq!(link.kind, ThreadKindTag::Resolved);
            assert_eq!(link.last_activity, 300);
            assert_eq!(replies, &vec![r1.id, r2.id]);
        }

        // Neither the root nor the parent ever reach the third board.
        let gamma = board_view(&engine, "en.gamma");
        assert_eq!(gamma.len(), 1);
        assert_eq!(gamma[0].0.thread_id, r2.id);
        assert_eq!(gamma[0].0.kind, ThreadKindTag::Orphan);
        assert_eq!(gamma[0].0.head.as_ref().map(|m| m.id), Some(r2.id));
        assert!(gamma[0].1.is_empty());
    }

    #[test]
    fn test_redelivery_produces_no_notifications() {
        let (engine, router, _) = router();
        let t = root(1, 100, &["en.alpha"]);
        assert_eq!(router.apply(received(&t)).len(), 1);

        let before = full_view(&engine);
        assert!(router.apply(received(&t)).is_empty());
        assert_eq!(full_view(&engine), before);
    }

    // =========================================================================
    // ANNOUNCEMENTS
    // =========================================================================

    #[test]
    fn test_announced_list_wakes_scheduler_only_for_missing_ids() {
        let (engine, router, resync) = router();
        let stored = root(1, 100, &["en.alpha"]);
        router.apply(received(&stored));

        let list = BoardEvent::MessageListReceived {
            list_id: MessageListId::new(author(1), 0),
            references: vec![MessageListReference::new(stored.id, board("en.alpha"), 90)],
            received: 120,
        };
        router.apply(list);
        assert!(engine.messages_to_fetch().is_empty());

        let missing = message_id(1, 77);
        let list = BoardEvent::MessageListReceived {
            list_id: MessageListId::new(author(1), 1),
            references: vec![MessageListReference::new(missing, board("en.alpha"), 130)],
            received: 140,
        };
        router.apply(list);
        assert_eq!(engine.messages_to_fetch(), vec![missing]);

        // The stored permit from the second list is still pending.
        let woke = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
            .block_on(async {
                tokio::time::timeout(std::time::Duration::from_millis(50), resync.notified())
                    .await
                    .is_ok()
            });
        assert!(woke);
    }

    // =========================================================================
    // IDENTITY DELETION
    // =========================================================================

    #[test]
    fn test_deleted_thread_starter_leaves_ghost_thread() {
        let (engine, router, _) = router();
        let t = root(1, 100, &["en.alpha", "en.beta"]);
        let r1 = reply(1, &t, &t, 200);
        let r2 = reply(2, &t, &r1, 300);
        for message in [&t, &r1, &r2] {
            router.apply(received(message));
        }

        let events = router.apply(BoardEvent::IdentityDeleted { identity: author(1) });
        assert_eq!(events.len(), 2);
        assert!(engine.is_deleted(&author(1)));

        for name in ["en.alpha", "en.beta"] {
            let view = board_view(&engine, name);
            assert_eq!(view.len(), 1);
            let (link, replies) = &view[0];
            assert_eq!(link.thread_id, t.id);
            assert!(link.is_ghost());
            assert!(link.head.is_none());
            assert_eq!(replies, &vec![r2.id]);
        }

        // A late copy of the deleted root is refused.
        assert!(router.apply(received(&t)).is_empty());
        assert!(!engine.is_stored(&t.id));
        assert!(engine.messages_to_fetch().is_empty());
    }
}
