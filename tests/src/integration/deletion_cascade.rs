//! # Deletion Cascade
//!
//! Deleting an identity removes its content from every board while keeping
//! other authors' replies reachable, and the result survives a restart.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use engine_runtime::{BoardEngine, FileSnapshotStore};
    use proptest::prelude::*;
    use shared_types::{Message, MessageId};
    use std::collections::BTreeSet;
    use tl_02_board_index::BoardGraph;

    fn settled(messages: &[Message]) -> BoardEngine {
        let engine = engine();
        for message in messages {
            engine.on_message_received(message.clone(), None).unwrap();
        }
        engine
    }

    fn listed_ids(engine: &BoardEngine, name: &str) -> BTreeSet<MessageId> {
        board_view(engine, name)
            .into_iter()
            .flat_map(|(link, replies)| link.head.map(|m| m.id).into_iter().chain(replies))
            .collect()
    }

    #[test]
    fn test_plan_matches_report() {
        let t = root(1, 100, &["en.alpha", "en.beta"]);
        let r1 = reply(2, &t, &t, 200);
        let mine = reply(1, &t, &r1, 300);
        let other = root(2, 150, &["en.gamma"]);
        let engine = settled(&[t.clone(), r1.clone(), mine, other]);

        let plan = engine.before_identity_deletion(&author(1));
        assert_eq!(plan.messages, 2);
        assert_eq!(plan.threads_rooted, 2);
        assert_eq!(plan.boards, vec![board("en.alpha"), board("en.beta")]);
        assert!(engine.is_stored(&t.id));

        let report = engine.on_identity_deletion(&author(1));
        assert_eq!(report.messages_removed, plan.messages);
        assert_eq!(report.boards.len(), plan.boards.len());
        for (_, ghosts) in report.ghost_threads() {
            assert_eq!(ghosts, BTreeSet::from([t.id]));
        }
        assert!(engine.before_identity_deletion(&author(1)).is_empty());
    }

    #[test]
    fn test_cascade_survives_snapshot_restore() {
        let t = root(1, 100, &["en.alpha"]);
        let r1 = reply(1, &t, &t, 200);
        let r2 = reply(2, &t, &r1, 300);
        let engine = settled(&[t.clone(), r1, r2.clone()]);
        engine.on_identity_deletion(&author(1));
        let expected = full_view(&engine);

        let restored = engine_from(&engine);
        assert_eq!(full_view(&restored), expected);
        assert!(restored.is_deleted(&author(1)));
        assert!(restored.on_message_received(t.clone(), None).is_err());

        // The ghost thread still takes late replies after the restart.
        let late = reply(3, &t, &r2, 400);
        restored.on_message_received(late.clone(), None).unwrap();
        let view = board_view(&restored, "en.alpha");
        assert_eq!(view.len(), 1);
        assert!(view[0].0.is_ghost());
        assert_eq!(view[0].1, vec![r2.id, late.id]);
    }

    #[test]
    fn test_cascade_survives_snapshot_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("engine.bin");
        let t = root(1, 100, &["en.alpha", "en.beta"]);
        let r1 = reply(2, &t, &t, 200);
        let engine = settled(&[t, r1]);
        engine.on_identity_deletion(&author(1));
        let expected = full_view(&engine);

        {
            let store = FileSnapshotStore::open(&path).unwrap();
            store.save(&engine.snapshot()).unwrap();
        }
        let store = FileSnapshotStore::open(&path).unwrap();
        let restored = crate::fixtures::engine();
        restored.restore(store.load().unwrap().unwrap()).unwrap();

        assert_eq!(full_view(&restored), expected);
        assert!(board_view(&restored, "en.beta")[0].0.is_ghost());
    }

    fn engine_from(source: &BoardEngine) -> BoardEngine {
        let restored = engine();
        restored.restore(source.snapshot()).unwrap();
        restored
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_deletion_keeps_survivors_reachable(
            blueprints in blueprint_strategy(12),
            victim in 0u8..4,
        ) {
            let messages = build_forest(&blueprints);
            let engine = settled(&messages);
            let victim = author(victim);
            let plan = engine.before_identity_deletion(&victim);

            let report = engine.on_identity_deletion(&victim);
            prop_assert_eq!(report.messages_removed, plan.messages);

            let survivors: Vec<Message> = messages
                .iter()
                .filter(|m| m.author() != victim)
                .cloned()
                .collect();
            for name in BOARDS {
                let handle = engine.board(&board(name)).unwrap();
                let graph = handle.read();
                prop_assert!(graph.messages().all(|m| m.author() != victim));

                let rebuilt = BoardGraph::rebuild(board(name), survivors.iter().cloned(), graph.ghost_threads().clone());
                prop_assert_eq!(&*graph, &rebuilt);

                let stored: BTreeSet<MessageId> = graph.messages().map(|m| m.id).collect();
                drop(graph);
                prop_assert_eq!(listed_ids(&engine, name), stored);
            }

            prop_assert!(engine.messages_to_fetch().iter().all(|id| id.author != victim));
            prop_assert_eq!(full_view(&engine_from(&engine)), full_view(&engine));
        }
    }
}
