//! # Order Independence
//!
//! Whatever order the network delivers messages in, and however often, the
//! engine settles every board on the same threads.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use engine_runtime::BoardEngine;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use shared_types::Message;
    use tl_02_board_index::BoardGraph;

    fn deliver(engine: &BoardEngine, messages: &[Message]) {
        for message in messages {
            engine.on_message_received(message.clone(), None).unwrap();
        }
    }

    fn settled(messages: &[Message]) -> BoardEngine {
        let engine = engine();
        deliver(&engine, messages);
        engine
    }

    /// Each tracked board equals a fresh rebuild from its stored messages.
    fn assert_boards_canonical(engine: &BoardEngine, messages: &[Message]) {
        for name in engine.board_names() {
            let handle = engine.board(&name).unwrap();
            let graph = handle.read();
            let expected = BoardGraph::rebuild(name.clone(), messages.iter().cloned(), []);
            assert_eq!(*graph, expected, "board {name}");
        }
    }

    /// Heads and replies across a board's listing cover its messages exactly once.
    fn assert_listing_covers_board(engine: &BoardEngine, name: &str) {
        let mut listed: Vec<_> = board_view(engine, name)
            .into_iter()
            .flat_map(|(link, replies)| link.head.map(|m| m.id).into_iter().chain(replies))
            .collect();
        listed.sort();
        let before = listed.len();
        listed.dedup();
        assert_eq!(listed.len(), before, "message listed twice in {name}");

        let handle = engine.board(&board(name)).unwrap();
        let mut stored: Vec<_> = handle.read().messages().map(|m| m.id).collect();
        stored.sort();
        assert_eq!(listed, stored, "listing of {name}");
    }

    /// Heap's algorithm over the first `k` items.
    fn for_each_permutation<T>(items: &mut [T], k: usize, visit: &mut impl FnMut(&[T])) {
        if k <= 1 {
            visit(items);
            return;
        }
        for_each_permutation(items, k - 1, visit);
        for i in 0..k - 1 {
            let j = if k % 2 == 0 { i } else { 0 };
            items.swap(j, k - 1);
            for_each_permutation(items, k - 1, visit);
        }
    }

    #[test]
    fn test_every_order_of_crossposted_forest_agrees() {
        let t = root(1, 100, &["en.alpha", "en.beta"]);
        let u = root(2, 110, &["en.beta"]);
        let r1 = reply(3, &t, &t, 200);
        let mut r2 = reply(4, &t, &r1, 300);
        r2.boards = boards(&["en.alpha", "en.gamma"]);
        let r3 = reply(1, &u, &u, 250);
        let r4 = reply(2, &t, &r2, 400);

        let mut items = vec![t, u, r1, r2, r3, r4];
        let reference = settled(&items);
        let expected = full_view(&reference);
        assert_boards_canonical(&reference, &items);

        let mut visited = 0;
        let len = items.len();
        for_each_permutation(&mut items, len, &mut |order: &[Message]| {
            let engine = settled(order);
            assert_eq!(full_view(&engine), expected);
            visited += 1;
        });
        assert_eq!(visited, 720);
    }

    #[test]
    fn test_partial_delivery_matches_rebuild_at_every_step() {
        let t = root(1, 100, &["en.alpha"]);
        let r1 = reply(2, &t, &t, 200);
        let r2 = reply(3, &t, &r1, 300);
        let r3 = reply(4, &t, &r2, 400);
        let order = [r3, r1, t, r2];

        let engine = engine();
        for (i, message) in order.iter().enumerate() {
            engine.on_message_received(message.clone(), None).unwrap();
            assert_boards_canonical(&engine, &order[..=i]);
            assert_listing_covers_board(&engine, "en.alpha");
        }
        assert_eq!(board_view(&engine, "en.alpha").len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_shuffled_delivery_settles_identically(
            blueprints in blueprint_strategy(12),
            seed in any::<u64>(),
        ) {
            let messages = build_forest(&blueprints);
            let expected = full_view(&settled(&messages));

            let mut shuffled = messages.clone();
            shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
            let engine = settled(&shuffled);

            prop_assert_eq!(full_view(&engine), expected);
            assert_boards_canonical(&engine, &messages);
            for name in BOARDS {
                assert_listing_covers_board(&engine, name);
            }
        }

        #[test]
        fn prop_duplicate_deliveries_are_absorbed(
            blueprints in blueprint_strategy(10),
            seed in any::<u64>(),
        ) {
            let messages = build_forest(&blueprints);
            let expected = full_view(&settled(&messages));

            let mut doubled: Vec<Message> = messages.iter().chain(messages.iter()).cloned().collect();
            doubled.shuffle(&mut StdRng::seed_from_u64(seed));
            let engine = engine();
            let mut duplicates = 0;
            for message in doubled {
                if engine.on_message_received(message, None).unwrap().is_duplicate() {
                    duplicates += 1;
                }
            }

            prop_assert_eq!(duplicates, messages.len());
            prop_assert_eq!(full_view(&engine), expected);
        }
    }
}
