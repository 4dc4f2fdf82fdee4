//! # Concurrency
//!
//! Parallel producers against one engine: board locks serialize per-board
//! work, so the settled state must match sequential delivery.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use engine_runtime::{BoardEngine, EngineConfig, EngineRuntime, InMemoryContentStore};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use shared_bus::{BoardEvent, EventPublisher};
    use shared_types::Message;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tl_02_board_index::BoardGraph;
    use tl_03_fetch_retry::SystemTimeSource;
    use tl_04_subscribed_view::TrustEveryone;

    const WORKERS: usize = 4;

    /// A deterministic forest of `len` messages across all boards.
    fn forest(len: usize, seed: u64) -> Vec<Message> {
        let mut rng = StdRng::seed_from_u64(seed);
        let blueprints: Vec<Blueprint> = (0..len)
            .map(|i| Blueprint {
                author: (i % 4) as u8,
                parent: if i % 5 == 0 { None } else { Some(rng.gen_range(0..i.max(1))) },
                boards: rng.gen_range(1..8),
            })
            .collect();
        build_forest(&blueprints)
    }

    fn sequential(messages: &[Message]) -> BoardEngine {
        let engine = engine();
        for message in messages {
            engine.on_message_received(message.clone(), None).unwrap();
        }
        engine
    }

    #[test]
    fn test_parallel_workers_match_sequential_delivery() {
        let messages = forest(120, 7);
        let expected = full_view(&sequential(&messages));

        for round in 0..8u64 {
            let engine = engine();
            thread::scope(|scope| {
                for worker in 0..WORKERS {
                    let engine = &engine;
                    let mut order = messages.clone();
                    order.shuffle(&mut StdRng::seed_from_u64(round * 31 + worker as u64));
                    scope.spawn(move || {
                        // Every worker delivers everything: most arrivals are duplicates.
                        for message in order {
                            engine.on_message_received(message, None).unwrap();
                        }
                    });
                }
            });
            assert_eq!(full_view(&engine), expected, "round {round}");
        }
    }

    #[test]
    fn test_deletion_racing_arrivals_leaves_no_trace() {
        let messages = forest(200, 11);
        let victim = author(1);

        for round in 0..8u64 {
            let engine = engine();
            thread::scope(|scope| {
                for worker in 0..WORKERS {
                    let engine = &engine;
                    let mut order = messages.clone();
                    order.shuffle(&mut StdRng::seed_from_u64(round * 17 + worker as u64));
                    scope.spawn(move || {
                        for message in order {
                            // Refusals for the deleted identity are expected.
                            let _ = engine.on_message_received(message, None);
                        }
                    });
                }
                let engine = &engine;
                scope.spawn(move || {
                    thread::yield_now();
                    engine.on_identity_deletion(&victim);
                });
            });

            let survivors: Vec<Message> = messages.iter().filter(|m| m.author() != victim).cloned().collect();
            for name in BOARDS {
                let handle = engine.board(&board(name)).unwrap();
                let graph = handle.read();
                assert!(graph.messages().all(|m| m.author() != victim), "round {round}, {name}");
                let rebuilt = BoardGraph::rebuild(board(name), survivors.iter().cloned(), graph.ghost_threads().clone());
                assert_eq!(*graph, rebuilt, "round {round}, {name}");
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bus_producers_converge() {
        let messages = forest(60, 3);
        let expected = full_view(&sequential(&messages));

        let store = Arc::new(InMemoryContentStore::new());
        let mut runtime = EngineRuntime::new(
            EngineConfig::default(),
            store,
            Arc::new(TrustEveryone),
            Arc::new(SystemTimeSource),
        )
        .unwrap();
        let engine = runtime.engine();
        for name in BOARDS {
            engine.subscribe(VIEWER, board(name));
        }
        runtime.start().unwrap();

        let mut producers = Vec::new();
        for chunk in messages.chunks(15) {
            let bus = runtime.bus();
            let mut chunk = chunk.to_vec();
            chunk.reverse();
            producers.push(tokio::spawn(async move {
                for message in chunk {
                    let author = message.author();
                    bus.publish(BoardEvent::MessageReceived {
                        message,
                        announced_by: Some(author),
                    })
                    .await;
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !messages.iter().all(|m| engine.is_stored(&m.id)) && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(full_view(&engine), expected);

        drop(engine);
        runtime.shutdown().await.unwrap();
    }
}
