use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use serde_json::{Value, json};
use syncer_client::{Diff, DiffOp, PatchDispatcher, PatchOp, PatchOpSet};

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Card {
    title: String,
    #[serde(default)]
    done: bool,
}

#[test]
fn test_items_rule_matches_add_and_replace_only() {
    let _ = env_logger::builder().is_test(true).try_init();

    let values = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&values);

    let mut dispatcher = PatchDispatcher::<Value>::new();
    dispatcher
        .add_rule(
            "^/items/([0-9]+)$",
            PatchOp::Add | PatchOp::Replace,
            move |_, groups, _, value: i64| {
                sink.lock().unwrap().push((groups[1].to_string(), value));
            },
        )
        .expect("pattern compiles");

    let ctx = json!({"items": [0, 0, 0, 0, 0, 0, 0, 42]});
    assert_eq!(dispatcher.handle_op(&ctx, "/items/7", PatchOp::Replace, &json!(42)), 1);
    assert_eq!(dispatcher.handle_op(&ctx, "/items/7", PatchOp::Remove, &Value::Null), 0);

    assert_eq!(*values.lock().unwrap(), vec![("7".to_string(), 42)]);
}

#[test]
fn test_typed_handlers_share_one_stream() {
    let _ = env_logger::builder().is_test(true).try_init();

    let cards = Arc::new(std::sync::Mutex::new(Vec::new()));
    let removed = Arc::new(AtomicUsize::new(0));
    let titles = Arc::new(std::sync::Mutex::new(Vec::new()));

    let mut dispatcher = PatchDispatcher::<()>::new();
    {
        let cards = Arc::clone(&cards);
        dispatcher
            .add_rule(r"/cards/(\d+)", PatchOp::Add | PatchOp::Replace, move |_, _, _, card: Card| {
                cards.lock().unwrap().push(card);
            })
            .unwrap();
    }
    {
        let removed = Arc::clone(&removed);
        dispatcher
            .add_rule(r"/cards/(\d+)", PatchOp::Remove, move |_, _, _, card: Card| {
                assert_eq!(card, Card::default());
                removed.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    {
        let titles = Arc::clone(&titles);
        dispatcher
            .add_rule(r"/cards/(\d+)/title", PatchOpSet::ANY, move |_, groups, _, title: String| {
                titles.lock().unwrap().push(format!("{}={title}", &groups[1]));
            })
            .unwrap();
    }

    let diff = Diff(vec![
        DiffOp::add("/cards/0", json!({"title": "write tests", "done": false})),
        DiffOp::add("/cards/1", json!({"bogus": true})),
        DiffOp::replace("/cards/0/title", json!("write more tests")),
        DiffOp::remove("/cards/1"),
        DiffOp::replace("/__syncer_data_version", json!(4)),
    ]);

    assert_eq!(dispatcher.handle_diff(&(), &diff), 4);

    let cards = cards.lock().unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].title, "write tests");
    // undecodable value falls back to the default card
    assert_eq!(cards[1], Card::default());
    assert_eq!(removed.load(Ordering::SeqCst), 1);
    assert_eq!(*titles.lock().unwrap(), vec!["0=write more tests"]);
}

#[test]
fn test_concurrent_dispatch_after_setup() {
    let hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&hits);

    let mut dispatcher = PatchDispatcher::<()>::new();
    dispatcher
        .add_rule("/counter", PatchOpSet::ANY, move |_, _, _, step: usize| {
            sink.fetch_add(step, Ordering::SeqCst);
        })
        .unwrap();
    let dispatcher = Arc::new(dispatcher);

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let dispatcher = Arc::clone(&dispatcher);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    dispatcher.handle_op(&(), "/counter", PatchOp::Replace, &json!(1));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }
    assert_eq!(hits.load(Ordering::SeqCst), 800);
}
