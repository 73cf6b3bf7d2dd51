//! A producer and two consumers sharing an in-memory channel.
//!
//! Run with `RUST_LOG=debug cargo run --example counter`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use syncer_client::{PatchDispatcher, PatchOp, PatchOpSet, Replica};
use syncer_core::InMemoryChannel;
use syncer_server::StateTracker;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Scoreboard {
    scores: Vec<u32>,
    leader: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let channel = Arc::new(InMemoryChannel::new());
    let mut board = Scoreboard::default();
    let mut tracker = StateTracker::new(Arc::clone(&channel), &board)?;

    let mut dispatcher = PatchDispatcher::<Value>::new();
    dispatcher
        .add_rule(
            r"/scores/(\d+)",
            PatchOp::Add | PatchOp::Replace,
            |_, groups, op, score: u32| println!("  player {} {op} -> {score}", &groups[1]),
        )?
        .add_rule("/leader", PatchOpSet::ANY, |state, _, _, leader: Option<String>| {
            println!("  leader is now {leader:?} (state: {state})");
        })?;

    let mut replicas = vec![Replica::new(), Replica::new()];

    for round in 1..=3u32 {
        board.scores.push(round * 10);
        if round == 2 {
            board.leader = Some("ada".into());
        }
        tracker.update(&board)?;
        // unchanged data publishes nothing
        tracker.update(&board)?;

        let published = channel.take_published();
        println!("round {round}: {} payload(s) published", published.len());

        for (id, replica) in replicas.iter_mut().enumerate() {
            for payload in &published {
                if let Some(diff) = replica.process(payload, &*channel)? {
                    println!(" replica {id} at version {}", replica.version());
                    if let Some(state) = replica.state() {
                        dispatcher.handle_diff(state, &diff);
                    }
                }
            }
        }
    }

    for replica in &replicas {
        let copy: Scoreboard = replica.data()?;
        println!("replica v{}: {copy:?}", replica.version());
    }
    Ok(())
}
