//! Multi-turn integration tests for whole games.
//!
//! These tests play bots against each other on generated maps, both by
//! stepping the game core directly and through the threaded runner.
//!
//! Run with: cargo test --release game_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use kingsgrid::bot::{Bot, Strategy};
use kingsgrid::game::GameOutcome;
use kingsgrid::{
    BlockRegistry, BroadcastEvent, Command, CommandEvent, ControlEvent, EventBus, GameCore,
    GameMode, GameRunner, GameStatus, GeneratorRegistry, MapManager,
};

fn manager() -> Arc<MapManager> {
    let generators = GeneratorRegistry::with_defaults(&BlockRegistry::with_defaults()).unwrap();
    Arc::new(MapManager::new(generators))
}

fn bots(count: usize, strategy: Strategy, seed: u64) -> Vec<Bot> {
    (1..=count)
        .zip(0u64..)
        .map(|(n, offset)| Bot::new(format!("p{n}"), strategy, seed + offset))
        .collect()
}

/// Play a game on the calling thread, one turn at a time.
fn step_game(seed: u64, strategy: Strategy, max_turns: u32) -> (u32, Option<GameOutcome>) {
    let bus = Arc::new(EventBus::default());
    let mode = GameMode::classic().with_turn_limit(max_turns);
    let map_id = format!("perlin:16x16:seed={seed}");
    let mut core = GameCore::new("step", mode, map_id, manager(), Arc::clone(&bus));
    let updates = bus.subscribe_broadcast("step");
    let mut bots = bots(2, strategy, seed);

    for bot in &bots {
        core.handle(bot.join().into()).unwrap();
    }
    for bot in &bots {
        let vote = CommandEvent::new(bot.player_id(), Command::ForceStart { is_vote: true });
        core.handle(vote.into()).unwrap();
    }
    assert_eq!(core.status(), GameStatus::InProgress);

    while core.status() == GameStatus::InProgress {
        // Answer until the bots have nothing left to say this turn.
        loop {
            let events = updates.drain();
            if events.is_empty() {
                break;
            }
            for event in &events {
                for bot in &mut bots {
                    if let Some(command) = bot.observe(event) {
                        let _ = core.handle(command.into());
                    }
                }
            }
        }
        if core.status() != GameStatus::InProgress {
            break;
        }
        let next = core.turn_number() + 1;
        core.handle(ControlEvent::AdvanceTurn { turn_number: next }.into()).unwrap();
    }

    (core.turn_number(), core.outcome().cloned())
}

#[test]
fn test_stepped_game_finishes() {
    let (turns, outcome) = step_game(11, Strategy::Greedy, 300);
    assert!(turns <= 300);
    let outcome = outcome.unwrap();
    assert!(!outcome.reason.is_empty());
    assert!(outcome.winners.iter().all(|w| w == "p1" || w == "p2"));
}

#[test]
fn test_stepped_games_are_deterministic() {
    for strategy in [Strategy::Random, Strategy::Greedy] {
        assert_eq!(step_game(5, strategy, 150), step_game(5, strategy, 150));
    }
}

#[test]
fn test_threaded_game_with_bots() {
    // Roomy broadcast buffers so a slow test thread never drops `GameEnded`.
    let bus = Arc::new(EventBus::new(1024, 8192));
    let mut mode = GameMode::classic().with_turn_limit(60);
    mode.turn_duration = Duration::from_millis(5);
    let core = GameCore::new(
        "threaded",
        mode,
        "perlin:12x12:seed=3",
        manager(),
        Arc::clone(&bus),
    );
    let handle = GameRunner::spawn(core, bus, 1.0);
    let updates = handle.subscribe();

    let mut bots = bots(3, Strategy::Greedy, 9);
    for bot in &bots {
        assert!(handle.send_command(bot.join()));
    }
    for bot in &bots {
        handle.send_command(CommandEvent::new(bot.player_id(), Command::ForceStart { is_vote: true }));
    }

    let ended = loop {
        let event = updates.recv_timeout(Duration::from_secs(10)).unwrap();
        for bot in &mut bots {
            if let Some(command) = bot.observe(&event) {
                handle.send_command(command);
            }
        }
        if let BroadcastEvent::GameEnded { winners, reason } = event {
            break (winners, reason);
        }
    };

    let core = handle.join().unwrap();
    assert_eq!(core.status(), GameStatus::Finished);
    assert!(core.turn_number() <= 60);
    let outcome = core.outcome().unwrap();
    assert_eq!((outcome.winners.clone(), outcome.reason.clone()), ended);
    assert!(bots.iter().all(|b| b.owner().is_some()));
}
