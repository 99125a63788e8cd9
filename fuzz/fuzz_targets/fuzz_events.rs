#![no_main]

//! Inbox event fuzzer.
//!
//! Decodes arbitrary bytes as inbox events and feeds whatever parses to a
//! game. Rejections are fine; panics and broken invariants are not.

use std::sync::Arc;

use kingsgrid::game::GameEvent;
use kingsgrid::{BlockRegistry, EventBus, GameCore, GameMode, GameStatus, GeneratorRegistry, MapManager};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(generators) = GeneratorRegistry::with_defaults(&BlockRegistry::with_defaults()) else {
        return;
    };
    let maps = Arc::new(MapManager::new(generators));
    let bus = Arc::new(EventBus::default());
    let mut core = GameCore::new("fuzz", GameMode::duel(), "perlin:10x10:seed=1", maps, bus);

    // One JSON event per line
    for line in data.split(|&b| b == b'\n').take(256) {
        let Ok(event) = serde_json::from_slice::<GameEvent>(line) else {
            continue;
        };
        let _ = core.handle(event);

        assert!(core.players().len() <= core.mode().max_players);
        if core.status() == GameStatus::Waiting {
            assert!(core.map().is_none());
        } else {
            assert!(core.map().is_some());
        }
        if core.status() == GameStatus::Finished {
            assert!(core.outcome().is_some());
        }
    }
});
