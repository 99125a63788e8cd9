#![no_main]

//! Move fuzzer.
//!
//! Applies arbitrary moves and turn advances to a generated map and checks
//! that moves never create troops and that every source keeps a garrison.

use arbitrary::Arbitrary;
use kingsgrid::mapgen::PlayerSlot;
use kingsgrid::{
    BlockRegistry, Direction, GeneratorConfig, Map, MapGenerator, PerlinGenerator, Position, Size,
};
use libfuzzer_sys::fuzz_target;

/// A fuzzer-generated step.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzStep {
    /// Move troops from a cell.
    Move { x: u8, y: u8, direction: u8, amount: u32 },
    /// Run the start-of-turn growth hooks.
    Turn,
}

/// Structured input for move fuzzing.
#[derive(Arbitrary, Debug)]
struct MoveInput {
    /// Map seed.
    seed: u64,
    /// Map side length.
    side: u8,
    /// Steps to apply.
    steps: Vec<FuzzStep>,
}

fn total_troops(map: &Map) -> u64 {
    map.blocks().iter().map(|b| u64::from(b.num())).sum()
}

fuzz_target!(|input: MoveInput| {
    let side = u16::from(input.side % 24) + 6;
    let Ok(generator) = PerlinGenerator::new(&BlockRegistry::with_defaults()) else {
        return;
    };
    let config = GeneratorConfig {
        seed: input.seed,
        max_attempts: 4,
        ..GeneratorConfig::default()
    };
    let Ok(mut map) = generator.generate(Size::new(side, side), &PlayerSlot::active_seats(2), &config)
    else {
        return;
    };

    let mut turn = 0;
    for step in input.steps.into_iter().take(64) {
        match step {
            FuzzStep::Move {
                x,
                y,
                direction,
                amount,
            } => {
                let from = Position::new(u16::from(x % 32), u16::from(y % 32));
                let direction = Direction::ALL[usize::from(direction % 4)];
                let before = total_troops(&map);
                if let Ok(outcome) = map.move_troops(from, direction, amount) {
                    assert!(total_troops(&map) <= before, "move created troops");
                    assert!(outcome.moved > 0);
                    assert!(map.block(from).unwrap().num() >= 1, "source lost its garrison");
                } else {
                    assert_eq!(total_troops(&map), before, "failed move changed the map");
                }
            }
            FuzzStep::Turn => {
                turn += 1;
                map.round_end(turn - 1);
                map.round_start(turn);
            }
        }
    }
});
