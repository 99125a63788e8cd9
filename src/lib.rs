// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! kingsgrid: the simulation core of a real-time territory-capture game.
//!
//! Players own troops on a grid and issue one-cell moves; every turn the
//! engine grows buildings and soldiers, resolves combat and checks who is
//! still standing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Transport / CLI bots              │
//! ├──────────────┬──────────────────────┤
//! │ inbox topic  │  broadcast topic     │   events
//! ├──────────────┴──────────────────────┤
//! │   GameRunner thread + TurnTimer     │   game
//! │   GameCore state machine            │
//! ├─────────────────────────────────────┤
//! │   Map, fog, moves  │  generator     │   map, mapgen
//! ├─────────────────────────────────────┤
//! │   Block variants and combat         │   block
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use kingsgrid::{Block, Direction, Map, MapInfo, Position};
//!
//! let mut map = Map::from_rows(
//!     MapInfo::default(),
//!     vec![vec![Block::soldier(10, 1), Block::Blank, Block::Blank]],
//! )?;
//! let outcome = map.move_troops(Position::new(1, 1), Direction::Right, 5)?;
//! assert_eq!(outcome.moved, 5);
//! assert_eq!(map.block(Position::new(2, 1))?, &Block::soldier(5, 1));
//! # Ok::<(), kingsgrid::MapError>(())
//! ```

pub mod block;
pub mod bot;
pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod map;
pub mod mapgen;

pub use error::{ConfigError, GameError, GameResult, GenerateError, MapError, MapResult};

// Re-export key types at crate root for convenience
pub use block::{Block, BlockKind, BlockRegistry, Num, Owner, NEUTRAL};
pub use config::EngineConfig;
pub use events::{EventQueue, Subscription, Topic};
pub use game::{
    BroadcastEvent, Command, CommandEvent, ControlEvent, EventBus, GameCore, GameHandle,
    GameMode, GameRunner, GameStatus, MapManager, MapSource, ModeRegistry, Player, PlayerStatus,
};
pub use map::{Direction, Map, MapInfo, Position, Sight, Size};
pub use mapgen::{GeneratorConfig, GeneratorRegistry, MapGenerator, PerlinGenerator, PlayerSlot};
