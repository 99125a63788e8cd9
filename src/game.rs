//! Game layer for kingsgrid.
//!
//! Drives a [`Map`](crate::map::Map) through a session:
//! - Roster of players and their lifecycle
//! - Modes with turn length and end conditions
//! - The [`GameCore`] state machine, the only writer of a game's state
//! - A runner thread per game fed by an inbox topic, plus a turn timer
//! - Map identifier resolution for generated and static maps

mod end;
mod event;
mod manager;
mod mode;
mod player;
mod runner;
mod state;
mod timer;

pub use end::{all_left, eliminated, EndCondition, GameOutcome};
pub use event::{
    BroadcastEvent, Command, CommandEvent, ControlEvent, EventBus, GameEvent, PlayerView,
};
pub use manager::{MapManager, MapSpec};
pub use mode::{GameMode, ModeRegistry};
pub use player::{Player, PlayerStatus};
pub use runner::{GameHandle, GameRunner};
pub use state::{GameCore, GameStatus, MapSource};
pub use timer::TurnTimer;
