//! Error types for the simulation core.
//!
//! Every layer has its own enum so callers can tell validation failures
//! (bad position, not enough troops) from state failures (command issued
//! while the game is in the wrong phase) and setup failures (bad map id,
//! generator budget exhausted).

use std::path::PathBuf;

use thiserror::Error;

use crate::block::{Num, Owner};
use crate::map::Position;

/// Errors raised by map access, move execution and map import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A block lookup or write addressed a cell outside the grid.
    #[error("position {0} is out of bounds")]
    OutOfBounds(Position),
    /// A move started or ended outside the grid.
    #[error("invalid move position {0}")]
    InvalidPosition(Position),
    /// The source cell does not hold enough troops for the move.
    #[error("insufficient troops: requested {requested}, available {available}")]
    InsufficientTroops {
        /// Troops the move asked for after sentinel resolution.
        requested: Num,
        /// Troops on the source cell.
        available: Num,
    },
    /// The source cannot originate a move or the target cannot receive one.
    #[error("move from {from} to {to} is not allowed")]
    MoveNotAllowed {
        /// Source cell.
        from: Position,
        /// Target cell.
        to: Position,
    },
    /// A sight grid does not match the map dimensions.
    #[error("sight grid is {actual_width}x{actual_height}, map is {width}x{height}")]
    DimensionMismatch {
        /// Map width.
        width: u16,
        /// Map height.
        height: u16,
        /// Sight grid width.
        actual_width: u16,
        /// Sight grid height.
        actual_height: u16,
    },
    /// Map dimensions must be non-zero.
    #[error("invalid map size {width}x{height}")]
    InvalidSize {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
    },
    /// An imported map referenced a block name the registry does not know.
    #[error("unknown block type `{0}`")]
    UnknownBlock(String),
    /// An imported map is structurally inconsistent.
    #[error("malformed map: {0}")]
    Malformed(String),
    /// A map identifier could not be parsed.
    #[error("invalid map id `{id}`: {reason}")]
    InvalidMapId {
        /// The identifier as given.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A map identifier named a generator that is not registered.
    #[error("no map generator registered as `{0}`")]
    UnknownGenerator(String),
    /// Procedural generation failed.
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Errors raised by procedural map generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The grid cannot fit the requested number of players.
    #[error("map {width}x{height} is too small for {players} players")]
    TooSmall {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
        /// Number of active players.
        players: usize,
    },
    /// No active players were supplied.
    #[error("map generation needs at least one active player")]
    NoPlayers,
    /// A density parameter is outside `[0, 1)`.
    #[error("{name} density must be in [0, 1), got {value}")]
    InvalidDensity {
        /// Parameter name.
        name: &'static str,
        /// Value as given, formatted.
        value: String,
    },
    /// Two players would spawn on the same cell.
    #[error("start position {0} is shared by two players")]
    OverlappingStart(Position),
    /// Every attempt produced a layout with unreachable castles or territory.
    #[error("no reachable layout found after {attempts} attempts")]
    Unreachable {
        /// Attempts made before giving up.
        attempts: u32,
    },
}

/// Errors raised by the game orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// `join` on a game that has already started.
    #[error("game is not accepting new players")]
    NotWaiting,
    /// Command requires a running game.
    #[error("game is not in progress")]
    NotInProgress,
    /// The game is over and no longer accepts mutations.
    #[error("game has finished")]
    GameFinished,
    /// A player with this id is already in the game.
    #[error("player `{0}` already joined")]
    DuplicatePlayer(String),
    /// The game roster is at the mode's player limit.
    #[error("game is full ({0} players)")]
    GameFull(usize),
    /// No player with this id is in the game.
    #[error("player `{0}` not found")]
    PlayerNotFound(String),
    /// The player is not in a state that allows this command.
    #[error("player `{0}` is not an active participant")]
    PlayerNotActive(String),
    /// The player has spent every move for this turn.
    #[error("player `{0}` has no moves remaining this turn")]
    NoMovesRemaining(String),
    /// The source cell belongs to someone else.
    #[error("player `{player}` does not own {position} (owner {owner})")]
    NotOwner {
        /// Issuing player.
        player: String,
        /// Source cell.
        position: Position,
        /// Actual owner of the cell.
        owner: Owner,
    },
    /// Force-start voting needs at least two players.
    #[error("force start needs at least 2 players, have {0}")]
    NotEnoughPlayers(usize),
    /// A turn advance arrived out of sequence.
    #[error("expected turn {expected}, got {actual}")]
    TurnMismatch {
        /// `current + 1`.
        expected: u32,
        /// Turn number carried by the event.
        actual: u32,
    },
    /// A game mode name is not registered.
    #[error("unknown game mode `{0}`")]
    UnknownMode(String),
    /// The game has no map loaded.
    #[error("game has no map")]
    NoMap,
    /// Map access or move execution failed.
    #[error(transparent)]
    Map(#[from] MapError),
}

/// Errors raised while loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The file is not valid configuration JSON.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A value parsed but is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result alias for map operations.
pub type MapResult<T> = Result<T, MapError>;

/// Result alias for game operations.
pub type GameResult<T> = Result<T, GameError>;
