//! Game modes and their registry.

use std::collections::BTreeMap;
use std::time::Duration;

use super::EndCondition;
use crate::error::{GameError, GameResult};

/// Immutable rules for one kind of game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameMode {
    /// Registry name.
    pub name: String,
    /// Roster limit; reaching it starts the game.
    pub max_players: usize,
    /// Players required before a force-start vote can pass.
    pub min_players: usize,
    /// Players per team. Only 1 is currently played.
    pub team_size: usize,
    /// Wall-clock length of a turn at speed 1.
    pub turn_duration: Duration,
    /// Moves each player may issue per turn.
    pub moves_per_turn: u32,
    /// Checked in order after every state change; the first match ends the game.
    pub end_conditions: Vec<EndCondition>,
}

impl GameMode {
    /// Free-for-all up to 8 players, kings must survive.
    #[must_use]
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            max_players: 8,
            min_players: 2,
            team_size: 1,
            turn_duration: Duration::from_millis(500),
            moves_per_turn: 1,
            end_conditions: vec![EndCondition::KingSurvival, EndCondition::LastStanding],
        }
    }

    /// Two players, kings must survive.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "duel".to_string(),
            max_players: 2,
            ..Self::classic()
        }
    }

    /// Territory war with no king rule and a turn cap.
    #[must_use]
    pub fn conquest() -> Self {
        Self {
            name: "conquest".to_string(),
            max_players: 8,
            moves_per_turn: 2,
            end_conditions: vec![EndCondition::LastStanding, EndCondition::TurnLimit(1000)],
            ..Self::classic()
        }
    }

    /// Losing the king eliminates a player in this mode.
    #[must_use]
    pub fn uses_king_survival(&self) -> bool {
        self.end_conditions.contains(&EndCondition::KingSurvival)
    }

    /// Same mode with a turn cap appended.
    #[must_use]
    pub fn with_turn_limit(mut self, turns: u32) -> Self {
        self.end_conditions.retain(|c| !matches!(c, EndCondition::TurnLimit(_)));
        self.end_conditions.push(EndCondition::TurnLimit(turns));
        self
    }
}

/// Game modes keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ModeRegistry {
    modes: BTreeMap<String, GameMode>,
}

impl ModeRegistry {
    /// Registry with the built-in modes.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.register(GameMode::classic());
        registry.register(GameMode::duel());
        registry.register(GameMode::conquest());
        registry
    }

    /// Add or replace a mode under its own name.
    pub fn register(&mut self, mode: GameMode) {
        self.modes.insert(mode.name.clone(), mode);
    }

    /// Look up a mode by name.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownMode`] if nothing is registered as `name`.
    pub fn get(&self, name: &str) -> GameResult<&GameMode> {
        self.modes
            .get(name)
            .ok_or_else(|| GameError::UnknownMode(name.to_string()))
    }

    /// Registered mode names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }
}
