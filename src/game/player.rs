//! Player roster entries.

use serde::{Deserialize, Serialize};

use crate::block::Owner;

/// Lifecycle state of a player within one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Joined, not voting to start.
    Waiting,
    /// Joined and voting to force the start.
    RequestForceStart,
    /// Playing.
    InGame,
    /// Playing but currently not connected.
    Disconnected,
    /// Gave up.
    Surrendered,
    /// Eliminated.
    Lost,
    /// Won the game.
    Winner,
    /// Watching only.
    Spectator,
    /// Still in the game when it ended without winning.
    Finished,
}

impl PlayerStatus {
    /// No further status changes happen from here.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Surrendered | Self::Lost | Self::Winner | Self::Spectator | Self::Finished
        )
    }

    /// Still competing in a running game, connected or not.
    #[must_use]
    pub const fn is_contending(self) -> bool {
        matches!(self, Self::InGame | Self::Disconnected)
    }
}

/// A player seated in a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Transport-assigned identity. Trusted as given.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owner id of this player's blocks. Assigned in join order at start.
    pub index: Owner,
    /// Moves left in the current turn.
    pub moves_remaining: u32,
    /// Lifecycle state.
    pub status: PlayerStatus,
    /// Transport connection label while connected.
    pub connection: Option<String>,
    /// Why the player left play, once terminal.
    pub finish_reason: Option<String>,
}

impl Player {
    /// A freshly joined player.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, index: Owner) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            index,
            moves_remaining: 0,
            status: PlayerStatus::Waiting,
            connection: None,
            finish_reason: None,
        }
    }

    /// Whether this player currently votes to force the start.
    #[must_use]
    pub fn votes_force_start(&self) -> bool {
        self.status == PlayerStatus::RequestForceStart
    }

    /// Move to a terminal status with a reason.
    pub fn finish(&mut self, status: PlayerStatus, reason: impl Into<String>) {
        self.status = status;
        self.finish_reason = Some(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let player = Player::new("p1", "Alice", 1);
        assert_eq!(player.status, PlayerStatus::Waiting);
        assert_eq!(player.index, 1);
        assert!(!player.votes_force_start());
        assert!(player.finish_reason.is_none());
    }

    #[test]
    fn test_status_classes() {
        assert!(PlayerStatus::InGame.is_contending());
        assert!(PlayerStatus::Disconnected.is_contending());
        assert!(!PlayerStatus::Waiting.is_contending());
        assert!(!PlayerStatus::Waiting.is_terminal());
        for status in [
            PlayerStatus::Surrendered,
            PlayerStatus::Lost,
            PlayerStatus::Winner,
            PlayerStatus::Finished,
        ] {
            assert!(status.is_terminal());
            assert!(!status.is_contending());
        }
    }

    #[test]
    fn test_player_finish() {
        let mut player = Player::new("p1", "Alice", 1);
        player.finish(PlayerStatus::Lost, "eliminated");
        assert_eq!(player.status, PlayerStatus::Lost);
        assert_eq!(player.finish_reason.as_deref(), Some("eliminated"));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PlayerStatus::RequestForceStart).unwrap();
        assert_eq!(json, "\"request_force_start\"");
    }
}
