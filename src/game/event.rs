//! Events flowing into and out of a game.
//!
//! Transports publish [`GameEvent`]s on a game's inbox topic and forward the
//! [`BroadcastEvent`]s it publishes on its broadcast topic. Both travel over
//! the same [`EventBus`].

use serde::{Deserialize, Serialize};

use super::{GameStatus, Player, PlayerStatus};
use crate::block::Num;
use crate::events::{EventQueue, Subscription, Topic};
use crate::map::{Direction, Map, Position};

/// A player-issued command. The `player_id` is trusted as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Issuing player.
    pub player_id: String,
    /// What the player asked for.
    #[serde(flatten)]
    pub command: Command,
}

impl CommandEvent {
    /// Command from `player_id`.
    #[must_use]
    pub fn new(player_id: impl Into<String>, command: Command) -> Self {
        Self {
            player_id: player_id.into(),
            command,
        }
    }
}

/// Player commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Take a seat, or reconnect to a running game.
    Join {
        /// Display name.
        player_name: String,
        /// Transport connection label.
        #[serde(default)]
        connection: Option<String>,
    },
    /// Leave the game; running games keep the seat for reconnection.
    Leave,
    /// Move troops one cell.
    Move {
        /// Source cell.
        from: Position,
        /// Step direction.
        direction: Direction,
        /// Troops to move; `0` moves all but the garrison, `Num::MAX` half.
        troops: Num,
    },
    /// Cast or withdraw a force-start vote.
    ForceStart {
        /// `true` to vote for starting now.
        is_vote: bool,
    },
    /// Give up.
    Surrender,
}

impl Command {
    /// Join with a display name.
    #[must_use]
    pub fn join(player_name: impl Into<String>) -> Self {
        Self::Join {
            player_name: player_name.into(),
            connection: None,
        }
    }
}

/// Lifecycle control, issued by the lobby or the turn timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlEvent {
    /// Start the game now.
    Start,
    /// Stop the game and its runner.
    Stop,
    /// Advance to `turn_number`.
    AdvanceTurn {
        /// Must be the current turn plus one.
        turn_number: u32,
    },
}

/// Anything a game's runner consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameEvent {
    /// Player command.
    Command(CommandEvent),
    /// Lifecycle control.
    Control(ControlEvent),
}

impl From<CommandEvent> for GameEvent {
    fn from(event: CommandEvent) -> Self {
        Self::Command(event)
    }
}

impl From<ControlEvent> for GameEvent {
    fn from(event: ControlEvent) -> Self {
        Self::Control(event)
    }
}

/// Public view of a player, as broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    /// Player id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owner id of the player's blocks.
    pub index: u8,
    /// Lifecycle state.
    pub status: PlayerStatus,
    /// Why the player left play, once terminal.
    pub finish_reason: Option<String>,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            index: player.index,
            status: player.status,
            finish_reason: player.finish_reason.clone(),
        }
    }
}

/// Events a game publishes to its transports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BroadcastEvent {
    /// A player took a seat or reconnected.
    PlayerJoined {
        /// The player.
        player: PlayerView,
    },
    /// A player left or disconnected.
    PlayerLeft {
        /// The player's id.
        player_id: String,
    },
    /// Game status or roster changed.
    GameStatusUpdate {
        /// Game status.
        status: GameStatus,
        /// Full roster.
        players: Vec<PlayerView>,
        /// Current turn.
        turn_number: u32,
    },
    /// One player's fogged view of the map.
    MapUpdate {
        /// Player the view belongs to.
        viewer: String,
        /// The fogged map.
        map: Map,
        /// Current turn.
        turn_number: u32,
    },
    /// A turn completed.
    TurnAdvanced {
        /// The new turn.
        turn_number: u32,
    },
    /// A player changed their force-start vote.
    ForceStartVote {
        /// Voting player.
        player_id: String,
        /// The new vote.
        is_vote: bool,
    },
    /// The game is over.
    GameEnded {
        /// Winning player ids.
        winners: Vec<String>,
        /// Why it ended.
        reason: String,
    },
    /// An automatic start failed; the game is still waiting.
    StartFailed {
        /// Error description.
        message: String,
    },
    /// A command was rejected.
    PlayerError {
        /// Player whose command failed.
        player_id: String,
        /// Error description.
        message: String,
    },
}

/// Paired queues for one process: game inboxes and broadcasts.
#[derive(Debug)]
pub struct EventBus {
    inbox: EventQueue<GameEvent>,
    broadcast: EventQueue<BroadcastEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(
            crate::events::DEFAULT_CAPACITY,
            crate::events::DEFAULT_CAPACITY,
        )
    }
}

impl EventBus {
    /// Bus with the given per-subscriber buffer sizes.
    #[must_use]
    pub fn new(inbox_capacity: usize, broadcast_capacity: usize) -> Self {
        Self {
            inbox: EventQueue::new(inbox_capacity),
            broadcast: EventQueue::new(broadcast_capacity),
        }
    }

    /// Publish into a game's inbox. Returns the delivery count.
    pub fn send(&self, game_id: &str, event: impl Into<GameEvent>) -> usize {
        self.inbox.publish(&Topic::inbox(game_id), event.into())
    }

    /// Publish on a game's broadcast topic. Returns the delivery count.
    pub fn broadcast(&self, game_id: &str, event: BroadcastEvent) -> usize {
        self.broadcast.publish(&Topic::broadcast(game_id), event)
    }

    /// Subscribe to a game's inbox.
    pub fn subscribe_inbox(&self, game_id: &str) -> Subscription<GameEvent> {
        self.inbox.subscribe(&Topic::inbox(game_id))
    }

    /// Subscribe to a game's broadcasts.
    pub fn subscribe_broadcast(&self, game_id: &str) -> Subscription<BroadcastEvent> {
        self.broadcast.subscribe(&Topic::broadcast(game_id))
    }

    /// Inbox queue.
    #[must_use]
    pub const fn inbox(&self) -> &EventQueue<GameEvent> {
        &self.inbox
    }

    /// Broadcast queue.
    #[must_use]
    pub const fn broadcasts(&self) -> &EventQueue<BroadcastEvent> {
        &self.broadcast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_shape() {
        let event = CommandEvent::new(
            "p1",
            Command::Move {
                from: Position::new(2, 3),
                direction: Direction::Left,
                troops: 0,
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["player_id"], "p1");
        assert_eq!(json["type"], "move");
        assert_eq!(json["direction"], "left");
        assert_eq!(json["from"]["x"], 2);

        let back: CommandEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_join_connection_optional() {
        let event: CommandEvent =
            serde_json::from_str(r#"{"player_id":"p","type":"join","player_name":"Ann"}"#).unwrap();
        assert_eq!(event.command, Command::join("Ann"));
    }

    #[test]
    fn test_game_event_untagged() {
        let control: GameEvent =
            serde_json::from_str(r#"{"type":"advance_turn","turn_number":4}"#).unwrap();
        assert_eq!(control, GameEvent::Control(ControlEvent::AdvanceTurn { turn_number: 4 }));

        let command: GameEvent =
            serde_json::from_str(r#"{"player_id":"p","type":"surrender"}"#).unwrap();
        assert!(matches!(command, GameEvent::Command(_)));
    }

    #[test]
    fn test_bus_routes_per_game() {
        let bus = EventBus::default();
        let inbox = bus.subscribe_inbox("g1");
        let updates = bus.subscribe_broadcast("g1");
        assert_eq!(bus.send("g1", ControlEvent::Start), 1);
        assert_eq!(bus.send("g2", ControlEvent::Start), 0);
        bus.broadcast("g1", BroadcastEvent::TurnAdvanced { turn_number: 1 });
        assert_eq!(inbox.try_recv().unwrap(), GameEvent::Control(ControlEvent::Start));
        assert_eq!(
            updates.try_recv().unwrap(),
            BroadcastEvent::TurnAdvanced { turn_number: 1 }
        );
    }
}
