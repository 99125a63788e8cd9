//! The per-session game state machine.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::end::{all_left, eliminated};
use super::{
    BroadcastEvent, Command, CommandEvent, ControlEvent, EventBus, GameEvent, GameMode,
    GameOutcome, Player, PlayerStatus, PlayerView,
};
use crate::block::Num;
use crate::error::{GameError, GameResult, MapError};
use crate::map::{Direction, Map, MoveOutcome, Position};
use crate::mapgen::PlayerSlot;

/// Resolves a map identifier to a playable map.
pub trait MapSource: Send + Sync + fmt::Debug {
    /// Produce the map named `map_id` for `players`.
    ///
    /// # Errors
    ///
    /// Returns a [`MapError`] if the id is malformed or generation fails.
    fn resolve(&self, map_id: &str, players: &[PlayerSlot]) -> Result<Map, MapError>;
}

/// Game lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Accepting players.
    Waiting,
    /// Running.
    InProgress,
    /// Over. Terminal.
    Finished,
}

/// One game session: roster, map, turn counter and rules.
///
/// All mutation goes through the methods below, which validate before they
/// change anything. A failed call leaves the game untouched.
#[derive(Debug)]
pub struct GameCore {
    game_id: String,
    status: GameStatus,
    players: Vec<Player>,
    map: Option<Map>,
    map_id: String,
    turn_number: u32,
    mode: GameMode,
    outcome: Option<GameOutcome>,
    maps: Arc<dyn MapSource>,
    bus: Arc<EventBus>,
}

impl GameCore {
    /// A new game in `Waiting` that will play `map_id` under `mode`.
    #[must_use]
    pub fn new(
        game_id: impl Into<String>,
        mode: GameMode,
        map_id: impl Into<String>,
        maps: Arc<dyn MapSource>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            status: GameStatus::Waiting,
            players: Vec::new(),
            map: None,
            map_id: map_id.into(),
            turn_number: 0,
            mode,
            outcome: None,
            maps,
            bus,
        }
    }

    /// Game id.
    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Roster in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Player by id.
    #[must_use]
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// The live (unfogged) map, once started.
    #[must_use]
    pub const fn map(&self) -> Option<&Map> {
        self.map.as_ref()
    }

    /// Current turn; 0 until the first advance.
    #[must_use]
    pub const fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// Rules in force.
    #[must_use]
    pub const fn mode(&self) -> &GameMode {
        &self.mode
    }

    /// How the game ended, once finished.
    #[must_use]
    pub const fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    /// Apply one inbox event.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying operation rejects.
    pub fn handle(&mut self, event: GameEvent) -> GameResult<()> {
        match event {
            GameEvent::Command(CommandEvent { player_id, command }) => match command {
                Command::Join {
                    player_name,
                    connection,
                } => self.join(&player_id, &player_name, connection),
                Command::Leave => self.leave(&player_id),
                Command::Move {
                    from,
                    direction,
                    troops,
                } => self.move_troops(&player_id, from, direction, troops).map(|_| ()),
                Command::ForceStart { is_vote } => self.force_start(&player_id, is_vote),
                Command::Surrender => self.surrender(&player_id),
            },
            GameEvent::Control(ControlEvent::Start) => self.start(),
            GameEvent::Control(ControlEvent::Stop) => self.stop(),
            GameEvent::Control(ControlEvent::AdvanceTurn { turn_number }) => {
                self.next_turn(turn_number)
            }
        }
    }

    /// Seat a player, or reconnect a disconnected one in a running game.
    ///
    /// # Errors
    ///
    /// [`GameError::NotWaiting`] after the start unless reconnecting,
    /// [`GameError::DuplicatePlayer`] and [`GameError::GameFull`] while
    /// waiting.
    pub fn join(
        &mut self,
        player_id: &str,
        name: &str,
        connection: Option<String>,
    ) -> GameResult<()> {
        self.ensure_not_finished()?;

        if self.status == GameStatus::InProgress {
            let player = self
                .players
                .iter_mut()
                .find(|p| p.id == player_id && p.status == PlayerStatus::Disconnected)
                .ok_or(GameError::NotWaiting)?;
            player.status = PlayerStatus::InGame;
            player.connection = connection;
            let view = PlayerView::from(&*player);
            info!(game = %self.game_id, player = player_id, "game.player.reconnected");
            self.publish(BroadcastEvent::PlayerJoined { player: view });
            self.publish_status();
            return self.publish_maps();
        }

        if self.player(player_id).is_some() {
            return Err(GameError::DuplicatePlayer(player_id.to_string()));
        }
        if self.players.len() >= self.mode.max_players {
            return Err(GameError::GameFull(self.mode.max_players));
        }

        let index = u8::try_from(self.players.len() + 1)
            .map_err(|_| GameError::GameFull(self.players.len()))?;
        let mut player = Player::new(player_id, name, index);
        player.connection = connection;
        let view = PlayerView::from(&player);
        self.players.push(player);
        info!(game = %self.game_id, player = player_id, seats = self.players.len(), "game.player.joined");
        self.publish(BroadcastEvent::PlayerJoined { player: view });
        self.check_auto_start();
        Ok(())
    }

    /// Remove a waiting player, or mark a playing one disconnected.
    ///
    /// # Errors
    ///
    /// [`GameError::PlayerNotFound`] if `player_id` is not seated.
    pub fn leave(&mut self, player_id: &str) -> GameResult<()> {
        self.ensure_not_finished()?;
        let idx = self.player_idx(player_id)?;

        if self.status == GameStatus::Waiting {
            self.players.remove(idx);
            self.reindex();
            info!(game = %self.game_id, player = player_id, "game.player.left");
            self.publish(BroadcastEvent::PlayerLeft {
                player_id: player_id.to_string(),
            });
            self.check_auto_start();
            return Ok(());
        }

        let player = &mut self.players[idx];
        if player.status.is_contending() {
            player.status = PlayerStatus::Disconnected;
        }
        player.connection = None;
        info!(game = %self.game_id, player = player_id, "game.player.disconnected");
        self.publish(BroadcastEvent::PlayerLeft {
            player_id: player_id.to_string(),
        });
        self.publish_status();
        self.evaluate()
    }

    /// Move troops from a cell the player owns.
    ///
    /// # Errors
    ///
    /// State errors when the game or player cannot move, [`GameError::NotOwner`]
    /// for foreign cells, and [`GameError::Map`] for illegal moves.
    pub fn move_troops(
        &mut self,
        player_id: &str,
        from: Position,
        direction: Direction,
        troops: Num,
    ) -> GameResult<MoveOutcome> {
        self.ensure_in_progress()?;
        let idx = self.player_idx(player_id)?;
        let player = &self.players[idx];
        if player.status != PlayerStatus::InGame {
            return Err(GameError::PlayerNotActive(player_id.to_string()));
        }
        if player.moves_remaining == 0 {
            return Err(GameError::NoMovesRemaining(player_id.to_string()));
        }

        let map = self.map.as_mut().ok_or(GameError::NoMap)?;
        let owner = map
            .block(from)
            .map_err(|_| MapError::InvalidPosition(from))?
            .owner();
        if owner != player.index {
            return Err(GameError::NotOwner {
                player: player_id.to_string(),
                position: from,
                owner,
            });
        }

        let outcome = map.move_troops(from, direction, troops)?;
        self.players[idx].moves_remaining -= 1;
        debug!(
            game = %self.game_id,
            player = player_id,
            %from,
            to = %outcome.to,
            moved = outcome.moved,
            captured = outcome.captured,
            "game.move"
        );
        self.publish_maps()?;
        Ok(outcome)
    }

    /// Cast or withdraw a force-start vote.
    ///
    /// # Errors
    ///
    /// [`GameError::NotEnoughPlayers`] with fewer than two players seated.
    pub fn force_start(&mut self, player_id: &str, is_vote: bool) -> GameResult<()> {
        self.ensure_not_finished()?;
        if self.status != GameStatus::Waiting {
            return Err(GameError::NotWaiting);
        }
        if self.players.len() < 2 {
            return Err(GameError::NotEnoughPlayers(self.players.len()));
        }
        let idx = self.player_idx(player_id)?;
        self.players[idx].status = if is_vote {
            PlayerStatus::RequestForceStart
        } else {
            PlayerStatus::Waiting
        };
        debug!(game = %self.game_id, player = player_id, is_vote, "game.force_start.vote");
        self.publish(BroadcastEvent::ForceStartVote {
            player_id: player_id.to_string(),
            is_vote,
        });
        self.check_auto_start();
        Ok(())
    }

    /// Give up. Territory stays on the map.
    ///
    /// # Errors
    ///
    /// [`GameError::PlayerNotActive`] unless the player is in game.
    pub fn surrender(&mut self, player_id: &str) -> GameResult<()> {
        self.ensure_in_progress()?;
        let idx = self.player_idx(player_id)?;
        if self.players[idx].status != PlayerStatus::InGame {
            return Err(GameError::PlayerNotActive(player_id.to_string()));
        }
        self.players[idx].finish(PlayerStatus::Surrendered, "surrendered");
        info!(game = %self.game_id, player = player_id, "game.player.surrendered");
        self.publish_status();
        self.evaluate()
    }

    /// Advance to `turn`, which must be the current turn plus one.
    ///
    /// # Errors
    ///
    /// [`GameError::TurnMismatch`] for out-of-sequence advances.
    pub fn next_turn(&mut self, turn: u32) -> GameResult<()> {
        self.ensure_in_progress()?;
        let expected = self.turn_number + 1;
        if turn != expected {
            return Err(GameError::TurnMismatch {
                expected,
                actual: turn,
            });
        }
        let map = self.map.as_mut().ok_or(GameError::NoMap)?;
        map.round_end(self.turn_number);
        self.turn_number = turn;
        map.round_start(turn);

        let moves = self.mode.moves_per_turn;
        for player in self.players.iter_mut().filter(|p| p.status.is_contending()) {
            player.moves_remaining = moves;
        }
        debug!(game = %self.game_id, turn, "game.turn");
        self.publish(BroadcastEvent::TurnAdvanced { turn_number: turn });
        self.publish_maps()?;
        self.evaluate()
    }

    /// Resolve the map and begin play.
    ///
    /// # Errors
    ///
    /// [`GameError::NotWaiting`] once started, [`GameError::NotEnoughPlayers`]
    /// with an empty roster, and [`GameError::Map`] if the map cannot be
    /// resolved. The game stays waiting on failure.
    pub fn start(&mut self) -> GameResult<()> {
        self.ensure_not_finished()?;
        if self.status != GameStatus::Waiting {
            return Err(GameError::NotWaiting);
        }
        if self.players.is_empty() {
            return Err(GameError::NotEnoughPlayers(0));
        }

        let slots = PlayerSlot::active_seats(self.players.len());
        let map = self.maps.resolve(&self.map_id, &slots)?;

        for (player, slot) in self.players.iter_mut().zip(&slots) {
            player.index = slot.owner;
            player.status = PlayerStatus::InGame;
            player.moves_remaining = self.mode.moves_per_turn;
        }
        self.map = Some(map);
        self.turn_number = 0;
        self.status = GameStatus::InProgress;
        info!(
            game = %self.game_id,
            map = %self.map_id,
            players = self.players.len(),
            "game.started"
        );
        self.publish_status();
        self.publish_maps()
    }

    /// Stop the game. A running game finishes with reason `"stopped"`.
    ///
    /// # Errors
    ///
    /// [`GameError::GameFinished`] if already over.
    pub fn stop(&mut self) -> GameResult<()> {
        self.ensure_not_finished()?;
        if self.status == GameStatus::InProgress {
            self.finish(GameOutcome::new(Vec::new(), "stopped"));
        }
        Ok(())
    }

    /// Eliminate players without territory, then check end conditions.
    fn evaluate(&mut self) -> GameResult<()> {
        if self.status != GameStatus::InProgress {
            return Ok(());
        }
        let Some(map) = self.map.as_ref() else {
            return Err(GameError::NoMap);
        };

        let lost = eliminated(&self.players, map, self.mode.uses_king_survival());
        for player in self.players.iter_mut().filter(|p| lost.contains(&p.id)) {
            info!(game = %self.game_id, player = %player.id, "game.player.eliminated");
            player.finish(PlayerStatus::Lost, "eliminated");
        }
        if !lost.is_empty() {
            self.publish_status();
        }

        let outcome = all_left(&self.players).or_else(|| {
            self.mode
                .end_conditions
                .iter()
                .find_map(|c| c.evaluate(&self.players, map, self.turn_number))
        });
        if let Some(outcome) = outcome {
            self.finish(outcome);
        }
        Ok(())
    }

    fn finish(&mut self, outcome: GameOutcome) {
        for player in &mut self.players {
            if outcome.winners.contains(&player.id) {
                player.finish(PlayerStatus::Winner, outcome.reason.clone());
            } else if !player.status.is_terminal() {
                player.finish(PlayerStatus::Finished, outcome.reason.clone());
            }
        }
        self.status = GameStatus::Finished;
        info!(
            game = %self.game_id,
            turn = self.turn_number,
            winners = ?outcome.winners,
            reason = %outcome.reason,
            "game.finished"
        );
        self.publish(BroadcastEvent::GameEnded {
            winners: outcome.winners.clone(),
            reason: outcome.reason.clone(),
        });
        self.publish_status();
        self.outcome = Some(outcome);
    }

    /// Start once the roster is full or a majority votes for it. A failed
    /// start is broadcast and the game keeps waiting; it never fails the
    /// command that triggered it.
    fn check_auto_start(&mut self) {
        if self.status != GameStatus::Waiting || self.players.is_empty() {
            return;
        }
        let count = self.players.len();
        let votes = self.players.iter().filter(|p| p.votes_force_start()).count();
        if count < self.mode.max_players && (votes * 2 <= count || count < self.mode.min_players)
        {
            return;
        }
        if let Err(err) = self.start() {
            warn!(game = %self.game_id, map = %self.map_id, error = %err, "game.start.failed");
            self.publish(BroadcastEvent::StartFailed {
                message: err.to_string(),
            });
        }
    }

    fn reindex(&mut self) {
        for (i, player) in self.players.iter_mut().enumerate() {
            player.index = u8::try_from(i + 1).unwrap_or(u8::MAX);
        }
    }

    fn ensure_not_finished(&self) -> GameResult<()> {
        if self.status == GameStatus::Finished {
            return Err(GameError::GameFinished);
        }
        Ok(())
    }

    fn ensure_in_progress(&self) -> GameResult<()> {
        match self.status {
            GameStatus::InProgress => Ok(()),
            GameStatus::Finished => Err(GameError::GameFinished),
            GameStatus::Waiting => Err(GameError::NotInProgress),
        }
    }

    fn player_idx(&self, player_id: &str) -> GameResult<usize> {
        self.players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))
    }

    fn publish(&self, event: BroadcastEvent) {
        self.bus.broadcast(&self.game_id, event);
    }

    fn publish_status(&self) {
        self.publish(BroadcastEvent::GameStatusUpdate {
            status: self.status,
            players: self.players.iter().map(PlayerView::from).collect(),
            turn_number: self.turn_number,
        });
    }

    /// One fogged view per seated player.
    fn publish_maps(&self) -> GameResult<()> {
        let Some(map) = self.map.as_ref() else {
            return Ok(());
        };
        for player in &self.players {
            let owners = BTreeSet::from([player.index]);
            let sight = map.sight(&owners);
            self.publish(BroadcastEvent::MapUpdate {
                viewer: player.id.clone(),
                map: map.fogged(&owners, &sight)?,
                turn_number: self.turn_number,
            });
        }
        Ok(())
    }
}
