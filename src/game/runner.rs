//! One consumer thread per game.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::{
    BroadcastEvent, CommandEvent, ControlEvent, EventBus, GameCore, GameEvent, GameStatus,
    TurnTimer,
};
use crate::error::GameError;
use crate::events::Subscription;

/// Spawns game runner threads.
#[derive(Debug, Clone, Copy)]
pub struct GameRunner;

impl GameRunner {
    /// Move `core` onto its own thread, consuming its inbox until the game
    /// finishes or a `Stop` arrives. `speed` scales the turn timer.
    #[must_use]
    pub fn spawn(core: GameCore, bus: Arc<EventBus>, speed: f64) -> GameHandle {
        let game_id = core.game_id().to_string();
        // Subscribe before the thread starts so nothing sent after `spawn`
        // returns is missed.
        let inbox = bus.subscribe_inbox(&game_id);
        let thread_bus = Arc::clone(&bus);
        let thread = thread::Builder::new()
            .name(format!("game-{game_id}"))
            .spawn(move || run(core, &thread_bus, &inbox, speed));

        GameHandle {
            game_id,
            bus,
            thread: thread.ok(),
        }
    }
}

fn run(
    mut core: GameCore,
    bus: &Arc<EventBus>,
    inbox: &Subscription<GameEvent>,
    speed: f64,
) -> GameCore {
    let game_id = core.game_id().to_string();
    let turn = Arc::new(AtomicU32::new(core.turn_number()));
    let mut timer: Option<TurnTimer> = None;
    info!(game = %game_id, "runner.started");

    while let Ok(event) = inbox.recv() {
        let stop = matches!(event, GameEvent::Control(ControlEvent::Stop));
        let player_id = match &event {
            GameEvent::Command(command) => Some(command.player_id.clone()),
            GameEvent::Control(_) => None,
        };

        match (core.handle(event), player_id) {
            (Ok(()), _) => {}
            (Err(err), Some(player_id)) => {
                warn!(game = %game_id, player = %player_id, error = %err, "runner.command.rejected");
                bus.broadcast(
                    &game_id,
                    BroadcastEvent::PlayerError {
                        player_id,
                        message: err.to_string(),
                    },
                );
            }
            // Late timer ticks after a turn was already advanced.
            (Err(err @ GameError::TurnMismatch { .. }), None) => {
                debug!(game = %game_id, error = %err, "runner.tick.skipped");
            }
            (Err(err), None) => warn!(game = %game_id, error = %err, "runner.control.rejected"),
        }
        turn.store(core.turn_number(), Ordering::Release);

        if timer.is_none() && core.status() == GameStatus::InProgress {
            let period = TurnTimer::period(core.mode().turn_duration, speed);
            timer = Some(TurnTimer::start(
                Arc::clone(bus),
                game_id.clone(),
                period,
                Arc::clone(&turn),
            ));
        }
        if stop || core.status() == GameStatus::Finished {
            break;
        }
    }

    if let Some(mut timer) = timer {
        timer.stop();
    }
    bus.inbox().unsubscribe(inbox);
    info!(game = %game_id, turn = core.turn_number(), status = ?core.status(), "runner.stopped");
    core
}

/// Handle to a running game.
#[derive(Debug)]
pub struct GameHandle {
    game_id: String,
    bus: Arc<EventBus>,
    thread: Option<JoinHandle<GameCore>>,
}

impl GameHandle {
    /// Game id.
    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Queue a player command. Returns whether the runner received it.
    pub fn send_command(&self, command: CommandEvent) -> bool {
        self.bus.send(&self.game_id, command) > 0
    }

    /// Queue a control event. Returns whether the runner received it.
    pub fn send_control(&self, control: ControlEvent) -> bool {
        self.bus.send(&self.game_id, control) > 0
    }

    /// Subscribe to the game's broadcasts.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<BroadcastEvent> {
        self.bus.subscribe_broadcast(&self.game_id)
    }

    /// Ask the runner to stop.
    pub fn stop(&self) -> bool {
        self.send_control(ControlEvent::Stop)
    }

    /// Whether the runner thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the runner to exit and take back the final game state.
    /// `None` if the thread could not be spawned or panicked.
    #[must_use]
    pub fn join(mut self) -> Option<GameCore> {
        self.thread.take()?.join().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::block::Block;
    use crate::error::MapError;
    use crate::game::{Command, GameMode, MapSource};
    use crate::map::{Direction, Map, MapInfo, Position};
    use crate::mapgen::PlayerSlot;

    #[derive(Debug)]
    struct FixedMap(Map);

    impl MapSource for FixedMap {
        fn resolve(&self, _map_id: &str, _players: &[PlayerSlot]) -> Result<Map, MapError> {
            Ok(self.0.clone())
        }
    }

    fn spawn(mode: GameMode) -> GameHandle {
        let bus = Arc::new(EventBus::default());
        let map = Map::from_rows(
            MapInfo::default(),
            vec![vec![Block::king(1, 1), Block::soldier(200, 1), Block::king(1, 2)]],
        )
        .unwrap();
        let core = GameCore::new("r", mode, "fixed", Arc::new(FixedMap(map)), Arc::clone(&bus));
        GameRunner::spawn(core, bus, 1.0)
    }

    fn wait_for(
        updates: &Subscription<BroadcastEvent>,
        pred: impl Fn(&BroadcastEvent) -> bool,
    ) -> BroadcastEvent {
        loop {
            let event = updates.recv_timeout(Duration::from_secs(5)).unwrap();
            if pred(&event) {
                return event;
            }
        }
    }

    #[test]
    fn test_errors_are_broadcast_and_loop_continues() {
        let handle = spawn(GameMode::duel());
        let updates = handle.subscribe();
        assert!(handle.send_command(CommandEvent::new("a", Command::Surrender)));
        let error = wait_for(&updates, |e| matches!(e, BroadcastEvent::PlayerError { .. }));
        assert_eq!(
            error,
            BroadcastEvent::PlayerError {
                player_id: "a".into(),
                message: "game is not in progress".into()
            }
        );

        handle.send_command(CommandEvent::new("a", Command::join("Alice")));
        wait_for(&updates, |e| matches!(e, BroadcastEvent::PlayerJoined { .. }));
        handle.stop();
        let core = handle.join().unwrap();
        assert_eq!(core.players().len(), 1);
    }

    #[test]
    fn test_control_errors_are_not_broadcast() {
        let handle = spawn(GameMode::duel());
        let updates = handle.subscribe();
        handle.bus.send("r", ControlEvent::AdvanceTurn { turn_number: 7 });
        handle.send_command(CommandEvent::new("a", Command::Surrender));

        // The inbox is ordered, so a broadcast control error would come first.
        let error = wait_for(&updates, |e| matches!(e, BroadcastEvent::PlayerError { .. }));
        assert!(matches!(error, BroadcastEvent::PlayerError { player_id, .. } if player_id == "a"));
        handle.stop();
        assert!(handle.join().is_some());
    }

    #[test]
    fn test_timer_advances_and_game_finishes() {
        let mut mode = GameMode::duel();
        mode.turn_duration = Duration::from_millis(5);
        let handle = spawn(mode);
        let updates = handle.subscribe();
        handle.send_command(CommandEvent::new("a", Command::join("Alice")));
        handle.send_command(CommandEvent::new("b", Command::join("Bob")));

        wait_for(&updates, |e| matches!(e, BroadcastEvent::TurnAdvanced { turn_number: 2 }));
        handle.send_command(CommandEvent::new(
            "a",
            Command::Move {
                from: Position::new(2, 1),
                direction: Direction::Right,
                troops: 0,
            },
        ));
        let ended = wait_for(&updates, |e| matches!(e, BroadcastEvent::GameEnded { .. }));
        assert_eq!(
            ended,
            BroadcastEvent::GameEnded {
                winners: vec!["a".into()],
                reason: "last king standing".into()
            }
        );

        let core = handle.join().unwrap();
        assert_eq!(core.status(), GameStatus::Finished);
    }

    #[test]
    fn test_stop_while_running() {
        let handle = spawn(GameMode::duel());
        let updates = handle.subscribe();
        handle.send_command(CommandEvent::new("a", Command::join("Alice")));
        handle.send_command(CommandEvent::new("b", Command::join("Bob")));
        wait_for(&updates, |e| matches!(
            e,
            BroadcastEvent::GameStatusUpdate { status: GameStatus::InProgress, .. }
        ));
        handle.stop();
        let ended = wait_for(&updates, |e| matches!(e, BroadcastEvent::GameEnded { .. }));
        assert!(matches!(ended, BroadcastEvent::GameEnded { reason, .. } if reason == "stopped"));
        assert!(handle.join().is_some());
    }
}
