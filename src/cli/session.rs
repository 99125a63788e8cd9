//! Shared setup for commands that play a game with local bots.

use super::{BotStrategy, CliError};
use kingsgrid::bot::Bot;
use kingsgrid::events::Subscription;
use kingsgrid::game::TurnTimer;
use kingsgrid::{
    BlockRegistry, BroadcastEvent, Command, CommandEvent, EngineConfig, EventBus, GameCore,
    GameHandle, GameMode, GameRunner, GeneratorRegistry, MapManager, ModeRegistry,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Give up on a runner that has been silent this long.
pub(crate) const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Load the config file, or defaults without one.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded.
pub(crate) fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_json_file(path)?),
        None => Ok(EngineConfig::default()),
    }
}

/// Map manager over the built-in generators.
///
/// # Errors
///
/// Returns an error if a built-in generator cannot be registered.
pub(crate) fn map_manager(config: &EngineConfig) -> Result<MapManager, CliError> {
    let blocks = BlockRegistry::with_defaults();
    let generators = GeneratorRegistry::with_defaults(&blocks)?;
    Ok(MapManager::new(generators)
        .with_defaults(config.generator)
        .with_cache_capacity(config.map_cache_capacity))
}

/// Pin a generated map identifier to `seed` unless it already carries one.
/// Identifiers without a size part are static names and stay as they are.
pub(crate) fn seeded_map_id(map_id: &str, seed: u64) -> String {
    match map_id.matches(':').count() {
        1 => format!("{map_id}:seed={seed}"),
        2 if !map_id.contains("seed=") => format!("{map_id},seed={seed}"),
        _ => map_id.to_string(),
    }
}

/// Options shared by `run` and `watch`.
#[derive(Debug, Clone)]
pub(crate) struct GameArgs {
    pub(crate) bots: usize,
    pub(crate) strategy: BotStrategy,
    pub(crate) seed: Option<u64>,
    pub(crate) turns: u32,
    pub(crate) mode: Option<String>,
    pub(crate) map: Option<String>,
    pub(crate) speed: Option<f64>,
}

/// A running game plus the bots playing it.
#[derive(Debug)]
pub(crate) struct Session {
    handle: GameHandle,
    updates: Subscription<BroadcastEvent>,
    bots: Vec<Bot>,
    mode: GameMode,
    map_id: String,
    seed: u64,
}

impl Session {
    /// Spawn a game, seat the bots and vote to start it.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown modes, more bots than the mode seats, or
    /// a broken generator setup.
    pub(crate) fn start(config: &EngineConfig, args: &GameArgs) -> Result<Self, CliError> {
        let seed = args.seed.unwrap_or_else(rand::random);
        let modes = ModeRegistry::with_defaults();
        let mode_name = args.mode.as_deref().unwrap_or(&config.mode);
        let mode = modes.get(mode_name)?.clone().with_turn_limit(args.turns);
        if args.bots > mode.max_players {
            return Err(CliError::new(format!(
                "mode `{}` seats at most {} players, got {} bots",
                mode.name, mode.max_players, args.bots
            )));
        }

        let speed = args.speed.unwrap_or(config.speed);
        if !(TurnTimer::MIN_SPEED..=TurnTimer::MAX_SPEED).contains(&speed) {
            return Err(CliError::new(format!(
                "speed must be in [{}, {}], got {speed}",
                TurnTimer::MIN_SPEED,
                TurnTimer::MAX_SPEED
            )));
        }

        let maps = map_manager(config)?;
        let map_id = seeded_map_id(args.map.as_deref().unwrap_or(&config.map), seed);
        let bus = Arc::new(EventBus::new(
            config.inbox_capacity,
            config.broadcast_capacity,
        ));
        let core = GameCore::new(
            format!("cli-{seed}"),
            mode.clone(),
            map_id.clone(),
            Arc::new(maps),
            Arc::clone(&bus),
        );
        let handle = GameRunner::spawn(core, bus, speed);
        let updates = handle.subscribe();

        let bots: Vec<Bot> = (1..=args.bots)
            .zip(0u64..)
            .map(|(n, offset)| {
                Bot::new(format!("p{n}"), args.strategy.into(), seed.wrapping_add(offset))
                .with_moves_per_turn(mode.moves_per_turn)
            })
            .collect();

        for bot in &bots {
            handle.send_command(bot.join());
        }
        // A full roster starts on its own.
        if bots.len() < mode.max_players {
            for bot in &bots {
                handle.send_command(CommandEvent::new(
                    bot.player_id(),
                    Command::ForceStart { is_vote: true },
                ));
            }
        }
        info!(game = handle.game_id(), map = %map_id, mode = %mode.name, bots = bots.len(), "cli.session.started");

        Ok(Self {
            handle,
            updates,
            bots,
            mode,
            map_id,
            seed,
        })
    }

    /// Game mode in play.
    pub(crate) const fn mode(&self) -> &GameMode {
        &self.mode
    }

    /// Resolved map identifier.
    pub(crate) fn map_id(&self) -> &str {
        &self.map_id
    }

    /// Seed used for the bots and the map.
    pub(crate) const fn seed(&self) -> u64 {
        self.seed
    }

    pub(crate) fn bots(&self) -> &[Bot] {
        &self.bots
    }

    /// Next broadcast, already answered by the bots. `None` once `timeout`
    /// passes without one.
    pub(crate) fn next_event(&mut self, timeout: Duration) -> Option<BroadcastEvent> {
        let event = self.updates.recv_timeout(timeout).ok()?;
        self.dispatch(&event);
        Some(event)
    }

    /// Every broadcast already queued, answered by the bots.
    pub(crate) fn drain(&mut self) -> Vec<BroadcastEvent> {
        let events = self.updates.drain();
        for event in &events {
            self.dispatch(event);
        }
        events
    }

    fn dispatch(&mut self, event: &BroadcastEvent) {
        if let BroadcastEvent::PlayerError { player_id, message } = event {
            debug!(player = %player_id, %message, "cli.bot.rejected");
        }
        for bot in &mut self.bots {
            if let Some(command) = bot.observe(event) {
                self.handle.send_command(command);
            }
        }
    }

    /// Stop the game if it is still running and take its final state.
    ///
    /// # Errors
    ///
    /// Returns an error if the runner thread died.
    pub(crate) fn finish(self) -> Result<GameCore, CliError> {
        self.handle.stop();
        let game_id = self.handle.game_id().to_string();
        self.handle
            .join()
            .ok_or_else(|| CliError::new(format!("game `{game_id}` runner panicked")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_map_id() {
        assert_eq!(seeded_map_id("perlin:20x20", 7), "perlin:20x20:seed=7");
        assert_eq!(
            seeded_map_id("perlin:20x20:mountains=0.3", 7),
            "perlin:20x20:mountains=0.3,seed=7"
        );
        assert_eq!(seeded_map_id("perlin:20x20:seed=1", 7), "perlin:20x20:seed=1");
        assert_eq!(seeded_map_id("arena", 7), "arena");
    }
}
