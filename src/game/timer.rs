//! Periodic turn advancement.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use tracing::{debug, trace};

use super::{ControlEvent, EventBus};

/// Background thread publishing `AdvanceTurn` into a game's inbox.
///
/// The next turn number is read from a shared counter the runner keeps
/// current, so a tick that was dropped or rejected is simply repeated on
/// the following period.
#[derive(Debug)]
pub struct TurnTimer {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TurnTimer {
    /// Start ticking every `period`.
    #[must_use]
    pub fn start(
        bus: Arc<EventBus>,
        game_id: String,
        period: Duration,
        turn: Arc<AtomicU32>,
    ) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let thread = thread::spawn(move || {
            let ticker = tick(period);
            debug!(game = %game_id, ?period, "timer.started");
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => {
                        let next = turn.load(Ordering::Acquire) + 1;
                        trace!(game = %game_id, turn = next, "timer.tick");
                        bus.send(&game_id, ControlEvent::AdvanceTurn { turn_number: next });
                    }
                }
            }
            debug!(game = %game_id, "timer.stopped");
        });
        Self {
            stop: Some(stop_tx),
            thread: Some(thread),
        }
    }

    /// Slowest accepted speed multiplier.
    pub const MIN_SPEED: f64 = 0.01;
    /// Fastest accepted speed multiplier.
    pub const MAX_SPEED: f64 = 1000.0;
    /// Shortest period the ticker runs at.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// `turn_duration / speed`. Speeds are clamped to
    /// [`MIN_SPEED`](Self::MIN_SPEED)..=[`MAX_SPEED`](Self::MAX_SPEED) and
    /// NaN or non-positive speeds count as 1.
    #[must_use]
    pub fn period(turn_duration: Duration, speed: f64) -> Duration {
        let speed = if speed.is_nan() || speed <= 0.0 {
            1.0
        } else {
            speed.clamp(Self::MIN_SPEED, Self::MAX_SPEED)
        };
        Duration::try_from_secs_f64(turn_duration.as_secs_f64() / speed)
            .unwrap_or(turn_duration)
            .max(Self::MIN_PERIOD)
    }

    /// Stop ticking and wait for the thread to exit.
    pub fn stop(&mut self) {
        // Dropping the sender disconnects the stop channel.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
