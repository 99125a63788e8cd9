//! Output formatting utilities for CLI.

// Aggregate ratios are reported as floats
#![allow(clippy::cast_precision_loss)]

use kingsgrid::mapgen::ReachabilityReport;
use kingsgrid::{GameCore, PlayerStatus};
use serde::Serialize;
use std::fmt::Write as _;

/// JSON-serializable game result.
#[derive(Debug, Serialize)]
pub(super) struct JsonRunResult {
    /// Seed used for bots and the map.
    pub(super) seed: u64,
    /// Game mode name.
    pub(super) mode: String,
    /// Map identifier.
    pub(super) map: String,
    /// Last turn played.
    pub(super) turns_played: u32,
    /// Winning player ids (empty for a draw or a stopped game).
    pub(super) winners: Vec<String>,
    /// Why the game ended.
    pub(super) reason: Option<String>,
    /// Per-player results.
    pub(super) players: Vec<JsonPlayerResult>,
}

/// JSON-serializable player result.
#[derive(Debug, Serialize)]
pub(super) struct JsonPlayerResult {
    /// Player id.
    pub(super) id: String,
    /// Owner index on the map (1-8).
    pub(super) index: u8,
    /// Final lifecycle state.
    pub(super) status: PlayerStatus,
    /// Troops on the final map.
    pub(super) troops: u64,
    /// Cells held on the final map.
    pub(super) cells: usize,
}

impl JsonRunResult {
    /// Create from the final state of a game.
    pub(super) fn from_core(core: &GameCore, seed: u64, map_id: &str) -> Self {
        let outcome = core.outcome();
        let players = core
            .players()
            .iter()
            .map(|p| {
                let (troops, cells) = core
                    .map()
                    .map_or((0, 0), |m| (m.troops(p.index), m.owned_cells(p.index).count()));
                JsonPlayerResult {
                    id: p.id.clone(),
                    index: p.index,
                    status: p.status,
                    troops,
                    cells,
                }
            })
            .collect();

        Self {
            seed,
            mode: core.mode().name.clone(),
            map: map_id.to_string(),
            turns_played: core.turn_number(),
            winners: outcome.map(|o| o.winners.clone()).unwrap_or_default(),
            reason: outcome.map(|o| o.reason.clone()),
            players,
        }
    }
}

/// Format a game result as human-readable text.
pub(super) fn format_run_text(result: &JsonRunResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Game Result (seed: {})", result.seed);
    let _ = writeln!(output, "  Mode: {}  Map: {}", result.mode, result.map);
    if result.winners.is_empty() {
        output.push_str("  Winner: none\n");
    } else {
        let _ = writeln!(output, "  Winner: {}", result.winners.join(", "));
    }
    if let Some(reason) = &result.reason {
        let _ = writeln!(output, "  Reason: {reason}");
    }
    let _ = writeln!(output, "  Turns: {}\n", result.turns_played);

    for player in &result.players {
        let _ = writeln!(
            output,
            "  Player {} ({}): {} troops on {} cells [{:?}]",
            player.index, player.id, player.troops, player.cells, player.status
        );
    }

    output
}

/// Aggregated reachability statistics over a batch of generated maps.
#[derive(Debug, Default, Clone)]
pub(super) struct ValidateStats {
    /// Maps the generator produced.
    pub(super) generated: u64,
    /// Produced maps that pass the playability check.
    pub(super) playable: u64,
    /// Seeds where the generator ran out of attempts.
    pub(super) exhausted: u64,
    /// Seeds that failed for any other reason.
    pub(super) failed: u64,
    /// First non-exhaustion failure, for reporting.
    pub(super) first_error: Option<String>,
    ratio_sum: f64,
    max_ratio: f64,
    isolated_buildings: u64,
}

impl ValidateStats {
    /// Record a generated map.
    pub(super) fn add_report(&mut self, report: &ReachabilityReport) {
        self.generated += 1;
        if report.is_playable() {
            self.playable += 1;
        }
        let ratio = report.unreachable_ratio();
        self.ratio_sum += ratio;
        self.max_ratio = self.max_ratio.max(ratio);
        self.isolated_buildings += report.isolated_buildings as u64;
    }

    /// Record a seed the generator gave up on.
    pub(super) fn add_exhausted(&mut self) {
        self.exhausted += 1;
    }

    /// Record any other generator failure.
    pub(super) fn add_failure(&mut self, message: String) {
        self.failed += 1;
        self.first_error.get_or_insert(message);
    }

    /// Merge stats from another worker.
    pub(super) fn merge(&mut self, other: &Self) {
        self.generated += other.generated;
        self.playable += other.playable;
        self.exhausted += other.exhausted;
        self.failed += other.failed;
        if self.first_error.is_none() {
            self.first_error.clone_from(&other.first_error);
        }
        self.ratio_sum += other.ratio_sum;
        self.max_ratio = self.max_ratio.max(other.max_ratio);
        self.isolated_buildings += other.isolated_buildings;
    }

    /// Seeds attempted.
    pub(super) const fn total(&self) -> u64 {
        self.generated + self.exhausted + self.failed
    }

    /// Share of attempted seeds that yielded a playable map.
    pub(super) fn playable_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.playable as f64 / self.total() as f64
    }

    /// Mean unreachable ratio over generated maps.
    pub(super) fn avg_unreachable(&self) -> f64 {
        if self.generated == 0 {
            return 0.0;
        }
        self.ratio_sum / self.generated as f64
    }
}

/// JSON-serializable validation result.
#[derive(Debug, Serialize)]
pub(super) struct JsonValidateResult {
    width: u16,
    height: u16,
    players: usize,
    seeds: u64,
    generated: u64,
    playable: u64,
    playable_rate: f64,
    exhausted: u64,
    failed: u64,
    avg_unreachable: f64,
    max_unreachable: f64,
    isolated_buildings: u64,
    first_error: Option<String>,
}

impl JsonValidateResult {
    /// Create from stats and the batch parameters.
    pub(super) fn from_stats(stats: &ValidateStats, width: u16, height: u16, players: usize) -> Self {
        Self {
            width,
            height,
            players,
            seeds: stats.total(),
            generated: stats.generated,
            playable: stats.playable,
            playable_rate: stats.playable_rate(),
            exhausted: stats.exhausted,
            failed: stats.failed,
            avg_unreachable: stats.avg_unreachable(),
            max_unreachable: stats.max_ratio,
            isolated_buildings: stats.isolated_buildings,
            first_error: stats.first_error.clone(),
        }
    }
}

/// Format validation stats as human-readable text.
pub(super) fn format_validate_text(result: &JsonValidateResult) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Map Validation ({}x{}, {} players, {} seeds)",
        result.width, result.height, result.players, result.seeds
    );
    output.push_str("========================================\n\n");
    let _ = writeln!(
        output,
        "  Playable:   {} ({:.1}%)",
        result.playable,
        result.playable_rate * 100.0
    );
    let _ = writeln!(output, "  Exhausted:  {}", result.exhausted);
    let _ = writeln!(output, "  Failed:     {}", result.failed);
    let _ = writeln!(
        output,
        "  Unreachable: {:.2}% avg, {:.2}% max",
        result.avg_unreachable * 100.0,
        result.max_unreachable * 100.0
    );
    let _ = writeln!(output, "  Isolated buildings: {}", result.isolated_buildings);
    if let Some(error) = &result.first_error {
        let _ = writeln!(output, "\nFirst error: {error}");
    }

    output
}
