//! Breadth-first reachability checks over passable cells.

use std::collections::VecDeque;

use crate::block::{Block, BlockKind};
use crate::map::{Direction, Map, Position};

/// Unreachable passable cells must stay under this share of all passable
/// cells, as a fraction of 1.
pub const MAX_UNREACHABLE_RATIO: f64 = 0.10;

/// Summary of a reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachabilityReport {
    /// Non-mountain cells on the map.
    pub passable: usize,
    /// Passable cells reached from the start cell.
    pub reached: usize,
    /// Castles and kings that could not be reached.
    pub isolated_buildings: usize,
}

impl ReachabilityReport {
    /// Passable cells that were not reached.
    #[must_use]
    pub const fn unreachable(&self) -> usize {
        self.passable - self.reached
    }

    /// Unreachable share of passable cells.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn unreachable_ratio(&self) -> f64 {
        if self.passable == 0 {
            return 0.0;
        }
        self.unreachable() as f64 / self.passable as f64
    }

    /// Every building is connected and unreachable cells stay under
    /// [`MAX_UNREACHABLE_RATIO`].
    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.isolated_buildings == 0 && self.unreachable_ratio() < MAX_UNREACHABLE_RATIO
    }
}

/// Cells reachable from `start` by orthogonal steps over non-mountain cells.
#[must_use]
pub fn reachable_from(map: &Map, start: Position) -> Vec<bool> {
    let size = map.size();
    let mut seen = vec![false; size.area()];
    let Some(start_idx) = size.index(start) else {
        return seen;
    };
    if map.blocks()[start_idx] == Block::Mountain {
        return seen;
    }

    let mut queue = VecDeque::from([start]);
    seen[start_idx] = true;
    while let Some(pos) = queue.pop_front() {
        for direction in Direction::ALL {
            let Some(next) = pos.step(direction) else {
                continue;
            };
            let Some(idx) = size.index(next) else {
                continue;
            };
            if !seen[idx] && map.blocks()[idx] != Block::Mountain {
                seen[idx] = true;
                queue.push_back(next);
            }
        }
    }
    seen
}

/// Check that every castle and king is reachable from the first castle
/// (or the first king when there are no castles).
#[must_use]
pub fn check_reachability(map: &Map) -> ReachabilityReport {
    let passable = map.blocks().iter().filter(|b| **b != Block::Mountain).count();
    let start = map
        .positions_of(BlockKind::Castle)
        .next()
        .or_else(|| map.positions_of(BlockKind::King).next());

    let Some(start) = start else {
        return ReachabilityReport {
            passable,
            reached: passable,
            isolated_buildings: 0,
        };
    };

    let seen = reachable_from(map, start);
    let reached = seen.iter().filter(|&&s| s).count();
    let isolated_buildings = map
        .blocks()
        .iter()
        .zip(&seen)
        .filter(|(block, seen)| block.is_building() && !**seen)
        .count();

    ReachabilityReport {
        passable,
        reached,
        isolated_buildings,
    }
}
