//! Procedural map generation.
//!
//! Terrain comes from a 4-octave Perlin fBm field. Every candidate layout is
//! checked for reachability before it is accepted; a generator that runs
//! out of attempts fails instead of returning an unplayable map.

// Map generation uses intentional casts for densities and troop counts
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

mod layout;
mod noise;
mod reachability;
mod registry;

pub use layout::start_positions;
pub use reachability::{check_reachability, reachable_from, ReachabilityReport, MAX_UNREACHABLE_RATIO};
pub use registry::GeneratorRegistry;

use std::fmt;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::block::{Block, BlockKind, BlockRegistry, Owner};
use crate::error::{GenerateError, MapError};
use crate::map::{Direction, Map, MapInfo, Position, Size};
use noise::{quantile, Fbm, Perlin};

/// Smallest accepted side length.
pub const MIN_SIDE: u16 = 5;

/// Cells required per active player.
pub const CELLS_PER_PLAYER: usize = 5;

/// Base troop count of a generated neutral castle; a random `0..20` is added.
pub const CASTLE_BASE_TROOPS: u32 = 10;

/// How many times wider than `castle_density` the castle noise band is.
const CASTLE_BAND_FACTOR: f64 = 4.0;

/// A player seat offered to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    /// Seat index in join order.
    pub index: usize,
    /// Owner id the seat's blocks carry.
    pub owner: Owner,
    /// Inactive seats get no start position.
    pub active: bool,
}

impl PlayerSlot {
    /// Active seats for owners `1..=count`.
    #[must_use]
    pub fn active_seats(count: usize) -> Vec<Self> {
        (0..count)
            .map(|index| Self {
                index,
                owner: Owner::try_from(index + 1).unwrap_or(Owner::MAX),
                active: true,
            })
            .collect()
    }
}

/// Generation tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Target share of cells that become mountains, in `[0, 1)`.
    pub mountain_density: f64,
    /// Target share of cells that become neutral castles, in `[0, 1)`.
    pub castle_density: f64,
    /// Minimum Manhattan distance between two castles.
    pub min_castle_distance: u32,
    /// RNG seed.
    pub seed: u64,
    /// Layouts tried before giving up.
    pub max_attempts: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            mountain_density: 0.2,
            castle_density: 0.04,
            min_castle_distance: 3,
            seed: 0,
            max_attempts: 32,
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> Result<(), GenerateError> {
        for (name, value) in [
            ("mountain", self.mountain_density),
            ("castle", self.castle_density),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(GenerateError::InvalidDensity {
                    name,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A named strategy for producing maps.
pub trait MapGenerator: Send + Sync + fmt::Debug {
    /// Name the generator is registered under.
    fn name(&self) -> &str;

    /// Produce a populated map for `players`.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerateError`] when the inputs are unusable or no
    /// playable layout was found.
    fn generate(
        &self,
        size: Size,
        players: &[PlayerSlot],
        config: &GeneratorConfig,
    ) -> Result<Map, GenerateError>;
}

/// Perlin-noise terrain generator with reachability validation.
#[derive(Debug, Clone, Copy)]
pub struct PerlinGenerator {
    king: BlockKind,
    soldier: BlockKind,
    castle: BlockKind,
    mountain: BlockKind,
}

impl PerlinGenerator {
    /// Registry name.
    pub const NAME: &'static str = "perlin";

    /// Resolve the block kinds this generator places.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnknownBlock`] if `blocks` lacks a required kind.
    pub fn new(blocks: &BlockRegistry) -> Result<Self, MapError> {
        let lookup = |name: &str| {
            blocks
                .kind(name)
                .ok_or_else(|| MapError::UnknownBlock(name.to_string()))
        };
        Ok(Self {
            king: lookup("king")?,
            soldier: lookup("soldier")?,
            castle: lookup("castle")?,
            mountain: lookup("mountain")?,
        })
    }

    /// Place kings and their escort soldiers.
    fn place_starts(
        &self,
        cells: &mut [Option<Block>],
        size: Size,
        players: &[PlayerSlot],
    ) -> Result<(), GenerateError> {
        let active: Vec<_> = players.iter().filter(|slot| slot.active).collect();
        let starts = start_positions(size, active.len());

        for (slot, &pos) in active.iter().zip(&starts) {
            let idx = size.index(pos).ok_or(GenerateError::OverlappingStart(pos))?;
            if matches!(cells[idx], Some(Block::King { .. })) {
                return Err(GenerateError::OverlappingStart(pos));
            }
            cells[idx] = Some(BlockRegistry::create(self.king, 1, slot.owner));
        }

        for (slot, &pos) in active.iter().zip(&starts) {
            for direction in Direction::ALL {
                let Some(idx) = pos.step(direction).and_then(|n| size.index(n)) else {
                    continue;
                };
                if cells[idx].is_none() {
                    cells[idx] = Some(BlockRegistry::create(self.soldier, 1, slot.owner));
                }
            }
        }
        Ok(())
    }

    /// Fill unoccupied cells with mountains and castles from one noise field.
    fn place_terrain(
        &self,
        cells: &mut [Option<Block>],
        size: Size,
        config: &GeneratorConfig,
        rng: &mut ChaCha8Rng,
    ) {
        let perlin = Perlin::new(rng);
        let field = Fbm::default().field(&perlin, size);

        let free: Vec<f64> = field
            .iter()
            .zip(cells.iter())
            .filter(|(_, cell)| cell.is_none())
            .map(|(value, _)| *value)
            .collect();
        let band = (config.castle_density * CASTLE_BAND_FACTOR).min(1.0 - config.mountain_density);
        let mountain_at = if config.mountain_density > 0.0 {
            quantile(&free, 1.0 - config.mountain_density)
        } else {
            f64::INFINITY
        };
        let castle_at = quantile(&free, 1.0 - config.mountain_density - band);
        let target_castles = (config.castle_density * size.area() as f64).round() as usize;

        let mut order: Vec<usize> = (0..cells.len()).collect();
        order.shuffle(rng);

        let mut castles: Vec<Position> = Vec::with_capacity(target_castles);
        for idx in order {
            if cells[idx].is_some() {
                continue;
            }
            let value = field[idx];
            if value >= mountain_at {
                cells[idx] = Some(BlockRegistry::create(self.mountain, 0, 0));
            } else if value >= castle_at && castles.len() < target_castles {
                let pos = size.position(idx);
                if castles
                    .iter()
                    .all(|c| c.manhattan(pos) >= config.min_castle_distance)
                {
                    let troops = CASTLE_BASE_TROOPS + rng.gen_range(0..20);
                    cells[idx] = Some(BlockRegistry::create(self.castle, troops, 0));
                    castles.push(pos);
                }
            }
        }
    }
}

impl MapGenerator for PerlinGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate(
        &self,
        size: Size,
        players: &[PlayerSlot],
        config: &GeneratorConfig,
    ) -> Result<Map, GenerateError> {
        config.validate()?;
        let active = players.iter().filter(|slot| slot.active).count();
        if active == 0 {
            return Err(GenerateError::NoPlayers);
        }
        if size.width < MIN_SIDE || size.height < MIN_SIDE || size.area() < active * CELLS_PER_PLAYER {
            return Err(GenerateError::TooSmall {
                width: size.width,
                height: size.height,
                players: active,
            });
        }

        let mut starts = vec![None; size.area()];
        self.place_starts(&mut starts, size, players)?;

        let info = MapInfo::new(
            format!("{}:{}x{}:seed={}", Self::NAME, size.width, size.height, config.seed),
            format!("Perlin {}x{}", size.width, size.height),
            format!("{active} players"),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        for attempt in 1..=config.max_attempts {
            let mut cells = starts.clone();
            self.place_terrain(&mut cells, size, config, &mut rng);

            let rows = cells
                .chunks(usize::from(size.width))
                .map(|row| row.iter().map(|cell| cell.unwrap_or_default()).collect())
                .collect();
            let map = Map::from_rows(info.clone(), rows).map_err(|_| GenerateError::TooSmall {
                width: size.width,
                height: size.height,
                players: active,
            })?;

            let report = check_reachability(&map);
            if report.is_playable() {
                debug!(attempt, unreachable = report.unreachable(), "map.generate.accepted");
                return Ok(map);
            }
            debug!(
                attempt,
                isolated = report.isolated_buildings,
                unreachable = report.unreachable(),
                "map.generate.rejected"
            );
        }

        warn!(
            attempts = config.max_attempts,
            width = size.width,
            height = size.height,
            "map.generate.exhausted"
        );
        Err(GenerateError::Unreachable {
            attempts: config.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> PerlinGenerator {
        PerlinGenerator::new(&BlockRegistry::with_defaults()).unwrap()
    }

    fn generate(seed: u64, size: Size, players: usize) -> Result<Map, GenerateError> {
        let config = GeneratorConfig {
            seed,
            ..GeneratorConfig::default()
        };
        generator().generate(size, &PlayerSlot::active_seats(players), &config)
    }

    #[test]
    fn test_generation_determinism() {
        let a = generate(42, Size::new(24, 24), 2).unwrap();
        let b = generate(42, Size::new(24, 24), 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generation_different_seeds() {
        let a = generate(1, Size::new(24, 24), 2).unwrap();
        let b = generate(2, Size::new(24, 24), 2).unwrap();
        assert_ne!(a.blocks(), b.blocks());
    }

    #[test]
    fn test_kings_and_escorts_placed() {
        let map = generate(7, Size::new(30, 30), 4).unwrap();
        for owner in 1..=4 {
            let king = map.king_position(owner).unwrap();
            assert_eq!(map.block(king).unwrap().num(), 1);
            let escorts = Direction::ALL
                .iter()
                .filter_map(|&d| king.step(d))
                .filter(|&p| map.block(p).is_ok_and(|b| *b == Block::soldier(1, owner)))
                .count();
            assert_eq!(escorts, 4, "owner {owner}");
        }
    }

    #[test]
    fn test_generated_maps_are_playable() {
        for seed in 0..20 {
            let map = generate(seed, Size::new(24, 20), 3).unwrap();
            let report = check_reachability(&map);
            assert!(report.is_playable(), "seed {seed}: {report:?}");
        }
    }

    #[test]
    fn test_castles_respect_distance_and_troops() {
        let map = generate(11, Size::new(40, 40), 2).unwrap();
        let castles: Vec<_> = map.positions_of(BlockKind::Castle).collect();
        assert!(!castles.is_empty());
        for (i, a) in castles.iter().enumerate() {
            let troops = map.block(*a).unwrap().num();
            assert!((10..30).contains(&troops));
            assert_eq!(map.block(*a).unwrap().owner(), 0);
            for b in &castles[i + 1..] {
                assert!(a.manhattan(*b) >= 3);
            }
        }
    }

    #[test]
    fn test_too_small_rejected() {
        assert!(matches!(
            generate(0, Size::new(4, 20), 2),
            Err(GenerateError::TooSmall { .. })
        ));
        assert!(matches!(
            generate(0, Size::new(5, 5), 6),
            Err(GenerateError::TooSmall { .. })
        ));
    }

    #[test]
    fn test_inactive_seats_skipped() {
        let mut seats = PlayerSlot::active_seats(3);
        seats[1].active = false;
        let map = generator()
            .generate(Size::new(20, 20), &seats, &GeneratorConfig::default())
            .unwrap();
        assert!(map.king_position(1).is_some());
        assert!(map.king_position(2).is_none());
        assert!(map.king_position(3).is_some());
    }

    #[test]
    fn test_no_players_rejected() {
        assert_eq!(
            generator().generate(Size::new(20, 20), &[], &GeneratorConfig::default()),
            Err(GenerateError::NoPlayers)
        );
    }

    #[test]
    fn test_invalid_density_rejected() {
        let config = GeneratorConfig {
            mountain_density: 1.0,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            generator().generate(Size::new(20, 20), &PlayerSlot::active_seats(2), &config),
            Err(GenerateError::InvalidDensity { name: "mountain", .. })
        ));
    }

    #[test]
    fn test_exhausted_budget_fails_loudly() {
        let config = GeneratorConfig {
            mountain_density: 0.95,
            castle_density: 0.0,
            max_attempts: 3,
            ..GeneratorConfig::default()
        };
        assert_eq!(
            generator().generate(Size::new(20, 20), &PlayerSlot::active_seats(2), &config),
            Err(GenerateError::Unreachable { attempts: 3 })
        );
    }

    #[test]
    fn test_every_cell_filled() {
        let map = generate(5, Size::new(16, 16), 2).unwrap();
        assert_eq!(map.blocks().len(), 256);
        let kings = map.positions_of(BlockKind::King).count();
        assert_eq!(kings, 2);
    }
}
