//! The game map: a fixed-size grid of blocks.
//!
//! Positions are 1-indexed. Cells are stored row-major, so the block at
//! `(x, y)` lives at index `(y - 1) * width + (x - 1)`.

mod export;
mod position;
mod render;
mod sight;

pub use export::{BlockExport, MapExport, MetaExport};
pub use position::{Direction, Position};
pub use render::render_ascii;
pub use sight::Sight;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockKind, Num, Owner, NEUTRAL};
use crate::error::{MapError, MapResult};

/// Map dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    /// Number of columns.
    pub width: u16,
    /// Number of rows.
    pub height: u16,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Number of cells.
    #[must_use]
    pub const fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether `pos` lies on a grid of this size.
    #[must_use]
    pub const fn contains(self, pos: Position) -> bool {
        pos.x >= 1 && pos.y >= 1 && pos.x <= self.width && pos.y <= self.height
    }

    /// Row-major index of `pos`, if in bounds.
    #[must_use]
    pub fn index(self, pos: Position) -> Option<usize> {
        self.contains(pos).then(|| {
            usize::from(pos.y - 1) * usize::from(self.width) + usize::from(pos.x - 1)
        })
    }

    /// Position of row-major index `idx`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn position(self, idx: usize) -> Position {
        let width = usize::from(self.width);
        Position::new((idx % width) as u16 + 1, (idx / width) as u16 + 1)
    }

    /// Every position in row-major order.
    pub fn positions(self) -> impl Iterator<Item = Position> {
        (1..=self.height).flat_map(move |y| (1..=self.width).map(move |x| Position::new(x, y)))
    }
}

/// Identity and description of a map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInfo {
    /// Identifier the map was resolved from.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub desc: String,
}

impl MapInfo {
    /// Create map info.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            desc: desc.into(),
        }
    }
}

/// Result of a successful move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Source cell.
    pub from: Position,
    /// Target cell.
    pub to: Position,
    /// Troops that left the source.
    pub moved: Num,
    /// The target changed hands to the mover.
    pub captured: bool,
}

/// The game map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    size: Size,
    info: MapInfo,
    blocks: Vec<Block>,
}

impl Map {
    /// Create a map filled with blank cells.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidSize`] if either dimension is zero.
    pub fn new(size: Size, info: MapInfo) -> MapResult<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(MapError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }
        Ok(Self {
            size,
            info,
            blocks: vec![Block::Blank; size.area()],
        })
    }

    /// Create a map from rows of blocks (outer index is `y`).
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Malformed`] for ragged rows or dimensions that do
    /// not fit in `u16`, and [`MapError::InvalidSize`] for an empty grid.
    pub fn from_rows(info: MapInfo, rows: Vec<Vec<Block>>) -> MapResult<Self> {
        let height = u16::try_from(rows.len())
            .map_err(|_| MapError::Malformed(format!("{} rows exceed the limit", rows.len())))?;
        let width = rows.first().map_or(0, Vec::len);
        let width = u16::try_from(width)
            .map_err(|_| MapError::Malformed(format!("{width} columns exceed the limit")))?;
        if let Some((y, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != usize::from(width))
        {
            return Err(MapError::Malformed(format!(
                "row {} has {} cells, expected {width}",
                y + 1,
                row.len()
            )));
        }

        let mut map = Self::new(Size::new(width, height), info)?;
        map.blocks = rows.into_iter().flatten().collect();
        Ok(map)
    }

    /// Map dimensions.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Map width.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.size.width
    }

    /// Map height.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.size.height
    }

    /// Identity metadata.
    #[must_use]
    pub const fn info(&self) -> &MapInfo {
        &self.info
    }

    /// Replace the identity metadata.
    pub fn set_info(&mut self, info: MapInfo) {
        self.info = info;
    }

    /// Whether `pos` lies on this map.
    #[must_use]
    pub const fn in_bounds(&self, pos: Position) -> bool {
        self.size.contains(pos)
    }

    /// Block at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::OutOfBounds`] if `pos` is off the grid.
    pub fn block(&self, pos: Position) -> MapResult<&Block> {
        self.size
            .index(pos)
            .map(|idx| &self.blocks[idx])
            .ok_or(MapError::OutOfBounds(pos))
    }

    /// Mutable block at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::OutOfBounds`] if `pos` is off the grid.
    pub fn block_mut(&mut self, pos: Position) -> MapResult<&mut Block> {
        match self.size.index(pos) {
            Some(idx) => Ok(&mut self.blocks[idx]),
            None => Err(MapError::OutOfBounds(pos)),
        }
    }

    /// Replace the block at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::OutOfBounds`] if `pos` is off the grid.
    pub fn set_block(&mut self, pos: Position, block: Block) -> MapResult<()> {
        *self.block_mut(pos)? = block;
        Ok(())
    }

    /// Raw blocks in row-major order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Every position with its block, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Block)> {
        let size = self.size;
        self.blocks
            .iter()
            .enumerate()
            .map(move |(idx, block)| (size.position(idx), block))
    }

    /// Run every block's start-of-turn hook.
    pub fn round_start(&mut self, turn: u32) {
        for block in &mut self.blocks {
            block.round_start(turn);
        }
    }

    /// Run every block's end-of-turn hook.
    pub fn round_end(&mut self, turn: u32) {
        for block in &mut self.blocks {
            block.round_end(turn);
        }
    }

    /// Mask every cell in place for an observer owning `owners`.
    ///
    /// Callers that still need the real map must clone first, or use
    /// [`Map::fogged`].
    ///
    /// # Errors
    ///
    /// Returns [`MapError::DimensionMismatch`] if `sight` has a different size.
    pub fn fog(&mut self, owners: &BTreeSet<Owner>, sight: &Sight) -> MapResult<()> {
        if sight.size() != self.size {
            return Err(MapError::DimensionMismatch {
                width: self.size.width,
                height: self.size.height,
                actual_width: sight.size().width,
                actual_height: sight.size().height,
            });
        }
        let size = self.size;
        for (idx, block) in self.blocks.iter_mut().enumerate() {
            let is_owner = block.owner() != NEUTRAL && owners.contains(&block.owner());
            *block = block.fog(is_owner, sight.get(size.position(idx)));
        }
        Ok(())
    }

    /// Fogged copy of this map.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::DimensionMismatch`] if `sight` has a different size.
    pub fn fogged(&self, owners: &BTreeSet<Owner>, sight: &Sight) -> MapResult<Self> {
        let mut view = self.clone();
        view.fog(owners, sight)?;
        Ok(view)
    }

    /// Cells visible to `owners`: every owned cell and its eight neighbours.
    #[must_use]
    pub fn sight(&self, owners: &BTreeSet<Owner>) -> Sight {
        let mut sight = Sight::new(self.size);
        for (pos, block) in self.iter() {
            if block.owner() != NEUTRAL && owners.contains(&block.owner()) {
                sight.reveal_around(pos);
            }
        }
        sight
    }

    /// Move `amount` troops from `from` one step towards `towards`.
    ///
    /// `amount == 0` moves everything but the garrison; `amount == Num::MAX`
    /// moves half. The map does not check who issued the move.
    ///
    /// # Errors
    ///
    /// - [`MapError::InvalidPosition`] if either end is off the grid
    /// - [`MapError::InsufficientTroops`] if the source holds fewer than
    ///   `amount` troops, or the resolved amount is zero
    /// - [`MapError::MoveNotAllowed`] if either block refuses the move
    pub fn move_troops(
        &mut self,
        from: Position,
        towards: Direction,
        amount: Num,
    ) -> MapResult<MoveOutcome> {
        let to = from.step(towards).ok_or(MapError::InvalidPosition(from))?;
        let from_idx = self.size.index(from).ok_or(MapError::InvalidPosition(from))?;
        let to_idx = self.size.index(to).ok_or(MapError::InvalidPosition(to))?;

        let source = self.blocks[from_idx];
        let available = source.num();
        let requested = match amount {
            0 => available.saturating_sub(source.garrison()),
            Num::MAX => available / 2,
            n => n,
        };
        if available < requested || requested == 0 {
            return Err(MapError::InsufficientTroops {
                requested,
                available,
            });
        }

        if !source.allow_move().from || !self.blocks[to_idx].allow_move().to {
            return Err(MapError::MoveNotAllowed { from, to });
        }

        let mover = source.owner();
        let moved = self.blocks[from_idx].move_from(requested);
        let target_owner = self.blocks[to_idx].owner();
        if let Some(replacement) = self.blocks[to_idx].move_to(moved, mover) {
            self.blocks[to_idx] = replacement;
        }
        let captured = target_owner != mover && self.blocks[to_idx].owner() == mover;

        Ok(MoveOutcome {
            from,
            to,
            moved,
            captured,
        })
    }

    /// Cells owned by `owner`.
    pub fn owned_cells(&self, owner: Owner) -> impl Iterator<Item = (Position, &Block)> {
        self.iter().filter(move |(_, block)| block.owner() == owner)
    }

    /// Whether `owner` holds at least one cell.
    #[must_use]
    pub fn holds_territory(&self, owner: Owner) -> bool {
        owner != NEUTRAL && self.blocks.iter().any(|block| block.owner() == owner)
    }

    /// Total troops owned by `owner`.
    #[must_use]
    pub fn troops(&self, owner: Owner) -> u64 {
        self.owned_cells(owner)
            .map(|(_, block)| u64::from(block.num()))
            .sum()
    }

    /// Position of `owner`'s king, if it still stands.
    #[must_use]
    pub fn king_position(&self, owner: Owner) -> Option<Position> {
        self.iter().find_map(|(pos, block)| match block {
            Block::King {
                owner: current,
                original_owner,
                ..
            } if *current == owner && *original_owner == owner => Some(pos),
            _ => None,
        })
    }

    /// Whether `owner` still owns a king.
    #[must_use]
    pub fn has_king(&self, owner: Owner) -> bool {
        owner != NEUTRAL
            && self
                .blocks
                .iter()
                .any(|block| matches!(block, Block::King { owner: o, .. } if *o == owner))
    }

    /// Positions of every block of `kind`.
    pub fn positions_of(&self, kind: BlockKind) -> impl Iterator<Item = Position> + '_ {
        self.iter()
            .filter(move |(_, block)| block.kind() == kind)
            .map(|(pos, _)| pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(blocks: Vec<Block>) -> Map {
        Map::from_rows(MapInfo::default(), vec![blocks]).unwrap()
    }

    #[test]
    fn test_map_zero_size() {
        assert!(Map::new(Size::new(0, 4), MapInfo::default()).is_err());
        assert!(Map::new(Size::new(4, 0), MapInfo::default()).is_err());
    }

    #[test]
    fn test_block_bounds() {
        let mut map = Map::new(Size::new(3, 2), MapInfo::default()).unwrap();
        assert!(map.block(Position::new(1, 1)).is_ok());
        assert!(map.block(Position::new(3, 2)).is_ok());
        assert_eq!(
            map.block(Position::new(0, 1)),
            Err(MapError::OutOfBounds(Position::new(0, 1)))
        );
        assert!(map.set_block(Position::new(4, 1), Block::Mountain).is_err());
        map.set_block(Position::new(2, 2), Block::Mountain).unwrap();
        assert_eq!(map.block(Position::new(2, 2)), Ok(&Block::Mountain));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![Block::Blank; 3], vec![Block::Blank; 2]];
        assert!(matches!(
            Map::from_rows(MapInfo::default(), rows),
            Err(MapError::Malformed(_))
        ));
    }

    #[test]
    fn test_move_right_into_blank() {
        let mut map = strip(vec![Block::soldier(10, 1), Block::Blank, Block::Blank]);
        let outcome = map.move_troops(Position::new(1, 1), Direction::Right, 5).unwrap();
        assert_eq!(outcome.moved, 5);
        assert!(outcome.captured);
        assert_eq!(map.block(Position::new(1, 1)), Ok(&Block::soldier(5, 1)));
        assert_eq!(map.block(Position::new(2, 1)), Ok(&Block::soldier(5, 1)));
        assert_eq!(map.block(Position::new(3, 1)), Ok(&Block::Blank));
    }

    #[test]
    fn test_move_all_sentinel() {
        let mut map = strip(vec![Block::soldier(10, 1), Block::Blank]);
        let outcome = map.move_troops(Position::new(1, 1), Direction::Right, 0).unwrap();
        assert_eq!(outcome.moved, 9);
        assert_eq!(map.block(Position::new(1, 1)).unwrap().num(), 1);
        assert_eq!(map.block(Position::new(2, 1)).unwrap().num(), 9);
    }

    #[test]
    fn test_move_half_sentinel() {
        let mut map = strip(vec![Block::castle(11, 1), Block::soldier(2, 1)]);
        let outcome = map
            .move_troops(Position::new(1, 1), Direction::Right, Num::MAX)
            .unwrap();
        assert_eq!(outcome.moved, 5);
        assert!(!outcome.captured);
        assert_eq!(map.block(Position::new(1, 1)).unwrap().num(), 6);
        assert_eq!(map.block(Position::new(2, 1)).unwrap().num(), 7);
    }

    #[test]
    fn test_move_off_grid() {
        let mut map = strip(vec![Block::soldier(10, 1), Block::Blank]);
        assert_eq!(
            map.move_troops(Position::new(1, 1), Direction::Left, 3),
            Err(MapError::InvalidPosition(Position::new(0, 1)))
        );
        assert_eq!(
            map.move_troops(Position::new(1, 1), Direction::Up, 3),
            Err(MapError::InvalidPosition(Position::new(1, 0)))
        );
        assert_eq!(
            map.move_troops(Position::new(5, 1), Direction::Left, 3),
            Err(MapError::InvalidPosition(Position::new(5, 1)))
        );
    }

    #[test]
    fn test_move_insufficient() {
        let mut map = strip(vec![Block::soldier(3, 1), Block::Blank]);
        assert_eq!(
            map.move_troops(Position::new(1, 1), Direction::Right, 4),
            Err(MapError::InsufficientTroops {
                requested: 4,
                available: 3
            })
        );
        let mut lone = strip(vec![Block::soldier(1, 1), Block::Blank]);
        assert!(matches!(
            lone.move_troops(Position::new(1, 1), Direction::Right, 0),
            Err(MapError::InsufficientTroops { requested: 0, .. })
        ));
        assert_eq!(lone.block(Position::new(2, 1)), Ok(&Block::Blank));
    }

    #[test]
    fn test_move_into_mountain_rejected() {
        let mut map = strip(vec![Block::soldier(5, 1), Block::Mountain]);
        assert!(matches!(
            map.move_troops(Position::new(1, 1), Direction::Right, 2),
            Err(MapError::MoveNotAllowed { .. })
        ));
        assert_eq!(map.block(Position::new(1, 1)).unwrap().num(), 5);
    }

    #[test]
    fn test_move_captures_king() {
        let mut map = strip(vec![Block::soldier(9, 2), Block::king(3, 1)]);
        let outcome = map.move_troops(Position::new(1, 1), Direction::Right, 5).unwrap();
        assert!(outcome.captured);
        assert_eq!(map.block(Position::new(2, 1)), Ok(&Block::castle(2, 2)));
        assert_eq!(map.king_position(1), None);
    }

    #[test]
    fn test_round_hooks_touch_every_cell() {
        let mut map = strip(vec![Block::castle(1, 1), Block::king(1, 2), Block::castle(1, 0)]);
        map.round_start(2);
        map.round_end(2);
        let nums: Vec<_> = map.blocks().iter().map(Block::num).collect();
        assert_eq!(nums, vec![2, 2, 1]);
    }

    #[test]
    fn test_fog_masks_unseen_enemy() {
        let mut map = Map::new(Size::new(5, 1), MapInfo::default()).unwrap();
        map.set_block(Position::new(1, 1), Block::king(4, 1)).unwrap();
        map.set_block(Position::new(3, 1), Block::Mountain).unwrap();
        map.set_block(Position::new(5, 1), Block::king(8, 2)).unwrap();

        let owners = BTreeSet::from([1]);
        let sight = map.sight(&owners);
        let view = map.fogged(&owners, &sight).unwrap();

        assert_eq!(view.block(Position::new(1, 1)), Ok(&Block::king(4, 1)));
        assert_eq!(view.block(Position::new(3, 1)), Ok(&Block::Mountain));
        assert_eq!(view.block(Position::new(5, 1)), Ok(&Block::Blank));
        assert_eq!(map.block(Position::new(5, 1)), Ok(&Block::king(8, 2)));
    }

    #[test]
    fn test_fog_dimension_mismatch() {
        let mut map = Map::new(Size::new(3, 3), MapInfo::default()).unwrap();
        let sight = Sight::new(Size::new(2, 3));
        assert!(matches!(
            map.fog(&BTreeSet::new(), &sight),
            Err(MapError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_territory_queries() {
        let map = strip(vec![Block::king(3, 1), Block::soldier(4, 1), Block::castle(9, 0)]);
        assert!(map.holds_territory(1));
        assert!(!map.holds_territory(2));
        assert!(!map.holds_territory(NEUTRAL));
        assert_eq!(map.troops(1), 7);
        assert_eq!(map.king_position(1), Some(Position::new(1, 1)));
        assert!(map.has_king(1));
        assert!(!map.has_king(2));
        assert_eq!(map.positions_of(BlockKind::Castle).count(), 1);
    }

    #[test]
    fn test_size_index_roundtrip() {
        let size = Size::new(7, 3);
        for (idx, pos) in size.positions().enumerate() {
            assert_eq!(size.index(pos), Some(idx));
            assert_eq!(size.position(idx), pos);
        }
    }
}
