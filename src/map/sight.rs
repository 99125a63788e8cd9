//! Per-cell visibility grids.

use super::{Position, Size};

/// Boolean grid marking the cells an observer can currently see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sight {
    size: Size,
    cells: Vec<bool>,
}

impl Sight {
    /// Grid with nothing in sight.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            cells: vec![false; size.area()],
        }
    }

    /// Grid with every cell in sight.
    #[must_use]
    pub fn full(size: Size) -> Self {
        Self {
            size,
            cells: vec![true; size.area()],
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Whether `pos` is in sight. Out-of-bounds cells never are.
    #[must_use]
    pub fn get(&self, pos: Position) -> bool {
        self.size.index(pos).is_some_and(|idx| self.cells[idx])
    }

    /// Mark `pos`. Out-of-bounds positions are ignored.
    pub fn set(&mut self, pos: Position, visible: bool) {
        if let Some(idx) = self.size.index(pos) {
            self.cells[idx] = visible;
        }
    }

    /// Mark `pos` and its eight neighbours.
    pub fn reveal_around(&mut self, pos: Position) {
        for dy in -1i16..=1 {
            for dx in -1i16..=1 {
                if let (Some(x), Some(y)) = (pos.x.checked_add_signed(dx), pos.y.checked_add_signed(dy)) {
                    self.set(Position::new(x, y), true);
                }
            }
        }
    }

    /// Number of visible cells.
    #[must_use]
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&v| v).count()
    }
}
