//! Grid coordinates and move directions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 1-indexed cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Column, `1..=width`.
    pub x: u16,
    /// Row, `1..=height`.
    pub y: u16,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// The neighbouring position one step towards `direction`.
    ///
    /// Returns `None` when the step leaves the representable range; the
    /// result may still be outside any particular map.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.offset();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Self::new(x, y))
    }

    /// Manhattan distance to `other`.
    #[must_use]
    pub fn manhattan(self, other: Self) -> u32 {
        u32::from(self.x.abs_diff(other.x)) + u32::from(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four orthogonal move directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards row 1.
    Up,
    /// Towards the last row.
    Down,
    /// Towards column 1.
    Left,
    /// Towards the last column.
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit `(dx, dy)` offset.
    #[must_use]
    pub const fn offset(self) -> (i16, i16) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            "left" | "l" => Ok(Direction::Left),
            "right" | "r" => Ok(Direction::Right),
            other => Err(format!("unknown direction `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_offsets() {
        let pos = Position::new(3, 3);
        assert_eq!(pos.step(Direction::Up), Some(Position::new(3, 2)));
        assert_eq!(pos.step(Direction::Down), Some(Position::new(3, 4)));
        assert_eq!(pos.step(Direction::Left), Some(Position::new(2, 3)));
        assert_eq!(pos.step(Direction::Right), Some(Position::new(4, 3)));
    }

    #[test]
    fn test_step_underflow() {
        assert_eq!(Position::new(0, 1).step(Direction::Left), None);
        assert_eq!(Position::new(1, 1).step(Direction::Left), Some(Position::new(0, 1)));
        assert_eq!(Position::new(1, u16::MAX).step(Direction::Down), None);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("Up".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("r".parse::<Direction>(), Ok(Direction::Right));
        assert!("north".parse::<Direction>().is_err());
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(Position::new(1, 1).manhattan(Position::new(4, 5)), 7);
    }
}
