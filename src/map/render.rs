//! ASCII renderer for terminal viewing with ANSI colors.

use std::fmt::Write as _;

use super::Map;
use crate::block::{Block, Owner, NEUTRAL};

/// ANSI color codes for owners 1-8.
const OWNER_COLORS: [&str; 8] = [
    "\x1b[31m", // Red
    "\x1b[34m", // Blue
    "\x1b[32m", // Green
    "\x1b[33m", // Yellow
    "\x1b[35m", // Magenta
    "\x1b[36m", // Cyan
    "\x1b[91m", // Bright Red
    "\x1b[94m", // Bright Blue
];

const RESET: &str = "\x1b[0m";
const GRAY: &str = "\x1b[90m";

fn owner_color(owner: Owner) -> &'static str {
    if owner == NEUTRAL {
        return GRAY;
    }
    OWNER_COLORS[usize::from(owner - 1) % OWNER_COLORS.len()]
}

/// Render a map to ASCII. With `color`, owned cells use ANSI colors.
///
/// ```text
/// ┌───────────┐
/// │ K . . ^ C │
/// │ 3 . ^ ^ . │
/// └───────────┘
/// ```
///
/// `K` king, `C` castle, `^` mountain, `.` blank, digits are soldier counts
/// (capped at 9, `+` above).
#[must_use]
pub fn render_ascii(map: &Map, color: bool) -> String {
    let width = usize::from(map.width());
    let mut output = String::new();

    output.push('┌');
    output.push_str(&"─".repeat(width * 2 + 1));
    output.push_str("┐\n");

    for row in map.blocks().chunks(width.max(1)) {
        output.push_str("│ ");
        for block in row {
            let glyph = glyph(block);
            if color {
                let _ = write!(output, "{}{glyph}{RESET} ", owner_color(block.owner()));
            } else {
                output.push(glyph);
                output.push(' ');
            }
        }
        output.push_str("│\n");
    }

    output.push('└');
    output.push_str(&"─".repeat(width * 2 + 1));
    output.push_str("┘\n");
    output
}

/// Single-character representation of a block.
#[must_use]
pub(crate) fn glyph(block: &Block) -> char {
    match block {
        Block::Blank => '.',
        Block::Mountain => '^',
        Block::Castle { .. } => 'C',
        Block::King { .. } => 'K',
        Block::Soldier { num, .. } => char::from_digit(*num, 10).unwrap_or('+'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapInfo;

    #[test]
    fn test_render_plain() {
        let rows = vec![
            vec![Block::king(1, 1), Block::soldier(3, 1), Block::Mountain],
            vec![Block::Blank, Block::castle(10, 0), Block::soldier(42, 2)],
        ];
        let map = Map::from_rows(MapInfo::default(), rows).unwrap();
        let text = render_ascii(&map, false);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "│ K 3 ^ │");
        assert_eq!(lines[2], "│ . C + │");
    }

    #[test]
    fn test_render_color_wraps_owned_cells() {
        let map = Map::from_rows(MapInfo::default(), vec![vec![Block::king(1, 2)]]).unwrap();
        let text = render_ascii(&map, true);
        assert!(text.contains("\x1b[34mK\x1b[0m"));
    }
}
