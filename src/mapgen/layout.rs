//! Symmetric start positions for players.

// Layout math converts between grid coordinates and floats
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use crate::map::{Position, Size};

/// Fractional layouts for the common player counts.
const LAYOUT_2: [(f64, f64); 2] = [(0.2, 0.2), (0.8, 0.8)];
const LAYOUT_3: [(f64, f64); 3] = [(0.5, 0.15), (0.15, 0.85), (0.85, 0.85)];
const LAYOUT_4: [(f64, f64); 4] = [(0.2, 0.2), (0.8, 0.2), (0.2, 0.8), (0.8, 0.8)];

/// Start positions for `count` players on a grid of `size`.
///
/// Two to four players use fixed layouts; any other count is spread on a
/// circle of radius `min(width, height) / 3` around the centre.
#[must_use]
pub fn start_positions(size: Size, count: usize) -> Vec<Position> {
    let fixed: &[(f64, f64)] = match count {
        2 => &LAYOUT_2,
        3 => &LAYOUT_3,
        4 => &LAYOUT_4,
        _ => return radial(size, count),
    };
    fixed
        .iter()
        .map(|&(fx, fy)| {
            Position::new(
                scale(fx, size.width),
                scale(fy, size.height),
            )
        })
        .collect()
}

/// Map a fraction of an axis onto `1..=len`.
fn scale(fraction: f64, len: u16) -> u16 {
    let span = f64::from(len.saturating_sub(1));
    1 + (fraction * span).round() as u16
}

fn radial(size: Size, count: usize) -> Vec<Position> {
    let cx = (f64::from(size.width) + 1.0) / 2.0;
    let cy = (f64::from(size.height) + 1.0) / 2.0;
    let radius = f64::from(size.width.min(size.height)) / 3.0;
    (0..count)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / count as f64;
            let x = (cx + radius * angle.cos()).round().clamp(1.0, f64::from(size.width));
            let y = (cy + radius * angle.sin()).round().clamp(1.0, f64::from(size.height));
            Position::new(x as u16, y as u16)
        })
        .collect()
}
