//! Coherent gradient noise for terrain placement.

// Noise sampling converts between lattice indices and floats on purpose
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use rand::seq::SliceRandom;
use rand::Rng;

use crate::map::Size;

/// 2D Perlin gradient noise with a seeded permutation table.
#[derive(Debug, Clone)]
pub(crate) struct Perlin {
    perm: [u8; 512],
}

impl Perlin {
    /// Build a permutation table by shuffling `0..=255` with `rng`.
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut base: Vec<u8> = (0..=255).collect();
        base.shuffle(rng);
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = base[i & 255];
        }
        Self { perm }
    }

    /// Noise value at `(x, y)`, roughly in `[-1, 1]`. Zero on lattice points.
    pub(crate) fn get(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let xf = x - x0;
        let yf = y - y0;
        let xi = (x0 as i64 & 255) as usize;
        let yi = (y0 as i64 & 255) as usize;

        let p = &self.perm;
        let aa = p[usize::from(p[xi]) + yi];
        let ab = p[usize::from(p[xi]) + yi + 1];
        let ba = p[usize::from(p[xi + 1]) + yi];
        let bb = p[usize::from(p[xi + 1]) + yi + 1];

        let u = fade(xf);
        let v = fade(yf);
        lerp(
            v,
            lerp(u, grad(aa, xf, yf), grad(ba, xf - 1.0, yf)),
            lerp(u, grad(ab, xf, yf - 1.0), grad(bb, xf - 1.0, yf - 1.0)),
        )
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn grad(hash: u8, x: f64, y: f64) -> f64 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

/// Fractal Brownian motion over [`Perlin`] octaves.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fbm {
    pub(crate) octaves: u32,
    pub(crate) persistence: f64,
    pub(crate) lacunarity: f64,
    pub(crate) frequency: f64,
}

impl Default for Fbm {
    fn default() -> Self {
        Self {
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            frequency: 0.125,
        }
    }
}

impl Fbm {
    /// Normalized fBm sample at `(x, y)`.
    pub(crate) fn sample(&self, perlin: &Perlin, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut norm = 0.0;
        for _ in 0..self.octaves {
            total += perlin.get(x * frequency, y * frequency) * amplitude;
            norm += amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }
        if norm > 0.0 { total / norm } else { 0.0 }
    }

    /// Sample every cell centre of a grid, row-major.
    pub(crate) fn field(&self, perlin: &Perlin, size: Size) -> Vec<f64> {
        size.positions()
            .map(|pos| self.sample(perlin, f64::from(pos.x) + 0.5, f64::from(pos.y) + 0.5))
            .collect()
    }
}

/// Value below which a `fraction` of `values` falls.
///
/// `fraction >= 1` yields `+inf`, so nothing is above it.
pub(crate) fn quantile(values: &[f64], fraction: f64) -> f64 {
    if values.is_empty() || fraction >= 1.0 {
        return f64::INFINITY;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = ((fraction.max(0.0) * sorted.len() as f64) as usize).min(sorted.len() - 1);
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_perlin_deterministic() {
        let a = Perlin::new(&mut ChaCha8Rng::seed_from_u64(7));
        let b = Perlin::new(&mut ChaCha8Rng::seed_from_u64(7));
        for i in 0..50 {
            let x = f64::from(i) * 0.37;
            assert!((a.get(x, x * 1.3) - b.get(x, x * 1.3)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_perlin_zero_on_lattice() {
        let perlin = Perlin::new(&mut ChaCha8Rng::seed_from_u64(1));
        assert!(perlin.get(3.0, 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_fbm_bounded() {
        let perlin = Perlin::new(&mut ChaCha8Rng::seed_from_u64(99));
        let field = Fbm::default().field(&perlin, Size::new(40, 40));
        assert_eq!(field.len(), 1600);
        assert!(field.iter().all(|v| (-1.5..=1.5).contains(v)));
        assert!(field.iter().any(|v| v.abs() > 1e-6));
    }

    #[test]
    fn test_quantile() {
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        assert!((quantile(&values, 0.5) - 5.0).abs() < f64::EPSILON);
        assert!((quantile(&values, 0.0) - 0.0).abs() < f64::EPSILON);
        assert!(quantile(&values, 1.0).is_infinite());
        assert!((quantile(&values, 0.99) - 9.0).abs() < f64::EPSILON);
    }
}
