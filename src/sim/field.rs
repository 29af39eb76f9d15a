//! Deterministic random field for stable decoration
//!
//! `sample(seed, index)` is a pure integer hash: the same arguments always
//! produce the same value, so decor placed from it never jitters between
//! frames and needs no stored array. Spawn-time jitter for real particles
//! uses a seeded `Pcg32` instead, since those values are stored.

use glam::Vec2;

use crate::geometry::Rect;

/// Knuth multiplicative constant, shared with the seed mixing below
const GOLDEN: u32 = 2_654_435_761;

/// Sample the field at `index` for `seed`. Returns a value in `[0, 1)`.
#[inline]
pub fn sample(seed: u32, index: u32) -> f32 {
    let mut h = seed.wrapping_mul(GOLDEN) ^ index.wrapping_mul(0x85EB_CA77);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB_352D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846C_A68B);
    h ^= h >> 16;
    // Top 24 bits map exactly onto the f32 mantissa, so 1.0 is unreachable
    (h >> 8) as f32 / (1u32 << 24) as f32
}

/// Sample mapped into `[lo, hi)`
#[inline]
pub fn sample_range(seed: u32, index: u32, lo: f32, hi: f32) -> f32 {
    lo + (hi - lo) * sample(seed, index)
}

/// Number of independent channels each decor element may draw from
pub const CHANNELS: u32 = 8;

/// A seeded view of the field with per-element channels.
///
/// Element `i` channel `c` maps to field index `i * CHANNELS + c`, so
/// x, y, size and phase of one star never share a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecorField {
    seed: u32,
}

impl DecorField {
    pub const fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Replace the seed; the only way a decor layout changes
    pub fn reseed(&mut self, seed: u32) {
        if seed != self.seed {
            log::debug!("decor field reseeded {} -> {}", self.seed, seed);
        }
        self.seed = seed;
    }

    #[inline]
    pub fn value(&self, element: u32, channel: u32) -> f32 {
        debug_assert!(channel < CHANNELS);
        sample(
            self.seed,
            element.wrapping_mul(CHANNELS).wrapping_add(channel),
        )
    }

    #[inline]
    pub fn range(&self, element: u32, channel: u32, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.value(element, channel)
    }

    /// Stable point inside `rect` for `element` (channels 0 and 1)
    pub fn point_in(&self, rect: Rect, element: u32) -> Vec2 {
        rect.at(self.value(element, 0), self.value(element, 1))
    }

    /// Stable angle in `[0, TAU)` for `element` on `channel`
    pub fn angle(&self, element: u32, channel: u32) -> f32 {
        self.value(element, channel) * std::f32::consts::TAU
    }
}
