//! Shared opacity envelope for every particle kind
//!
//! Three linear segments over normalized age `t = age / lifetime`:
//! ramp up over `[0, fade_in)`, hold at 1.0, ramp down over the final
//! `fade_out` of the lifetime. Continuous at both segment boundaries.

use crate::consts::{FADE_IN, FADE_OUT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Fraction of lifetime spent fading in
    pub fade_in: f32,
    /// Fraction of lifetime spent fading out
    pub fade_out: f32,
}

impl Envelope {
    pub const DEFAULT: Envelope = Envelope {
        fade_in: FADE_IN,
        fade_out: FADE_OUT,
    };

    /// Opacity in `[0, 1]` at normalized time `t`
    pub fn at(&self, t: f32) -> f32 {
        if t.is_nan() || t <= 0.0 || t >= 1.0 {
            return 0.0;
        }
        let fade_out_start = 1.0 - self.fade_out;
        if t < self.fade_in {
            t / self.fade_in
        } else if t > fade_out_start {
            (1.0 - t) / self.fade_out
        } else {
            1.0
        }
    }

    /// Opacity for a particle of the given age and lifetime
    #[inline]
    pub fn alpha(&self, age: f32, lifetime: f32) -> f32 {
        if lifetime.is_nan() || lifetime <= 0.0 {
            return 0.0;
        }
        self.at(age / lifetime)
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The shared envelope every effect uses
#[inline]
pub fn alpha_envelope(age: f32, lifetime: f32) -> f32 {
    Envelope::DEFAULT.alpha(age, lifetime)
}
