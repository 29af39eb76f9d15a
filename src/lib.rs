//! Idle FX - procedural effects for idle-game canvas renderers
//!
//! Core modules:
//! - `sim`: Deterministic effect core (particle pools, timelines, decor field)
//! - `renderer`: Canvas abstraction, tessellation and per-scene compositors
//! - `board`: Read-only board snapshots and hop-distance search
//! - `settings`: Quality presets and JSON configuration

pub mod board;
pub mod color;
pub mod geometry;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use color::Color;
pub use geometry::Rect;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Effect configuration constants
pub mod consts {
    /// Largest frame delta a host loop should hand to a compositor
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Off-screen slack before a particle is culled
    pub const CULL_MARGIN: f32 = 16.0;

    /// Shared alpha envelope: fraction of lifetime spent fading in
    pub const FADE_IN: f32 = 0.15;
    /// Shared alpha envelope: fraction of lifetime spent fading out
    pub const FADE_OUT: f32 = 0.3;

    /// Flow fill wave: delay between consecutive hop distances (seconds)
    pub const FLOW_PER_HOP_DELAY: f32 = 0.2;
    /// Flow fill wave: width of a single cell's fill window (seconds)
    pub const FLOW_FILL_DURATION: f32 = 0.25;

    /// Base pool capacities at the Medium preset
    pub const FLOW_SPARK_CAPACITY: usize = 96;
    pub const FLOW_DROPLET_CAPACITY: usize = 64;
    pub const SKY_DUST_CAPACITY: usize = 48;
    pub const SKY_BOLT_CAPACITY: usize = 4;
    pub const WOOD_CHIP_CAPACITY: usize = 40;
    pub const WOOD_LEAF_CAPACITY: usize = 60;
    pub const POND_BUBBLE_CAPACITY: usize = 32;
    pub const POND_DROP_CAPACITY: usize = 48;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return angle;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle_wraps() {
        use std::f32::consts::PI;
        assert!((normalize_angle(2.5 * PI) - PI / 2.0).abs() < 1e-5);
        assert!((normalize_angle(-2.5 * PI) - -PI / 2.0).abs() < 1e-5);
        assert!((normalize_angle(-PI / 2.0) - -PI / 2.0).abs() < 1e-6);
        assert!(normalize_angle(f32::INFINITY).is_infinite());
    }

    #[test]
    fn test_polar_to_cartesian() {
        let p = polar_to_cartesian(2.0, std::f32::consts::FRAC_PI_2);
        assert!(p.x.abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
    }
}
