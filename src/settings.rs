//! Effect settings and preferences
//!
//! Loaded from a JSON file by the host; every field has a default so
//! partial files are fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Multiplier applied to every base pool capacity
    pub fn capacity_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.5,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 2.0,
        }
    }

    /// Decor density multiplier (stars, bark blocks)
    pub fn decor_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.5,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 1.5,
        }
    }
}

/// Effect settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Particle effects (sparks, chips, bubbles, etc.)
    pub particles: bool,
    /// Celebration flashes and banners
    pub celebrations: bool,

    // === Accessibility ===
    /// Reduced motion (no full-screen flashes, gentler wobble)
    pub reduced_motion: bool,

    /// Seed for decor layouts and spawn jitter
    pub seed: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            celebrations: true,
            reduced_motion: false,
            seed: 0x1D1E_F00D,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset drops celebrations for performance
        if preset == QualityPreset::Low {
            self.celebrations = false;
        }
    }

    /// Effective capacity for a pool whose Medium-preset size is `base`
    pub fn pool_capacity(&self, base: usize) -> usize {
        if !self.particles {
            return 0;
        }
        ((base as f32 * self.quality.capacity_scale()).round() as usize).max(1)
    }

    /// Effective decor element count for a Medium-preset `base`
    pub fn decor_count(&self, base: u32) -> u32 {
        (base as f32 * self.quality.decor_scale()).round() as u32
    }

    /// Full-screen flashes (respects reduced_motion)
    pub fn effective_flash(&self) -> bool {
        self.celebrations && !self.reduced_motion
    }

    /// Wobble amplitude multiplier (respects reduced_motion)
    pub fn motion_scale(&self) -> f32 {
        if self.reduced_motion { 0.5 } else { 1.0 }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not read settings {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Invalid settings {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
