//! Per-scene orchestration: update once, then draw layers back to front
//!
//! `Compositor::render` is the only entry point a host calls per frame.
//! It runs the update (timelines, edge-triggered spawns, pool steps) and
//! then visits `Layer::ORDER`, so a compositor cannot draw particles
//! before the board they decorate.

use super::canvas::Canvas;
use crate::geometry::Rect;
use crate::sim::{Edge, sanitize_dt};

/// Draw layers, back to front
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// Static decor and sky
    Background,
    /// State-driven foreground: board cells, icons, progress
    Board,
    /// Timeline-driven overlays on top of the board
    Overlay,
    Particles,
    /// One-shot flashes and banners gated by timeline phase
    Celebration,
}

impl Layer {
    pub const ORDER: [Layer; 5] = [
        Layer::Background,
        Layer::Board,
        Layer::Overlay,
        Layer::Particles,
        Layer::Celebration,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Layer::Background => "background",
            Layer::Board => "board",
            Layer::Overlay => "overlay",
            Layer::Particles => "particles",
            Layer::Celebration => "celebration",
        }
    }
}

/// A per-scene effect driven once per frame
pub trait Compositor {
    /// Read-only snapshot the host passes every frame
    type State;

    /// Tick timelines, apply edge-triggered spawns and resets, step pools
    fn update(&mut self, bounds: Rect, state: &Self::State, dt: f32);

    /// Issue the draw calls for one layer
    fn draw_layer(&mut self, layer: Layer, canvas: &mut dyn Canvas, bounds: Rect, state: &Self::State);

    fn phase(&self) -> EffectPhase;

    /// Update then draw every layer in `Layer::ORDER`
    fn render(&mut self, canvas: &mut dyn Canvas, bounds: Rect, state: &Self::State, dt: f32) {
        let dt = sanitize_dt(dt);
        self.update(bounds, state, dt);
        for layer in Layer::ORDER {
            canvas.push_group(layer.label());
            canvas.save();
            self.draw_layer(layer, canvas, bounds, state);
            canvas.restore();
            canvas.pop_group();
        }
    }
}

/// Lifecycle of an edge-triggered effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectPhase {
    #[default]
    Idle,
    Active,
    Celebrating,
}

/// How a celebration ends; each compositor declares one
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CelebrationExit {
    /// Back to Idle after this many seconds (or on a falling edge)
    AfterDuration(f32),
    /// Stay until the driving condition goes false
    WhenConditionClears,
}

/// `Idle → Active → Celebrating → Idle`
#[derive(Debug, Clone)]
pub struct EffectMachine {
    phase: EffectPhase,
    exit: CelebrationExit,
    /// Seconds spent celebrating
    celebrated: f32,
    name: &'static str,
}

impl EffectMachine {
    pub fn new(name: &'static str, exit: CelebrationExit) -> Self {
        Self {
            phase: EffectPhase::Idle,
            exit,
            celebrated: 0.0,
            name,
        }
    }

    #[inline]
    pub fn phase(&self) -> EffectPhase {
        self.phase
    }

    pub fn exit(&self) -> CelebrationExit {
        self.exit
    }

    fn set(&mut self, phase: EffectPhase) {
        if phase != self.phase {
            log::debug!("{}: {:?} -> {:?}", self.name, self.phase, phase);
            self.phase = phase;
        }
    }

    /// Rising edge starts the effect; falling edge always returns to Idle
    pub fn on_edge(&mut self, edge: Edge) {
        match edge {
            Edge::Rising => {
                self.celebrated = 0.0;
                self.set(EffectPhase::Active);
            }
            Edge::Falling => {
                self.celebrated = 0.0;
                self.set(EffectPhase::Idle);
            }
            Edge::None => {}
        }
    }

    /// The main animation finished; only meaningful while Active
    pub fn complete(&mut self) {
        if self.phase == EffectPhase::Active {
            self.celebrated = 0.0;
            self.set(EffectPhase::Celebrating);
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if self.phase != EffectPhase::Celebrating {
            return;
        }
        self.celebrated += sanitize_dt(dt);
        if let CelebrationExit::AfterDuration(limit) = self.exit {
            if self.celebrated >= limit {
                self.set(EffectPhase::Idle);
            }
        }
    }

    /// Seconds into the current celebration
    pub fn celebrated(&self) -> f32 {
        self.celebrated
    }

    /// Progress through a timed celebration; 0 for open-ended ones
    pub fn celebration_progress(&self) -> f32 {
        match (self.phase, self.exit) {
            (EffectPhase::Celebrating, CelebrationExit::AfterDuration(limit)) if limit > 0.0 => {
                (self.celebrated / limit).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::canvas::Color;
    use crate::renderer::recording::RecordingCanvas;

    #[test]
    fn test_timed_exit() {
        let mut m = EffectMachine::new("test", CelebrationExit::AfterDuration(1.0));
        m.on_edge(Edge::Rising);
        assert_eq!(m.phase(), EffectPhase::Active);
        m.complete();
        assert_eq!(m.phase(), EffectPhase::Celebrating);
        m.tick(0.5);
        assert!((m.celebration_progress() - 0.5).abs() < 1e-6);
        m.tick(0.6);
        assert_eq!(m.phase(), EffectPhase::Idle);
    }

    #[test]
    fn test_open_ended_exit() {
        let mut m = EffectMachine::new("test", CelebrationExit::WhenConditionClears);
        m.on_edge(Edge::Rising);
        m.complete();
        m.tick(100.0);
        assert_eq!(m.phase(), EffectPhase::Celebrating);
        m.on_edge(Edge::Falling);
        assert_eq!(m.phase(), EffectPhase::Idle);
    }

    #[test]
    fn test_complete_ignored_when_idle() {
        let mut m = EffectMachine::new("test", CelebrationExit::AfterDuration(1.0));
        m.complete();
        assert_eq!(m.phase(), EffectPhase::Idle);
    }

    struct Probe;

    impl Compositor for Probe {
        type State = ();

        fn update(&mut self, _bounds: Rect, _state: &(), _dt: f32) {}

        fn draw_layer(&mut self, layer: Layer, canvas: &mut dyn Canvas, bounds: Rect, _state: &()) {
            if layer == Layer::Particles {
                canvas.fill_rect(bounds, Color::WHITE);
            }
        }

        fn phase(&self) -> EffectPhase {
            EffectPhase::Idle
        }
    }

    #[test]
    fn test_render_visits_layers_in_order() {
        let mut canvas = RecordingCanvas::new();
        Probe.render(&mut canvas, Rect::new(0.0, 0.0, 1.0, 1.0), &(), 0.016);
        assert_eq!(
            canvas.groups(),
            vec!["background", "board", "overlay", "particles", "celebration"]
        );
        assert_eq!(canvas.group("particles").len(), 3);
    }
}
