//! Fishing minigame: rising bubbles, bobber, splash and ripples
//!
//! Bubbles stream up from the bed and pop at the water surface. `bite` is
//! the driving condition. Its rising edge throws splash drops at the
//! bobber and starts the ripple timeline. A bite is often a one-frame
//! pulse, so the ripple timeline holds through a falling edge and plays out.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::canvas::{BlendMode, Canvas, Color};
use super::compositor::{CelebrationExit, Compositor, EffectMachine, EffectPhase, Layer};
use crate::consts::{CULL_MARGIN, POND_BUBBLE_CAPACITY, POND_DROP_CAPACITY};
use crate::geometry::Rect;
use crate::settings::Settings;
use crate::sim::{DecorField, Edge, Emitter, FallingEdge, Motion, Particle, ParticlePool, Phase, Timeline};

mod colors {
    use crate::color::Color;

    pub const AIR: Color = Color::rgb(214, 234, 240);
    pub const SHALLOW: Color = Color::rgb(60, 140, 170);
    pub const DEEP: Color = Color::rgb(16, 52, 86);
    pub const PEBBLE: Color = Color::rgb(90, 96, 88);
    pub const WEED: Color = Color::rgb(40, 110, 70);
    pub const BUBBLE: Color = Color::rgb(220, 245, 255);
    pub const DROP: Color = Color::rgb(180, 225, 245);
    pub const RIPPLE: Color = Color::rgb(235, 250, 255);
    pub const BOBBER_TOP: Color = Color::rgb(220, 50, 40);
    pub const BOBBER_BOTTOM: Color = Color::rgb(245, 245, 240);
    pub const BANNER: Color = Color::rgb(255, 214, 90);
}

/// Host-provided minigame snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PondState {
    pub bite: bool,
    /// Height of the water surface as a fraction from the top, `0..=1`
    pub water_line: f32,
}

impl Default for PondState {
    fn default() -> Self {
        Self {
            bite: false,
            water_line: 0.35,
        }
    }
}

static BITE_PHASES: [Phase; 3] = [
    Phase::new("splash", 0.2),
    Phase::new("ripple", 0.9),
    Phase::new("settle", 0.4),
];
const PHASE_RIPPLE: usize = 1;
const PHASE_SETTLE: usize = 2;
const LATCH_SPLASH: u32 = 0;

const PEBBLES: u32 = 14;
const WEEDS: u32 = 6;
const RINGS: usize = 3;
const DROPS_PER_SPLASH: usize = 18;
const BUBBLES_PER_SEC: f32 = 1.5;
const DROP_MOTION: Motion = Motion::falling(380.0, 0.4);

pub struct PondCompositor {
    field: DecorField,
    pebbles: u32,
    bite: Timeline,
    machine: EffectMachine,
    bubbles: ParticlePool,
    drops: ParticlePool,
    rng: Pcg32,
    bubble_rate: Emitter,
    clock: f32,
    flash: bool,
    celebrations: bool,
    motion_scale: f32,
    splashes: u32,
    path: Vec<Vec2>,
}

impl PondCompositor {
    pub fn new(settings: &Settings) -> Self {
        let bubbles = settings.pool_capacity(POND_BUBBLE_CAPACITY);
        let drops = settings.pool_capacity(POND_DROP_CAPACITY);
        log::info!("pond compositor: bubbles={} drops={}", bubbles, drops);
        Self {
            field: DecorField::new(settings.seed),
            pebbles: settings.decor_count(PEBBLES),
            bite: Timeline::new(&BITE_PHASES).with_falling_edge(FallingEdge::Hold),
            machine: EffectMachine::new("pond", CelebrationExit::AfterDuration(1.5)),
            bubbles: ParticlePool::new(bubbles),
            drops: ParticlePool::new(drops),
            rng: Pcg32::seed_from_u64(settings.seed as u64 ^ 0xB0BB),
            bubble_rate: Emitter::new(BUBBLES_PER_SEC),
            clock: 0.0,
            flash: settings.effective_flash(),
            celebrations: settings.celebrations,
            motion_scale: settings.motion_scale(),
            splashes: 0,
            path: Vec::with_capacity(3),
        }
    }

    pub fn reseed(&mut self, seed: u32) {
        self.field.reseed(seed);
    }

    pub fn splashes(&self) -> u32 {
        self.splashes
    }

    pub fn bubbles(&self) -> &ParticlePool {
        &self.bubbles
    }

    pub fn drops(&self) -> &ParticlePool {
        &self.drops
    }

    /// Y of the water surface; bad input falls back to the default line
    pub fn surface(bounds: Rect, state: &PondState) -> f32 {
        let line = if state.water_line.is_finite() {
            state.water_line.clamp(0.0, 1.0)
        } else {
            PondState::default().water_line
        };
        bounds.min.y + bounds.height() * line
    }

    fn bobber(&self, bounds: Rect, state: &PondState) -> Vec2 {
        let bob = (self.clock * 2.2).sin() * 2.0 * self.motion_scale;
        let dip = if self.bite.current_phase() == Some(0) { 6.0 } else { 0.0 };
        Vec2::new(bounds.center().x, Self::surface(bounds, state) + bob + dip)
    }

    fn spawn_bubbles(&mut self, bounds: Rect, surface: f32, dt: f32) {
        if surface >= bounds.max().y {
            return;
        }
        let due = self.bubble_rate.due(dt, self.bubbles.free_slots());
        for _ in 0..due {
            let pos = Vec2::new(
                bounds.min.x + bounds.width() * self.rng.random_range(0.05..0.95),
                bounds.max().y - 2.0,
            );
            let vel = Vec2::new(0.0, self.rng.random_range(-35.0..-20.0));
            let p = Particle::new(pos, vel, self.rng.random_range(6.0..9.0), ())
                .with_size(self.rng.random_range(1.5..3.5))
                .with_color(colors::BUBBLE)
                .with_salt(self.rng.random_range(0.0..std::f32::consts::TAU));
            self.bubbles.spawn(p);
        }
    }

    fn splash(&mut self, at: Vec2) -> usize {
        let rng = &mut self.rng;
        let drops = (0..DROPS_PER_SPLASH).map(|_| {
            let vel = Vec2::new(rng.random_range(-60.0..60.0), rng.random_range(-150.0..-70.0));
            Particle::new(at, vel, rng.random_range(0.5..0.9), ())
                .with_size(rng.random_range(1.2..2.6))
                .with_color(colors::DROP)
        });
        self.drops.spawn_burst(drops)
    }
}

impl Compositor for PondCompositor {
    type State = PondState;

    fn update(&mut self, bounds: Rect, state: &PondState, dt: f32) {
        self.clock += dt;
        let surface = Self::surface(bounds, state);

        let edge = self.bite.drive(state.bite);
        self.machine.on_edge(edge);
        if edge == Edge::Rising {
            log::debug!("pond: bite");
        }
        self.bite.tick(dt);
        if self.bite.reached(0) && self.bite.fire_once(LATCH_SPLASH) {
            let bobber = self.bobber(bounds, state);
            let thrown = self.splash(bobber);
            self.splashes += 1;
            log::trace!("pond: splash threw {} drops", thrown);
        }
        if self.bite.reached(PHASE_RIPPLE) {
            self.machine.complete();
        }
        if self.bite.is_finished() {
            self.bite.stop();
        }
        self.machine.tick(dt);

        self.spawn_bubbles(bounds, surface, dt);
        let rise = Motion::BALLISTIC.with_wobble(10.0 * self.motion_scale, 3.0);
        self.bubbles.step(dt, bounds, CULL_MARGIN, |p, dt| {
            rise.apply(p, dt);
            if p.pos.y <= surface {
                // Pop at the surface
                p.age = p.lifetime;
            }
        });
        self.drops.step(dt, bounds, CULL_MARGIN, |p, dt| {
            DROP_MOTION.apply(p, dt);
            if p.vel.y > 0.0 && p.pos.y >= surface {
                p.age = p.lifetime;
            }
        });
    }

    fn draw_layer(&mut self, layer: Layer, canvas: &mut dyn Canvas, bounds: Rect, state: &PondState) {
        let surface = Self::surface(bounds, state);
        match layer {
            Layer::Background => {
                let water = Rect::from_min_max(Vec2::new(bounds.min.x, surface), bounds.max());
                canvas.fill_rect(Rect::from_min_max(bounds.min, Vec2::new(bounds.max().x, surface)), colors::AIR);
                canvas.fill_rect(water, colors::SHALLOW);
                canvas.fill_rect(
                    Rect::from_min_max(water.at(0.0, 0.5), water.max()),
                    colors::DEEP.with_alpha(0.6),
                );

                let bed = Rect::from_min_max(water.at(0.0, 0.9), water.max());
                for i in 0..self.pebbles {
                    let at = self.field.point_in(bed, i);
                    let radii = Vec2::new(self.field.range(i, 2, 3.0, 8.0), self.field.range(i, 3, 2.0, 4.0));
                    canvas.fill_ellipse(at, radii, colors::PEBBLE.mix(Color::BLACK, self.field.value(i, 4) * 0.4));
                }
                for i in 0..WEEDS {
                    let root = self.field.point_in(bed, 500 + i);
                    let height = self.field.range(500 + i, 2, 0.15, 0.4) * water.height();
                    let sway = (self.clock * 0.8 + self.field.angle(500 + i, 3)).sin() * 6.0 * self.motion_scale;
                    self.path.clear();
                    self.path.extend([
                        root - Vec2::new(3.0, 0.0),
                        Vec2::new(root.x + sway, root.y - height),
                        root + Vec2::new(3.0, 0.0),
                    ]);
                    canvas.fill_path(&self.path, colors::WEED);
                }
            }
            Layer::Board => {
                let bobber = self.bobber(bounds, state);
                canvas.fill_circle(bobber, 5.0, colors::BOBBER_BOTTOM);
                canvas.save();
                canvas.clip_rect(Rect::from_min_max(bounds.min, Vec2::new(bounds.max().x, bobber.y)));
                canvas.fill_circle(bobber, 5.0, colors::BOBBER_TOP);
                canvas.restore();
                canvas.stroke_path(&[bobber, Vec2::new(bobber.x + 40.0, bounds.min.y)], Color::BLACK.with_alpha(0.5), 1.0);
            }
            Layer::Overlay => {
                if !self.bite.reached(PHASE_RIPPLE) {
                    return;
                }
                let grow = self.bite.phase_progress(PHASE_RIPPLE);
                let fade = 1.0 - self.bite.phase_progress(PHASE_SETTLE);
                let center = Vec2::new(bounds.center().x, surface);
                let reach = bounds.width() * 0.25;
                for ring in 0..RINGS {
                    // Rings trail one another outward
                    let lag = ring as f32 / RINGS as f32;
                    let t = ((grow - lag * 0.4) / (1.0 - lag * 0.4)).clamp(0.0, 1.0);
                    if t <= 0.0 {
                        continue;
                    }
                    let alpha = (1.0 - t * 0.6) * fade;
                    // Flattened sheen plus a ring for the crest
                    canvas.fill_ellipse(center, Vec2::new(reach * t, reach * t * 0.25), colors::RIPPLE.with_alpha(0.12 * alpha));
                    canvas.stroke_circle(center, reach * t * 0.5, colors::RIPPLE.with_alpha(alpha), 1.5);
                }
            }
            Layer::Particles => {
                self.bubbles.for_each_live(|p| {
                    canvas.stroke_circle(p.pos, p.size, p.faded_color(), 1.0);
                });
                canvas.set_blend(BlendMode::Additive);
                self.drops.for_each_live(|p| canvas.fill_circle(p.pos, p.size, p.faded_color()));
                canvas.set_blend(BlendMode::Normal);
            }
            Layer::Celebration => {
                if !self.celebrations || self.machine.phase() != EffectPhase::Celebrating {
                    return;
                }
                let t = self.machine.celebration_progress();
                if self.flash && t < 0.1 {
                    canvas.fill_rect(bounds, Color::WHITE.with_alpha(0.25 * (1.0 - t / 0.1)));
                }
                let size = bounds.height() * 0.12;
                let origin = Vec2::new(bounds.center().x - size * 2.2, surface - size * 1.8 - t * 10.0);
                canvas.fill_text("FISH ON!", origin, size, colors::BANNER.with_alpha(1.0 - t));
            }
        }
    }

    fn phase(&self) -> EffectPhase {
        self.machine.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{DrawCommand, RecordingCanvas};

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 320.0, 240.0);

    fn run(fx: &mut PondCompositor, state: &PondState, seconds: f32) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new();
        let steps = (seconds / 0.05).round() as usize;
        for _ in 0..steps {
            canvas.clear();
            fx.render(&mut canvas, BOUNDS, state, 0.05);
        }
        canvas
    }

    const BITE: PondState = PondState {
        bite: true,
        water_line: 0.35,
    };

    #[test]
    fn test_bubbles_pop_at_surface() {
        let mut fx = PondCompositor::new(&Settings::default());
        let state = PondState::default();
        run(&mut fx, &state, 20.0);
        let surface = PondCompositor::surface(BOUNDS, &state);
        assert!(!fx.bubbles().is_empty());
        assert!(fx.bubbles().iter().all(|p| p.pos.y > surface));
        assert!(fx.bubbles().len() <= fx.bubbles().capacity());
    }

    #[test]
    fn test_bite_splashes_once() {
        let mut fx = PondCompositor::new(&Settings::default());
        run(&mut fx, &BITE, 0.1);
        assert_eq!(fx.splashes(), 1);
        assert_eq!(fx.drops().len(), DROPS_PER_SPLASH);
        assert_eq!(fx.phase(), EffectPhase::Active);

        run(&mut fx, &BITE, 0.2);
        assert_eq!(fx.splashes(), 1);
        assert_eq!(fx.phase(), EffectPhase::Celebrating);
    }

    #[test]
    fn test_celebration_times_out() {
        let mut fx = PondCompositor::new(&Settings::default());
        run(&mut fx, &BITE, 0.5);
        assert_eq!(fx.phase(), EffectPhase::Celebrating);
        run(&mut fx, &BITE, 1.5);
        assert_eq!(fx.phase(), EffectPhase::Idle);
    }

    #[test]
    fn test_ripples_outlive_a_bite_pulse() {
        let mut fx = PondCompositor::new(&Settings::default());
        run(&mut fx, &BITE, 0.05);
        let canvas = run(&mut fx, &PondState::default(), 0.5);
        // Falling edge ends the celebration but the ripples keep spreading
        assert_eq!(fx.phase(), EffectPhase::Idle);
        assert!(canvas
            .group("overlay")
            .iter()
            .any(|c| matches!(c, DrawCommand::StrokeCircle { .. })));

        let canvas = run(&mut fx, &PondState::default(), 1.5);
        assert!(!canvas.group("overlay").iter().any(DrawCommand::is_primitive));
    }

    #[test]
    fn test_rebite_restarts_splash() {
        let mut fx = PondCompositor::new(&Settings::default());
        run(&mut fx, &BITE, 0.1);
        run(&mut fx, &PondState::default(), 0.1);
        run(&mut fx, &BITE, 0.1);
        assert_eq!(fx.splashes(), 2);
    }

    #[test]
    fn test_bad_water_line_falls_back() {
        let state = PondState {
            bite: false,
            water_line: f32::NAN,
        };
        let default = PondCompositor::surface(BOUNDS, &PondState::default());
        assert_eq!(PondCompositor::surface(BOUNDS, &state), default);
        let high = PondState {
            bite: false,
            water_line: 4.0,
        };
        assert_eq!(PondCompositor::surface(BOUNDS, &high), BOUNDS.max().y);
    }

    #[test]
    fn test_reduced_motion_skips_flash() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        let mut fx = PondCompositor::new(&settings);
        let canvas = run(&mut fx, &BITE, 0.25);
        let celebration = canvas.group("celebration");
        assert!(!celebration.iter().any(|c| matches!(c, DrawCommand::FillRect { .. })));
        assert!(celebration.iter().any(|c| matches!(c, DrawCommand::FillText { .. })));
    }

    #[test]
    fn test_long_frame_spawns_at_most_capacity() {
        let mut fx = PondCompositor::new(&Settings::default());
        let state = PondState::default();
        let mut canvas = RecordingCanvas::new();
        fx.render(&mut canvas, BOUNDS, &state, 1.0e7);
        assert!(fx.bubbles().len() <= fx.bubbles().capacity());

        fx.render(&mut canvas, BOUNDS, &state, 0.05);
        assert!(!fx.bubbles().is_empty());
        assert!(fx.bubbles().len() <= 2);
    }
}
