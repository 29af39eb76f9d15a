//! Sky background: stars, drifting dust and storm lightning
//!
//! Stars and hills come from the decor field, so they hold still until
//! `reseed`. `night` is computed by the host from its own clock and only
//! scales visibility here. While `storm` stays true the storm timeline
//! loops: charge, one bolt and flash, afterglow, repeat. The flash is the
//! celebration and ends after a fixed time (`AfterDuration`).

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::canvas::{BlendMode, Canvas, Color};
use super::compositor::{CelebrationExit, Compositor, EffectMachine, EffectPhase, Layer};
use crate::consts::{CULL_MARGIN, SKY_BOLT_CAPACITY, SKY_DUST_CAPACITY};
use crate::geometry::Rect;
use crate::settings::Settings;
use crate::sim::{DecorField, Edge, Emitter, Motion, Particle, ParticlePool, Phase, Timeline, field};
use crate::lerp;

pub mod colors {
    use crate::color::Color;

    pub const DAY_TOP: Color = Color::rgb(110, 170, 230);
    pub const DAY_BOTTOM: Color = Color::rgb(200, 225, 245);
    pub const NIGHT_TOP: Color = Color::rgb(8, 10, 30);
    pub const NIGHT_BOTTOM: Color = Color::rgb(30, 34, 70);
    pub const STAR: Color = Color::rgb(255, 250, 230);
    pub const HILLS: Color = Color::rgb(30, 60, 45);
    pub const SUN: Color = Color::rgb(255, 220, 120);
    pub const MOON: Color = Color::rgb(230, 235, 255);
    pub const DUST: Color = Color::rgb(255, 240, 200);
    pub const BOLT: Color = Color::rgb(235, 240, 255);
    pub const BOLT_GLOW: Color = Color::rgb(140, 160, 255);
}

/// Host-provided sky snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkyState {
    /// 0 = full day, 1 = full night
    pub night: f32,
    pub storm: bool,
}

/// Lightning bolt endpoints and the seed of its jag pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bolt {
    pub from: Vec2,
    pub to: Vec2,
    pub seed: u32,
}

static STORM_PHASES: [Phase; 3] = [
    Phase::new("charge", 0.6),
    Phase::new("strike", 0.12),
    Phase::new("afterglow", 0.5),
];
const PHASE_STRIKE: usize = 1;
const LATCH_STRIKE: u32 = 0;

const STAR_COUNT: u32 = 60;
const HILL_STEPS: u32 = 16;
const BOLT_SEGMENTS: u32 = 9;
const DUST_PER_SEC: f32 = 6.0;
const SKY_BANDS: usize = 8;

pub struct SkyCompositor {
    field: DecorField,
    stars: u32,
    storm: Timeline,
    machine: EffectMachine,
    dust: ParticlePool,
    bolts: ParticlePool<Bolt>,
    rng: Pcg32,
    dust_rate: Emitter,
    clock: f32,
    flash: bool,
    celebrations: bool,
    motion_scale: f32,
    strikes: u32,
    /// Reused polyline buffer for bolts and hills
    path: Vec<Vec2>,
}

impl SkyCompositor {
    pub fn new(settings: &Settings) -> Self {
        let dust = settings.pool_capacity(SKY_DUST_CAPACITY);
        let bolts = settings.pool_capacity(SKY_BOLT_CAPACITY);
        log::info!("sky compositor: dust={} bolts={}", dust, bolts);
        Self {
            field: DecorField::new(settings.seed),
            stars: settings.decor_count(STAR_COUNT),
            storm: Timeline::new(&STORM_PHASES),
            machine: EffectMachine::new(
                "sky",
                CelebrationExit::AfterDuration(STORM_PHASES[1].duration + STORM_PHASES[2].duration),
            ),
            dust: ParticlePool::new(dust),
            bolts: ParticlePool::new(bolts),
            rng: Pcg32::seed_from_u64(settings.seed as u64 ^ 0x5C1E),
            dust_rate: Emitter::new(DUST_PER_SEC),
            clock: 0.0,
            flash: settings.effective_flash(),
            celebrations: settings.celebrations,
            motion_scale: settings.motion_scale(),
            strikes: 0,
            path: Vec::with_capacity((BOLT_SEGMENTS + 1).max(HILL_STEPS + 1) as usize),
        }
    }

    /// New star and hill layout
    pub fn reseed(&mut self, seed: u32) {
        self.field.reseed(seed);
    }

    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    pub fn dust(&self) -> &ParticlePool {
        &self.dust
    }

    pub fn bolts(&self) -> &ParticlePool<Bolt> {
        &self.bolts
    }

    /// Region stars are scattered over
    fn star_region(bounds: Rect) -> Rect {
        Rect::new(bounds.min.x, bounds.min.y, bounds.width(), bounds.height() * 0.65)
    }

    fn horizon(bounds: Rect) -> f32 {
        bounds.min.y + bounds.height() * 0.78
    }

    fn spawn_dust(&mut self, bounds: Rect, dt: f32) {
        let due = self.dust_rate.due(dt, self.dust.free_slots());
        for _ in 0..due {
            let pos = bounds.at(self.rng.random_range(0.0..1.0), self.rng.random_range(0.3..0.95));
            let vel = Vec2::new(self.rng.random_range(-6.0..6.0), self.rng.random_range(-14.0..-4.0));
            let p = Particle::new(pos, vel, self.rng.random_range(3.0..6.0), ())
                .with_size(self.rng.random_range(0.8..1.8))
                .with_color(colors::DUST)
                .with_salt(self.rng.random_range(0.0..std::f32::consts::TAU));
            self.dust.spawn(p);
        }
    }

    fn spawn_bolt(&mut self, bounds: Rect) {
        let from = bounds.at(self.rng.random_range(0.15..0.85), 0.0);
        let to = Vec2::new(
            from.x + self.rng.random_range(-0.2f32..0.2) * bounds.width(),
            Self::horizon(bounds),
        );
        let bolt = Bolt {
            from,
            to,
            seed: self.rng.random(),
        };
        if self.bolts.spawn(Particle::new(from, Vec2::ZERO, 0.35, bolt).with_color(colors::BOLT)) {
            log::debug!("sky: bolt at x={:.0}", from.x);
        }
    }

    fn fill_jag(path: &mut Vec<Vec2>, bolt: &Bolt) {
        path.clear();
        let dir = bolt.to - bolt.from;
        let perp = Vec2::new(-dir.y, dir.x).normalize_or_zero();
        let spread = dir.length() * 0.08;
        for k in 0..=BOLT_SEGMENTS {
            let t = k as f32 / BOLT_SEGMENTS as f32;
            // Endpoints stay pinned, interior points jag sideways
            let jag = if k == 0 || k == BOLT_SEGMENTS {
                0.0
            } else {
                (field::sample(bolt.seed, k) - 0.5) * 2.0 * spread
            };
            path.push(bolt.from + dir * t + perp * jag);
        }
    }
}

impl Compositor for SkyCompositor {
    type State = SkyState;

    fn update(&mut self, bounds: Rect, state: &SkyState, dt: f32) {
        self.clock += dt;

        let edge = self.storm.drive(state.storm);
        self.machine.on_edge(edge);
        if edge != Edge::None {
            log::debug!("sky: storm {:?}", edge);
        }
        self.storm.tick(dt);

        if self.storm.reached(PHASE_STRIKE) && self.storm.fire_once(LATCH_STRIKE) {
            self.spawn_bolt(bounds);
            self.strikes += 1;
            self.machine.complete();
        }
        self.machine.tick(dt);

        if self.storm.is_finished() {
            // Storm still on: charge the next strike
            self.storm.restart();
            self.machine.on_edge(Edge::Rising);
        }

        self.spawn_dust(bounds, dt);
        let drift = Motion::BALLISTIC.with_wobble(8.0 * self.motion_scale, 1.7);
        self.dust.step_motion(dt, bounds, CULL_MARGIN, &drift);
        self.bolts.step(dt, bounds, CULL_MARGIN, |_, _| {});
    }

    fn draw_layer(&mut self, layer: Layer, canvas: &mut dyn Canvas, bounds: Rect, state: &SkyState) {
        let night = state.night.clamp(0.0, 1.0);
        match layer {
            Layer::Background => {
                let band = bounds.height() / SKY_BANDS as f32;
                for i in 0..SKY_BANDS {
                    let t = i as f32 / (SKY_BANDS - 1) as f32;
                    let day = colors::DAY_TOP.mix(colors::DAY_BOTTOM, t);
                    let dark = colors::NIGHT_TOP.mix(colors::NIGHT_BOTTOM, t);
                    let rect = Rect::new(bounds.min.x, bounds.min.y + band * i as f32, bounds.width(), band + 0.5);
                    canvas.fill_rect(rect, day.mix(dark, night));
                }

                if night <= 0.01 {
                    return;
                }
                let region = Self::star_region(bounds);
                for i in 0..self.stars {
                    let rate = self.field.range(i, 4, 0.6, 2.4);
                    let twinkle = (self.clock * rate + self.field.angle(i, 2)).sin() * 0.35 + 0.65;
                    let radius = self.field.range(i, 3, 0.5, 1.6);
                    let color = colors::STAR.with_alpha(night * twinkle);
                    canvas.fill_circle(self.field.point_in(region, i), radius, color);
                }
            }
            Layer::Board => {
                // Rolling hills as a strip of convex quads along the horizon
                let horizon = Self::horizon(bounds);
                let bottom = bounds.max().y;
                let step = bounds.width() / HILL_STEPS as f32;
                let height = |k: u32| horizon - self.field.range(1000 + k, 5, 0.0, bounds.height() * 0.12);
                for k in 0..HILL_STEPS {
                    let x0 = bounds.min.x + step * k as f32;
                    let x1 = x0 + step;
                    self.path.clear();
                    self.path.extend([
                        Vec2::new(x0, bottom),
                        Vec2::new(x0, height(k)),
                        Vec2::new(x1, height(k + 1)),
                        Vec2::new(x1, bottom),
                    ]);
                    canvas.fill_path(&self.path, colors::HILLS.mix(Color::BLACK, night * 0.6));
                }
            }
            Layer::Overlay => {
                // Sun sets as the moon rises along the same arc
                let arc = |t: f32| {
                    Vec2::new(
                        bounds.min.x + bounds.width() * lerp(0.15, 0.85, t),
                        Self::horizon(bounds) - (t * std::f32::consts::PI).sin() * bounds.height() * 0.55,
                    )
                };
                let radius = bounds.height().min(bounds.width()) * 0.06;
                if night < 1.0 {
                    canvas.fill_circle(arc(1.0 - night), radius, colors::SUN.with_alpha(1.0 - night));
                }
                if night > 0.0 {
                    let moon = arc(night);
                    canvas.fill_circle(moon, radius * 1.8, colors::MOON.with_alpha(0.08 * night));
                    canvas.fill_circle(moon, radius * 0.8, colors::MOON.with_alpha(night));
                }
            }
            Layer::Particles => {
                let day = 1.0 - night;
                self.dust.for_each_live(|p| {
                    let color = p.faded_color().scale_alpha(0.3 + 0.7 * day);
                    canvas.fill_circle(p.pos, p.size, color);
                });

                canvas.set_blend(BlendMode::Additive);
                let mut path = std::mem::take(&mut self.path);
                for p in self.bolts.iter() {
                    Self::fill_jag(&mut path, &p.payload);
                    let alpha = 1.0 - p.progress();
                    canvas.set_blur(6.0);
                    canvas.stroke_path(&path, colors::BOLT_GLOW.with_alpha(0.5 * alpha), 9.0);
                    canvas.set_blur(0.0);
                    canvas.stroke_path(&path, p.color.with_alpha(alpha), 2.5);
                }
                self.path = path;
                canvas.set_blend(BlendMode::Normal);
            }
            Layer::Celebration => {
                if !self.celebrations || self.machine.phase() != EffectPhase::Celebrating {
                    return;
                }
                if self.flash && self.storm.current_phase() == Some(PHASE_STRIKE) {
                    let flash = 1.0 - self.storm.phase_progress(PHASE_STRIKE);
                    canvas.fill_rect(bounds, Color::WHITE.with_alpha(0.45 * flash));
                }
                let glow = 1.0 - self.machine.celebration_progress();
                canvas.fill_rect(bounds, colors::BOLT_GLOW.with_alpha(0.08 * glow));
            }
        }
    }

    fn phase(&self) -> EffectPhase {
        self.machine.phase()
    }
}
