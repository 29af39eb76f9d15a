//! Woodcutting scene: bark texture, flying chips and the falling tree
//!
//! `chopping` loops the swing timeline and each swing throws one handful
//! of chips. `felled` is the driving condition: the trunk topples, leaves
//! burst from the canopy and the banner stays up until the host clears it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::canvas::{Canvas, Color};
use super::compositor::{CelebrationExit, Compositor, EffectMachine, EffectPhase, Layer};
use crate::consts::{CULL_MARGIN, WOOD_CHIP_CAPACITY, WOOD_LEAF_CAPACITY};
use crate::geometry::Rect;
use crate::settings::Settings;
use crate::normalize_angle;
use crate::sim::{DecorField, Edge, Motion, Particle, ParticlePool, Phase, Timeline};

mod colors {
    use crate::color::Color;

    pub const SKY: Color = Color::rgb(196, 222, 236);
    pub const GROUND: Color = Color::rgb(92, 128, 64);
    pub const TRUNK: Color = Color::rgb(110, 74, 44);
    pub const BARK_DARK: Color = Color::rgb(72, 46, 26);
    pub const BARK_LIGHT: Color = Color::rgb(140, 98, 60);
    pub const HEARTWOOD: Color = Color::rgb(226, 190, 140);
    pub const CANOPY: Color = Color::rgb(52, 112, 58);
    pub const LEAF: Color = Color::rgb(88, 160, 70);
    pub const LEAF_DRY: Color = Color::rgb(196, 170, 60);
    pub const BANNER: Color = Color::rgb(255, 236, 160);
}

/// Host-provided skill snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WoodState {
    pub chopping: bool,
    pub felled: bool,
    /// Depth of the cut, `0..=1`
    pub progress: f32,
}

/// Orientation carried by each wood chip
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Chip {
    pub rotation: f32,
    /// Radians per second
    pub spin: f32,
}

static SWING_PHASES: [Phase; 3] = [
    Phase::new("windup", 0.35),
    Phase::new("strike", 0.08),
    Phase::new("recover", 0.27),
];
const PHASE_STRIKE: usize = 1;

static FELL_PHASES: [Phase; 2] = [Phase::new("topple", 0.8), Phase::new("banner", 1.2)];
const PHASE_BANNER: usize = 1;

const LATCH_CHIPS: u32 = 0;
const LATCH_LEAVES: u32 = 0;

const BARK_BLOCKS: u32 = 24;
const CHIPS_PER_SWING: usize = 5;
const LEAVES_PER_FALL: usize = 28;
const CHIP_MOTION: Motion = Motion::falling(420.0, 0.6);

pub struct WoodcutCompositor {
    field: DecorField,
    bark: u32,
    swing: Timeline,
    fell: Timeline,
    machine: EffectMachine,
    chips: ParticlePool<Chip>,
    leaves: ParticlePool,
    rng: Pcg32,
    clock: f32,
    flash: bool,
    celebrations: bool,
    motion_scale: f32,
    swings: u32,
    path: Vec<Vec2>,
}

impl WoodcutCompositor {
    pub fn new(settings: &Settings) -> Self {
        let chips = settings.pool_capacity(WOOD_CHIP_CAPACITY);
        let leaves = settings.pool_capacity(WOOD_LEAF_CAPACITY);
        log::info!("woodcut compositor: chips={} leaves={}", chips, leaves);
        Self {
            field: DecorField::new(settings.seed),
            bark: settings.decor_count(BARK_BLOCKS),
            swing: Timeline::new(&SWING_PHASES),
            fell: Timeline::new(&FELL_PHASES),
            machine: EffectMachine::new("woodcut", CelebrationExit::WhenConditionClears),
            chips: ParticlePool::new(chips),
            leaves: ParticlePool::new(leaves),
            rng: Pcg32::seed_from_u64(settings.seed as u64 ^ 0xC4_0B),
            clock: 0.0,
            flash: settings.effective_flash(),
            celebrations: settings.celebrations,
            motion_scale: settings.motion_scale(),
            swings: 0,
            path: Vec::with_capacity(4),
        }
    }

    pub fn reseed(&mut self, seed: u32) {
        self.field.reseed(seed);
    }

    /// Completed swings that threw chips
    pub fn swings(&self) -> u32 {
        self.swings
    }

    pub fn chips(&self) -> &ParticlePool<Chip> {
        &self.chips
    }

    pub fn leaves(&self) -> &ParticlePool {
        &self.leaves
    }

    fn ground(bounds: Rect) -> f32 {
        bounds.min.y + bounds.height() * 0.85
    }

    fn trunk(bounds: Rect) -> Rect {
        let width = bounds.width() * 0.14;
        let top = bounds.min.y + bounds.height() * 0.2;
        Rect::from_min_max(
            Vec2::new(bounds.center().x - width * 0.5, top),
            Vec2::new(bounds.center().x + width * 0.5, Self::ground(bounds)),
        )
    }

    /// Where the axe bites, on the right side of the trunk
    fn notch(bounds: Rect) -> Vec2 {
        let trunk = Self::trunk(bounds);
        Vec2::new(trunk.max().x, trunk.max().y - trunk.height() * 0.15)
    }

    /// Trunk tilt in radians while toppling
    fn tilt(&self) -> f32 {
        if !self.fell.is_active() {
            return 0.0;
        }
        let t = self.fell.phase_progress(0);
        // Ease in: slow start, fast finish
        t * t * std::f32::consts::FRAC_PI_2
    }

    fn throw_chips(&mut self, from: Vec2) -> usize {
        let rng = &mut self.rng;
        let chips = (0..CHIPS_PER_SWING).map(|_| {
            let vel = Vec2::new(rng.random_range(40.0..160.0), rng.random_range(-180.0..-60.0));
            let chip = Chip {
                rotation: rng.random_range(0.0..std::f32::consts::TAU),
                spin: rng.random_range(-14.0..14.0),
            };
            let shade = rng.random_range(0.0..1.0);
            Particle::new(from, vel, rng.random_range(0.6..1.1), chip)
                .with_size(rng.random_range(2.0..4.5))
                .with_color(colors::HEARTWOOD.mix(colors::BARK_LIGHT, shade))
        });
        self.chips.spawn_burst(chips)
    }

    fn drop_leaves(&mut self, canopy: Vec2, spread: f32) -> usize {
        let spread = spread.max(1.0);
        let rng = &mut self.rng;
        let leaves = (0..LEAVES_PER_FALL).map(|_| {
            let offset = Vec2::new(rng.random_range(-spread..spread), rng.random_range(-spread..spread) * 0.5);
            let vel = Vec2::new(rng.random_range(-50.0..50.0), rng.random_range(-40.0..10.0));
            Particle::new(canopy + offset, vel, rng.random_range(1.5..2.5), ())
                .with_size(rng.random_range(2.0..3.5))
                .with_color(colors::LEAF.mix(colors::LEAF_DRY, rng.random_range(0.0..0.6)))
                .with_salt(rng.random_range(0.0..std::f32::consts::TAU))
        });
        self.leaves.spawn_burst(leaves)
    }

    fn draw_tree(&mut self, canvas: &mut dyn Canvas, bounds: Rect, progress: f32) {
        let trunk = Self::trunk(bounds);
        let base = Vec2::new(trunk.center().x, trunk.max().y);
        let tilt = self.tilt();
        canvas.save();
        if tilt > 0.0 {
            canvas.translate(base);
            canvas.rotate(tilt);
            canvas.translate(-base);
        }

        canvas.fill_circle(
            Vec2::new(trunk.center().x, trunk.min.y),
            trunk.width() * 1.6,
            colors::CANOPY,
        );
        canvas.fill_rect(trunk, colors::TRUNK);
        for i in 0..self.bark {
            let at = self.field.point_in(trunk, i);
            let h = self.field.range(i, 2, 4.0, 14.0);
            let w = self.field.range(i, 3, 1.5, trunk.width() * 0.25);
            let shade = colors::BARK_DARK.mix(colors::BARK_LIGHT, self.field.value(i, 4));
            let block = Rect::new(at.x - w * 0.5, at.y - h * 0.5, w, h);
            canvas.fill_rect(block, shade);
        }

        let depth = progress.clamp(0.0, 1.0) * trunk.width() * 0.6;
        if depth > 0.0 {
            let notch = Self::notch(bounds);
            let half = trunk.height() * 0.05;
            self.path.clear();
            self.path.extend([
                Vec2::new(notch.x, notch.y - half),
                Vec2::new(notch.x - depth, notch.y),
                Vec2::new(notch.x, notch.y + half),
            ]);
            canvas.fill_path(&self.path, colors::HEARTWOOD);
        }
        canvas.restore();
    }
}

impl Compositor for WoodcutCompositor {
    type State = WoodState;

    fn update(&mut self, bounds: Rect, state: &WoodState, dt: f32) {
        self.clock += dt;

        // Swing loop
        if self.swing.drive(state.chopping && !state.felled) == Edge::Rising {
            log::debug!("woodcut: chopping");
        }
        self.swing.tick(dt);
        if self.swing.reached(PHASE_STRIKE) && self.swing.fire_once(LATCH_CHIPS) {
            let thrown = self.throw_chips(Self::notch(bounds));
            self.swings += 1;
            log::trace!("woodcut: swing {} threw {} chips", self.swings, thrown);
        }
        if self.swing.is_finished() {
            self.swing.restart();
        }

        // Felling
        let edge = self.fell.drive(state.felled);
        self.machine.on_edge(edge);
        self.fell.tick(dt);
        if self.fell.reached(0) && self.fell.fire_once(LATCH_LEAVES) {
            let trunk = Self::trunk(bounds);
            let canopy = Vec2::new(trunk.center().x, trunk.min.y);
            let dropped = self.drop_leaves(canopy, trunk.width() * 1.4);
            log::debug!("woodcut: tree felled, {} leaves", dropped);
        }
        if self.fell.reached(PHASE_BANNER) {
            self.machine.complete();
        }
        self.machine.tick(dt);

        self.chips.step(dt, bounds, CULL_MARGIN, |p, dt| {
            CHIP_MOTION.apply(p, dt);
            p.payload.rotation = normalize_angle(p.payload.rotation + p.payload.spin * dt);
        });
        let flutter = Motion::falling(60.0, 1.5).with_wobble(24.0 * self.motion_scale, 3.2);
        self.leaves.step_motion(dt, bounds, CULL_MARGIN, &flutter);
    }

    fn draw_layer(&mut self, layer: Layer, canvas: &mut dyn Canvas, bounds: Rect, state: &WoodState) {
        match layer {
            Layer::Background => {
                canvas.fill_rect(bounds, colors::SKY);
                let ground = Self::ground(bounds);
                canvas.fill_rect(
                    Rect::from_min_max(Vec2::new(bounds.min.x, ground), bounds.max()),
                    colors::GROUND,
                );
            }
            Layer::Board => self.draw_tree(canvas, bounds, state.progress),
            Layer::Overlay => {
                // Stump left behind once the trunk starts to go
                if self.fell.is_active() {
                    let trunk = Self::trunk(bounds);
                    let stump = Rect::from_min_max(
                        Vec2::new(trunk.min.x, trunk.max().y - trunk.height() * 0.12),
                        trunk.max(),
                    );
                    canvas.fill_rect(stump, colors::TRUNK);
                    canvas.fill_ellipse(
                        Vec2::new(stump.center().x, stump.min.y),
                        Vec2::new(stump.width() * 0.5, 3.0),
                        colors::HEARTWOOD,
                    );
                }
            }
            Layer::Particles => {
                self.leaves.for_each_live(|p| {
                    canvas.fill_ellipse(p.pos, Vec2::new(p.size, p.size * 0.5), p.faded_color());
                });
                for p in self.chips.iter() {
                    canvas.save();
                    canvas.translate(p.pos);
                    canvas.rotate(p.payload.rotation);
                    canvas.fill_rect(
                        Rect::new(-p.size, -p.size * 0.4, p.size * 2.0, p.size * 0.8),
                        p.faded_color(),
                    );
                    canvas.restore();
                }
            }
            Layer::Celebration => {
                if !self.celebrations || self.machine.phase() != EffectPhase::Celebrating {
                    return;
                }
                let shown = self.machine.celebrated();
                if self.flash && shown < 0.15 {
                    canvas.fill_rect(bounds, Color::WHITE.with_alpha(0.3 * (1.0 - shown / 0.15)));
                }
                let pop = (shown / 0.25).min(1.0);
                let pulse = (self.clock * 3.0).sin() * 0.04 + 1.0;
                let size = bounds.height() * 0.14 * pop * pulse;
                let origin = Vec2::new(bounds.center().x - size * 2.0, bounds.min.y + bounds.height() * 0.12);
                canvas.fill_text("TIMBER!", origin + Vec2::splat(2.0), size, Color::BLACK.with_alpha(0.4));
                canvas.fill_text("TIMBER!", origin, size, colors::BANNER);
            }
        }
    }

    fn phase(&self) -> EffectPhase {
        self.machine.phase()
    }
}
