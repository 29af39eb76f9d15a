//! Flow minigame board: distance-staggered fill and spark celebration
//!
//! When the board becomes solved, connected cells fill one hop at a time
//! outward from the source. Each cell drips a few droplets as its window
//! opens. When the farthest cell is full, sparks burst from it once and
//! the board celebrates for a fixed time (`AfterDuration`). Unsolving the
//! board drops straight back to Idle.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::f32::consts::TAU;

use super::canvas::{BlendMode, Canvas, Color};
use super::compositor::{CelebrationExit, Compositor, EffectMachine, EffectPhase, Layer};
use super::layout::GridLayout;
use crate::board::{FlowBoard, FlowCell};
use crate::consts::{
    CULL_MARGIN, FLOW_DROPLET_CAPACITY, FLOW_FILL_DURATION, FLOW_PER_HOP_DELAY,
    FLOW_SPARK_CAPACITY,
};
use crate::geometry::Rect;
use crate::polar_to_cartesian;
use crate::settings::Settings;
use crate::sim::{DecorField, Edge, Motion, Particle, ParticlePool, Phase, Stagger, Timeline};

/// Colors for the flow board
pub mod colors {
    use crate::color::Color;

    pub const BACKGROUND: Color = Color::rgb(18, 24, 38);
    pub const SHIMMER: Color = Color::rgb(90, 120, 170);
    pub const CELL_EMPTY: Color = Color::rgb(34, 42, 60);
    pub const CELL_PIECE: Color = Color::rgb(70, 86, 120);
    pub const CELL_LOCKED: Color = Color::rgb(52, 58, 72);
    pub const CELL_ERROR: Color = Color::rgb(190, 60, 70);
    pub const HINT: Color = Color::rgb(250, 220, 120);
    pub const WATER: Color = Color::rgb(70, 170, 240);
    pub const WATER_FRONT: Color = Color::rgb(180, 230, 255);
    pub const DROPLET: Color = Color::rgb(120, 200, 255);
    pub const SPARK: Color = Color::rgb(255, 230, 140);
    pub const FLASH: Color = Color::WHITE;
}

/// Celebration phases once the last cell fills
static CELEBRATE_PHASES: [Phase; 3] = [
    Phase::new("flash", 0.25),
    Phase::new("glow", 0.6),
    Phase::new("fade", 0.75),
];

const CELEBRATE_SECS: f32 = 1.6;
const LATCH_COMPLETE: u32 = 0;
const SPARKS_PER_CELL: usize = 24;
const DROPLETS_PER_CELL: usize = 3;
const SHIMMER_DOTS: u32 = 24;

/// Compositor for a flow (pipe-connect) board
pub struct FlowCompositor {
    padding: f32,
    gap: f32,
    stagger: Stagger,
    /// Runs while the board is solved; its elapsed keys the fill wave
    fill: Timeline,
    celebrate: Timeline,
    machine: EffectMachine,
    sparks: ParticlePool,
    droplets: ParticlePool,
    rng: Pcg32,
    field: DecorField,
    shimmer_dots: u32,
    flash: bool,
    celebrations: bool,
    /// Compositor clock for idle shimmer and hint pulses
    clock: f32,
    bursts: u32,
    drips: u32,
    /// Reused per frame for cells that need spawns
    scratch: Vec<Rect>,
}

impl FlowCompositor {
    pub fn new(settings: &Settings) -> Self {
        let sparks = settings.pool_capacity(FLOW_SPARK_CAPACITY);
        let droplets = settings.pool_capacity(FLOW_DROPLET_CAPACITY);
        log::info!("flow compositor: sparks={} droplets={}", sparks, droplets);
        Self {
            padding: 12.0,
            gap: 6.0,
            stagger: Stagger::new(FLOW_PER_HOP_DELAY, FLOW_FILL_DURATION),
            fill: Timeline::new(&[]),
            celebrate: Timeline::new(&CELEBRATE_PHASES),
            machine: EffectMachine::new(
                "flow",
                CelebrationExit::AfterDuration(CELEBRATE_SECS),
            ),
            sparks: ParticlePool::new(sparks),
            droplets: ParticlePool::new(droplets),
            rng: Pcg32::seed_from_u64(settings.seed as u64),
            field: DecorField::new(settings.seed),
            shimmer_dots: settings.decor_count(SHIMMER_DOTS),
            flash: settings.effective_flash(),
            celebrations: settings.celebrations,
            clock: 0.0,
            bursts: 0,
            drips: 0,
            scratch: Vec::new(),
        }
    }

    pub fn layout(&self, board: &FlowBoard) -> GridLayout {
        GridLayout::new(board.columns, board.rows, self.padding, self.gap)
    }

    /// Cell under `point`, using the same layout the board is drawn with
    pub fn hit_test(&self, bounds: Rect, board: &FlowBoard, point: Vec2) -> Option<usize> {
        self.layout(board).hit_test(bounds, point)
    }

    /// Local fill progress of `cell` in `[0, 1]`
    pub fn cell_progress(&self, cell: &FlowCell) -> f32 {
        if !self.fill.is_active() || !cell.fills() {
            return 0.0;
        }
        self.stagger.progress(self.fill.elapsed(), cell.distance)
    }

    /// Completion bursts fired so far
    pub fn bursts(&self) -> u32 {
        self.bursts
    }

    /// Fill droplets spawned so far
    pub fn drips(&self) -> u32 {
        self.drips
    }

    pub fn sparks(&self) -> &ParticlePool {
        &self.sparks
    }

    pub fn droplets(&self) -> &ParticlePool {
        &self.droplets
    }

    fn cells<'a>(
        &self,
        bounds: Rect,
        board: &'a FlowBoard,
    ) -> impl Iterator<Item = (Rect, &'a FlowCell)> + use<'a> {
        let layout = self.layout(board);
        board
            .cells
            .iter()
            .take(layout.len())
            .enumerate()
            .filter_map(move |(i, cell)| layout.cell_rect(bounds, i).map(|r| (r, cell)))
    }

    fn spawn_droplets(&mut self, rect: Rect) -> usize {
        let mut accepted = 0;
        for _ in 0..DROPLETS_PER_CELL {
            let pos = rect.at(self.rng.random_range(0.2..0.8), 0.9);
            let vel = Vec2::new(self.rng.random_range(-20.0..20.0), self.rng.random_range(-60.0..-20.0));
            let p = Particle::new(pos, vel, self.rng.random_range(0.4..0.7), ())
                .with_size(self.rng.random_range(1.5..2.5))
                .with_color(colors::DROPLET);
            if !self.droplets.spawn(p) {
                break;
            }
            accepted += 1;
        }
        accepted
    }

    fn spawn_sparks(&mut self, center: Vec2) -> usize {
        let mut accepted = 0;
        for i in 0..SPARKS_PER_CELL {
            let angle = i as f32 / SPARKS_PER_CELL as f32 * TAU + self.rng.random_range(-0.2f32..0.2);
            let speed = self.rng.random_range(80.0..200.0);
            let p = Particle::new(center, polar_to_cartesian(speed, angle), self.rng.random_range(0.6..1.1), ())
                .with_size(self.rng.random_range(1.5..3.0))
                .with_color(colors::SPARK)
                .with_salt(self.rng.random_range(0.0..TAU));
            if !self.sparks.spawn(p) {
                break;
            }
            accepted += 1;
        }
        accepted
    }
}

impl Compositor for FlowCompositor {
    type State = FlowBoard;

    fn update(&mut self, bounds: Rect, board: &FlowBoard, dt: f32) {
        self.clock += dt;

        let edge = self.fill.drive(board.solved);
        self.machine.on_edge(edge);
        match edge {
            Edge::Rising => log::debug!("flow: solved, filling {} cells", board.cells.len()),
            Edge::Falling => self.celebrate.stop(),
            Edge::None => {}
        }

        let previous = self.fill.elapsed();
        self.fill.tick(dt);
        let elapsed = self.fill.elapsed();

        if self.machine.phase() == EffectPhase::Active {
            let mut scratch = std::mem::take(&mut self.scratch);
            scratch.clear();
            scratch.extend(
                self.cells(bounds, board)
                    .filter(|(_, c)| c.fills() && self.stagger.opened_between(previous, elapsed, c.distance))
                    .map(|(r, _)| r),
            );
            for rect in &scratch {
                let accepted = self.spawn_droplets(*rect);
                self.drips += accepted as u32;
                log::trace!("flow: cell at {:?} opened, {} droplets", rect.min, accepted);
            }

            if let Some(last) = board.max_fill_distance() {
                if self.stagger.progress(elapsed, last) >= 1.0 && self.fill.fire_once(LATCH_COMPLETE) {
                    scratch.clear();
                    scratch.extend(
                        self.cells(bounds, board)
                            .filter(|(_, c)| c.fills() && c.distance == last)
                            .map(|(r, _)| r),
                    );
                    let accepted: usize = scratch.iter().map(|r| self.spawn_sparks(r.center())).sum();
                    self.bursts += 1;
                    log::debug!("flow: fill complete at {:.2}s, {} sparks", elapsed, accepted);
                    self.machine.complete();
                    self.celebrate.start();
                }
            }
            self.scratch = scratch;
        }

        self.celebrate.tick(dt);
        self.machine.tick(dt);
        if self.machine.phase() != EffectPhase::Celebrating && self.celebrate.is_active() {
            self.celebrate.stop();
        }

        self.sparks
            .step_motion(dt, bounds, CULL_MARGIN, &Motion::falling(240.0, 1.2));
        self.droplets
            .step_motion(dt, bounds, CULL_MARGIN, &Motion::falling(160.0, 2.0));
    }

    fn draw_layer(&mut self, layer: Layer, canvas: &mut dyn Canvas, bounds: Rect, board: &FlowBoard) {
        match layer {
            Layer::Background => {
                canvas.fill_rect(bounds, colors::BACKGROUND);
                for i in 0..self.shimmer_dots {
                    let pos = self.field.point_in(bounds, i);
                    let twinkle = (self.clock * 0.8 + self.field.angle(i, 2)).sin() * 0.5 + 0.5;
                    let radius = self.field.range(i, 3, 0.8, 2.2);
                    canvas.fill_circle(pos, radius, colors::SHIMMER.with_alpha(0.15 + 0.25 * twinkle));
                }
            }
            Layer::Board => {
                let pulse = (self.clock * 4.0).sin() * 0.5 + 0.5;
                for (rect, cell) in self.cells(bounds, board) {
                    let base = if cell.error {
                        colors::CELL_ERROR
                    } else if cell.locked {
                        colors::CELL_LOCKED
                    } else if cell.occupied {
                        colors::CELL_PIECE
                    } else {
                        colors::CELL_EMPTY
                    };
                    let radius = rect.width() * 0.15;
                    canvas.fill_round_rect(rect, radius, base);
                    if cell.hint {
                        canvas.stroke_rect(rect, colors::HINT.with_alpha(0.4 + 0.6 * pulse), 2.0);
                    }
                }
            }
            Layer::Overlay => {
                if !self.fill.is_active() {
                    return;
                }
                for (rect, cell) in self.cells(bounds, board) {
                    let progress = self.cell_progress(cell);
                    if progress <= 0.0 {
                        continue;
                    }
                    // Liquid rises from the bottom of the card
                    let height = rect.height() * progress;
                    let level = Rect::new(rect.min.x, rect.max().y - height, rect.width(), height);
                    canvas.fill_rect(level, colors::WATER.with_alpha(0.85));
                    if progress < 1.0 {
                        let front = Rect::new(level.min.x, level.min.y, level.width(), 2.0);
                        canvas.fill_rect(front, colors::WATER_FRONT);
                    }
                }
            }
            Layer::Particles => {
                self.droplets.for_each_live(|p| {
                    canvas.fill_circle(p.pos, p.size, p.faded_color());
                });
                canvas.set_blend(BlendMode::Additive);
                self.sparks.for_each_live(|p| {
                    let twinkle = (p.age * 18.0 + p.salt).sin() * 0.25 + 0.75;
                    canvas.fill_circle(p.pos, p.size * twinkle, p.faded_color());
                });
                canvas.set_blend(BlendMode::Normal);
            }
            Layer::Celebration => {
                if !self.celebrations || self.machine.phase() != EffectPhase::Celebrating {
                    return;
                }
                if self.flash {
                    let flash = 1.0 - self.celebrate.phase_progress(0);
                    canvas.fill_rect(bounds, colors::FLASH.with_alpha(0.5 * flash));
                }
                let glow = self.celebrate.phase_progress(1);
                let fade = 1.0 - self.celebrate.phase_progress(2);
                canvas.stroke_rect(bounds.inflate(-4.0 - 6.0 * glow), colors::SPARK.with_alpha(fade), 3.0);
                let size = bounds.height().min(bounds.width()) * 0.12;
                let origin = bounds.center() - Vec2::new(size * 2.0, -size * 0.35);
                canvas.fill_text("SOLVED", origin, size, Color::WHITE.with_alpha(fade));
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
    use crate::board::UNREACHABLE;
    use crate::renderer::recording::{DrawCommand, RecordingCanvas};

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 300.0, 120.0);

    fn line_board() -> FlowBoard {
        let mut board = FlowBoard::new(3, 1);
        for c in &mut board.cells {
            c.occupied = true;
        }
        board.connect_from(&[0]);
        board
    }

    fn run(fx: &mut FlowCompositor, board: &FlowBoard, frames: usize, dt: f32) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new();
        for _ in 0..frames {
            canvas.clear();
            fx.render(&mut canvas, BOUNDS, board, dt);
        }
        canvas
    }

    #[test]
    fn test_wave_fills_in_distance_order() {
        let mut fx = FlowCompositor::new(&Settings::default());
        let mut board = line_board();
        board.solved = true;
        run(&mut fx, &board, 3, 0.1);

        assert_eq!(fx.cell_progress(&board.cells[0]), 1.0);
        let middle = fx.cell_progress(&board.cells[1]);
        assert!(middle > 0.0 && middle < 1.0, "middle cell at {middle}");
        assert_eq!(fx.cell_progress(&board.cells[2]), 0.0);
        assert_eq!(fx.phase(), EffectPhase::Active);
    }

    #[test]
    fn test_each_cell_drips_once_as_its_window_opens() {
        let mut fx = FlowCompositor::new(&Settings::default());
        let mut board = line_board();
        board.solved = true;
        let mut canvas = RecordingCanvas::new();

        // A zero-length rising frame opens nothing
        fx.render(&mut canvas, BOUNDS, &board, 0.0);
        assert_eq!(fx.drips(), 0);

        let mut drip_frames = Vec::new();
        for frame in 0..42 {
            let before = fx.drips();
            fx.render(&mut canvas, BOUNDS, &board, 1.0 / 60.0);
            if fx.drips() != before {
                drip_frames.push((frame, fx.drips() - before));
            }
        }

        assert_eq!(drip_frames.len(), 3, "drips at {drip_frames:?}");
        assert!(drip_frames.iter().all(|&(_, n)| n == DROPLETS_PER_CELL as u32));
        assert_eq!(drip_frames[0].0, 0);
        assert_eq!(fx.drips(), 3 * DROPLETS_PER_CELL as u32);
        assert_eq!(fx.bursts(), 1);
    }

    #[test]
    fn test_completion_bursts_once_then_times_out() {
        let mut fx = FlowCompositor::new(&Settings::default());
        let mut board = line_board();
        board.solved = true;

        // Last window closes at 2 * 0.2 + 0.25 = 0.65s
        run(&mut fx, &board, 7, 0.1);
        assert_eq!(fx.bursts(), 1);
        assert_eq!(fx.phase(), EffectPhase::Celebrating);
        assert!(!fx.sparks().is_empty());

        run(&mut fx, &board, 10, 0.1);
        assert_eq!(fx.bursts(), 1);

        run(&mut fx, &board, 10, 0.1);
        assert_eq!(fx.phase(), EffectPhase::Idle);
        // Still solved: cells stay full
        assert_eq!(fx.cell_progress(&board.cells[2]), 1.0);
    }

    #[test]
    fn test_retrigger_restarts_wave() {
        let mut fx = FlowCompositor::new(&Settings::default());
        let mut board = line_board();
        board.solved = true;
        run(&mut fx, &board, 2, 0.1);

        board.solved = false;
        run(&mut fx, &board, 1, 0.0);
        assert_eq!(fx.phase(), EffectPhase::Idle);
        assert_eq!(fx.cell_progress(&board.cells[0]), 0.0);

        board.solved = true;
        run(&mut fx, &board, 1, 0.05);
        assert!((fx.cell_progress(&board.cells[0]) - 0.2).abs() < 1e-5);

        run(&mut fx, &board, 12, 0.1);
        assert_eq!(fx.bursts(), 1);
    }

    #[test]
    fn test_unreachable_cells_never_fill() {
        let mut fx = FlowCompositor::new(&Settings::default());
        let mut board = FlowBoard::new(2, 1);
        for c in &mut board.cells {
            c.occupied = true;
            c.connected = true;
            c.distance = UNREACHABLE;
        }
        board.solved = true;
        run(&mut fx, &board, 30, 0.1);

        assert_eq!(fx.cell_progress(&board.cells[0]), 0.0);
        assert_eq!(fx.bursts(), 0);
        assert_eq!(fx.phase(), EffectPhase::Active);
        assert!(fx.droplets().is_empty());
    }

    #[test]
    fn test_layers_drawn_in_order() {
        let mut fx = FlowCompositor::new(&Settings::default());
        let mut board = line_board();
        board.solved = true;
        let canvas = run(&mut fx, &board, 7, 0.1);

        assert_eq!(
            canvas.groups(),
            vec!["background", "board", "overlay", "particles", "celebration"]
        );
        let particles = canvas.group("particles");
        assert!(particles.iter().any(|c| matches!(c, DrawCommand::FillCircle { .. })));
        let celebration = canvas.group("celebration");
        assert!(celebration.iter().any(|c| matches!(c, DrawCommand::FillText { .. })));
    }

    #[test]
    fn test_reduced_motion_skips_flash() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        let mut fx = FlowCompositor::new(&settings);
        let mut board = line_board();
        board.solved = true;
        let canvas = run(&mut fx, &board, 7, 0.1);
        let celebration = canvas.group("celebration");
        assert!(!celebration.iter().any(|c| matches!(c, DrawCommand::FillRect { .. })));
    }

    #[test]
    fn test_same_seed_same_frames() {
        let mut board = line_board();
        board.solved = true;
        let mut a = FlowCompositor::new(&Settings::default());
        let mut b = FlowCompositor::new(&Settings::default());
        for _ in 0..12 {
            let ca = run(&mut a, &board, 1, 1.0 / 60.0);
            let cb = run(&mut b, &board, 1, 1.0 / 60.0);
            assert_eq!(ca.commands, cb.commands);
        }
    }

    #[test]
    fn test_hit_test_uses_board_layout() {
        let fx = FlowCompositor::new(&Settings::default());
        let board = line_board();
        let rect = fx.layout(&board).cell_rect(BOUNDS, 2).unwrap_or_default();
        assert_eq!(fx.hit_test(BOUNDS, &board, rect.center()), Some(2));
    }

    #[test]
    fn test_particles_disabled() {
        let settings = Settings {
            particles: false,
            ..Settings::default()
        };
        let mut fx = FlowCompositor::new(&settings);
        let mut board = line_board();
        board.solved = true;
        run(&mut fx, &board, 10, 0.1);
        assert!(fx.sparks().is_empty());
        assert_eq!(fx.bursts(), 1);
    }
}
