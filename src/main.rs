//! Idle FX headless demo
//!
//! Drives every compositor through a scripted session on a `VertexCanvas`
//! and logs what each frame produced. Usage:
//!
//! ```text
//! RUST_LOG=debug idle-fx [frames] [settings.json]
//! ```

use std::path::Path;

use glam::Vec2;

use idle_fx::Rect;
use idle_fx::Settings;
use idle_fx::board::FlowBoard;
use idle_fx::consts::MAX_FRAME_DT;
use idle_fx::renderer::{
    Compositor, FlowCompositor, PondCompositor, PondState, SkyCompositor, SkyState, VertexCanvas,
    WoodState, WoodcutCompositor,
};

const DEFAULT_FRAMES: u32 = 600;
const FRAME_DT: f32 = 1.0 / 60.0;
/// Every this many frames the demo simulates a stalled tab
const HITCH_EVERY: u32 = 240;
const VIEW: Rect = Rect::new(0.0, 0.0, 640.0, 360.0);

struct Demo {
    canvas: VertexCanvas,
    board: FlowBoard,
    flow: FlowCompositor,
    sky: SkyCompositor,
    wood: WoodcutCompositor,
    pond: PondCompositor,
    time: f32,
    peak_triangles: usize,
}

impl Demo {
    fn new(settings: &Settings) -> Self {
        // U-shaped pipe around a cracked tile
        let mut board = FlowBoard::new(5, 3);
        for i in [0, 1, 2, 3, 4, 9, 14, 13, 12, 11, 10] {
            board.cells[i].occupied = true;
        }
        board.cells[7].error = true;
        board.connect_from(&[0]);

        Self {
            canvas: VertexCanvas::default(),
            board,
            flow: FlowCompositor::new(settings),
            sky: SkyCompositor::new(settings),
            wood: WoodcutCompositor::new(settings),
            pond: PondCompositor::new(settings),
            time: 0.0,
            peak_triangles: 0,
        }
    }

    fn particles(&self) -> usize {
        self.flow.sparks().len()
            + self.flow.droplets().len()
            + self.sky.dust().len()
            + self.sky.bolts().len()
            + self.wood.chips().len()
            + self.wood.leaves().len()
            + self.pond.bubbles().len()
            + self.pond.drops().len()
    }

    /// Scripted host state for the current time
    fn script(&mut self) -> (SkyState, WoodState, PondState) {
        let t = self.time;
        self.board.solved = (2.0..7.0).contains(&t);
        let sky = SkyState {
            night: ((t * 0.1).sin() * 0.5 + 0.5).clamp(0.0, 1.0),
            storm: (4.0..8.0).contains(&t),
        };
        let wood = WoodState {
            chopping: t < 5.0,
            felled: (5.0..9.0).contains(&t),
            progress: (t / 5.0).min(1.0),
        };
        let pond = PondState {
            bite: (t % 3.0) < FRAME_DT,
            ..PondState::default()
        };
        (sky, wood, pond)
    }

    fn frame(&mut self, dt: f32) {
        let dt = dt.min(MAX_FRAME_DT);
        self.time += dt;
        let (sky, wood, pond) = self.script();

        self.canvas.clear();
        let quarter = Vec2::new(VIEW.width() * 0.5, VIEW.height() * 0.5);
        let at = |u: f32, v: f32| Rect {
            min: VIEW.at(u, v),
            size: quarter,
        };
        self.flow.render(&mut self.canvas, at(0.0, 0.0), &self.board, dt);
        self.sky.render(&mut self.canvas, at(0.5, 0.0), &sky, dt);
        self.wood.render(&mut self.canvas, at(0.0, 0.5), &wood, dt);
        self.pond.render(&mut self.canvas, at(0.5, 0.5), &pond, dt);

        let triangles = self.canvas.triangle_count();
        self.peak_triangles = self.peak_triangles.max(triangles);
        log::trace!(
            "t={:.2} vertices={} particles={} text={} phases={:?}/{:?}/{:?}/{:?}",
            self.time,
            self.canvas.vertices.len(),
            self.particles(),
            self.canvas.text_calls,
            self.flow.phase(),
            self.sky.phase(),
            self.wood.phase(),
            self.pond.phase(),
        );
    }
}

fn main() {
    env_logger::init();
    log::info!("Idle FX (headless) starting...");

    let mut args = std::env::args().skip(1);
    let frames = match args.next() {
        Some(arg) => arg.parse::<u32>().unwrap_or_else(|e| {
            log::warn!("Bad frame count {:?}: {}, using {}", arg, e, DEFAULT_FRAMES);
            DEFAULT_FRAMES
        }),
        None => DEFAULT_FRAMES,
    };
    let settings = match args.next() {
        Some(path) => Settings::load(Path::new(&path)),
        None => Settings::default(),
    };
    log::info!(
        "Running {} frames at {} quality (seed {:#x})",
        frames,
        settings.quality.as_str(),
        settings.seed
    );

    let mut demo = Demo::new(&settings);
    for frame in 1..=frames {
        let dt = if frame % HITCH_EVERY == 0 { 0.5 } else { FRAME_DT };
        demo.frame(dt);
    }

    log::info!(
        "Done: {:.1}s simulated, peak {} triangles, {} live particles, {} fill bursts, {} strikes, {} swings, {} splashes",
        demo.time,
        demo.peak_triangles,
        demo.particles(),
        demo.flow.bursts(),
        demo.sky.strikes(),
        demo.wood.swings(),
        demo.pond.splashes()
    );
}
