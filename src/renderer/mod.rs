//! Canvas rendering module
//!
//! Compositors issue 2D draw calls against the `Canvas` trait. Hosts pick
//! the backend: `VertexCanvas` tessellates into a GPU-ready triangle list,
//! `RecordingCanvas` keeps the commands for tests and frame dumps.

pub mod canvas;
pub mod compositor;
pub mod flow;
pub mod layout;
pub mod pond;
pub mod recording;
pub mod shapes;
pub mod sky;
pub mod vertex;
pub mod woodcut;

pub use canvas::{BlendMode, Canvas};
pub use compositor::{CelebrationExit, Compositor, EffectMachine, EffectPhase, Layer};
pub use flow::FlowCompositor;
pub use layout::GridLayout;
pub use pond::{PondCompositor, PondState};
pub use recording::{DrawCommand, RecordingCanvas};
pub use shapes::VertexCanvas;
pub use sky::{SkyCompositor, SkyState};
pub use vertex::Vertex;
pub use woodcut::{WoodState, WoodcutCompositor};
