//! Deterministic effect core
//!
//! Everything here is pure and frame-stepped:
//! - Explicit delta-time only, never a wall clock
//! - Fixed capacities, no growth in the frame loop
//! - Decor from a stateless hash, spawn jitter from a seeded RNG
//! - No rendering or platform dependencies

pub mod envelope;
pub mod field;
pub mod pool;
pub mod timeline;

pub use envelope::{Envelope, alpha_envelope};
pub use field::{DecorField, sample, sample_range};
pub use pool::{Emitter, Motion, Particle, ParticlePool, Wobble, sanitize_dt};
pub use timeline::{Edge, FallingEdge, Phase, Stagger, Timeline};
