//! Fixed-capacity particle pool with swap-remove compaction
//!
//! Slots `[0, len)` are exactly the live particles. Removing slot `i`
//! moves the last live particle into it, so removal is O(1) and the
//! iteration order is unspecified. Capacity is reserved once at
//! construction; `spawn` past capacity is dropped, never queued.

use glam::Vec2;

use super::envelope::alpha_envelope;
use crate::color::Color;
use crate::geometry::Rect;

/// Clamp a host-supplied frame delta: NaN, infinite and negative become 0
#[inline]
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

/// A short-lived visual point with an effect-specific payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle<P = ()> {
    pub pos: Vec2,
    /// Units per second
    pub vel: Vec2,
    /// Seconds since spawn; dead once `age >= lifetime`
    pub age: f32,
    pub lifetime: f32,
    pub size: f32,
    pub color: Color,
    /// Phase offset for wobble and twinkle, fixed at spawn
    pub salt: f32,
    pub payload: P,
}

impl<P> Particle<P> {
    pub fn new(pos: Vec2, vel: Vec2, lifetime: f32, payload: P) -> Self {
        Self {
            pos,
            vel,
            age: 0.0,
            lifetime,
            size: 1.0,
            color: Color::WHITE,
            salt: 0.0,
            payload,
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_salt(mut self, salt: f32) -> Self {
        self.salt = salt;
        self
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.age >= self.lifetime
    }

    /// Normalized age in `[0, 1]`
    #[inline]
    pub fn progress(&self) -> f32 {
        (self.age / self.lifetime).clamp(0.0, 1.0)
    }

    /// Opacity from the shared envelope
    #[inline]
    pub fn alpha(&self) -> f32 {
        alpha_envelope(self.age, self.lifetime)
    }

    /// Color with the envelope folded into its alpha channel
    #[inline]
    pub fn faded_color(&self) -> Color {
        self.color.scale_alpha(self.alpha())
    }

    fn is_well_formed(&self) -> bool {
        self.lifetime.is_finite()
            && self.lifetime > 0.0
            && self.age >= 0.0
            && self.age < self.lifetime
            && self.pos.is_finite()
            && self.vel.is_finite()
    }
}

/// Horizontal sway applied on top of the integrated velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wobble {
    /// Peak sideways speed (units/second)
    pub amplitude: f32,
    /// Radians per second of age
    pub frequency: f32,
}

/// Shared integrator used by most effects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Acceleration (units/second²)
    pub gravity: Vec2,
    /// Fraction of velocity lost per second
    pub drag: f32,
    pub wobble: Option<Wobble>,
}

impl Motion {
    pub const BALLISTIC: Motion = Motion {
        gravity: Vec2::ZERO,
        drag: 0.0,
        wobble: None,
    };

    pub const fn falling(gravity: f32, drag: f32) -> Self {
        Self {
            gravity: Vec2::new(0.0, gravity),
            drag,
            wobble: None,
        }
    }

    pub const fn with_wobble(mut self, amplitude: f32, frequency: f32) -> Self {
        self.wobble = Some(Wobble {
            amplitude,
            frequency,
        });
        self
    }

    /// Advance one particle's motion by `dt` (aging is the pool's job)
    #[inline]
    pub fn apply<P>(&self, p: &mut Particle<P>, dt: f32) {
        p.vel += self.gravity * dt;
        p.vel *= (1.0 - self.drag * dt).max(0.0);
        p.pos += p.vel * dt;
        if let Some(w) = self.wobble {
            p.pos.x += (p.age * w.frequency + p.salt).sin() * w.amplitude * dt;
        }
    }
}

/// Fixed-rate spawner that carries fractional spawns between frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    /// Spawns per second
    pub rate: f32,
    debt: f32,
}

impl Emitter {
    pub const fn new(rate: f32) -> Self {
        Self { rate, debt: 0.0 }
    }

    /// Spawns owed after `dt`, never more than `free`.
    ///
    /// Debt is capped at one past `free`, so a long frame costs at most
    /// `free` spawns and leaves no backlog behind.
    pub fn due(&mut self, dt: f32, free: usize) -> usize {
        let owed = (self.debt + self.rate.max(0.0) * sanitize_dt(dt)).min(free as f32 + 1.0);
        let count = (owed.floor() as usize).min(free);
        self.debt = owed - count as f32;
        count
    }
}

/// Bounded store of live particles
#[derive(Debug, Clone)]
pub struct ParticlePool<P = ()> {
    live: Vec<Particle<P>>,
    capacity: usize,
    /// Spawns rejected for malformed input since the last `step`
    rejected: usize,
}

impl<P> ParticlePool<P> {
    pub fn new(capacity: usize) -> Self {
        Self {
            live: Vec::with_capacity(capacity),
            capacity,
            rejected: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.live.len() >= self.capacity
    }

    /// Slots still open for `spawn`
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.live.len())
    }

    /// Insert a particle at the end of the live range.
    ///
    /// Returns false (and leaves the pool untouched) when the pool is
    /// saturated, the lifetime is non-positive or non-finite, or the age
    /// lies outside `[0, lifetime)`.
    pub fn spawn(&mut self, particle: Particle<P>) -> bool {
        if !particle.is_well_formed() {
            self.rejected += 1;
            return false;
        }
        if self.is_full() {
            return false;
        }
        self.live.push(particle);
        true
    }

    /// Spawn until the pool saturates; returns how many were accepted
    pub fn spawn_burst(&mut self, particles: impl IntoIterator<Item = Particle<P>>) -> usize {
        let mut accepted = 0;
        for p in particles {
            if self.is_full() {
                break;
            }
            if self.spawn(p) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Advance every live particle and compact out the dead.
    ///
    /// `update` runs first (motion, color shifts), then the pool ages the
    /// particle by `dt`. Particles whose age reaches their lifetime or that
    /// leave `bounds` by more than `margin` are swap-removed. Iterates from
    /// the back so a swapped-in particle has already been visited.
    /// Returns the number removed.
    pub fn step(
        &mut self,
        dt: f32,
        bounds: Rect,
        margin: f32,
        mut update: impl FnMut(&mut Particle<P>, f32),
    ) -> usize {
        let dt = sanitize_dt(dt);
        let keep = bounds.inflate(margin);
        let before = self.live.len();

        let mut i = self.live.len();
        while i > 0 {
            i -= 1;
            let p = &mut self.live[i];
            update(p, dt);
            p.age += dt;
            let out = !keep.is_empty() && !keep.contains(p.pos);
            if p.is_dead() || out || !p.pos.is_finite() {
                self.live.swap_remove(i);
            }
        }

        if self.rejected > 0 {
            log::warn!("dropped {} malformed particle spawns", self.rejected);
            self.rejected = 0;
        }

        before - self.live.len()
    }

    /// `step` with the shared integrator
    pub fn step_motion(&mut self, dt: f32, bounds: Rect, margin: f32, motion: &Motion) -> usize {
        self.step(dt, bounds, margin, |p, dt| motion.apply(p, dt))
    }

    /// Read-only iteration over live particles for drawing
    pub fn for_each_live(&self, mut draw: impl FnMut(&Particle<P>)) {
        for p in &self.live {
            draw(p);
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle<P>> {
        self.live.iter()
    }

    pub fn clear(&mut self) {
        self.live.clear();
    }
}

impl<'a, P> IntoIterator for &'a ParticlePool<P> {
    type Item = &'a Particle<P>;
    type IntoIter = std::slice::Iter<'a, Particle<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.live.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    fn dot(id: u32, lifetime: f32) -> Particle<u32> {
        Particle::new(Vec2::new(50.0, 50.0), Vec2::ZERO, lifetime, id)
    }

    #[test]
    fn test_spawn_saturates_then_expires() {
        let mut pool: ParticlePool<u32> = ParticlePool::new(15);
        let accepted = (0..20).filter(|&i| pool.spawn(dot(i, 1.0))).count();
        assert_eq!(accepted, 15);
        assert_eq!(pool.len(), 15);

        pool.step(1.1, BOUNDS, 10.0, |_, _| {});
        assert!(pool.is_empty());
    }

    #[test]
    fn test_spawn_burst_reports_accepted() {
        let mut pool: ParticlePool<u32> = ParticlePool::new(4);
        pool.spawn(dot(0, 1.0));
        assert_eq!(pool.spawn_burst((1..10).map(|i| dot(i, 1.0))), 3);
        assert!(pool.is_full());
    }

    #[test]
    fn test_rejects_bad_lifetime() {
        let mut pool: ParticlePool<u32> = ParticlePool::new(4);
        assert!(!pool.spawn(dot(0, 0.0)));
        assert!(!pool.spawn(dot(1, -2.0)));
        assert!(!pool.spawn(dot(2, f32::NAN)));
        assert!(!pool.spawn(dot(3, f32::INFINITY)));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_age() {
        let mut pool: ParticlePool<u32> = ParticlePool::new(4);
        let mut stale = dot(0, 1.0);
        stale.age = 1.0;
        let mut unborn = dot(1, 1.0);
        unborn.age = -0.5;
        let mut nan_age = dot(2, 1.0);
        nan_age.age = f32::NAN;
        assert!(!pool.spawn(stale));
        assert!(!pool.spawn(unborn));
        assert!(!pool.spawn(nan_age));

        let mut midway = dot(3, 1.0);
        midway.age = 0.5;
        assert!(pool.spawn(midway));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_emitter_carries_fractions() {
        let mut emitter = Emitter::new(4.0);
        let counts: Vec<usize> = (0..4).map(|_| emitter.due(0.125, 10)).collect();
        assert_eq!(counts, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_emitter_long_frame_is_bounded() {
        let mut emitter = Emitter::new(6.0);
        assert_eq!(emitter.due(1.0e7, 5), 5);
        assert_eq!(emitter.due(1.0e30, 0), 0);
        // No backlog: a short frame owes at most the one carried spawn
        assert!(emitter.due(0.0, 100) <= 1);
    }

    #[test]
    fn test_rejects_nan_position() {
        let mut pool: ParticlePool = ParticlePool::new(4);
        assert!(!pool.spawn(Particle::new(Vec2::new(f32::NAN, 0.0), Vec2::ZERO, 1.0, ())));
    }

    #[test]
    fn test_out_of_bounds_removed_after_margin() {
        let mut pool: ParticlePool = ParticlePool::new(4);
        pool.spawn(Particle::new(Vec2::new(99.0, 50.0), Vec2::new(100.0, 0.0), 10.0, ()));
        // 99 + 5 = 104, inside the 10 unit margin
        pool.step_motion(0.05, BOUNDS, 10.0, &Motion::BALLISTIC);
        assert_eq!(pool.len(), 1);
        // 104 + 10 = 114, outside
        pool.step_motion(0.1, BOUNDS, 10.0, &Motion::BALLISTIC);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_nan_dt_does_not_age() {
        let mut pool: ParticlePool<u32> = ParticlePool::new(2);
        pool.spawn(dot(0, 1.0));
        pool.step(f32::NAN, BOUNDS, 10.0, |_, _| {});
        pool.step(-3.0, BOUNDS, 10.0, |_, _| {});
        assert_eq!(pool.iter().next().map(|p| p.age), Some(0.0));
    }

    #[test]
    fn test_motion_gravity_and_drag() {
        let mut p = Particle::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 1.0, ());
        Motion::falling(100.0, 0.5).apply(&mut p, 0.1);
        // vel = (10, 10) * 0.95
        assert!((p.vel.x - 9.5).abs() < 1e-5);
        assert!((p.vel.y - 9.5).abs() < 1e-5);
        assert!((p.pos.y - 0.95).abs() < 1e-5);
    }

    #[test]
    fn test_wobble_uses_salt() {
        let motion = Motion::BALLISTIC.with_wobble(10.0, 3.0);
        let mut a = Particle::new(Vec2::ZERO, Vec2::ZERO, 1.0, ()).with_salt(0.0);
        let mut b = Particle::new(Vec2::ZERO, Vec2::ZERO, 1.0, ()).with_salt(1.5);
        motion.apply(&mut a, 0.1);
        motion.apply(&mut b, 0.1);
        assert_eq!(a.pos.x, 0.0);
        assert!(b.pos.x > 0.9);
    }

    #[test]
    fn test_for_each_live_sees_all() {
        let mut pool: ParticlePool<u32> = ParticlePool::new(8);
        pool.spawn_burst((0..5).map(|i| dot(i, 1.0)));
        let mut seen = 0;
        pool.for_each_live(|_| seen += 1);
        assert_eq!(seen, 5);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Spawn { lifetime: f32, x: f32 },
        Step { dt: f32 },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.01f32..2.0, -20.0f32..120.0).prop_map(|(lifetime, x)| Op::Spawn { lifetime, x }),
            (0.0f32..0.5).prop_map(|dt| Op::Step { dt }),
        ]
    }

    proptest! {
        #[test]
        fn prop_capacity_invariant(capacity in 0usize..24, ops in proptest::collection::vec(op(), 0..200)) {
            let mut pool: ParticlePool<u32> = ParticlePool::new(capacity);
            let drift = Vec2::new(30.0, 0.0);
            for (id, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Spawn { lifetime, x } => {
                        pool.spawn(Particle::new(Vec2::new(x, 50.0), drift, lifetime, id as u32));
                    }
                    Op::Step { dt } => {
                        pool.step_motion(dt, BOUNDS, 10.0, &Motion::BALLISTIC);
                        prop_assert!(pool.iter().all(|p| !p.is_dead()));
                    }
                }
                prop_assert!(pool.len() <= capacity);
            }
        }

        #[test]
        fn prop_compaction_keeps_exactly_survivors(
            spawns in proptest::collection::vec((0.01f32..2.0, 0.0f32..2.0, -30.0f32..130.0), 0..40),
            dt in 0.0f32..1.5,
        ) {
            let mut pool: ParticlePool<u32> = ParticlePool::new(64);
            for (id, (lifetime, age, x)) in spawns.iter().enumerate() {
                let mut p = Particle::new(Vec2::new(*x, 50.0), Vec2::ZERO, *lifetime, id as u32);
                p.age = *age;
                pool.spawn(p);
            }
            let keep = BOUNDS.inflate(10.0);
            let expected: BTreeSet<u32> = pool
                .iter()
                .filter(|p| p.age + dt < p.lifetime && keep.contains(p.pos))
                .map(|p| p.payload)
                .collect();

            pool.step(dt, BOUNDS, 10.0, |_, _| {});

            let ids: Vec<u32> = pool.iter().map(|p| p.payload).collect();
            let unique: BTreeSet<u32> = ids.iter().copied().collect();
            prop_assert_eq!(ids.len(), unique.len());
            prop_assert_eq!(unique, expected);
        }
    }
}
