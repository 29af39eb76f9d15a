//! Edge-triggered, multi-phase animation timelines
//!
//! A timeline watches one boolean condition. A rising edge (re)starts it
//! from phase 0 with every one-shot latch cleared; elapsed time then only
//! grows until the effect stops it. Per-entity offsets (see `Stagger`) are
//! derived from `elapsed` and a fixed per-entity constant, never stored.

use super::pool::sanitize_dt;

/// Transition of the watched condition between two observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    Rising,
    Falling,
}

/// A named span of the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub name: &'static str,
    /// Seconds
    pub duration: f32,
}

impl Phase {
    pub const fn new(name: &'static str, duration: f32) -> Self {
        Self { name, duration }
    }
}

/// What a falling edge does to a running timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallingEdge {
    /// Stop and rewind to zero
    #[default]
    Reset,
    /// Keep playing to the end
    Hold,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    phases: &'static [Phase],
    on_falling: FallingEdge,
    previous: bool,
    active: bool,
    elapsed: f32,
    latches: u32,
}

impl Timeline {
    pub fn new(phases: &'static [Phase]) -> Self {
        Self {
            phases,
            on_falling: FallingEdge::Reset,
            previous: false,
            active: false,
            elapsed: 0.0,
            latches: 0,
        }
    }

    pub fn with_falling_edge(mut self, policy: FallingEdge) -> Self {
        self.on_falling = policy;
        self
    }

    /// Compare against the last observation and remember `current`
    pub fn observe(&mut self, current: bool) -> Edge {
        let edge = match (self.previous, current) {
            (false, true) => Edge::Rising,
            (true, false) => Edge::Falling,
            _ => Edge::None,
        };
        self.previous = current;
        edge
    }

    /// Observe `current` and apply the edge policy
    pub fn drive(&mut self, current: bool) -> Edge {
        let edge = self.observe(current);
        match edge {
            Edge::Rising => self.start(),
            Edge::Falling if self.on_falling == FallingEdge::Reset => self.stop(),
            _ => {}
        }
        edge
    }

    /// Begin from phase 0 with every latch cleared
    pub fn start(&mut self) {
        self.active = true;
        self.elapsed = 0.0;
        self.latches = 0;
    }

    /// Loop a running timeline back to phase 0
    pub fn restart(&mut self) {
        self.start();
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.elapsed = 0.0;
        self.latches = 0;
    }

    pub fn tick(&mut self, dt: f32) {
        if self.active {
            self.elapsed += sanitize_dt(dt);
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds since the last start; 0 when inactive
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Last observed value of the condition
    #[inline]
    pub fn condition(&self) -> bool {
        self.previous
    }

    pub fn phases(&self) -> &'static [Phase] {
        self.phases
    }

    pub fn total_duration(&self) -> f32 {
        self.phases.iter().map(|p| p.duration).sum()
    }

    /// Active and past the end of the last phase
    pub fn is_finished(&self) -> bool {
        self.active && self.elapsed >= self.total_duration()
    }

    /// Cumulative start of `index`; `None` when out of range
    pub fn phase_start(&self, index: usize) -> Option<f32> {
        if index >= self.phases.len() {
            return None;
        }
        Some(self.phases[..index].iter().map(|p| p.duration).sum())
    }

    /// Progress through `index` clamped to `[0, 1]`. Zero-length phases
    /// jump straight to 1 once reached; unknown indices report 0.
    pub fn phase_progress(&self, index: usize) -> f32 {
        if !self.active {
            return 0.0;
        }
        let Some(start) = self.phase_start(index) else {
            return 0.0;
        };
        let duration = self.phases[index].duration;
        if duration <= 0.0 {
            return if self.elapsed >= start { 1.0 } else { 0.0 };
        }
        ((self.elapsed - start) / duration).clamp(0.0, 1.0)
    }

    /// Index of the phase containing `elapsed`, found by scanning
    /// cumulative durations. `None` when inactive or finished.
    pub fn current_phase(&self) -> Option<usize> {
        if !self.active {
            return None;
        }
        let mut end = 0.0;
        for (i, phase) in self.phases.iter().enumerate() {
            end += phase.duration;
            if self.elapsed < end {
                return Some(i);
            }
        }
        None
    }

    pub fn current_phase_name(&self) -> Option<&'static str> {
        self.current_phase().map(|i| self.phases[i].name)
    }

    /// True once the timeline has entered phase `index` (or passed it)
    pub fn reached(&self, index: usize) -> bool {
        match self.phase_start(index) {
            Some(start) => self.active && self.elapsed >= start,
            None => false,
        }
    }

    /// Set `latch` and report whether this is the first time since start.
    /// Only bits 0..32 exist; larger indices never fire.
    pub fn fire_once(&mut self, latch: u32) -> bool {
        if latch >= u32::BITS {
            return false;
        }
        let bit = 1 << latch;
        if self.latches & bit != 0 {
            return false;
        }
        self.latches |= bit;
        true
    }

    pub fn latched(&self, latch: u32) -> bool {
        latch < u32::BITS && self.latches & (1 << latch) != 0
    }
}

/// Distance-ordered reveal: entity `e` opens its window at
/// `distance[e] * per_hop_delay` and fills over `fill_duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stagger {
    pub per_hop_delay: f32,
    pub fill_duration: f32,
}

impl Stagger {
    pub const fn new(per_hop_delay: f32, fill_duration: f32) -> Self {
        Self {
            per_hop_delay,
            fill_duration,
        }
    }

    /// Window open time; negative distances (unreachable) never open
    #[inline]
    pub fn window_start(&self, distance: i32) -> Option<f32> {
        (distance >= 0).then(|| distance as f32 * self.per_hop_delay)
    }

    /// Local fill progress in `[0, 1]`
    pub fn progress(&self, elapsed: f32, distance: i32) -> f32 {
        let Some(start) = self.window_start(distance) else {
            return 0.0;
        };
        if self.fill_duration <= 0.0 {
            return if elapsed >= start { 1.0 } else { 0.0 };
        }
        ((elapsed - start) / self.fill_duration).clamp(0.0, 1.0)
    }

    /// Time at which the window for `distance` closes
    pub fn completion_time(&self, distance: i32) -> Option<f32> {
        self.window_start(distance)
            .map(|start| start + self.fill_duration.max(0.0))
    }

    /// Whether the window for `distance` opened in `(previous, elapsed]`.
    /// A window at exactly 0 counts as opening on the first tick.
    pub fn opened_between(&self, previous: f32, elapsed: f32, distance: i32) -> bool {
        match self.window_start(distance) {
            Some(start) if start == 0.0 => previous <= 0.0 && elapsed > previous,
            Some(start) => previous < start && start <= elapsed,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static THREE: [Phase; 3] = [
        Phase::new("delay", 0.5),
        Phase::new("ramp", 1.0),
        Phase::new("hold", 0.5),
    ];

    #[test]
    fn test_edge_detection() {
        let mut t = Timeline::new(&THREE);
        assert_eq!(t.observe(false), Edge::None);
        assert_eq!(t.observe(true), Edge::Rising);
        assert_eq!(t.observe(true), Edge::None);
        assert_eq!(t.observe(false), Edge::Falling);
        assert!(!t.condition());
    }

    #[test]
    fn test_rising_edge_starts_and_ticks() {
        let mut t = Timeline::new(&THREE);
        t.tick(1.0);
        assert_eq!(t.elapsed(), 0.0);
        t.drive(true);
        t.tick(0.25);
        t.tick(0.5);
        assert_eq!(t.elapsed(), 0.75);
        assert_eq!(t.current_phase(), Some(1));
        assert_eq!(t.current_phase_name(), Some("ramp"));
        assert!((t.phase_progress(1) - 0.25).abs() < 1e-6);
        assert_eq!(t.phase_progress(0), 1.0);
        assert_eq!(t.phase_progress(2), 0.0);
        assert_eq!(t.phase_progress(9), 0.0);
    }

    #[test]
    fn test_finished_after_total() {
        let mut t = Timeline::new(&THREE);
        t.drive(true);
        t.tick(2.0);
        assert!(t.is_finished());
        assert_eq!(t.current_phase(), None);
        assert!(t.reached(2));
    }

    #[test]
    fn test_retrigger_resets_elapsed_and_latches() {
        let mut t = Timeline::new(&THREE);
        t.drive(true);
        t.tick(t.total_duration() * 0.5);
        assert!(t.fire_once(0));

        // Falling then rising before the next tick
        t.drive(false);
        t.drive(true);
        assert_eq!(t.elapsed(), 0.0);
        assert!(!t.latched(0));

        // One logical completion fires the burst once
        t.tick(t.total_duration());
        let fired = (0..10).filter(|_| t.fire_once(0)).count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_hold_policy_keeps_running() {
        let mut t = Timeline::new(&THREE).with_falling_edge(FallingEdge::Hold);
        t.drive(true);
        t.tick(0.3);
        assert_eq!(t.drive(false), Edge::Falling);
        t.tick(0.3);
        assert!((t.elapsed() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_nan_tick_ignored() {
        let mut t = Timeline::new(&THREE);
        t.drive(true);
        t.tick(f32::NAN);
        t.tick(-1.0);
        assert_eq!(t.elapsed(), 0.0);
    }

    #[test]
    fn test_out_of_range_latch() {
        let mut t = Timeline::new(&THREE);
        assert!(!t.fire_once(32));
        assert!(t.fire_once(31));
        assert!(!t.fire_once(31));
    }

    #[test]
    fn test_stagger_wave_ordering() {
        let s = Stagger::new(0.2, 0.25);
        let elapsed = 0.3;
        assert_eq!(s.progress(elapsed, 0), 1.0);
        let mid = s.progress(elapsed, 1);
        assert!(mid > 0.0 && mid < 1.0);
        assert!((mid - 0.4).abs() < 1e-5);
        assert_eq!(s.progress(elapsed, 2), 0.0);
    }

    #[test]
    fn test_stagger_unreachable_never_fills() {
        let s = Stagger::new(0.2, 0.25);
        assert_eq!(s.progress(100.0, -1), 0.0);
        assert_eq!(s.completion_time(-1), None);
        assert!(!s.opened_between(0.0, 100.0, -1));
    }

    #[test]
    fn test_stagger_window_opening() {
        let s = Stagger::new(0.2, 0.25);
        assert!(s.opened_between(0.0, 0.016, 0));
        assert!(!s.opened_between(0.016, 0.032, 0));
        assert!(s.opened_between(0.19, 0.21, 1));
        assert!(!s.opened_between(0.21, 0.23, 1));
        assert!((s.completion_time(2).unwrap_or(0.0) - 0.65).abs() < 1e-6);
    }
}
