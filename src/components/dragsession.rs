//! Pointer capture state.
//!
//! A [`DragSession`] is inserted on the companion when a pointer-down lands on
//! one of its parts and removed on pointer-up, so its presence is exactly the
//! "pointer owns input capture" condition. While present the physics
//! integrator leaves the body alone and drag kinematics move it instead.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::Component;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

use super::bodypart::BodyPart;

/// Capacity of the pointer sample ring.
pub const MAX_POINTER_SAMPLES: usize = 8;

/// One pointer observation in world pixels, timestamped in host seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub position: Vec2,
    pub time: f32,
}

impl PointerSample {
    pub fn new(position: Vec2, time: f32) -> Self {
        Self { position, time }
    }
}

/// Bounded ring of the most recent pointer samples. The oldest sample is
/// dropped when full.
#[derive(Debug, Clone, Default)]
pub struct SampleRing {
    samples: ArrayVec<PointerSample, MAX_POINTER_SAMPLES>,
}

impl SampleRing {
    pub fn push(&mut self, sample: PointerSample) {
        if self.samples.is_full() {
            self.samples.remove(0);
        }
        self.samples.push(sample);
    }

    pub fn latest(&self) -> Option<&PointerSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PointerSample> {
        self.samples.iter()
    }

    /// Velocity in pixels per second over the last `count` samples.
    ///
    /// Only samples no older than `max_age` seconds before the newest one are
    /// used. Fewer than two usable samples, or no elapsed time between them,
    /// yields zero.
    pub fn recent_velocity(&self, count: usize, max_age: f32) -> Vec2 {
        let Some(newest) = self.samples.last() else {
            return Vec2::ZERO;
        };
        let start = self.samples.len().saturating_sub(count.max(2));
        let window: ArrayVec<&PointerSample, MAX_POINTER_SAMPLES> = self.samples[start..]
            .iter()
            .filter(|s| newest.time - s.time <= max_age)
            .collect();
        if window.len() < 2 {
            return Vec2::ZERO;
        }
        let first = window[0];
        let dt = newest.time - first.time;
        if dt <= f32::EPSILON {
            return Vec2::ZERO;
        }
        (newest.position - first.position) / dt
    }
}

/// Live pointer capture on the companion.
///
/// # Fields
/// - `grabbed_part` - Part hit by the pointer-down
/// - `samples` - Recent pointer samples, newest last
/// - `started_at` - Timestamp of the pointer-down
/// - `grab_point` - Pointer position at pointer-down
/// - `root_at_grab` - Body position at pointer-down
/// - `travelled` - Accumulated pointer path length in pixels
/// - `is_drag` - Path length exceeded the click threshold; clicks are suppressed
/// - `spin` - Accumulated pivot rotation for non-torso drags, radians, unwrapped
/// - `speed_px_per_tick` - Most recent drag speed, pixels per nominal tick
#[derive(Component, Debug, Clone)]
pub struct DragSession {
    pub grabbed_part: BodyPart,
    pub samples: SampleRing,
    pub started_at: f32,
    pub grab_point: Vec2,
    pub root_at_grab: Vec3,
    pub travelled: f32,
    pub is_drag: bool,
    pub spin: f32,
    pub speed_px_per_tick: f32,
    last_heading: Option<f32>,
}

impl DragSession {
    pub fn new(grabbed_part: BodyPart, sample: PointerSample, root: Vec3) -> Self {
        let mut samples = SampleRing::default();
        samples.push(sample);
        Self {
            grabbed_part,
            samples,
            started_at: sample.time,
            grab_point: sample.position,
            root_at_grab: root,
            travelled: 0.0,
            is_drag: false,
            spin: 0.0,
            speed_px_per_tick: 0.0,
            last_heading: None,
        }
    }

    /// Append a sample and accumulate path length.
    ///
    /// Returns `true` on the call that first pushes the path past
    /// `threshold`, i.e. when the session turns into a drag.
    pub fn record(&mut self, sample: PointerSample, threshold: f32) -> bool {
        if let Some(previous) = self.samples.latest() {
            self.travelled += previous.position.distance(sample.position);
        }
        self.samples.push(sample);
        if !self.is_drag && self.travelled > threshold {
            self.is_drag = true;
            return true;
        }
        false
    }

    /// Horizontal pointer movement of the newest sample.
    pub fn last_dx(&self) -> f32 {
        let mut newest = self.samples.iter().rev();
        match (newest.next(), newest.next()) {
            (Some(b), Some(a)) => b.position.x - a.position.x,
            _ => 0.0,
        }
    }

    /// Only torso drags may flip facing.
    pub fn drives_facing(&self) -> bool {
        self.grabbed_part.is_torso()
    }

    /// Feed the current pointer heading (radians, relative to rest) and
    /// accumulate the smallest signed change, so a full circle keeps counting
    /// past ±π instead of snapping back.
    pub fn update_spin(&mut self, heading: f32) {
        match self.last_heading {
            None => self.spin = heading,
            Some(previous) => self.spin += wrap_angle(heading - previous),
        }
        self.last_heading = Some(heading);
    }
}

/// Wrap an angle into (-π, π].
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn sample(x: f32, y: f32, t: f32) -> PointerSample {
        PointerSample::new(Vec2::new(x, y), t)
    }

    #[test]
    fn ring_drops_oldest_when_full() {
        let mut ring = SampleRing::default();
        for i in 0..(MAX_POINTER_SAMPLES + 3) {
            ring.push(sample(i as f32, 0.0, i as f32));
        }
        assert_eq!(ring.len(), MAX_POINTER_SAMPLES);
        assert_eq!(ring.iter().next().map(|s| s.position.x), Some(3.0));
    }

    #[test]
    fn velocity_uses_last_samples_only() {
        let mut ring = SampleRing::default();
        ring.push(sample(0.0, 0.0, 0.0));
        ring.push(sample(1.0, 0.0, 0.1));
        ring.push(sample(2.0, 0.0, 0.2));
        ring.push(sample(102.0, 0.0, 0.21));
        ring.push(sample(202.0, 0.0, 0.22));
        let v = ring.recent_velocity(3, 1.0);
        assert!((v.x - 10_000.0).abs() < 1.0, "got {}", v.x);
    }

    #[test]
    fn stale_samples_are_ignored() {
        let mut ring = SampleRing::default();
        ring.push(sample(0.0, 0.0, 0.0));
        ring.push(sample(50.0, 0.0, 0.05));
        ring.push(sample(50.0, 0.0, 2.0));
        assert_eq!(ring.recent_velocity(4, 0.1), Vec2::ZERO);
    }

    #[test]
    fn single_sample_has_no_velocity() {
        let mut ring = SampleRing::default();
        ring.push(sample(5.0, 5.0, 1.0));
        assert_eq!(ring.recent_velocity(4, 0.1), Vec2::ZERO);
    }

    #[test]
    fn record_flags_drag_once_past_threshold() {
        let mut session = DragSession::new(BodyPart::Body, sample(0.0, 0.0, 0.0), Vec3::ZERO);
        assert!(!session.record(sample(3.0, 0.0, 0.01), 5.0));
        assert!(!session.is_drag);
        assert!(session.record(sample(3.0, 4.0, 0.02), 5.0));
        assert!(session.is_drag);
        assert!(!session.record(sample(10.0, 4.0, 0.03), 5.0));
        assert!(approx_eq(session.travelled, 14.0));
    }

    #[test]
    fn last_dx_uses_two_newest_samples() {
        let mut session = DragSession::new(BodyPart::Body, sample(10.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(session.last_dx(), 0.0);
        session.record(sample(14.0, 0.0, 0.01), 5.0);
        session.record(sample(11.0, 2.0, 0.02), 5.0);
        assert!(approx_eq(session.last_dx(), -3.0));
        assert_eq!(session.samples.iter().rev().next().map(|s| s.time), Some(0.02));
    }

    #[test]
    fn spin_unwraps_across_pi() {
        let mut session = DragSession::new(BodyPart::LegLeft, sample(0.0, 0.0, 0.0), Vec3::ZERO);
        let steps = 36;
        for i in 0..=steps {
            let heading = wrap_angle(i as f32 / steps as f32 * TAU);
            session.update_spin(heading);
        }
        assert!(approx_eq(session.spin, TAU), "spin {}", session.spin);
    }

    #[test]
    fn wrap_angle_range() {
        assert!(approx_eq(wrap_angle(3.0 * PI), PI));
        assert!(approx_eq(wrap_angle(-PI / 2.0), -PI / 2.0));
        assert!(approx_eq(wrap_angle(TAU + 0.5), 0.5));
    }
}
