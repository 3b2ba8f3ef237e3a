//! Rigid-body state of the companion root.
//!
//! The [`PhysicsBody`] component stores position and velocity of the rig root
//! (the feet) in world pixels, y up. It is mutated by the integrator in
//! [`crate::systems::physics`], by throw and knockback impulses, and by drag
//! kinematics while a [`DragSession`](super::dragsession::DragSession) holds
//! the pointer.

use bevy_ecs::prelude::Component;
use glam::Vec3;

/// Position/velocity of the companion root.
///
/// # Fields
/// - `position` - Root position in world pixels (y up, feet at `y`)
/// - `velocity` - Pixels per second
/// - `grounded` - Resting on the floor; gravity is not applied while set
/// - `bounce_count` - Floor bounces since the last launch
/// - `peak_impact_speed` - Largest floor impact speed since the last launch
#[derive(Component, Clone, Debug, PartialEq)]
pub struct PhysicsBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    pub bounce_count: u32,
    pub peak_impact_speed: f32,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self::resting_at(Vec3::ZERO)
    }
}

impl PhysicsBody {
    /// A body standing still on the floor at `position`.
    pub fn resting_at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            grounded: true,
            bounce_count: 0,
            peak_impact_speed: 0.0,
        }
    }

    /// Replace the velocity and leave the floor.
    ///
    /// Bounce bookkeeping restarts so landing decisions only see this flight.
    pub fn launch(&mut self, velocity: Vec3) {
        self.velocity = velocity;
        self.grounded = false;
        self.bounce_count = 0;
        self.peak_impact_speed = 0.0;
    }

    /// Add a velocity change. Any upward component lifts the body off the floor.
    pub fn apply_impulse(&mut self, delta_v: Vec3) {
        self.velocity += delta_v;
        if delta_v.y > 0.0 {
            self.grounded = false;
            self.bounce_count = 0;
            self.peak_impact_speed = 0.0;
        }
    }

    /// Teleport and stop. Grounding is decided by the caller.
    pub fn place_at(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.bounce_count = 0;
        self.peak_impact_speed = 0.0;
    }

    /// Settle on the floor at `floor_y` with no motion.
    pub fn rest_on_floor(&mut self, floor_y: f32) {
        self.position.y = floor_y;
        self.velocity = Vec3::ZERO;
        self.grounded = true;
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Height of the feet above `floor_y`, never negative.
    pub fn height_above(&self, floor_y: f32) -> f32 {
        (self.position.y - floor_y).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_resets_flight_bookkeeping() {
        let mut body = PhysicsBody::resting_at(Vec3::new(10.0, 0.0, 0.0));
        body.bounce_count = 3;
        body.peak_impact_speed = 500.0;
        body.launch(Vec3::new(100.0, 200.0, 0.0));
        assert!(!body.grounded);
        assert_eq!(body.bounce_count, 0);
        assert_eq!(body.peak_impact_speed, 0.0);
        assert_eq!(body.velocity, Vec3::new(100.0, 200.0, 0.0));
    }

    #[test]
    fn horizontal_impulse_keeps_grounded() {
        let mut body = PhysicsBody::resting_at(Vec3::ZERO);
        body.apply_impulse(Vec3::new(50.0, 0.0, 0.0));
        assert!(body.grounded);
        body.apply_impulse(Vec3::new(0.0, 10.0, 0.0));
        assert!(!body.grounded);
    }

    #[test]
    fn height_is_clamped_at_floor() {
        let mut body = PhysicsBody::resting_at(Vec3::new(0.0, 30.0, 0.0));
        assert_eq!(body.height_above(10.0), 20.0);
        body.rest_on_floor(50.0);
        assert_eq!(body.height_above(50.0), 0.0);
        assert!(body.grounded);
    }
}
