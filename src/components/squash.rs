//! Transient squash/stretch factor.
//!
//! Purely visual: impacts set it, it decays geometrically every tick and the
//! pose evaluator folds it into the root scale. Physics never reads it.

use bevy_ecs::prelude::Component;

/// Below this the factor snaps to zero.
const SQUASH_EPSILON: f32 = 0.005;

/// Squash amounts in [0, 1). `vertical` flattens (floor impacts),
/// `horizontal` narrows (wall impacts).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Squash {
    pub vertical: f32,
    pub horizontal: f32,
}

impl Squash {
    /// Register a floor impact. Stronger impacts override weaker residue.
    pub fn floor_impact(&mut self, impact_speed: f32, per_speed: f32, max: f32) {
        self.vertical = self.vertical.max((impact_speed * per_speed).min(max));
    }

    pub fn wall_impact(&mut self, impact_speed: f32, per_speed: f32, max: f32) {
        self.horizontal = self.horizontal.max((impact_speed * per_speed).min(max));
    }

    /// Multiply both factors by `retain` (0..1).
    pub fn decay(&mut self, retain: f32) {
        let retain = retain.clamp(0.0, 1.0);
        self.vertical *= retain;
        self.horizontal *= retain;
        if self.vertical < SQUASH_EPSILON {
            self.vertical = 0.0;
        }
        if self.horizontal < SQUASH_EPSILON {
            self.horizontal = 0.0;
        }
    }

    /// `(scale_x, scale_y)` multipliers.
    pub fn scale_factors(&self) -> (f32, f32) {
        (
            (1.0 + self.vertical) * (1.0 - self.horizontal),
            (1.0 - self.vertical) * (1.0 + self.horizontal),
        )
    }

    pub fn is_active(&self) -> bool {
        self.vertical > 0.0 || self.horizontal > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_is_clamped_and_decays_to_zero() {
        let mut squash = Squash::default();
        squash.floor_impact(10_000.0, 1.0 / 4000.0, 0.35);
        assert_eq!(squash.vertical, 0.35);
        let (sx, sy) = squash.scale_factors();
        assert!(sx > 1.0 && sy < 1.0);
        for _ in 0..20 {
            squash.decay(0.6);
        }
        assert!(!squash.is_active());
        assert_eq!(squash.scale_factors(), (1.0, 1.0));
    }

    #[test]
    fn weaker_impact_keeps_stronger_residue() {
        let mut squash = Squash::default();
        squash.floor_impact(1000.0, 1.0 / 4000.0, 0.35);
        squash.floor_impact(100.0, 1.0 / 4000.0, 0.35);
        assert_eq!(squash.vertical, 0.25);
    }
}
