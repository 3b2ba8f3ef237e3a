use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

/// Which way the companion looks. Mirrors the rig horizontally when `Left`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FacingDirection {
    Left,
    #[default]
    Right,
}

impl FacingDirection {
    /// +1 for right, -1 for left.
    pub fn sign(self) -> f32 {
        match self {
            FacingDirection::Left => -1.0,
            FacingDirection::Right => 1.0,
        }
    }

    /// Direction implied by horizontal motion, ignoring jitter under `deadzone`.
    pub fn from_motion(dx: f32, deadzone: f32) -> Option<Self> {
        if dx > deadzone {
            Some(FacingDirection::Right)
        } else if dx < -deadzone {
            Some(FacingDirection::Left)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_outside_deadzone_sets_direction() {
        assert_eq!(FacingDirection::from_motion(3.0, 1.0), Some(FacingDirection::Right));
        assert_eq!(FacingDirection::from_motion(-3.0, 1.0), Some(FacingDirection::Left));
        assert_eq!(FacingDirection::from_motion(0.5, 1.0), None);
        assert_eq!(FacingDirection::Left.sign(), -1.0);
    }
}
