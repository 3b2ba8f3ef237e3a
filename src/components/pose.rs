//! Pose data: per-state parameters and the composed per-part transforms.
//!
//! A pose is evaluated in two stages. A state's pose function turns the
//! animation phase into [`PoseParameters`]. The parameters are then composed
//! over the static hierarchy into a [`RigPose`]: one local and one world
//! matrix per part. Every transform goes through [`PartTransform::to_matrix`],
//! which applies scale, then rotation, then translation.

use bevy_ecs::prelude::Component;
use glam::{Mat4, Quat, Vec2, Vec3};

use super::animation::AnimationState;
use super::bodypart::{BodyPart, PartShape};

/// Extra hit margin around part shapes, in part-local pixels.
pub const HIT_PADDING: f32 = 3.0;

/// Whether paired limbs mirror each other or move in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gait {
    #[default]
    Alternating,
    Together,
}

/// Interpolation curves used by settling and one-shot poses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicOut,
}

impl Easing {
    /// Map linear `t` in [0, 1] through the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicOut => {
                let p = t - 1.0;
                p * p * p + 1.0
            }
        }
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Output of a state's pose function.
///
/// Angles are radians, offsets pixels. Positive `pivot_shift` lowers the rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseParameters {
    pub body_sway: f32,
    pub body_bob: f32,
    pub leg_swing: f32,
    pub arm_swing: f32,
    pub leg_gait: Gait,
    pub arm_gait: Gait,
    /// Per-arm extra angle `[left, right]`. Negative raises the left arm
    /// outward, positive raises the right one.
    pub arm_lift: [f32; 2],
    pub head_tilt: f32,
    /// Roll about the root pivot.
    pub rotation: f32,
    /// Forward fall about the root pivot.
    pub pitch: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub pivot_shift: f32,
    pub settle_progress: f32,
}

impl Default for PoseParameters {
    fn default() -> Self {
        Self {
            body_sway: 0.0,
            body_bob: 0.0,
            leg_swing: 0.0,
            arm_swing: 0.0,
            leg_gait: Gait::Alternating,
            arm_gait: Gait::Alternating,
            arm_lift: [0.0, 0.0],
            head_tilt: 0.0,
            rotation: 0.0,
            pitch: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            pivot_shift: 0.0,
            settle_progress: 0.0,
        }
    }
}

impl PoseParameters {
    /// `(left, right)` leg angles.
    pub fn leg_angles(&self) -> (f32, f32) {
        match self.leg_gait {
            Gait::Alternating => (self.leg_swing, -self.leg_swing),
            Gait::Together => (self.leg_swing, self.leg_swing),
        }
    }

    /// `(left, right)` arm angles including lift.
    pub fn arm_angles(&self) -> (f32, f32) {
        let (left, right) = match self.arm_gait {
            Gait::Alternating => (self.arm_swing, -self.arm_swing),
            Gait::Together => (self.arm_swing, self.arm_swing),
        };
        (left + self.arm_lift[0], right + self.arm_lift[1])
    }
}

/// Everything a pose function may read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseInput {
    pub state: AnimationState,
    /// Cycle phase in [0, 1).
    pub phase: f32,
    pub time_in_state: f32,
    pub settle_progress: f32,
    pub velocity: Vec3,
    pub grounded: bool,
}

impl PoseInput {
    pub fn at_rest(state: AnimationState) -> Self {
        Self {
            state,
            phase: 0.0,
            time_in_state: 0.0,
            settle_progress: 0.0,
            velocity: Vec3::ZERO,
            grounded: true,
        }
    }
}

pub type PoseFn = fn(&PoseInput) -> PoseParameters;

/// Scale, rotation and translation of one part relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for PartTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PartTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Scale first, then rotate, then translate.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// In-plane rotation angle, assuming rotation about z only.
    pub fn roll(&self) -> f32 {
        let (axis, angle) = self.rotation.to_axis_angle();
        if axis.z < 0.0 { -angle } else { angle }
    }
}

/// Composed pose of the whole rig for the current tick.
///
/// `local[i]` is relative to the parent of part `i` (or to the root for
/// top-level parts); `world[i]` maps part-local pixels to world pixels.
#[derive(Component, Debug, Clone)]
pub struct RigPose {
    pub params: PoseParameters,
    pub root: PartTransform,
    pub local: [PartTransform; 9],
    pub world: [Mat4; 9],
    /// Shadow strength handed to the renderer: 1 grounded, fading with height.
    pub shadow_intensity: f32,
}

impl Default for RigPose {
    fn default() -> Self {
        Self {
            params: PoseParameters::default(),
            root: PartTransform::IDENTITY,
            local: [PartTransform::IDENTITY; 9],
            world: [Mat4::IDENTITY; 9],
            shadow_intensity: 1.0,
        }
    }
}

impl RigPose {
    pub fn part_local(&self, part: BodyPart) -> &PartTransform {
        &self.local[part.index()]
    }

    pub fn part_matrix(&self, part: BodyPart) -> Mat4 {
        self.world[part.index()]
    }

    /// World position of a part's pivot.
    pub fn pivot_world(&self, part: BodyPart) -> Vec3 {
        self.world[part.index()].transform_point3(Vec3::ZERO)
    }

    /// World position of a part's shape centre.
    pub fn center_world(&self, part: BodyPart) -> Vec3 {
        self.world[part.index()].transform_point3(part.def().center)
    }

    /// Topmost part under a world-space point, if any.
    pub fn hit_test(&self, point: Vec2) -> Option<BodyPart> {
        BodyPart::HIT_ORDER
            .into_iter()
            .find(|&part| self.contains(part, point))
    }

    fn contains(&self, part: BodyPart, point: Vec2) -> bool {
        let def = part.def();
        let matrix = self.world[part.index()];
        if matrix.determinant().abs() <= f32::EPSILON {
            return false;
        }
        let depth = matrix.transform_point3(def.center).z;
        let local = matrix
            .inverse()
            .transform_point3(Vec3::new(point.x, point.y, depth));
        let d = local - def.center;
        match def.shape {
            PartShape::Box { half_extents } => {
                d.x.abs() <= half_extents.x + HIT_PADDING && d.y.abs() <= half_extents.y + HIT_PADDING
            }
            PartShape::Sphere { radius } => Vec2::new(d.x, d.y).length() <= radius + HIT_PADDING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-4;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn matrix_scales_before_rotating() {
        let t = PartTransform::from_translation(Vec3::new(10.0, 0.0, 0.0))
            .with_rotation(Quat::from_rotation_z(FRAC_PI_2))
            .with_scale(Vec3::new(2.0, 1.0, 1.0));
        // x is scaled to 2, then rotated onto y, then translated.
        let p = t.to_matrix().transform_point3(Vec3::X);
        assert!(vec_approx_eq(p, Vec3::new(10.0, 2.0, 0.0)), "{p:?}");
    }

    #[test]
    fn gait_controls_limb_pairing() {
        let mut params = PoseParameters {
            leg_swing: 0.3,
            arm_swing: 0.2,
            ..Default::default()
        };
        assert_eq!(params.leg_angles(), (0.3, -0.3));
        params.leg_gait = Gait::Together;
        assert_eq!(params.leg_angles(), (0.3, 0.3));
        params.arm_lift = [-1.0, 1.0];
        assert_eq!(params.arm_angles(), (-0.8, 0.8));
    }

    #[test]
    fn roll_reads_signed_angle() {
        let t = PartTransform::IDENTITY.with_rotation(Quat::from_rotation_z(-0.4));
        assert!((t.roll() + 0.4).abs() < EPSILON);
    }

    #[test]
    fn easing_endpoints() {
        for easing in [Easing::Linear, Easing::QuadIn, Easing::QuadOut, Easing::QuadInOut, Easing::CubicOut] {
            assert!(easing.apply(0.0).abs() < EPSILON);
            assert!((easing.apply(1.0) - 1.0).abs() < EPSILON);
            assert!((easing.apply(2.0) - 1.0).abs() < EPSILON);
        }
    }
}
