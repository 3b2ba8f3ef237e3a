//! Per-state pose functions.
//!
//! Each function maps a [`PoseInput`] to [`PoseParameters`] and is referenced
//! from the state's [`StateSpec`](crate::components::animation::StateSpec).
//! Phase is the cycle position in [0, 1); settling states read
//! `settle_progress` instead so the fall is monotonic.
//!
//! Arm angle convention: negative raises the left arm outward, positive the
//! right one. A hanging arm at angle ±π points straight up.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::components::pose::{Easing, Gait, PoseInput, PoseParameters, lerp};

/// Walking leg amplitude, radians.
pub const WALK_LEG_AMPLITUDE: f32 = 0.52;
const WALK_BOB: f32 = 4.0;

/// Resting side pose reached by TippingOverSide.
const SIDE_SCALE_X: f32 = 1.3;
const SIDE_SCALE_Y: f32 = 0.55;
const SIDE_PIVOT_SHIFT: f32 = 6.0;
/// Resting face-down pose reached by FallingOnFace.
const FACE_PITCH: f32 = FRAC_PI_2 * 0.9;
const FACE_SCALE_Y: f32 = 0.8;
const FACE_PIVOT_SHIFT: f32 = 4.0;

fn wave(phase: f32) -> f32 {
    (TAU * phase).sin()
}

pub fn idle(input: &PoseInput) -> PoseParameters {
    PoseParameters {
        body_bob: 1.5 * wave(input.phase),
        arm_swing: 0.04 * wave(input.phase),
        head_tilt: 0.03 * wave(input.phase * 0.5),
        ..Default::default()
    }
}

pub fn walking(input: &PoseInput) -> PoseParameters {
    let leg_swing = WALK_LEG_AMPLITUDE * wave(input.phase);
    PoseParameters {
        leg_swing,
        arm_swing: -leg_swing,
        leg_gait: Gait::Alternating,
        arm_gait: Gait::Alternating,
        body_bob: WALK_BOB * wave(input.phase).abs(),
        ..Default::default()
    }
}

/// One hop per cycle: crouch, push off, tuck both legs, land.
pub fn jumping(input: &PoseInput) -> PoseParameters {
    let arc = (PI * input.phase).sin();
    PoseParameters {
        body_bob: 30.0 * arc,
        leg_swing: -0.35 * arc,
        leg_gait: Gait::Together,
        arm_swing: 0.6 * arc,
        arm_gait: Gait::Together,
        arm_lift: [-0.8 * arc, 0.8 * arc],
        ..Default::default()
    }
}

pub fn celebrating(input: &PoseInput) -> PoseParameters {
    let beat = wave(input.phase);
    PoseParameters {
        body_bob: 6.0 * beat.abs(),
        arm_lift: [-2.6 + 0.25 * beat, 2.6 - 0.25 * beat],
        leg_swing: 0.12 * beat,
        head_tilt: 0.08 * beat,
        ..Default::default()
    }
}

pub fn waving(input: &PoseInput) -> PoseParameters {
    PoseParameters {
        arm_lift: [0.0, 2.6 + 0.35 * wave(input.phase)],
        head_tilt: -0.06,
        body_sway: 1.0 * wave(input.phase),
        ..Default::default()
    }
}

pub fn eating(input: &PoseInput) -> PoseParameters {
    let chew = wave(input.phase);
    PoseParameters {
        arm_lift: [1.3 + 0.1 * chew, -1.3 - 0.1 * chew],
        head_tilt: 0.08 * chew,
        body_bob: 0.8 * chew,
        ..Default::default()
    }
}

pub fn sleeping(input: &PoseInput) -> PoseParameters {
    PoseParameters {
        body_bob: 1.0 * wave(input.phase),
        head_tilt: 0.35,
        scale_y: 0.96,
        arm_lift: [0.2, -0.2],
        ..Default::default()
    }
}

pub fn working_at_desk(input: &PoseInput) -> PoseParameters {
    PoseParameters {
        arm_swing: 0.25 * wave(input.phase),
        arm_gait: Gait::Alternating,
        arm_lift: [0.9, -0.9],
        head_tilt: -0.1,
        ..Default::default()
    }
}

fn side_pose(s: f32) -> PoseParameters {
    PoseParameters {
        scale_x: lerp(1.0, SIDE_SCALE_X, s),
        scale_y: lerp(1.0, SIDE_SCALE_Y, s),
        pivot_shift: lerp(0.0, SIDE_PIVOT_SHIFT, s),
        leg_swing: 0.4 * s,
        leg_gait: Gait::Together,
        settle_progress: s,
        ..Default::default()
    }
}

fn face_pose(s: f32) -> PoseParameters {
    PoseParameters {
        pitch: FACE_PITCH * s,
        scale_y: lerp(1.0, FACE_SCALE_Y, s),
        pivot_shift: lerp(0.0, FACE_PIVOT_SHIFT, s),
        arm_lift: [-1.4 * s, 1.4 * s],
        settle_progress: s,
        ..Default::default()
    }
}

pub fn laying_on_side(input: &PoseInput) -> PoseParameters {
    let mut params = side_pose(1.0);
    params.body_bob = 0.6 * wave(input.phase);
    params
}

pub fn laying_on_face(input: &PoseInput) -> PoseParameters {
    let mut params = face_pose(1.0);
    params.leg_swing = 0.1 * wave(input.phase);
    params
}

/// Leans over and flattens into the side pose.
pub fn tipping_over_side(input: &PoseInput) -> PoseParameters {
    let s = Easing::QuadInOut.apply(input.settle_progress);
    let mut params = side_pose(s);
    params.rotation = -(PI * s).sin() * 0.45;
    params.arm_swing = 0.6 * (PI * s).sin();
    params.settle_progress = input.settle_progress;
    params
}

/// Pitches forward onto the face.
pub fn falling_on_face(input: &PoseInput) -> PoseParameters {
    let s = Easing::QuadIn.apply(input.settle_progress);
    let mut params = face_pose(s);
    params.settle_progress = input.settle_progress;
    params
}

/// Torso dragged along the floor: lean back against the motion, legs trailing.
pub fn being_dragged_on_ground(input: &PoseInput) -> PoseParameters {
    let vx = input.velocity.x;
    PoseParameters {
        body_sway: -(vx * 0.01).clamp(-8.0, 8.0),
        rotation: (vx * 0.0004).clamp(-0.35, 0.35),
        leg_swing: 0.3 + 0.1 * wave(input.phase),
        leg_gait: Gait::Together,
        arm_lift: [-1.0, 1.0],
        ..Default::default()
    }
}

/// Held by a limb, ear or head: limbs hang and kick a little.
pub fn dangling(input: &PoseInput) -> PoseParameters {
    let kick = wave(input.phase);
    PoseParameters {
        leg_swing: 0.15 * kick,
        leg_gait: Gait::Alternating,
        arm_swing: 0.2 * kick,
        arm_gait: Gait::Together,
        head_tilt: 0.1 * kick,
        ..Default::default()
    }
}

/// Flailing in flight, stretched along the vertical speed.
pub fn airborne(input: &PoseInput) -> PoseParameters {
    let stretch = (input.velocity.y.abs() / 4000.0).clamp(0.0, 0.12);
    PoseParameters {
        arm_swing: 0.5 * wave(input.phase),
        arm_gait: Gait::Alternating,
        arm_lift: [-1.2, 1.2],
        leg_swing: 0.4 * wave(input.phase),
        leg_gait: Gait::Alternating,
        scale_x: 1.0 - stretch * 0.5,
        scale_y: 1.0 + stretch,
        ..Default::default()
    }
}

/// Recoil with a decaying shake.
pub fn taking_damage(input: &PoseInput) -> PoseParameters {
    let t = input.time_in_state;
    let shake = (-6.0 * t).exp() * (30.0 * t).sin();
    PoseParameters {
        rotation: 0.2 * shake,
        body_sway: 4.0 * shake,
        head_tilt: -0.2 * (-4.0 * t).exp(),
        scale_x: 1.0 + 0.06 * shake.abs(),
        scale_y: 1.0 - 0.06 * shake.abs(),
        arm_lift: [0.8, -0.8],
        ..Default::default()
    }
}

pub fn happy_bounce(input: &PoseInput) -> PoseParameters {
    let beat = wave(input.phase);
    PoseParameters {
        body_bob: 8.0 * beat.abs(),
        arm_lift: [-0.6, 0.6],
        arm_swing: 0.2 * beat,
        arm_gait: Gait::Together,
        leg_swing: 0.1 * beat,
        leg_gait: Gait::Together,
        ..Default::default()
    }
}

pub fn sleepy_slow(input: &PoseInput) -> PoseParameters {
    PoseParameters {
        body_bob: 0.8 * wave(input.phase),
        head_tilt: 0.25 + 0.05 * wave(input.phase),
        scale_y: 0.98,
        ..Default::default()
    }
}

pub fn mischievous_grin(input: &PoseInput) -> PoseParameters {
    let sway = wave(input.phase);
    PoseParameters {
        body_sway: 3.0 * sway,
        head_tilt: 0.15 * sway,
        arm_lift: [0.4, -0.4],
        arm_swing: 0.1 * sway,
        ..Default::default()
    }
}

pub fn annoyed_grumpy(input: &PoseInput) -> PoseParameters {
    PoseParameters {
        arm_lift: [1.3, -1.3],
        head_tilt: -0.1,
        body_bob: -1.0,
        leg_swing: 0.15 * wave(input.phase).max(0.0),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::animation::AnimationState;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn input(state: AnimationState, phase: f32) -> PoseInput {
        PoseInput {
            phase,
            ..PoseInput::at_rest(state)
        }
    }

    #[test]
    fn walking_arms_oppose_legs() {
        for i in 0..20 {
            let phase = i as f32 / 20.0;
            let p = walking(&input(AnimationState::Walking, phase));
            assert!(approx_eq(p.leg_swing, WALK_LEG_AMPLITUDE * (TAU * phase).sin()));
            assert!(approx_eq(p.arm_swing, -p.leg_swing));
            let (left, right) = p.leg_angles();
            assert!(approx_eq(left, -right));
        }
    }

    #[test]
    fn jumping_legs_move_together() {
        for i in 0..20 {
            let p = jumping(&input(AnimationState::Jumping, i as f32 / 20.0));
            let (left, right) = p.leg_angles();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn side_pose_widens_flattens_and_drops() {
        let p = laying_on_side(&input(AnimationState::LayingOnSide, 0.0));
        assert!(p.scale_x > 1.0);
        assert!(p.scale_y < 1.0);
        assert!(p.pivot_shift > 0.0);
    }

    #[test]
    fn tipping_ends_in_side_pose() {
        let mut end = PoseInput::at_rest(AnimationState::TippingOverSide);
        end.settle_progress = 1.0;
        let p = tipping_over_side(&end);
        let rest = laying_on_side(&input(AnimationState::LayingOnSide, 0.0));
        assert!(approx_eq(p.scale_x, rest.scale_x));
        assert!(approx_eq(p.scale_y, rest.scale_y));
        assert!(approx_eq(p.pivot_shift, rest.pivot_shift));
        assert!(p.rotation.abs() < 1e-4);
    }

    #[test]
    fn falling_pitch_grows_with_settle() {
        let mut last = -1.0;
        for i in 0..=24 {
            let mut inp = PoseInput::at_rest(AnimationState::FallingOnFace);
            inp.settle_progress = i as f32 / 24.0;
            let p = falling_on_face(&inp);
            assert!(p.pitch >= last);
            last = p.pitch;
        }
        assert!(approx_eq(last, FACE_PITCH));
    }

    #[test]
    fn every_state_pose_is_finite() {
        for state in AnimationState::ALL {
            let spec = state.spec();
            for i in 0..10 {
                let mut inp = input(state, i as f32 / 10.0);
                inp.settle_progress = i as f32 / 9.0;
                inp.time_in_state = i as f32 * 0.1;
                let p = (spec.pose)(&inp);
                for v in [p.body_sway, p.body_bob, p.leg_swing, p.arm_swing, p.rotation, p.pitch, p.scale_x, p.scale_y] {
                    assert!(v.is_finite(), "{state} produced {v}");
                }
                assert!(p.scale_x > 0.0 && p.scale_y > 0.0);
            }
        }
    }
}
