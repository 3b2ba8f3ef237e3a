//! Skeletal pose evaluation.
//!
//! Runs last in the tick. The current state's pose function produces
//! [`PoseParameters`]; squash, facing and drag spin are layered on top and the
//! result is composed down the part hierarchy into a [`RigPose`]:
//!
//! ```text
//! root  = T(position + sway/bob/shift) · Rz(rotation + spin) · Rx(pitch) · S(facing, 1, 1)
//! chain = parent_chain · T(offset ⊙ squash) · R(part angle)
//! world = chain · S(squash)
//! ```
//!
//! Parts without a parent (Body, legs) hang off the root directly. Squash is
//! applied in each part's own frame, so rotated limbs never shear.

use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};

use crate::components::animation::AnimationPlayer;
use crate::components::bodypart::BodyPart;
use crate::components::dragsession::DragSession;
use crate::components::facing::FacingDirection;
use crate::components::physicsbody::PhysicsBody;
use crate::components::pose::{PartTransform, PoseInput, PoseParameters, RigPose};
use crate::components::squash::Squash;
use crate::resources::companionconfig::CompanionConfig;
use crate::resources::viewport::Viewport;

/// Faintest contact shadow while airborne.
const MIN_SHADOW: f32 = 0.25;

/// Pose parameters of the current state with squash applied.
pub fn evaluate_pose(input: &PoseInput, squash: &Squash) -> PoseParameters {
    let mut params = (input.state.spec().pose)(input);
    let (sx, sy) = squash.scale_factors();
    params.scale_x *= sx;
    params.scale_y *= sy;
    params.settle_progress = input.settle_progress;
    params
}

/// Local rotation of a part about its pivot.
fn part_rotation(part: BodyPart, params: &PoseParameters) -> Quat {
    let (leg_left, leg_right) = params.leg_angles();
    let (arm_left, arm_right) = params.arm_angles();
    let angle = match part {
        BodyPart::Head => params.head_tilt,
        BodyPart::ArmLeft => arm_left,
        BodyPart::ArmRight => arm_right,
        BodyPart::LegLeft => leg_left,
        BodyPart::LegRight => leg_right,
        _ => 0.0,
    };
    Quat::from_rotation_z(angle)
}

/// Compose the full rig from pose parameters and the body's placement.
pub fn compose_pose(
    params: PoseParameters,
    position: Vec3,
    facing: FacingDirection,
    spin: f32,
    shadow_intensity: f32,
) -> RigPose {
    let squash = Vec3::new(params.scale_x, params.scale_y, 1.0);
    let root = PartTransform::from_translation(
        position + Vec3::new(params.body_sway, params.body_bob - params.pivot_shift, 0.0),
    )
    .with_rotation(Quat::from_rotation_z(params.rotation + spin) * Quat::from_rotation_x(params.pitch))
    .with_scale(Vec3::new(facing.sign(), 1.0, 1.0));
    let root_matrix = root.to_matrix();
    let shape_scale = Mat4::from_scale(squash);

    let mut pose = RigPose {
        params,
        root,
        shadow_intensity,
        ..Default::default()
    };
    // Pivots are placed through the unscaled chain; squash only reaches them
    // through the scaled offsets and is applied to each shape last.
    let mut rigid = [Mat4::IDENTITY; 9];
    for part in BodyPart::ALL {
        let local = PartTransform::from_translation(part.def().offset * squash)
            .with_rotation(part_rotation(part, &params));
        let parent = part.parent().map_or(root_matrix, |parent| rigid[parent.index()]);
        rigid[part.index()] = parent * local.to_matrix();
        pose.local[part.index()] = local;
        pose.world[part.index()] = rigid[part.index()] * shape_scale;
    }
    pose
}

/// Idle rest pose at `position`, used before the first tick.
pub fn compose_rest_pose(position: Vec3, facing: FacingDirection) -> RigPose {
    let input = PoseInput::at_rest(crate::components::animation::AnimationState::Idle);
    compose_pose(evaluate_pose(&input, &Squash::default()), position, facing, 0.0, 1.0)
}

/// Contact shadow strength: full on the floor, fading with height.
pub fn shadow_intensity(body: &PhysicsBody, floor_y: f32, fade_height: f32) -> f32 {
    if body.grounded || fade_height <= 0.0 {
        return 1.0;
    }
    (1.0 - body.height_above(floor_y) / fade_height).clamp(MIN_SHADOW, 1.0)
}

pub fn pose_system(
    config: Res<CompanionConfig>,
    viewport: Res<Viewport>,
    mut companions: Query<(
        &AnimationPlayer,
        &PhysicsBody,
        &FacingDirection,
        &Squash,
        Option<&DragSession>,
        &mut RigPose,
    )>,
) {
    for (player, body, facing, squash, drag, mut pose) in companions.iter_mut() {
        let input = PoseInput {
            state: player.current,
            phase: player.phase,
            time_in_state: player.time_in_state,
            settle_progress: player.settle_progress,
            velocity: body.velocity,
            grounded: body.grounded,
        };
        let spin = drag
            .filter(|session| session.is_drag && !session.grabbed_part.is_torso())
            .map_or(0.0, |session| session.spin);
        let shadow = shadow_intensity(body, viewport.floor_y, config.shadow_fade_height);
        *pose = compose_pose(evaluate_pose(&input, squash), body.position, *facing, spin, shadow);
    }
}
