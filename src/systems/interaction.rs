//! Pointer interaction: grab, drag, throw and click.
//!
//! These are registered systems run immediately by the facade for every
//! pointer event, with the sample already converted to world pixels.
//!
//! A press becomes a drag once the pointer path exceeds the drag threshold;
//! shorter presses are clicks on release. While dragged:
//! - torso parts (Body, Butt) carry the whole rig and may flip facing;
//! - any other part hangs the rig from its pivot, follow-the-leader style,
//!   and accumulates `spin` instead of changing facing.
//!
//! Releasing a drag throws the body with the pointer velocity measured over
//! the last few samples. Physics skips the body while a [`DragSession`] is
//! present.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use glam::{Vec2, Vec3};
use log::{debug, info};

use crate::components::animation::{AnimationPlayer, AnimationState};
use crate::components::bodypart::BodyPart;
use crate::components::dragsession::{DragSession, PointerSample, wrap_angle};
use crate::components::facing::FacingDirection;
use crate::components::mood::{Mood, MoodChangeReason, MoodState};
use crate::components::physicsbody::PhysicsBody;
use crate::components::pose::RigPose;
use crate::components::walktarget::WalkTarget;
use crate::events::notification::{ClickReaction, CompanionNotification};
use crate::events::pointer::ReleaseOutcome;
use crate::resources::companionconfig::CompanionConfig;
use crate::resources::frameclock::FrameClock;
use crate::resources::interactionstats::InteractionStats;
use crate::resources::rng::CompanionRng;
use crate::resources::viewport::Viewport;
use crate::resources::worldtime::WorldTime;
use crate::systems::statemachine::{TriggerRequest, announce, request_state};

/// Bodies within this height of the floor count as standing on it.
pub const GROUND_SNAP: f32 = 0.5;

/// Shared resources of the pointer systems.
#[derive(SystemParam)]
pub struct PointerContext<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub config: Res<'w, CompanionConfig>,
    pub clock: Res<'w, FrameClock>,
    pub viewport: Res<'w, Viewport>,
    pub time: Res<'w, WorldTime>,
    pub rng: ResMut<'w, CompanionRng>,
    pub stats: ResMut<'w, InteractionStats>,
    pub notes: MessageWriter<'w, CompanionNotification>,
}

/// Pointer pressed. Captures the companion when a part is under the pointer.
///
/// Refused during settling falls so they always play out.
pub fn pointer_down_system(
    In(sample): In<PointerSample>,
    mut commands: Commands,
    companions: Query<(Entity, &RigPose, &PhysicsBody, &AnimationPlayer), Without<DragSession>>,
    mut stats: ResMut<InteractionStats>,
) -> bool {
    let Ok((entity, pose, body, player)) = companions.single() else {
        return false;
    };
    if player.current.is_settling() {
        debug!("pointer down ignored while {}", player.current);
        return false;
    }
    let Some(part) = pose.hit_test(sample.position) else {
        return false;
    };
    stats.record_grab(part);
    commands
        .entity(entity)
        .insert(DragSession::new(part, sample, body.position));
    debug!("grabbed {} at ({:.1}, {:.1})", part, sample.position.x, sample.position.y);
    true
}

/// Pointer moved while captured. Returns `false` if nothing is captured.
pub fn pointer_move_system(
    In(sample): In<PointerSample>,
    mut ctx: PointerContext,
    mut companions: Query<(
        Entity,
        &mut DragSession,
        &mut PhysicsBody,
        &mut FacingDirection,
        &mut AnimationPlayer,
    )>,
) -> bool {
    let Ok((entity, mut session, mut body, mut facing, mut player)) = companions.single_mut() else {
        return false;
    };
    let became_drag = session.record(sample, ctx.config.drag_threshold_px);
    if !session.is_drag {
        return true;
    }

    let velocity = session
        .samples
        .recent_velocity(ctx.config.throw_samples, ctx.config.throw_window_secs);
    session.speed_px_per_tick = velocity.length() * ctx.clock.nominal_dt();

    if became_drag {
        let part = session.grabbed_part;
        body.velocity = Vec3::ZERO;
        ctx.stats.drags += 1;
        ctx.notes.write(CompanionNotification::DragStarted { part });
        if !part.is_torso() && !player.current.is_settling() {
            let transition = player.enter(AnimationState::Dangling, None);
            announce(&mut ctx.commands, &mut ctx.notes, entity, transition);
        }
    }

    let floor = ctx.viewport.floor_y;
    if session.drives_facing() {
        let delta = sample.position - session.grab_point;
        body.position.x = ctx.viewport.clamp_x(session.root_at_grab.x + delta.x);
        body.position.y = (session.root_at_grab.y + delta.y).max(floor);
        if let Some(direction) = FacingDirection::from_motion(session.last_dx(), ctx.config.facing_deadzone_px) {
            if *facing != direction {
                *facing = direction;
            }
        }
    } else {
        hang_from_pivot(&mut session, &mut body, *facing, sample.position, &ctx.viewport);
    }
    body.grounded = body.position.y <= floor + GROUND_SNAP;
    true
}

/// Move the root so the grabbed part's pivot sits under the pointer, keeping
/// the pivot-to-root distance and rotating the rig toward the pointer.
fn hang_from_pivot(
    session: &mut DragSession,
    body: &mut PhysicsBody,
    facing: FacingDirection,
    pointer: Vec2,
    viewport: &Viewport,
) {
    let offset = pivot_offset(session.grabbed_part, facing);
    let length = offset.length();
    let rest_heading = offset.y.atan2(offset.x);

    let root = Vec2::new(body.position.x, body.position.y);
    let to_pointer = pointer - root;
    if to_pointer.length_squared() <= f32::EPSILON {
        return;
    }
    let heading = to_pointer.y.atan2(to_pointer.x);
    session.update_spin(wrap_angle(heading - rest_heading));

    let new_root = pointer - to_pointer.normalize() * length;
    body.position.x = viewport.clamp_x(new_root.x);
    body.position.y = new_root.y.max(viewport.floor_y);
}

/// Rest pivot of `part` relative to the root, mirrored for facing.
pub fn pivot_offset(part: BodyPart, facing: FacingDirection) -> Vec2 {
    part.rest_pivot_2d() * Vec2::new(facing.sign(), 1.0)
}

/// Pointer released. Ends the capture as a throw or a click.
pub fn pointer_up_system(
    In(sample): In<PointerSample>,
    mut ctx: PointerContext,
    mut companions: Query<(
        Entity,
        &mut DragSession,
        &mut PhysicsBody,
        &mut AnimationPlayer,
        &mut MoodState,
        Has<WalkTarget>,
    )>,
) -> ReleaseOutcome {
    let Ok((entity, mut session, mut body, mut player, mut mood, walking)) = companions.single_mut() else {
        return ReleaseOutcome::NotCaptured;
    };
    session.record(sample, ctx.config.drag_threshold_px);
    ctx.commands.entity(entity).remove::<DragSession>();
    let now = ctx.time.elapsed;

    if let Some(change) = mood.register_interaction(now, &mut ctx.rng.0) {
        ctx.notes.write(change.into());
    }

    if session.is_drag {
        let velocity = session
            .samples
            .recent_velocity(ctx.config.throw_samples, ctx.config.throw_window_secs)
            .clamp_length_max(ctx.config.max_throw_speed);
        release(&mut ctx, entity, &mut body, &mut player, velocity);
        ctx.stats.throws += 1;
        ctx.notes.write(CompanionNotification::Thrown {
            velocity: [velocity.x, velocity.y],
        });
        debug!("released {} at {:.0} px/s", session.grabbed_part, velocity.length());
        return ReleaseOutcome::Thrown { velocity };
    }

    let part = session.grabbed_part;
    let reaction = if part.is_pettable() {
        ClickReaction::Pet
    } else {
        ClickReaction::Poke
    };
    match reaction {
        ClickReaction::Pet => ctx.stats.pets += 1,
        ClickReaction::Poke => ctx.stats.pokes += 1,
    }
    let streak = ctx.stats.record_click(sample.time, ctx.config.click_streak_gap_secs);
    ctx.notes.write(CompanionNotification::Clicked { part, reaction });

    let response = if streak >= ctx.config.rage_click_threshold {
        info!("{} clicks in a row, companion is annoyed", streak);
        ctx.stats.click_streak = 0;
        if let Some(change) = mood.set(Mood::Annoyed, MoodChangeReason::TooManyInteractions, now, &mut ctx.rng.0) {
            ctx.notes.write(change.into());
        }
        AnimationState::AnnoyedGrumpy
    } else {
        match reaction {
            ClickReaction::Pet => AnimationState::HappyBounce,
            ClickReaction::Poke => AnimationState::Waving,
        }
    };
    let request = TriggerRequest {
        state: response,
        duration_ticks: None,
    };
    if let Err(err) = request_state(&mut ctx.commands, &mut ctx.notes, entity, &mut player, walking, request) {
        debug!("click reaction skipped: {}", err);
    }
    ReleaseOutcome::Clicked { part, reaction }
}

/// Hand the release velocity to physics and pick the follow-up state.
fn release(
    ctx: &mut PointerContext,
    entity: Entity,
    body: &mut PhysicsBody,
    player: &mut AnimationPlayer,
    velocity: Vec2,
) {
    let floor = ctx.viewport.floor_y;
    let on_floor = body.position.y <= floor + GROUND_SNAP && velocity.y <= 0.0;
    let next = if on_floor {
        body.rest_on_floor(floor);
        body.velocity = Vec3::new(velocity.x, 0.0, 0.0);
        player.current.is_internal().then_some(AnimationState::Idle)
    } else {
        body.launch(velocity.extend(0.0));
        (!player.current.is_settling()).then_some(AnimationState::Airborne)
    };
    if let Some(state) = next.filter(|&state| state != player.current) {
        let transition = player.enter(state, None);
        announce(&mut ctx.commands, &mut ctx.notes, entity, transition);
    }
}
