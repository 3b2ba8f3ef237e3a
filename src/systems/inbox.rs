//! Resolution of external [`CompanionEvent`]s.
//!
//! Events come from the cross-thread [`EventInbox`] (drained at the start of
//! every tick by [`drain_event_inbox`]) or from `Companion::apply_event`
//! (run immediately through [`apply_event_system`]). Both paths end in
//! [`resolve_event`], which turns the event into an animation trigger plus
//! its side effects.
//!
//! Triggers from events obey the same interruptibility rules as host
//! triggers: an event arriving during a settling fall only applies its side
//! effects (mood, knockback) and is otherwise dropped.
//!
//! Scene items live on their own entities and are found through the
//! [`ItemRegistry`]. Interacting with an item needs the matching reaction to
//! be accepted; a rejected reaction leaves the item untouched.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use glam::Vec3;
use log::{debug, info};

use crate::components::animation::{AnimationPlayer, AnimationState};
use crate::components::dragsession::DragSession;
use crate::components::facing::FacingDirection;
use crate::components::mood::{FocusChange, MoodChangeReason, MoodState};
use crate::components::palette::RigPalette;
use crate::components::physicsbody::PhysicsBody;
use crate::components::sceneitem::{Consumed, SceneItem};
use crate::components::walktarget::WalkTarget;
use crate::events::companion::CompanionEvent;
use crate::events::notification::CompanionNotification;
use crate::resources::companionconfig::CompanionConfig;
use crate::resources::eventinbox::EventInbox;
use crate::resources::interactionstats::InteractionStats;
use crate::resources::itemregistry::ItemRegistry;
use crate::resources::rng::CompanionRng;
use crate::resources::viewport::Viewport;
use crate::resources::worldtime::WorldTime;
use crate::systems::interaction::GROUND_SNAP;
use crate::systems::statemachine::{TriggerRequest, announce, request_state};

/// Height ratio above which a collision counts as a head hit.
const HEAD_HIT_RATIO: f32 = 0.7;
/// Height ratio below which a collision counts as hitting the feet.
const FEET_HIT_RATIO: f32 = 0.3;
/// Collisions harder than this always hurt.
const HARD_HIT_INTENSITY: f32 = 0.8;
/// Distance from an item at which a walk toward it stops, pixels.
pub const ITEM_REACH: f32 = 30.0;
/// Time from the first bite until food disappears, seconds.
pub const ITEM_EAT_SECS: f32 = 1.0;
const TOY_KICK_SPEED: f32 = 260.0;
const TOY_KICK_HOP: f32 = 420.0;

/// Everything event resolution touches.
#[derive(SystemParam)]
pub struct EventContext<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub companions: Query<
        'w,
        's,
        (
            Entity,
            &'static mut AnimationPlayer,
            &'static mut PhysicsBody,
            &'static mut MoodState,
            &'static FacingDirection,
            &'static mut RigPalette,
            Has<DragSession>,
            Has<WalkTarget>,
        ),
    >,
    pub items: Query<
        'w,
        's,
        (&'static SceneItem, &'static mut PhysicsBody, Has<Consumed>),
        Without<AnimationPlayer>,
    >,
    pub registry: ResMut<'w, ItemRegistry>,
    pub config: Res<'w, CompanionConfig>,
    pub time: Res<'w, WorldTime>,
    pub viewport: Res<'w, Viewport>,
    pub rng: ResMut<'w, CompanionRng>,
    pub stats: ResMut<'w, InteractionStats>,
    pub notes: MessageWriter<'w, CompanionNotification>,
}

/// Apply one event. Returns `true` when it had any effect.
pub fn resolve_event(ctx: &mut EventContext, event: CompanionEvent) -> bool {
    let Ok((entity, mut player, mut body, mut mood, facing, mut palette, dragged, walking)) =
        ctx.companions.single_mut()
    else {
        return false;
    };
    let now = ctx.time.elapsed;
    let rng = &mut ctx.rng.0;

    macro_rules! trigger {
        ($state:expr, $ticks:expr) => {
            try_trigger(&mut ctx.commands, &mut ctx.notes, entity, &mut player, walking, event, $state, $ticks)
        };
    }

    match event {
        CompanionEvent::Feed => {
            ctx.stats.feeds += 1;
            if let Some(change) = mood.register_interaction(now, rng) {
                ctx.notes.write(change.into());
            }
            let ticks = ctx.config.secs_to_ticks(ctx.config.feed_secs);
            trigger!(AnimationState::Eating, Some(ticks))
        }
        CompanionEvent::Pet => {
            ctx.stats.pets += 1;
            if let Some(change) = mood.register_interaction(now, rng) {
                ctx.notes.write(change.into());
            }
            trigger!(AnimationState::HappyBounce, None)
        }
        CompanionEvent::Damage { amount, source } => {
            let speed = (amount.max(0.0) * ctx.config.knockback_per_damage).min(ctx.config.max_knockback_speed);
            if !dragged && speed > 0.0 {
                let away = match source {
                    Some(source) if source.x != body.position.x => (body.position.x - source.x).signum(),
                    _ => -facing.sign(),
                };
                body.launch(Vec3::new(away * speed, ctx.config.knockback_hop, 0.0));
                debug!("knockback {:.0} px/s from {:.0} damage", away * speed, amount);
            }
            trigger!(AnimationState::TakingDamage, None)
        }
        CompanionEvent::Heal { amount } => {
            let ticks = ctx.config.secs_to_ticks(ctx.config.heal_step_secs);
            let accepted = trigger!(AnimationState::Eating, Some(ticks));
            if accepted {
                player.enqueue(AnimationState::Celebrating, Some(ticks));
                debug!("healed by {:.0}", amount);
            }
            accepted
        }
        CompanionEvent::SetMood(target) => {
            if let Some(change) = mood.set(target, MoodChangeReason::Forced, now, rng) {
                info!("mood forced {} -> {}", change.from, change.to);
                ctx.notes.write(change.into());
            }
            trigger!(target.variant(), None);
            true
        }
        CompanionEvent::AchievementUnlocked => {
            if let Some(change) = mood.quest_completed(now, rng) {
                ctx.notes.write(change.into());
            }
            trigger!(AnimationState::Celebrating, None);
            true
        }
        CompanionEvent::Collision {
            height_ratio,
            intensity,
        } => {
            let reaction = if intensity > HARD_HIT_INTENSITY {
                AnimationState::TakingDamage
            } else if height_ratio > HEAD_HIT_RATIO {
                AnimationState::Waving
            } else if height_ratio < FEET_HIT_RATIO {
                AnimationState::Jumping
            } else {
                AnimationState::TakingDamage
            };
            let accepted = trigger!(reaction, None);
            if accepted && reaction == AnimationState::TakingDamage && intensity <= HARD_HIT_INTENSITY {
                player.enqueue(AnimationState::Idle, None);
            }
            accepted
        }
        CompanionEvent::WalkTo { x, z } => {
            if dragged || !body.grounded {
                debug!("walk ignored while not standing");
                return false;
            }
            let target = WalkTarget::to(ctx.viewport.clamp_x(x), z);
            let accepted = trigger!(AnimationState::Walking, None);
            if accepted {
                ctx.commands.entity(entity).insert(target);
            }
            accepted
        }
        CompanionEvent::PlaceAt { position } => {
            if dragged {
                debug!("place ignored while dragged");
                return false;
            }
            let floor = ctx.viewport.floor_y;
            let position = Vec3::new(ctx.viewport.clamp_x(position.x), position.y.max(floor), position.z);
            body.place_at(position);
            let next = if position.y > floor + GROUND_SNAP {
                body.grounded = false;
                (!player.current.is_settling()).then_some(AnimationState::Airborne)
            } else {
                body.rest_on_floor(floor);
                player.current.is_internal().then_some(AnimationState::Idle)
            };
            if let Some(state) = next.filter(|&state| state != player.current) {
                let transition = player.enter(state, None);
                announce(&mut ctx.commands, &mut ctx.notes, entity, transition);
            }
            if walking {
                ctx.commands.entity(entity).remove::<WalkTarget>();
            }
            true
        }
        CompanionEvent::FocusLost | CompanionEvent::FocusGained => {
            let focus = if event == CompanionEvent::FocusLost {
                FocusChange::Lost
            } else {
                FocusChange::Gained
            };
            if let Some(change) = mood.focus_changed(focus, now, rng) {
                ctx.notes.write(change.into());
            }
            true
        }
        CompanionEvent::AddItem { kind, x, height } => {
            let id = ctx.registry.allocate();
            let floor = ctx.viewport.floor_y;
            let position = Vec3::new(ctx.viewport.clamp_x(x), floor + height.max(0.0), 0.0);
            let mut item_body = PhysicsBody::resting_at(position);
            if position.y > floor + GROUND_SNAP {
                item_body.launch(Vec3::ZERO);
            } else {
                item_body.rest_on_floor(floor);
            }
            let item = ctx.commands.spawn((SceneItem { id, kind }, item_body)).id();
            ctx.registry.insert(id, item);
            ctx.notes.write(CompanionNotification::ItemAdded { id, kind });
            info!("{} #{} dropped at ({:.0}, {:.0})", kind, id, position.x, position.y);
            true
        }
        CompanionEvent::WalkToItem { id } => {
            let Some(item_position) = ctx
                .registry
                .get(id)
                .and_then(|item| ctx.items.get(item).ok())
                .map(|(_, item_body, _)| item_body.position)
            else {
                debug!("walk to unknown item #{}", id);
                return false;
            };
            if dragged || !body.grounded {
                debug!("walk ignored while not standing");
                return false;
            }
            let side = if item_position.x >= body.position.x { -1.0 } else { 1.0 };
            let target = WalkTarget {
                x: ctx.viewport.clamp_x(item_position.x + side * ITEM_REACH),
                z: item_position.z,
                item: Some(id),
            };
            let accepted = trigger!(AnimationState::Walking, None);
            if accepted {
                ctx.commands.entity(entity).insert(target);
            }
            accepted
        }
        CompanionEvent::InteractItem { id } => {
            let Some(item_entity) = ctx.registry.get(id) else {
                debug!("interaction with unknown item #{}", id);
                return false;
            };
            let Ok((item, mut item_body, being_eaten)) = ctx.items.get_mut(item_entity) else {
                return false;
            };
            if being_eaten {
                return false;
            }
            if item.kind.is_food() {
                let ticks = ctx.config.secs_to_ticks(ctx.config.feed_secs);
                if !trigger!(AnimationState::Eating, Some(ticks)) {
                    return false;
                }
                ctx.stats.feeds += 1;
                if let Some(change) = mood.register_interaction(now, rng) {
                    ctx.notes.write(change.into());
                }
                ctx.commands.entity(item_entity).insert(Consumed {
                    remaining: ITEM_EAT_SECS,
                });
                debug!("eating {} #{}", item.kind, id);
            } else {
                if !trigger!(AnimationState::Jumping, None) {
                    return false;
                }
                ctx.stats.kicks += 1;
                let away = if item_body.position.x >= body.position.x { 1.0 } else { -1.0 };
                item_body.launch(Vec3::new(away * TOY_KICK_SPEED, TOY_KICK_HOP, 0.0));
                debug!("kicked {} #{}", item.kind, id);
            }
            true
        }
        CompanionEvent::RemoveItem { id } => match ctx.registry.remove(id) {
            Some(item) => {
                ctx.commands.entity(item).despawn();
                ctx.notes.write(CompanionNotification::ItemRemoved { id });
                true
            }
            None => false,
        },
        CompanionEvent::ClearItems => {
            let items = ctx.registry.drain();
            for &(id, item) in &items {
                ctx.commands.entity(item).despawn();
                ctx.notes.write(CompanionNotification::ItemRemoved { id });
            }
            !items.is_empty()
        }
        CompanionEvent::SetColor { slot, rgb } => {
            if !palette.set(slot, rgb) {
                return false;
            }
            info!("{} colour set to {:?}", slot, rgb);
            ctx.notes.write(CompanionNotification::ColorChanged { slot, rgb });
            true
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn try_trigger(
    commands: &mut Commands,
    notes: &mut MessageWriter<CompanionNotification>,
    entity: Entity,
    player: &mut AnimationPlayer,
    walking: bool,
    event: CompanionEvent,
    state: AnimationState,
    duration_ticks: Option<u32>,
) -> bool {
    let request = TriggerRequest { state, duration_ticks };
    match request_state(commands, notes, entity, player, walking, request) {
        Ok(_) => true,
        Err(err) => {
            debug!("{} ignored: {}", event.name(), err);
            false
        }
    }
}

/// Drain every queued event into the world, oldest first.
pub fn drain_event_inbox(inbox: Res<EventInbox>, mut ctx: EventContext) {
    for event in inbox.rx.try_iter() {
        let applied = resolve_event(&mut ctx, event);
        debug!("inbox event {} applied: {}", event.name(), applied);
    }
}

/// Registered system behind `Companion::apply_event`.
pub fn apply_event_system(In(event): In<CompanionEvent>, mut ctx: EventContext) -> bool {
    resolve_event(&mut ctx, event)
}
