//! Animation state machine systems.
//!
//! - [`advance_animation_system`] steps the [`AnimationPlayer`] every tick,
//!   applies finished-state fallbacks and the drag-speed rule.
//! - [`settle_on_landing_system`] decides how a thrown companion lands.
//! - [`trigger_system`] applies external triggers; it is registered on the
//!   world and run on demand by the facade.
//!
//! Every transition goes through [`announce`], which writes the
//! `StateChanged` notification and triggers a [`StateChangedEvent`].

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::animation::{AnimationPlayer, AnimationState, Transition, TriggerError};
use crate::components::dragsession::DragSession;
use crate::components::mood::MoodState;
use crate::components::physicsbody::PhysicsBody;
use crate::components::walktarget::WalkTarget;
use crate::events::notification::CompanionNotification;
use crate::events::physics::PhysicsMessage;
use crate::events::statechange::StateChangedEvent;
use crate::resources::companionconfig::CompanionConfig;
use crate::resources::worldtime::WorldTime;

/// External trigger request handed to [`trigger_system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRequest {
    pub state: AnimationState,
    pub duration_ticks: Option<u32>,
}

/// Publish a transition as notification and observable event.
pub fn announce(
    commands: &mut Commands,
    notes: &mut MessageWriter<CompanionNotification>,
    entity: Entity,
    transition: Transition,
) {
    notes.write(CompanionNotification::StateChanged {
        from: transition.from,
        to: transition.to,
    });
    commands.trigger(StateChangedEvent::new(entity, transition));
}

/// Apply an external trigger to `player`, dropping a stale walk target.
pub fn request_state(
    commands: &mut Commands,
    notes: &mut MessageWriter<CompanionNotification>,
    entity: Entity,
    player: &mut AnimationPlayer,
    walking: bool,
    request: TriggerRequest,
) -> Result<Transition, TriggerError> {
    let transition = player.request(request.state, request.duration_ticks)?;
    if walking && request.state != AnimationState::Walking {
        commands.entity(entity).remove::<WalkTarget>();
    }
    announce(commands, notes, entity, transition);
    Ok(transition)
}

pub fn advance_animation_system(
    mut commands: Commands,
    time: Res<WorldTime>,
    config: Res<CompanionConfig>,
    mut companions: Query<(
        Entity,
        &mut AnimationPlayer,
        &MoodState,
        &PhysicsBody,
        Option<&DragSession>,
    )>,
    mut notes: MessageWriter<CompanionNotification>,
) {
    for (entity, mut player, mood, body, drag) in companions.iter_mut() {
        match drag {
            Some(session)
                if session.is_drag
                    && session.grabbed_part.is_torso()
                    && player.current != AnimationState::BeingDraggedOnGround
                    && !player.current.is_settling()
                    && session.speed_px_per_tick > config.drag_speed_threshold =>
            {
                let transition = player.enter(AnimationState::BeingDraggedOnGround, None);
                announce(&mut commands, &mut notes, entity, transition);
            }
            None if player.current == AnimationState::Airborne && body.grounded => {
                let transition = player.enter(AnimationState::Idle, None);
                announce(&mut commands, &mut notes, entity, transition);
            }
            _ => {}
        }

        if let Some(transition) = player.advance(time.delta, mood.modifiers().animation_speed) {
            announce(&mut commands, &mut notes, entity, transition);
        }
    }
}

/// Pick the landing state when a thrown companion comes to rest.
///
/// Soft landings return to Idle. Hard ones fall over: sideways when still
/// moving fast horizontally at touchdown, onto the face otherwise.
pub fn landing_state(config: &CompanionConfig, horizontal_speed: f32, peak_impact_speed: f32) -> AnimationState {
    if peak_impact_speed < config.hard_landing_speed {
        AnimationState::Idle
    } else if horizontal_speed >= config.tip_over_speed {
        AnimationState::TippingOverSide
    } else {
        AnimationState::FallingOnFace
    }
}

pub fn settle_on_landing_system(
    mut commands: Commands,
    config: Res<CompanionConfig>,
    mut contacts: MessageReader<PhysicsMessage>,
    mut companions: Query<(Entity, &mut AnimationPlayer)>,
    mut notes: MessageWriter<CompanionNotification>,
) {
    for contact in contacts.read() {
        let PhysicsMessage::Settled {
            horizontal_speed,
            peak_impact_speed,
            ..
        } = *contact
        else {
            continue;
        };
        for (entity, mut player) in companions.iter_mut() {
            if player.current != AnimationState::Airborne {
                continue;
            }
            let next = landing_state(&config, horizontal_speed, peak_impact_speed);
            debug!(
                "landed: peak impact {:.0} px/s, horizontal {:.0} px/s -> {}",
                peak_impact_speed, horizontal_speed, next
            );
            let transition = player.enter(next, None);
            announce(&mut commands, &mut notes, entity, transition);
        }
    }
}

/// Registered system behind `Companion::trigger`.
pub fn trigger_system(
    In(request): In<TriggerRequest>,
    mut commands: Commands,
    mut companions: Query<(Entity, &mut AnimationPlayer, Has<WalkTarget>)>,
    mut notes: MessageWriter<CompanionNotification>,
) -> Result<Transition, TriggerError> {
    let Ok((entity, mut player, walking)) = companions.single_mut() else {
        return Err(TriggerError::MissingCompanion);
    };
    request_state(&mut commands, &mut notes, entity, &mut player, walking, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::dragsession::PointerSample;
    use crate::components::bodypart::BodyPart;
    use glam::{Vec2, Vec3};

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            delta: 1.0 / 60.0,
            ..Default::default()
        });
        world.insert_resource(CompanionConfig::new());
        world.init_resource::<Messages<CompanionNotification>>();
        world.init_resource::<Messages<PhysicsMessage>>();
        world
    }

    fn spawn(world: &mut World) -> Entity {
        world
            .spawn((
                AnimationPlayer::new(24),
                MoodState::new(0.0),
                PhysicsBody::resting_at(Vec3::ZERO),
            ))
            .id()
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems((advance_animation_system, settle_on_landing_system).chain());
        schedule.run(world);
    }

    fn notes(world: &mut World) -> Vec<CompanionNotification> {
        world
            .resource_mut::<Messages<CompanionNotification>>()
            .drain()
            .collect()
    }

    #[test]
    fn trigger_system_applies_and_notifies() {
        let mut world = world();
        let entity = spawn(&mut world);
        let id = world.register_system(trigger_system);
        let result = world
            .run_system_with(
                id,
                TriggerRequest {
                    state: AnimationState::Waving,
                    duration_ticks: None,
                },
            )
            .unwrap();
        assert_eq!(
            result,
            Ok(Transition {
                from: AnimationState::Idle,
                to: AnimationState::Waving
            })
        );
        assert_eq!(
            world.get::<AnimationPlayer>(entity).map(|p| p.current),
            Some(AnimationState::Waving)
        );
        assert_eq!(
            notes(&mut world),
            vec![CompanionNotification::StateChanged {
                from: AnimationState::Idle,
                to: AnimationState::Waving
            }]
        );
    }

    #[test]
    fn trigger_removes_walk_target() {
        let mut world = world();
        let entity = spawn(&mut world);
        world.entity_mut(entity).insert(WalkTarget::to(10.0, 0.0));
        world.get_mut::<AnimationPlayer>(entity).unwrap().enter(AnimationState::Walking, None);
        let id = world.register_system(trigger_system);
        let result = world
            .run_system_with(
                id,
                TriggerRequest {
                    state: AnimationState::Eating,
                    duration_ticks: None,
                },
            )
            .unwrap();
        assert!(result.is_ok());
        assert!(world.get::<WalkTarget>(entity).is_none());
    }

    #[test]
    fn fast_torso_drag_enters_dragged_state_and_stays() {
        let mut world = world();
        let entity = spawn(&mut world);
        let mut session = DragSession::new(BodyPart::Body, PointerSample::new(Vec2::ZERO, 0.0), Vec3::ZERO);
        session.is_drag = true;
        session.speed_px_per_tick = 2.0;
        world.entity_mut(entity).insert(session);
        run(&mut world);
        assert_eq!(world.get::<AnimationPlayer>(entity).unwrap().current, AnimationState::Idle);

        world.get_mut::<DragSession>(entity).unwrap().speed_px_per_tick = 4.0;
        run(&mut world);
        assert_eq!(
            world.get::<AnimationPlayer>(entity).unwrap().current,
            AnimationState::BeingDraggedOnGround
        );

        world.get_mut::<DragSession>(entity).unwrap().speed_px_per_tick = 0.0;
        for _ in 0..30 {
            run(&mut world);
        }
        assert_eq!(
            world.get::<AnimationPlayer>(entity).unwrap().current,
            AnimationState::BeingDraggedOnGround
        );
    }

    #[test]
    fn hard_landing_falls_over() {
        let mut world = world();
        let entity = spawn(&mut world);
        world.get_mut::<AnimationPlayer>(entity).unwrap().enter(AnimationState::Airborne, None);
        world.get_mut::<PhysicsBody>(entity).unwrap().grounded = false;
        world
            .resource_mut::<Messages<PhysicsMessage>>()
            .write(PhysicsMessage::Settled {
                impact_speed: 120.0,
                horizontal_speed: 10.0,
                peak_impact_speed: 2000.0,
            });
        run(&mut world);
        assert_eq!(
            world.get::<AnimationPlayer>(entity).unwrap().current,
            AnimationState::FallingOnFace
        );
    }

    #[test]
    fn landing_state_rules() {
        let config = CompanionConfig::new();
        assert_eq!(landing_state(&config, 0.0, 100.0), AnimationState::Idle);
        assert_eq!(landing_state(&config, 0.0, 2000.0), AnimationState::FallingOnFace);
        assert_eq!(landing_state(&config, 600.0, 2000.0), AnimationState::TippingOverSide);
    }
}
