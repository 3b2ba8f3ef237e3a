//! Walking toward a target and autonomous activity selection.
//!
//! A companion holding a [`WalkTarget`] walks along the floor at the
//! configured speed (scaled by the mood's movement modifier) and returns to
//! Idle on arrival; a walk toward a scene item that still exists reports
//! `ItemReached`. With [`Autonomy`] enabled, an idle grounded companion picks
//! a new activity every few seconds.

use bevy_ecs::prelude::*;
use fastrand::Rng;
use glam::Vec2;
use log::debug;

use crate::components::animation::{AnimationPlayer, AnimationState};
use crate::components::dragsession::DragSession;
use crate::components::facing::FacingDirection;
use crate::components::mood::{Mood, MoodState};
use crate::components::physicsbody::PhysicsBody;
use crate::components::walktarget::{Autonomy, WalkTarget};
use crate::events::notification::CompanionNotification;
use crate::resources::companionconfig::CompanionConfig;
use crate::resources::itemregistry::ItemRegistry;
use crate::resources::rng::CompanionRng;
use crate::resources::viewport::Viewport;
use crate::resources::worldtime::WorldTime;
use crate::systems::statemachine::{TriggerRequest, announce, request_state};

/// Horizontal step below which walking does not turn the companion.
const TURN_DEADZONE: f32 = 0.01;
/// Autonomous walks stay this far from the side walls.
const WALL_MARGIN: f32 = 40.0;
/// Autonomous walks wander this far in depth.
const DEPTH_RANGE: f32 = 30.0;
const WORK_SECS: f32 = 6.0;
const NAP_SECS: f32 = 10.0;

/// What an idle autonomous companion decides to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Walk,
    Work,
    Idle,
    Celebrate,
    Nap,
}

/// Weighted activity table for awake companions.
const ACTIVITY_WEIGHTS: [(Activity, f32); 4] = [
    (Activity::Walk, 0.4),
    (Activity::Work, 0.3),
    (Activity::Idle, 0.2),
    (Activity::Celebrate, 0.1),
];

/// Pick the next activity. Sleepy companions nap with their mood's rest
/// probability; everyone else draws from the weighted table.
pub fn pick_activity(rng: &mut Rng, mood: &MoodState) -> Activity {
    if mood.mood == Mood::Sleepy && rng.f32() < mood.modifiers().rest_probability {
        return Activity::Nap;
    }
    let mut roll = rng.f32();
    for (activity, weight) in ACTIVITY_WEIGHTS {
        if roll < weight {
            return activity;
        }
        roll -= weight;
    }
    Activity::Idle
}

pub fn wander_system(
    mut commands: Commands,
    time: Res<WorldTime>,
    config: Res<CompanionConfig>,
    viewport: Res<Viewport>,
    registry: Res<ItemRegistry>,
    mut rng: ResMut<CompanionRng>,
    mut companions: Query<
        (
            Entity,
            &mut PhysicsBody,
            &mut AnimationPlayer,
            &mut FacingDirection,
            &MoodState,
            Option<&mut Autonomy>,
            Option<&WalkTarget>,
        ),
        Without<DragSession>,
    >,
    mut notes: MessageWriter<CompanionNotification>,
) {
    let dt = time.delta;
    for (entity, mut body, mut player, mut facing, mood, autonomy, target) in companions.iter_mut() {
        if let Some(target) = target {
            if player.current != AnimationState::Walking {
                commands.entity(entity).remove::<WalkTarget>();
                continue;
            }
            if !body.grounded {
                continue;
            }
            let to_target = Vec2::new(target.x - body.position.x, target.z - body.position.z);
            let distance = to_target.length();
            if distance <= config.arrive_distance {
                commands.entity(entity).remove::<WalkTarget>();
                let transition = player.enter(AnimationState::Idle, None);
                announce(&mut commands, &mut notes, entity, transition);
                if let Some(id) = target.item.filter(|&id| registry.get(id).is_some()) {
                    notes.write(CompanionNotification::ItemReached { id });
                }
                continue;
            }
            let step = (config.walk_speed * mood.modifiers().movement_speed * dt).min(distance);
            let direction = to_target / distance;
            body.position.x = viewport.clamp_x(body.position.x + direction.x * step);
            body.position.z += direction.y * step;
            if let Some(turn) = FacingDirection::from_motion(direction.x, TURN_DEADZONE) {
                if *facing != turn {
                    *facing = turn;
                }
            }
            continue;
        }

        let Some(mut autonomy) = autonomy else {
            continue;
        };
        if !autonomy.enabled || player.current != AnimationState::Idle || !body.grounded {
            autonomy.idle_timer = 0.0;
            continue;
        }
        autonomy.idle_timer += dt;
        if autonomy.idle_timer < autonomy.next_pick {
            continue;
        }
        autonomy.idle_timer = 0.0;
        autonomy.next_pick = rng.range_f32(config.activity_min_secs, config.activity_max_secs);

        let activity = pick_activity(&mut rng.0, mood);
        debug!("autonomous activity: {:?}", activity);
        let (state, duration_ticks) = match activity {
            Activity::Idle => continue,
            Activity::Walk => (AnimationState::Walking, None),
            Activity::Work => (AnimationState::WorkingAtDesk, Some(config.secs_to_ticks(WORK_SECS))),
            Activity::Celebrate => (AnimationState::Celebrating, None),
            Activity::Nap => (AnimationState::Sleeping, Some(config.secs_to_ticks(NAP_SECS))),
        };
        let request = TriggerRequest { state, duration_ticks };
        if request_state(&mut commands, &mut notes, entity, &mut player, false, request).is_ok()
            && activity == Activity::Walk
        {
            let margin = WALL_MARGIN.min(viewport.width * 0.25);
            let x = rng.range_f32(margin, viewport.width - margin);
            let z = rng.range_f32(-DEPTH_RANGE, DEPTH_RANGE);
            commands.entity(entity).insert(WalkTarget::to(x, z));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn world(autonomous: bool) -> (World, Entity) {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            delta: 1.0 / 60.0,
            ..Default::default()
        });
        world.insert_resource(CompanionConfig::new());
        world.insert_resource(Viewport::new(800.0, 600.0, 20.0));
        world.insert_resource(CompanionRng::new(Some(11)));
        world.init_resource::<ItemRegistry>();
        world.init_resource::<Messages<CompanionNotification>>();
        let entity = world
            .spawn((
                PhysicsBody::resting_at(Vec3::new(400.0, 20.0, 0.0)),
                AnimationPlayer::new(24),
                FacingDirection::Right,
                MoodState::new(0.0),
                Autonomy::new(autonomous, 1.0),
            ))
            .id();
        (world, entity)
    }

    fn run(world: &mut World, ticks: usize) {
        let mut schedule = Schedule::default();
        schedule.add_systems(wander_system);
        for _ in 0..ticks {
            schedule.run(world);
        }
    }

    #[test]
    fn walks_to_target_and_stops() {
        let (mut world, entity) = world(false);
        world
            .get_mut::<AnimationPlayer>(entity)
            .unwrap()
            .enter(AnimationState::Walking, None);
        world.entity_mut(entity).insert(WalkTarget::to(340.0, 0.0));

        run(&mut world, 1);
        assert_eq!(*world.get::<FacingDirection>(entity).unwrap(), FacingDirection::Left);
        assert!(world.get::<PhysicsBody>(entity).unwrap().position.x < 400.0);

        run(&mut world, 120);
        assert!((world.get::<PhysicsBody>(entity).unwrap().position.x - 340.0).abs() <= 2.0);
        assert_eq!(
            world.get::<AnimationPlayer>(entity).unwrap().current,
            AnimationState::Idle
        );
        assert!(world.get::<WalkTarget>(entity).is_none());
    }

    #[test]
    fn arriving_at_an_item_reports_it() {
        let (mut world, entity) = world(false);
        let item = world.spawn_empty().id();
        world.resource_mut::<ItemRegistry>().insert(7, item);
        world
            .get_mut::<AnimationPlayer>(entity)
            .unwrap()
            .enter(AnimationState::Walking, None);
        world.entity_mut(entity).insert(WalkTarget {
            x: 420.0,
            z: 0.0,
            item: Some(7),
        });
        run(&mut world, 60);
        let notes: Vec<_> = world
            .resource_mut::<Messages<CompanionNotification>>()
            .drain()
            .collect();
        assert!(notes.contains(&CompanionNotification::ItemReached { id: 7 }));
    }

    #[test]
    fn disabled_autonomy_stays_idle() {
        let (mut world, entity) = world(false);
        run(&mut world, 600);
        assert_eq!(
            world.get::<AnimationPlayer>(entity).unwrap().current,
            AnimationState::Idle
        );
    }

    #[test]
    fn enabled_autonomy_eventually_does_something() {
        let (mut world, entity) = world(true);
        let mut left_idle = false;
        for _ in 0..60 * 60 {
            run(&mut world, 1);
            if world.get::<AnimationPlayer>(entity).unwrap().current != AnimationState::Idle {
                left_idle = true;
                break;
            }
        }
        assert!(left_idle);
    }

    #[test]
    fn activity_weights_cover_the_table() {
        let mut rng = Rng::with_seed(5);
        let mood = MoodState::new(0.0);
        let picks: Vec<Activity> = (0..200).map(|_| pick_activity(&mut rng, &mood)).collect();
        assert!(picks.contains(&Activity::Walk));
        assert!(picks.contains(&Activity::Work));
        assert!(!picks.contains(&Activity::Nap));
    }
}
