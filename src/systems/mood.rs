//! Periodic mood drift.
//!
//! Every `mood_check_secs` of simulated time the companion's [`MoodState`]
//! is checked for over-interaction, long idling and time decay. A change is
//! reported as a notification and expressed through the mood's variant
//! animation when the current state allows it.

use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::components::animation::AnimationPlayer;
use crate::components::mood::MoodState;
use crate::components::walktarget::WalkTarget;
use crate::events::notification::CompanionNotification;
use crate::resources::companionconfig::CompanionConfig;
use crate::resources::rng::CompanionRng;
use crate::resources::worldtime::WorldTime;
use crate::systems::statemachine::{TriggerRequest, request_state};

pub fn mood_system(
    mut commands: Commands,
    time: Res<WorldTime>,
    config: Res<CompanionConfig>,
    mut rng: ResMut<CompanionRng>,
    mut companions: Query<(Entity, &mut MoodState, &mut AnimationPlayer, Has<WalkTarget>)>,
    mut notes: MessageWriter<CompanionNotification>,
    mut next_check: Local<f32>,
) {
    let now = time.elapsed;
    if now < *next_check {
        return;
    }
    *next_check = now + config.mood_check_secs;

    for (entity, mut mood, mut player, walking) in companions.iter_mut() {
        let Some(change) = mood.periodic_check(now, config.idle_sleep_secs, &mut rng.0) else {
            continue;
        };
        info!("mood {} -> {} ({:?})", change.from, change.to, change.reason);
        notes.write(change.into());
        if player.current.is_internal() {
            continue;
        }
        let request = TriggerRequest {
            state: change.to.variant(),
            duration_ticks: None,
        };
        if let Err(err) = request_state(&mut commands, &mut notes, entity, &mut player, walking, request) {
            debug!("mood variant {} not played: {}", request.state, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::animation::AnimationState;
    use crate::components::mood::Mood;

    #[test]
    fn long_idling_makes_the_companion_sleepy() {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            elapsed: 200.0,
            ..Default::default()
        });
        world.insert_resource(CompanionConfig::new());
        world.insert_resource(CompanionRng::new(Some(1)));
        world.init_resource::<Messages<CompanionNotification>>();
        let entity = world
            .spawn((MoodState::new(0.0), AnimationPlayer::new(24)))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(mood_system);
        schedule.run(&mut world);

        assert_eq!(world.get::<MoodState>(entity).unwrap().mood, Mood::Sleepy);
        assert_eq!(
            world.get::<AnimationPlayer>(entity).unwrap().current,
            AnimationState::SleepySlow
        );
        let notes: Vec<_> = world
            .resource_mut::<Messages<CompanionNotification>>()
            .drain()
            .collect();
        assert!(notes.iter().any(|n| matches!(n, CompanionNotification::MoodChanged { to: Mood::Sleepy, .. })));
    }

    #[test]
    fn mood_changes_during_a_fall_keep_the_fall() {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            elapsed: 200.0,
            ..Default::default()
        });
        world.insert_resource(CompanionConfig::new());
        world.insert_resource(CompanionRng::new(Some(1)));
        world.init_resource::<Messages<CompanionNotification>>();
        let mut player = AnimationPlayer::new(24);
        player.enter(AnimationState::FallingOnFace, None);
        let entity = world.spawn((MoodState::new(0.0), player)).id();

        let mut schedule = Schedule::default();
        schedule.add_systems(mood_system);
        schedule.run(&mut world);

        assert_eq!(world.get::<MoodState>(entity).unwrap().mood, Mood::Sleepy);
        assert_eq!(
            world.get::<AnimationPlayer>(entity).unwrap().current,
            AnimationState::FallingOnFace
        );
    }

    #[test]
    fn checks_are_spaced_out() {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            elapsed: 200.0,
            ..Default::default()
        });
        world.insert_resource(CompanionConfig::new());
        world.insert_resource(CompanionRng::new(Some(1)));
        world.init_resource::<Messages<CompanionNotification>>();
        let entity = world
            .spawn((MoodState::new(0.0), AnimationPlayer::new(24)))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(mood_system);
        schedule.run(&mut world);
        // Interaction right after the first check; the next check is 10 s away.
        world.get_mut::<MoodState>(entity).unwrap().mood = Mood::Happy;
        world.resource_mut::<WorldTime>().elapsed = 205.0;
        schedule.run(&mut world);
        assert_eq!(world.get::<MoodState>(entity).unwrap().mood, Mood::Happy);
    }
}
