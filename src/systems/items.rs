//! Scene item upkeep.
//!
//! Items fall and bounce under the same integrator as the companion, with
//! the same floor, walls and restitution. Their contacts carry no gameplay
//! meaning and are dropped. Food marked [`Consumed`] disappears once its
//! timer runs out.

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::animation::AnimationPlayer;
use crate::components::physicsbody::PhysicsBody;
use crate::components::sceneitem::{Consumed, SceneItem};
use crate::events::notification::CompanionNotification;
use crate::resources::companionconfig::CompanionConfig;
use crate::resources::itemregistry::ItemRegistry;
use crate::resources::viewport::Viewport;
use crate::resources::worldtime::WorldTime;
use crate::systems::physics::{PhysicsParams, integrate};

pub fn item_physics_system(
    time: Res<WorldTime>,
    config: Res<CompanionConfig>,
    viewport: Res<Viewport>,
    mut items: Query<&mut PhysicsBody, (With<SceneItem>, Without<AnimationPlayer>)>,
) {
    let params = PhysicsParams::new(&config, &viewport);
    for mut body in items.iter_mut() {
        integrate(&mut body, &params, time.delta);
    }
}

pub fn consume_items_system(
    mut commands: Commands,
    time: Res<WorldTime>,
    mut registry: ResMut<ItemRegistry>,
    mut items: Query<(Entity, &SceneItem, &mut Consumed)>,
    mut notes: MessageWriter<CompanionNotification>,
) {
    for (entity, item, mut consumed) in items.iter_mut() {
        consumed.remaining -= time.delta;
        if consumed.remaining > 0.0 {
            continue;
        }
        registry.remove(item.id);
        commands.entity(entity).despawn();
        notes.write(CompanionNotification::ItemRemoved { id: item.id });
        debug!("{} #{} eaten", item.kind, item.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::sceneitem::ItemKind;
    use glam::Vec3;

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            delta: 1.0 / 60.0,
            ..Default::default()
        });
        world.insert_resource(CompanionConfig::new());
        world.insert_resource(Viewport::new(800.0, 600.0, 20.0));
        world.init_resource::<ItemRegistry>();
        world.init_resource::<Messages<CompanionNotification>>();
        world
    }

    fn spawn_item(world: &mut World, kind: ItemKind, body: PhysicsBody) -> Entity {
        let id = world.resource_mut::<ItemRegistry>().allocate();
        let entity = world.spawn((SceneItem { id, kind }, body)).id();
        world.resource_mut::<ItemRegistry>().insert(id, entity);
        entity
    }

    fn run(world: &mut World, ticks: usize) {
        let mut schedule = Schedule::default();
        schedule.add_systems((item_physics_system, consume_items_system).chain());
        for _ in 0..ticks {
            schedule.run(world);
        }
    }

    #[test]
    fn dropped_item_bounces_then_rests_on_the_floor() {
        let mut world = world();
        let mut body = PhysicsBody::resting_at(Vec3::new(300.0, 220.0, 0.0));
        body.launch(Vec3::ZERO);
        let entity = spawn_item(&mut world, ItemKind::SoccerBall, body);

        let mut bounced = false;
        for _ in 0..600 {
            run(&mut world, 1);
            let body = world.get::<PhysicsBody>(entity).unwrap();
            assert!(body.position.y >= 20.0);
            bounced |= body.bounce_count > 0;
        }
        let body = world.get::<PhysicsBody>(entity).unwrap();
        assert!(bounced);
        assert!(body.grounded);
        assert_eq!(body.position, Vec3::new(300.0, 20.0, 0.0));
    }

    #[test]
    fn companion_bodies_are_left_alone() {
        let mut world = world();
        let mut body = PhysicsBody::resting_at(Vec3::new(300.0, 220.0, 0.0));
        body.launch(Vec3::ZERO);
        let companion = world.spawn((AnimationPlayer::new(24), body.clone())).id();
        run(&mut world, 10);
        assert_eq!(world.get::<PhysicsBody>(companion), Some(&body));
    }

    #[test]
    fn eaten_food_disappears_after_its_timer() {
        let mut world = world();
        let entity = spawn_item(&mut world, ItemKind::Apple, PhysicsBody::resting_at(Vec3::new(100.0, 20.0, 0.0)));
        world.entity_mut(entity).insert(Consumed { remaining: 0.5 });

        run(&mut world, 29);
        assert!(world.get_entity(entity).is_ok());
        run(&mut world, 2);
        assert!(world.get_entity(entity).is_err());
        assert!(world.resource::<ItemRegistry>().is_empty());
        let notes: Vec<_> = world
            .resource_mut::<Messages<CompanionNotification>>()
            .drain()
            .collect();
        assert_eq!(notes, vec![CompanionNotification::ItemRemoved { id: 0 }]);
    }
}
