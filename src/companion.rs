//! Companion facade.
//!
//! [`Companion`] owns the ECS world holding the companion entity, its
//! resources and the per-tick schedule. Hosts drive it with [`Companion::tick`]
//! and feed it pointer input and triggers; everything else happens in
//! systems. Immediate calls (triggers, events, pointer input) run registered
//! systems right away so their effect is visible before the next tick.
//!
//! Coordinates passed to the pointer API are screen pixels (y down); the
//! simulation works in world pixels (y up) with the floor at
//! `Viewport::floor_y`.

use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemId;
use glam::{Vec2, Vec3};
use log::{debug, info, warn};
use serde::Serialize;

use crate::components::animation::{AnimationPlayer, AnimationState, Transition, TriggerError};
use crate::components::dragsession::{DragSession, PointerSample};
use crate::components::facing::FacingDirection;
use crate::components::mood::{Mood, MoodState};
use crate::components::palette::{ColorSlot, RigPalette};
use crate::components::physicsbody::PhysicsBody;
use crate::components::pose::RigPose;
use crate::components::sceneitem::{Consumed, ITEM_RADIUS, ItemKind, SceneItem};
use crate::components::squash::Squash;
use crate::components::walktarget::Autonomy;
use crate::events::companion::CompanionEvent;
use crate::events::notification::CompanionNotification;
use crate::events::physics::PhysicsMessage;
use crate::events::pointer::ReleaseOutcome;
use crate::events::statechange::observe_state_change;
use crate::render::{ItemSprite, RenderFrame, Scene, SceneRenderer};
use crate::resources::companionconfig::CompanionConfig;
use crate::resources::eventinbox::{EventInbox, EventSender};
use crate::resources::frameclock::FrameClock;
use crate::resources::interactionstats::InteractionStats;
use crate::resources::itemregistry::ItemRegistry;
use crate::resources::rng::CompanionRng;
use crate::resources::viewport::Viewport;
use crate::resources::worldtime::WorldTime;
use crate::systems::inbox::{apply_event_system, drain_event_inbox};
use crate::systems::items::{consume_items_system, item_physics_system};
use crate::systems::interaction::{pointer_down_system, pointer_move_system, pointer_up_system};
use crate::systems::mood::mood_system;
use crate::systems::physics::{physics_system, squash_decay_system, update_physics_messages};
use crate::systems::pose::{compose_rest_pose, pose_system};
use crate::systems::statemachine::{
    TriggerRequest, advance_animation_system, settle_on_landing_system, trigger_system,
};
use crate::systems::time::update_world_time;
use crate::systems::wander::wander_system;

/// Ids of the systems the facade runs on demand.
struct FacadeSystems {
    trigger: SystemId<In<TriggerRequest>, Result<Transition, TriggerError>>,
    apply_event: SystemId<In<CompanionEvent>, bool>,
    pointer_down: SystemId<In<PointerSample>, bool>,
    pointer_move: SystemId<In<PointerSample>, bool>,
    pointer_up: SystemId<In<PointerSample>, ReleaseOutcome>,
    refresh_pose: SystemId,
}

/// Serialisable summary of the companion.
#[derive(Debug, Clone, Serialize)]
pub struct CompanionSnapshot {
    pub frame: u64,
    pub elapsed: f32,
    pub state: AnimationState,
    pub mood: Mood,
    pub mood_intensity: f32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub grounded: bool,
    pub facing: FacingDirection,
    pub settle_progress: f32,
    pub dragging: bool,
    pub stats: InteractionStats,
}

/// Serialisable view of one scene item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: u32,
    pub kind: ItemKind,
    pub position: [f32; 3],
    pub grounded: bool,
    pub being_eaten: bool,
}

pub struct Companion {
    world: World,
    schedule: Schedule,
    entity: Entity,
    systems: FacadeSystems,
    notifications: Vec<CompanionNotification>,
}

impl Default for Companion {
    fn default() -> Self {
        Self::new(CompanionConfig::new())
    }
}

impl Companion {
    pub fn new(config: CompanionConfig) -> Self {
        let mut world = World::new();
        let viewport = Viewport::new(
            config.window_width as f32,
            config.window_height as f32,
            config.floor_y,
        );
        let mut rng = CompanionRng::new(config.seed);
        let first_pick = rng.range_f32(config.activity_min_secs, config.activity_max_secs);

        world.insert_resource(WorldTime::default().with_time_scale(config.time_scale));
        world.insert_resource(FrameClock::new(config.tick_hz, config.max_dt_factor));
        world.insert_resource(viewport);
        world.insert_resource(rng);
        world.insert_resource(EventInbox::default());
        world.init_resource::<InteractionStats>();
        world.init_resource::<ItemRegistry>();
        world.init_resource::<Messages<CompanionNotification>>();
        world.init_resource::<Messages<PhysicsMessage>>();
        world.spawn(Observer::new(observe_state_change));

        let start = Vec3::new(viewport.width * 0.5, viewport.floor_y, 0.0);
        let entity = world
            .spawn((
                PhysicsBody::resting_at(start),
                AnimationPlayer::new(config.settle_ticks),
                FacingDirection::default(),
                MoodState::new(0.0),
                Squash::default(),
                RigPalette::default(),
                Autonomy::new(config.autonomous, first_pick),
                compose_rest_pose(start, FacingDirection::default()),
            ))
            .id();
        info!(
            "companion spawned at ({:.0}, {:.0}) in a {}x{} viewport",
            start.x, start.y, viewport.width, viewport.height
        );
        world.insert_resource(config);

        let systems = FacadeSystems {
            trigger: world.register_system(trigger_system),
            apply_event: world.register_system(apply_event_system),
            pointer_down: world.register_system(pointer_down_system),
            pointer_move: world.register_system(pointer_move_system),
            pointer_up: world.register_system(pointer_up_system),
            refresh_pose: world.register_system(pose_system),
        };
        world.flush();

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                drain_event_inbox,
                advance_animation_system,
                wander_system,
                squash_decay_system,
                physics_system,
                item_physics_system,
                consume_items_system,
                settle_on_landing_system,
                mood_system,
                pose_system,
                update_physics_messages,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            entity,
            systems,
            notifications: Vec::new(),
        }
    }

    // ==================== Clock ====================

    /// Advance the simulation by one host tick of `dt` seconds.
    ///
    /// The delta is clamped; nothing runs while hidden. Returns whether a
    /// tick ran.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !update_world_time(&mut self.world, dt) {
            return false;
        }
        self.schedule.run(&mut self.world);
        self.collect_notifications();
        true
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.world.resource_mut::<FrameClock>().set_visible(visible);
    }

    pub fn is_visible(&self) -> bool {
        self.world.resource::<FrameClock>().is_visible()
    }

    /// Whether a repaint was requested since the last call.
    pub fn take_redraw_request(&mut self) -> bool {
        self.world.resource_mut::<FrameClock>().take_redraw_request()
    }

    // ==================== Triggers and events ====================

    /// Trigger a state by name. Unknown names and rejected triggers leave the
    /// companion unchanged and return `false`.
    pub fn trigger(&mut self, state_name: &str, duration_override: Option<Duration>) -> bool {
        let state = match state_name.parse::<AnimationState>() {
            Ok(state) => state,
            Err(err) => {
                warn!("trigger '{}' rejected: {}", state_name, err);
                return false;
            }
        };
        match self.trigger_state(state, duration_override) {
            Ok(_) => true,
            Err(err) => {
                debug!("trigger '{}' rejected: {}", state_name, err);
                false
            }
        }
    }

    /// Typed trigger with the rejection reason.
    pub fn trigger_state(
        &mut self,
        state: AnimationState,
        duration_override: Option<Duration>,
    ) -> Result<Transition, TriggerError> {
        let duration_ticks = duration_override.map(|d| self.config().secs_to_ticks(d.as_secs_f32()));
        let request = TriggerRequest { state, duration_ticks };
        let outcome = match self.world.run_system_with(self.systems.trigger, request) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("trigger system failed: {}", err);
                Err(TriggerError::MissingCompanion)
            }
        };
        self.refresh();
        outcome
    }

    /// Apply an external event now. Returns whether it had any effect.
    pub fn apply_event(&mut self, event: CompanionEvent) -> bool {
        let applied = match self.world.run_system_with(self.systems.apply_event, event) {
            Ok(applied) => applied,
            Err(err) => {
                warn!("event system failed: {}", err);
                false
            }
        };
        self.refresh();
        applied
    }

    /// Handle for producers on other threads; events are applied at the start
    /// of the next tick.
    pub fn event_sender(&self) -> EventSender {
        self.world.resource::<EventInbox>().sender()
    }

    pub fn set_autonomous(&mut self, enabled: bool) {
        if let Some(mut autonomy) = self.world.get_mut::<Autonomy>(self.entity) {
            autonomy.enabled = enabled;
            autonomy.idle_timer = 0.0;
        }
        self.world.resource_mut::<CompanionConfig>().autonomous = enabled;
    }

    // ==================== Scene items ====================

    /// Drop an item at `x`, `height` pixels above the floor. Returns its id.
    pub fn add_item(&mut self, kind: ItemKind, x: f32, height: f32) -> Option<u32> {
        if !self.apply_event(CompanionEvent::AddItem { kind, x, height }) {
            return None;
        }
        self.world.resource::<ItemRegistry>().last_spawned()
    }

    /// Walk up to item `id`; an [`CompanionNotification::ItemReached`]
    /// follows on arrival.
    pub fn walk_to_item(&mut self, id: u32) -> bool {
        self.apply_event(CompanionEvent::WalkToItem { id })
    }

    /// Eat food or kick a toy.
    pub fn interact_with_item(&mut self, id: u32) -> bool {
        self.apply_event(CompanionEvent::InteractItem { id })
    }

    pub fn remove_item(&mut self, id: u32) -> bool {
        self.apply_event(CompanionEvent::RemoveItem { id })
    }

    pub fn clear_items(&mut self) -> bool {
        self.apply_event(CompanionEvent::ClearItems)
    }

    /// Items in the scene, by id.
    pub fn items(&mut self) -> Vec<ItemView> {
        let mut query = self.world.query::<(&SceneItem, &PhysicsBody, Has<Consumed>)>();
        let mut items: Vec<ItemView> = query
            .iter(&self.world)
            .map(|(item, body, consumed)| ItemView {
                id: item.id,
                kind: item.kind,
                position: body.position.to_array(),
                grounded: body.grounded,
                being_eaten: consumed,
            })
            .collect();
        items.sort_by_key(|item| item.id);
        items
    }

    // ==================== Colours ====================

    /// Recolour a slot of the rig. Returns whether the colour changed.
    pub fn set_color(&mut self, slot: ColorSlot, rgb: [u8; 3]) -> bool {
        self.apply_event(CompanionEvent::SetColor { slot, rgb })
    }

    pub fn palette(&self) -> RigPalette {
        self.world
            .get::<RigPalette>(self.entity)
            .copied()
            .unwrap_or_default()
    }

    // ==================== Pointer input ====================

    /// Pointer pressed at screen position (`x`, `y`); `time` in seconds.
    /// Returns whether the companion captured the pointer.
    pub fn pointer_down(&mut self, x: f32, y: f32, time: f32) -> bool {
        let sample = self.screen_sample(x, y, time);
        self.pointer_down_world(sample)
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, time: f32) -> bool {
        let sample = self.screen_sample(x, y, time);
        self.pointer_move_world(sample)
    }

    pub fn pointer_up(&mut self, x: f32, y: f32, time: f32) -> ReleaseOutcome {
        let sample = self.screen_sample(x, y, time);
        self.pointer_up_world(sample)
    }

    /// [`Companion::pointer_down`] with a world-space sample.
    pub fn pointer_down_world(&mut self, sample: PointerSample) -> bool {
        let captured = self
            .world
            .run_system_with(self.systems.pointer_down, sample)
            .unwrap_or_else(|err| {
                warn!("pointer system failed: {}", err);
                false
            });
        self.refresh();
        captured
    }

    pub fn pointer_move_world(&mut self, sample: PointerSample) -> bool {
        let handled = self
            .world
            .run_system_with(self.systems.pointer_move, sample)
            .unwrap_or_else(|err| {
                warn!("pointer system failed: {}", err);
                false
            });
        self.refresh();
        handled
    }

    pub fn pointer_up_world(&mut self, sample: PointerSample) -> ReleaseOutcome {
        let outcome = self
            .world
            .run_system_with(self.systems.pointer_up, sample)
            .unwrap_or_else(|err| {
                warn!("pointer system failed: {}", err);
                ReleaseOutcome::NotCaptured
            });
        self.refresh();
        outcome
    }

    fn screen_sample(&self, x: f32, y: f32, time: f32) -> PointerSample {
        PointerSample::new(self.viewport().screen_to_world(Vec2::new(x, y)), time)
    }

    // ==================== Viewport ====================

    pub fn viewport(&self) -> Viewport {
        *self.world.resource::<Viewport>()
    }

    /// Resize the host surface. The companion is kept between the walls.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        let floor_y = self.viewport().floor_y;
        let viewport = Viewport::new(width, height, floor_y);
        self.world.insert_resource(viewport);
        if let Some(mut body) = self.world.get_mut::<PhysicsBody>(self.entity) {
            body.position.x = viewport.clamp_x(body.position.x);
        }
        self.refresh();
    }

    /// Move the floor. A standing companion moves with it.
    pub fn set_floor_y(&mut self, floor_y: f32) {
        self.world.resource_mut::<Viewport>().floor_y = floor_y;
        if let Some(mut body) = self.world.get_mut::<PhysicsBody>(self.entity) {
            if body.grounded || body.position.y < floor_y {
                body.rest_on_floor(floor_y);
            }
        }
        self.refresh();
    }

    // ==================== Queries ====================

    pub fn current_state(&self) -> AnimationState {
        self.world
            .get::<AnimationPlayer>(self.entity)
            .map_or(AnimationState::Idle, |player| player.current)
    }

    pub fn current_mood(&self) -> Mood {
        self.world
            .get::<MoodState>(self.entity)
            .map_or(Mood::Happy, |mood| mood.mood)
    }

    pub fn is_grounded(&self) -> bool {
        self.world
            .get::<PhysicsBody>(self.entity)
            .is_some_and(|body| body.grounded)
    }

    /// Root position in world pixels (feet, y up).
    pub fn current_position(&self) -> Vec3 {
        self.world
            .get::<PhysicsBody>(self.entity)
            .map_or(Vec3::ZERO, |body| body.position)
    }

    pub fn velocity(&self) -> Vec3 {
        self.world
            .get::<PhysicsBody>(self.entity)
            .map_or(Vec3::ZERO, |body| body.velocity)
    }

    pub fn facing(&self) -> FacingDirection {
        self.world
            .get::<FacingDirection>(self.entity)
            .copied()
            .unwrap_or_default()
    }

    pub fn settle_progress(&self) -> f32 {
        self.world
            .get::<AnimationPlayer>(self.entity)
            .map_or(0.0, |player| player.settle_progress)
    }

    pub fn is_dragging(&self) -> bool {
        self.world
            .get::<DragSession>(self.entity)
            .is_some_and(|session| session.is_drag)
    }

    /// Accumulated pivot rotation of the active limb drag, radians.
    pub fn drag_spin(&self) -> Option<f32> {
        self.world.get::<DragSession>(self.entity).map(|session| session.spin)
    }

    pub fn pose(&self) -> Option<&RigPose> {
        self.world.get::<RigPose>(self.entity)
    }

    pub fn stats(&self) -> &InteractionStats {
        self.world.resource::<InteractionStats>()
    }

    pub fn config(&self) -> &CompanionConfig {
        self.world.resource::<CompanionConfig>()
    }

    /// Notifications produced since the last call, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<CompanionNotification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn snapshot(&self) -> CompanionSnapshot {
        let time = self.world.resource::<WorldTime>();
        let body = self.world.get::<PhysicsBody>(self.entity);
        let mood = self.world.get::<MoodState>(self.entity);
        let position = body.map_or(Vec3::ZERO, |b| b.position);
        let velocity = body.map_or(Vec3::ZERO, |b| b.velocity);
        CompanionSnapshot {
            frame: time.frame_count,
            elapsed: time.elapsed,
            state: self.current_state(),
            mood: self.current_mood(),
            mood_intensity: mood.map_or(0.0, |m| m.intensity),
            position: position.to_array(),
            velocity: velocity.to_array(),
            grounded: self.is_grounded(),
            facing: self.facing(),
            settle_progress: self.settle_progress(),
            dragging: self.is_dragging(),
            stats: self.stats().clone(),
        }
    }

    // ==================== Rendering ====================

    /// Build the frame for the current pose, colours and items.
    pub fn render_frame(&mut self, renderer: &mut SceneRenderer) -> Option<RenderFrame> {
        let mut query = self.world.query::<(&SceneItem, &PhysicsBody)>();
        let sprites: Vec<ItemSprite> = query
            .iter(&self.world)
            .map(|(item, body)| ItemSprite {
                center: body.position + Vec3::Y * ITEM_RADIUS,
                radius: ITEM_RADIUS,
                color: item.kind.color(),
            })
            .collect();
        let viewport = self.viewport();
        let palette = self.palette();
        let pose = self.pose()?;
        let scene = Scene {
            pose,
            palette,
            items: &sprites,
        };
        Some(renderer.render(&scene, &viewport))
    }

    /// Recompose the pose after an immediate call and collect notifications.
    fn refresh(&mut self) {
        if let Err(err) = self.world.run_system(self.systems.refresh_pose) {
            warn!("pose refresh failed: {}", err);
        }
        self.collect_notifications();
    }

    fn collect_notifications(&mut self) {
        let mut messages = self.world.resource_mut::<Messages<CompanionNotification>>();
        self.notifications.extend(messages.drain());
    }
}
