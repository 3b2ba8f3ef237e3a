use bevy_ecs::prelude::Component;

/// Floor point the companion walks toward while in `Walking`.
///
/// Removed on arrival or when another state replaces `Walking`. A walk
/// toward a scene item reports `ItemReached` on arrival.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct WalkTarget {
    pub x: f32,
    pub z: f32,
    pub item: Option<u32>,
}

impl WalkTarget {
    pub fn to(x: f32, z: f32) -> Self {
        Self { x, z, item: None }
    }
}

/// Autonomous wandering state.
///
/// While `enabled`, an idle companion picks a new activity every few seconds.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Autonomy {
    pub enabled: bool,
    /// Seconds spent idle since the last pick.
    pub idle_timer: f32,
    /// Idle seconds before the next pick.
    pub next_pick: f32,
}

impl Autonomy {
    pub fn new(enabled: bool, first_pick: f32) -> Self {
        Self {
            enabled,
            idle_timer: 0.0,
            next_pick: first_pick,
        }
    }
}
