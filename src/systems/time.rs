//! Time update.
//!
//! Advances the shared [`WorldTime`] resource once per host tick. The raw
//! delta is first filtered by the [`FrameClock`] (clamping, hidden pause,
//! nominal resume step), then `time_scale` is applied.
use bevy_ecs::prelude::*;

use crate::resources::frameclock::FrameClock;
use crate::resources::worldtime::WorldTime;

/// Update elapsed and delta seconds on `WorldTime`.
///
/// Returns `false` without touching time when the clock says no tick should
/// run (companion hidden).
pub fn update_world_time(world: &mut World, dt: f32) -> bool {
    let step = match world.get_resource_mut::<FrameClock>() {
        Some(mut clock) => clock.step(dt),
        None => Some(if dt.is_nan() { 0.0 } else { dt.max(0.0) }),
    };
    let Some(step) = step else {
        return false;
    };
    world.resource_mut::<WorldTime>().advance(step);
    true
}
