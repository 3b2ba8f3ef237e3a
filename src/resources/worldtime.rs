use bevy_ecs::prelude::Resource;

/// Simulation clock of the companion world.
///
/// Advanced once per tick by
/// [`update_world_time`](crate::systems::time::update_world_time) with the
/// step the [`FrameClock`](crate::resources::frameclock::FrameClock) allows.
/// `elapsed` drives mood timing and click streaks; `delta` is what every
/// system integrates with.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    /// Slow motion (< 1) or fast forward (> 1). Negative scales freeze time.
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale.max(0.0);
        self
    }

    /// Take one tick of `step` unscaled seconds. Returns the scaled delta.
    pub fn advance(&mut self, step: f32) -> f32 {
        self.delta = step * self.time_scale;
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.delta
    }
}
