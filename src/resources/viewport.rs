use bevy_ecs::prelude::Resource;
use glam::Vec2;

/// Host surface size and floor height, in pixels.
///
/// Screen coordinates are y-down with the origin at the top-left; world
/// coordinates are y-up with the origin at the bottom-left, so side walls sit
/// at `x = 0` and `x = width`.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Floor height in world pixels.
    pub floor_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 360.0,
            floor_y: 24.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32, floor_y: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            floor_y,
        }
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        Vec2::new(screen.x, self.height - screen.y)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x, self.height - world.y)
    }

    /// Keep an x coordinate between the side walls.
    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(0.0, self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_world_conversion_flips_y() {
        let vp = Viewport::new(400.0, 300.0, 20.0);
        let w = vp.screen_to_world(Vec2::new(10.0, 250.0));
        assert_eq!(w, Vec2::new(10.0, 50.0));
        assert_eq!(vp.world_to_screen(w), Vec2::new(10.0, 250.0));
        assert_eq!(vp.clamp_x(500.0), 400.0);
    }
}
