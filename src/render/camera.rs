//! Orbit camera.
//!
//! The default is a front orthographic view whose extents match the
//! viewport, so a world pixel lands on the same screen pixel the pointer
//! hit-test uses. Yaw/pitch orbit around the viewport centre; pitch is
//! clamped to ±89° and zoom to [`MIN_ZOOM`, `MAX_ZOOM`].

use glam::{Mat4, Vec3};

use crate::resources::viewport::Viewport;

pub const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;
pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Radians around +y; 0 looks down −z.
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,
    pub distance: f32,
    /// Half the visible height at zoom 1, pixels.
    pub half_height: f32,
    pub aspect: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            zoom: 1.0,
            distance: 1000.0,
            half_height: 1.0,
            aspect: 1.0,
        };
        camera.fit_viewport(&Viewport::default());
        camera
    }
}

impl OrbitCamera {
    /// Centre on the viewport and match its extents.
    pub fn fit_viewport(&mut self, viewport: &Viewport) {
        self.target = Vec3::new(viewport.width * 0.5, viewport.height * 0.5, 0.0);
        self.half_height = viewport.height * 0.5;
        self.aspect = viewport.width / viewport.height;
        self.distance = viewport.width.max(viewport.height) * 2.0;
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn zoom_by(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Back to the front view.
    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.zoom = 1.0;
    }

    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye()).normalize()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        let half_h = self.half_height / self.zoom;
        let half_w = half_h * self.aspect;
        Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, 1.0, self.distance * 2.0)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Visible height in world pixels, as raylib's orthographic `fovy`.
    pub fn ortho_height(&self) -> f32 {
        2.0 * self.half_height / self.zoom
    }
}
