//! Scene renderer.
//!
//! Turns a [`Scene`] (the latest [`RigPose`], the rig colours and any scene
//! items) into a backend-agnostic [`RenderFrame`]: camera matrices, one
//! [`DrawCommand`] per rig part with pre-shaded face colours, item spheres,
//! the floor and its shadows. Shading uses a directional key light plus
//! ambient and a software [`ShadowMap`] rendered from the light.
//!
//! The floor receives the rig's cast shadow as [`ShadowPatch`] cells sampled
//! from the shadow map. The [`ContactShadow`] blob is the soft ambient term
//! under the feet; it also fades while airborne.
//!
//! The renderer holds no simulation state. A missing or degenerate light
//! falls back to flat unlit colours; the failure is logged once.
//!
//! Submodules overview
//! - [`camera`] – orbit camera with a front orthographic default
//! - [`lighting`] – directional light validation and Lambert shading
//! - [`shadowmap`] – depth map from the light, PCF lookups
//! - `raylib_backend` – draws a frame with raylib (feature `window`)

pub mod camera;
pub mod lighting;
#[cfg(feature = "window")]
pub mod raylib_backend;
pub mod shadowmap;

use glam::{Mat3, Mat4, Vec3};
use log::warn;
use serde::Serialize;
use thiserror::Error;

use crate::components::bodypart::{BodyPart, PartShape};
use crate::components::palette::RigPalette;
use crate::components::pose::RigPose;
use crate::resources::companionconfig::CompanionConfig;
use crate::resources::viewport::Viewport;

use camera::OrbitCamera;
use lighting::{DirectionalLight, Lighting};
use shadowmap::ShadowMap;

/// Depth of the drawn floor strip, pixels.
const FLOOR_DEPTH: f32 = 120.0;
/// Contact shadow radius at full size, pixels.
const CONTACT_SHADOW_RADIUS: f32 = 26.0;
const CONTACT_SHADOW_ALPHA: f32 = 0.45;
/// Lights closer than this to horizontal cast no floor shadows.
const MIN_LIGHT_ELEVATION: f32 = 0.05;
/// Edge of a sampled floor shadow cell, pixels.
const FLOOR_CELL: f32 = 8.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("no light configured")]
    MissingLight,
    #[error("degenerate light: {0}")]
    DegenerateLight(String),
}

/// How a frame was shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShadingMode {
    Lit,
    FlatFallback,
}

/// Local face normals of a box, matching `DrawCommand::face_colors`.
pub const FACE_NORMALS: [Vec3; 6] = [
    Vec3::NEG_X,
    Vec3::X,
    Vec3::NEG_Y,
    Vec3::Y,
    Vec3::NEG_Z,
    Vec3::Z,
];

/// One rig part to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub part: BodyPart,
    /// Part-local pixels to world pixels.
    pub model: Mat4,
    pub shape: PartShape,
    /// Shape centre in part-local pixels.
    pub center: Vec3,
    /// Box faces in [`FACE_NORMALS`] order; spheres use the first entry.
    pub face_colors: [[u8; 3]; 6],
}

/// Floor strip between the side walls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorQuad {
    pub y: f32,
    pub x_range: [f32; 2],
    pub z_range: [f32; 2],
    pub color: [u8; 3],
}

/// Sphere standing in for a scene item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemSprite {
    pub center: Vec3,
    pub radius: f32,
    pub color: [u8; 3],
}

/// What to draw this frame.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub pose: &'a RigPose,
    pub palette: RigPalette,
    pub items: &'a [ItemSprite],
}

impl<'a> Scene<'a> {
    /// The rig alone in its default colours.
    pub fn rig(pose: &'a RigPose) -> Self {
        Self {
            pose,
            palette: RigPalette::default(),
            items: &[],
        }
    }
}

/// Square of floor darkened by the rig's cast shadow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowPatch {
    pub center: Vec3,
    pub half_size: f32,
    /// Opacity of black drawn over the lit floor.
    pub alpha: f32,
}

/// Soft blob on the floor under the companion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactShadow {
    pub center: Vec3,
    pub radius: f32,
    pub alpha: f32,
}

/// Camera placement for backends that build their own camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSetup {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Visible height of the orthographic view, pixels.
    pub ortho_height: f32,
}

/// Everything a backend needs to paint one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub camera: CameraSetup,
    pub view: Mat4,
    pub projection: Mat4,
    pub clear_color: [u8; 3],
    pub floor: FloorQuad,
    pub floor_shadow: Vec<ShadowPatch>,
    pub contact_shadow: Option<ContactShadow>,
    pub commands: Vec<DrawCommand>,
    /// Item spheres with shaded colours.
    pub items: Vec<ItemSprite>,
    pub shading: ShadingMode,
    pub msaa_samples: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub shadow_map_size: u32,
    pub msaa_samples: u32,
    pub clear_color: [u8; 3],
    pub floor_color: [u8; 3],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadow_map_size: 1024,
            msaa_samples: 4,
            clear_color: [236, 240, 245],
            floor_color: [200, 206, 196],
        }
    }
}

impl RenderSettings {
    pub fn from_config(config: &CompanionConfig) -> Self {
        Self {
            shadow_map_size: config.shadow_map_size,
            msaa_samples: config.msaa_samples,
            ..Default::default()
        }
    }
}

pub struct SceneRenderer {
    settings: RenderSettings,
    camera: OrbitCamera,
    light: Option<DirectionalLight>,
    shadow_map: ShadowMap,
    fallback_warned: bool,
}

impl SceneRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            camera: OrbitCamera::default(),
            light: Some(DirectionalLight::default()),
            shadow_map: ShadowMap::new(settings.shadow_map_size as usize),
            fallback_warned: false,
        }
    }

    pub fn from_config(config: &CompanionConfig) -> Self {
        Self::new(RenderSettings::from_config(config))
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    /// Replace the key light. `None` forces flat shading.
    pub fn set_light(&mut self, light: Option<DirectionalLight>) {
        self.light = light;
        self.fallback_warned = false;
    }

    fn lighting(&mut self) -> Option<Lighting> {
        let result = self.light.as_ref().ok_or(RenderError::MissingLight).and_then(|l| l.validated());
        match result {
            Ok(lighting) => Some(lighting),
            Err(err) => {
                if !self.fallback_warned {
                    warn!("renderer falling back to flat shading: {}", err);
                    self.fallback_warned = true;
                }
                None
            }
        }
    }

    /// Build the frame for `scene`.
    pub fn render(&mut self, scene: &Scene<'_>, viewport: &Viewport) -> RenderFrame {
        let pose = scene.pose;
        self.camera.fit_viewport(viewport);
        let lighting = self.lighting();
        if let Some(lighting) = &lighting {
            self.shadow_map.render(pose, lighting);
        }

        let commands = BodyPart::ALL
            .into_iter()
            .map(|part| self.draw_command(pose, &scene.palette, part, lighting.as_ref()))
            .collect();
        let items = scene
            .items
            .iter()
            .map(|item| self.shade_item(item, lighting.as_ref()))
            .collect();

        let floor_color = match &lighting {
            Some(l) => l.shade(self.settings.floor_color, Vec3::Y, 1.0),
            None => self.settings.floor_color,
        };
        let floor_shadow = match &lighting {
            Some(l) => self.floor_shadow(l, viewport),
            None => Vec::new(),
        };
        let contact_shadow = lighting
            .as_ref()
            .and_then(|l| contact_shadow(pose, l, viewport.floor_y));

        RenderFrame {
            camera: CameraSetup {
                eye: self.camera.eye(),
                target: self.camera.target,
                up: Vec3::Y,
                ortho_height: self.camera.ortho_height(),
            },
            view: self.camera.view(),
            projection: self.camera.projection(),
            clear_color: self.settings.clear_color,
            floor: FloorQuad {
                y: viewport.floor_y,
                x_range: [0.0, viewport.width],
                z_range: [-FLOOR_DEPTH, FLOOR_DEPTH],
                color: floor_color,
            },
            floor_shadow,
            contact_shadow,
            commands,
            items,
            shading: if lighting.is_some() {
                ShadingMode::Lit
            } else {
                ShadingMode::FlatFallback
            },
            msaa_samples: self.settings.msaa_samples,
        }
    }

    fn draw_command(
        &self,
        pose: &RigPose,
        palette: &RigPalette,
        part: BodyPart,
        lighting: Option<&Lighting>,
    ) -> DrawCommand {
        let def = part.def();
        let base = palette.color_of(part);
        let model = pose.part_matrix(part);
        let mut face_colors = [base; 6];
        if let Some(lighting) = lighting {
            let normal_matrix = Mat3::from_mat4(model).inverse().transpose();
            match def.shape {
                PartShape::Box { half_extents } => {
                    for (slot, normal) in face_colors.iter_mut().zip(FACE_NORMALS) {
                        let world_normal = (normal_matrix * normal).normalize_or_zero();
                        let face_center = model.transform_point3(def.center + normal * half_extents);
                        let visibility = self.shadow_map.visibility(face_center + world_normal);
                        *slot = lighting.shade(base, world_normal, visibility);
                    }
                }
                PartShape::Sphere { radius } => {
                    let center = model.transform_point3(def.center);
                    let facing_camera = -self.camera.forward();
                    let lit_side = center + lighting.to_light * (radius + 1.0);
                    let visibility = self.shadow_map.visibility(lit_side);
                    let color = lighting.shade(base, (facing_camera + lighting.to_light).normalize_or_zero(), visibility);
                    face_colors = [color; 6];
                }
            }
        }
        DrawCommand {
            part,
            model,
            shape: def.shape,
            center: def.center,
            face_colors,
        }
    }

    fn shade_item(&self, item: &ItemSprite, lighting: Option<&Lighting>) -> ItemSprite {
        let Some(lighting) = lighting else {
            return *item;
        };
        let lit_side = item.center + lighting.to_light * (item.radius + 1.0);
        let visibility = self.shadow_map.visibility(lit_side);
        let normal = (-self.camera.forward() + lighting.to_light).normalize_or_zero();
        ItemSprite {
            color: lighting.shade(item.color, normal, visibility),
            ..*item
        }
    }

    /// Sample the shadow map over the floor cells the rig can shadow. Each
    /// partly shadowed cell becomes a patch whose alpha darkens the lit floor
    /// colour down to the shaded one.
    fn floor_shadow(&self, lighting: &Lighting, viewport: &Viewport) -> Vec<ShadowPatch> {
        let Some((center, half)) = self.shadow_map.floor_footprint(viewport.floor_y, MIN_LIGHT_ELEVATION) else {
            return Vec::new();
        };
        let x0 = (center.x - half).max(0.0);
        let x1 = (center.x + half).min(viewport.width);
        let z0 = (center.z - half).max(-FLOOR_DEPTH);
        let z1 = (center.z + half).min(FLOOR_DEPTH);
        let diffuse = lighting.to_light.y.max(0.0) * lighting.intensity;
        let lit = lighting.ambient + diffuse;
        if lit <= f32::EPSILON || x1 <= x0 || z1 <= z0 {
            return Vec::new();
        }

        let mut patches = Vec::new();
        let mut z = z0 + FLOOR_CELL * 0.5;
        while z < z1 {
            let mut x = x0 + FLOOR_CELL * 0.5;
            while x < x1 {
                let point = Vec3::new(x, viewport.floor_y, z);
                let visibility = self.shadow_map.visibility(point);
                if visibility < 1.0 {
                    patches.push(ShadowPatch {
                        center: point,
                        half_size: FLOOR_CELL * 0.5,
                        alpha: diffuse * (1.0 - visibility) / lit,
                    });
                }
                x += FLOOR_CELL;
            }
            z += FLOOR_CELL;
        }
        patches
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

/// Blob where the light ray through the rig root meets the floor, fading
/// with the pose's shadow intensity.
fn contact_shadow(pose: &RigPose, lighting: &Lighting, floor_y: f32) -> Option<ContactShadow> {
    if lighting.to_light.y < MIN_LIGHT_ELEVATION {
        return None;
    }
    let root = pose.root.translation;
    let height = (root.y - floor_y).max(0.0);
    let along = lighting.to_light * (height / lighting.to_light.y);
    let center = Vec3::new(root.x - along.x, floor_y, root.z - along.z);
    let width = pose.params.scale_x.abs().max(0.1);
    Some(ContactShadow {
        center,
        radius: CONTACT_SHADOW_RADIUS * width * (0.5 + 0.5 * pose.shadow_intensity),
        alpha: CONTACT_SHADOW_ALPHA * pose.shadow_intensity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::facing::FacingDirection;
    use crate::components::palette::ColorSlot;
    use crate::systems::pose::compose_rest_pose;

    fn small_renderer() -> SceneRenderer {
        SceneRenderer::new(RenderSettings {
            shadow_map_size: 128,
            ..Default::default()
        })
    }

    #[test]
    fn frame_has_one_command_per_part() {
        let mut renderer = small_renderer();
        let viewport = Viewport::default();
        let pose = compose_rest_pose(Vec3::new(240.0, viewport.floor_y, 0.0), FacingDirection::Right);
        let frame = renderer.render(&Scene::rig(&pose), &viewport);
        assert_eq!(frame.commands.len(), BodyPart::ALL.len());
        assert_eq!(frame.shading, ShadingMode::Lit);
        assert_eq!(frame.msaa_samples, 4);
        let shadow = frame.contact_shadow.unwrap();
        assert!((shadow.alpha - CONTACT_SHADOW_ALPHA).abs() < 1e-6);
        assert_eq!(shadow.center.y, viewport.floor_y);
    }

    #[test]
    fn missing_light_falls_back_to_flat_colours() {
        let mut renderer = small_renderer();
        renderer.set_light(None);
        let viewport = Viewport::default();
        let pose = compose_rest_pose(Vec3::new(240.0, viewport.floor_y, 0.0), FacingDirection::Right);
        let frame = renderer.render(&Scene::rig(&pose), &viewport);
        assert_eq!(frame.shading, ShadingMode::FlatFallback);
        assert!(frame.contact_shadow.is_none());
        assert!(frame.floor_shadow.is_empty());
        for command in &frame.commands {
            assert_eq!(command.face_colors, [command.part.def().color; 6]);
        }
    }

    #[test]
    fn degenerate_light_falls_back_too() {
        let mut renderer = small_renderer();
        renderer.set_light(Some(DirectionalLight {
            direction: Vec3::new(f32::NAN, -1.0, 0.0),
            ..Default::default()
        }));
        let viewport = Viewport::default();
        let pose = compose_rest_pose(Vec3::new(240.0, viewport.floor_y, 0.0), FacingDirection::Right);
        assert_eq!(renderer.render(&Scene::rig(&pose), &viewport).shading, ShadingMode::FlatFallback);
    }

    #[test]
    fn airborne_shadow_is_fainter() {
        let lighting = DirectionalLight::default().validated().unwrap();
        let mut pose = compose_rest_pose(Vec3::new(240.0, 24.0, 0.0), FacingDirection::Right);
        let grounded = contact_shadow(&pose, &lighting, 24.0).unwrap();
        pose.shadow_intensity = 0.25;
        let airborne = contact_shadow(&pose, &lighting, 24.0).unwrap();
        assert!(airborne.alpha < grounded.alpha);
        assert!(airborne.radius < grounded.radius);
    }

    #[test]
    fn rig_casts_a_shadow_on_the_floor() {
        let mut renderer = small_renderer();
        let viewport = Viewport::default();
        let pose = compose_rest_pose(Vec3::new(240.0, viewport.floor_y, 0.0), FacingDirection::Right);
        let frame = renderer.render(&Scene::rig(&pose), &viewport);
        assert!(!frame.floor_shadow.is_empty());
        for patch in &frame.floor_shadow {
            assert_eq!(patch.center.y, viewport.floor_y);
            assert!(patch.center.z.abs() <= FLOOR_DEPTH);
            assert!(patch.alpha > 0.0 && patch.alpha < 1.0);
        }
        // The default key light sits up and to the right, so the shadow
        // falls left of the root.
        let mean_x = frame.floor_shadow.iter().map(|p| p.center.x).sum::<f32>() / frame.floor_shadow.len() as f32;
        assert!(mean_x < 240.0);
    }

    #[test]
    fn palette_overrides_part_colours() {
        let mut renderer = small_renderer();
        renderer.set_light(None);
        let viewport = Viewport::default();
        let pose = compose_rest_pose(Vec3::new(240.0, viewport.floor_y, 0.0), FacingDirection::Right);
        let mut palette = RigPalette::default();
        palette.set(ColorSlot::Accent, [30, 90, 200]);
        let scene = Scene {
            pose: &pose,
            palette,
            items: &[],
        };
        let frame = renderer.render(&scene, &viewport);
        for command in &frame.commands {
            let expected = match ColorSlot::of(command.part) {
                ColorSlot::Accent => [30, 90, 200],
                ColorSlot::Body => command.part.def().color,
            };
            assert_eq!(command.face_colors, [expected; 6], "{}", command.part);
        }
    }

    #[test]
    fn items_are_drawn_and_shaded() {
        let mut renderer = small_renderer();
        let viewport = Viewport::default();
        let pose = compose_rest_pose(Vec3::new(240.0, viewport.floor_y, 0.0), FacingDirection::Right);
        let sprites = [ItemSprite {
            center: Vec3::new(400.0, viewport.floor_y + 10.0, 0.0),
            radius: 10.0,
            color: [200, 200, 200],
        }];
        let scene = Scene {
            pose: &pose,
            palette: RigPalette::default(),
            items: &sprites,
        };
        let frame = renderer.render(&scene, &viewport);
        assert_eq!(frame.items.len(), 1);
        assert_eq!(frame.items[0].center, sprites[0].center);
        // The warm key light tints grey.
        let [r, _, b] = frame.items[0].color;
        assert!(b < r);

        renderer.set_light(None);
        let flat = renderer.render(&scene, &viewport);
        assert_eq!(flat.items, sprites.to_vec());
    }
}
