//! Software shadow map.
//!
//! Depth of the posed rig as seen from the directional light, rasterised
//! into a square depth buffer (1024² by default). Boxes are drawn as their
//! twelve triangles; spheres as depth discs facing the light. Lookups use a
//! 3×3 percentage-closer filter with a small depth bias.
//!
//! The same lookups shade the floor: [`ShadowMap::floor_footprint`] gives
//! the patch of floor the rig can shadow, which the renderer samples in
//! cells.

use glam::{Mat4, Vec2, Vec3};

use crate::components::bodypart::{BodyPart, PartShape};
use crate::components::pose::RigPose;

use super::lighting::Lighting;

/// Depth bias in normalised light depth.
const DEPTH_BIAS: f32 = 0.004;
/// Extra room around the rig in the light frustum, pixels.
const BOUNDS_MARGIN: f32 = 40.0;
const MIN_SIZE: usize = 16;

const BOX_FACES: [[usize; 4]; 6] = [
    [0, 1, 3, 2], // -x
    [4, 6, 7, 5], // +x
    [0, 4, 5, 1], // -y
    [2, 3, 7, 6], // +y
    [0, 2, 6, 4], // -z
    [1, 5, 7, 3], // +z
];

/// Eight corners of a box, index bits (x, y, z) = (4, 2, 1).
pub fn box_corners(center: Vec3, half: Vec3) -> [Vec3; 8] {
    let mut corners = [Vec3::ZERO; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let sx = if i & 4 != 0 { 1.0 } else { -1.0 };
        let sy = if i & 2 != 0 { 1.0 } else { -1.0 };
        let sz = if i & 1 != 0 { 1.0 } else { -1.0 };
        *corner = center + half * Vec3::new(sx, sy, sz);
    }
    corners
}

/// Triangles of a box, two per face.
pub fn box_triangles(corners: &[Vec3; 8]) -> impl Iterator<Item = [Vec3; 3]> + '_ {
    BOX_FACES.iter().flat_map(move |[a, b, c, d]| {
        [
            [corners[*a], corners[*b], corners[*c]],
            [corners[*a], corners[*c], corners[*d]],
        ]
    })
}

#[derive(Debug, Clone)]
pub struct ShadowMap {
    size: usize,
    depth: Vec<f32>,
    light_view_proj: Mat4,
    /// Centre of the rig bounds the frustum is aimed at.
    bounds_center: Vec3,
    to_light: Vec3,
    /// Light frustum half extent, pixels.
    extent: f32,
    /// Light frustum depth range, pixels.
    depth_range: f32,
}

impl ShadowMap {
    pub fn new(size: usize) -> Self {
        let size = size.max(MIN_SIZE);
        Self {
            size,
            depth: vec![f32::INFINITY; size * size],
            light_view_proj: Mat4::IDENTITY,
            bounds_center: Vec3::ZERO,
            to_light: Vec3::Y,
            extent: 1.0,
            depth_range: 1.0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Re-render the depth buffer for `pose` lit by `lighting`.
    pub fn render(&mut self, pose: &RigPose, lighting: &Lighting) {
        let (center, radius) = rig_bounds(pose);
        let eye = center + lighting.to_light * radius * 2.0;
        let up = if lighting.to_light.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
        let view = Mat4::look_at_rh(eye, center, up);
        self.bounds_center = center;
        self.to_light = lighting.to_light;
        self.extent = radius;
        self.depth_range = radius * 4.0;
        self.light_view_proj = Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, self.depth_range) * view;
        self.depth.fill(f32::INFINITY);

        let light_view_proj = self.light_view_proj;
        for part in BodyPart::ALL {
            let model = pose.part_matrix(part);
            let def = part.def();
            match def.shape {
                PartShape::Box { half_extents } => {
                    let corners = box_corners(def.center, half_extents).map(|c| model.transform_point3(c));
                    for tri in box_triangles(&corners) {
                        self.raster_triangle(tri.map(|p| light_view_proj.project_point3(p)));
                    }
                }
                PartShape::Sphere { radius } => {
                    let world_center = model.transform_point3(def.center);
                    let world_radius = radius * model.x_axis.truncate().length().max(model.y_axis.truncate().length());
                    self.raster_disc(world_center, world_radius);
                }
            }
        }
    }

    /// Square of floor at height `floor_y` that the light frustum covers,
    /// as (centre, half size). `None` for lights too close to horizontal to
    /// reach the floor.
    pub fn floor_footprint(&self, floor_y: f32, min_elevation: f32) -> Option<(Vec3, f32)> {
        if self.to_light.y < min_elevation {
            return None;
        }
        let height = self.bounds_center.y - floor_y;
        let hit = self.bounds_center - self.to_light * (height / self.to_light.y);
        let half = (self.extent / self.to_light.y).min(self.extent * 4.0);
        Some((Vec3::new(hit.x, floor_y, hit.z), half))
    }

    fn to_texel(&self, ndc: Vec3) -> Vec2 {
        let size = self.size as f32;
        Vec2::new((ndc.x * 0.5 + 0.5) * size, (0.5 - ndc.y * 0.5) * size)
    }

    fn raster_triangle(&mut self, ndc: [Vec3; 3]) {
        let [a, b, c] = ndc.map(|p| (self.to_texel(p), p.z));
        let area = edge(a.0, b.0, c.0);
        if area.abs() <= f32::EPSILON {
            return;
        }
        let max = (self.size - 1) as f32;
        let x0 = a.0.x.min(b.0.x).min(c.0.x).floor().clamp(0.0, max) as usize;
        let x1 = a.0.x.max(b.0.x).max(c.0.x).ceil().clamp(0.0, max) as usize;
        let y0 = a.0.y.min(b.0.y).min(c.0.y).floor().clamp(0.0, max) as usize;
        let y1 = a.0.y.max(b.0.y).max(c.0.y).ceil().clamp(0.0, max) as usize;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b.0, c.0, p) / area;
                let w1 = edge(c.0, a.0, p) / area;
                let w2 = edge(a.0, b.0, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = w0 * a.1 + w1 * b.1 + w2 * c.1;
                self.write_depth(x, y, z);
            }
        }
    }

    fn raster_disc(&mut self, center: Vec3, radius: f32) {
        let ndc = self.light_view_proj.project_point3(center);
        let texel = self.to_texel(ndc);
        let texel_radius = radius / (2.0 * self.extent) * self.size as f32;
        let depth_radius = radius / self.depth_range;
        let max = (self.size - 1) as f32;
        let x0 = (texel.x - texel_radius).floor().clamp(0.0, max) as usize;
        let x1 = (texel.x + texel_radius).ceil().clamp(0.0, max) as usize;
        let y0 = (texel.y - texel_radius).floor().clamp(0.0, max) as usize;
        let y1 = (texel.y + texel_radius).ceil().clamp(0.0, max) as usize;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = (Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - texel) / texel_radius;
                let r2 = d.length_squared();
                if r2 > 1.0 {
                    continue;
                }
                self.write_depth(x, y, ndc.z - depth_radius * (1.0 - r2).sqrt());
            }
        }
    }

    fn write_depth(&mut self, x: usize, y: usize, z: f32) {
        let slot = &mut self.depth[y * self.size + x];
        if z < *slot {
            *slot = z;
        }
    }

    /// Fraction of the 3×3 neighbourhood in which `point` is lit, in [0, 1].
    /// Points outside the light frustum are fully lit.
    pub fn visibility(&self, point: Vec3) -> f32 {
        let ndc = self.light_view_proj.project_point3(point);
        if !ndc.is_finite() || ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
            return 1.0;
        }
        let texel = self.to_texel(ndc);
        let cx = texel.x.floor() as i64;
        let cy = texel.y.floor() as i64;
        let last = self.size as i64 - 1;
        let mut lit = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let x = (cx + dx).clamp(0, last) as usize;
                let y = (cy + dy).clamp(0, last) as usize;
                if ndc.z - DEPTH_BIAS <= self.depth[y * self.size + x] {
                    lit += 1;
                }
            }
        }
        lit as f32 / 9.0
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Centre and radius of a sphere enclosing every part.
fn rig_bounds(pose: &RigPose) -> (Vec3, f32) {
    let centers = BodyPart::ALL.map(|part| pose.center_world(part));
    let center = centers.iter().copied().sum::<Vec3>() / centers.len() as f32;
    let radius = centers
        .iter()
        .map(|c| c.distance(center))
        .fold(0.0f32, f32::max);
    (center, radius + BOUNDS_MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::facing::FacingDirection;
    use crate::render::lighting::DirectionalLight;
    use crate::systems::pose::compose_rest_pose;

    fn lit_map(light: DirectionalLight) -> (ShadowMap, RigPose) {
        let pose = compose_rest_pose(Vec3::new(200.0, 20.0, 0.0), FacingDirection::Right);
        let mut map = ShadowMap::new(256);
        map.render(&pose, &light.validated().unwrap());
        (map, pose)
    }

    #[test]
    fn box_has_twelve_triangles() {
        let corners = box_corners(Vec3::ZERO, Vec3::ONE);
        assert_eq!(box_triangles(&corners).count(), 12);
    }

    #[test]
    fn floor_under_overhead_light_is_shadowed() {
        let (map, _) = lit_map(DirectionalLight {
            direction: Vec3::new(0.0, -1.0, -0.05),
            ..Default::default()
        });
        // Straight under the body, on the floor.
        assert!(map.visibility(Vec3::new(200.0, 20.0, 0.0)) < 0.5);
        // Far to the side of the rig.
        assert_eq!(map.visibility(Vec3::new(600.0, 20.0, 0.0)), 1.0);
    }

    #[test]
    fn footprint_follows_the_light() {
        let (map, pose) = lit_map(DirectionalLight::default());
        let (center, half) = map.floor_footprint(20.0, 0.05).unwrap();
        assert_eq!(center.y, 20.0);
        // Light comes from +x/+z, so the footprint sits toward -x/-z.
        let root = pose.root.translation;
        assert!(center.x < root.x && center.z < root.z);
        assert!(half > 0.0);

        let (grazing, _) = lit_map(DirectionalLight {
            direction: Vec3::new(-1.0, -0.01, 0.0),
            ..Default::default()
        });
        assert!(grazing.floor_footprint(20.0, 0.05).is_none());
    }

    #[test]
    fn top_of_head_is_lit_from_above() {
        let (map, pose) = lit_map(DirectionalLight {
            direction: Vec3::new(0.0, -1.0, -0.05),
            ..Default::default()
        });
        let top = pose.center_world(BodyPart::Head) + Vec3::new(0.0, 27.0, 0.0);
        assert!(map.visibility(top) > 0.5);
    }
}
