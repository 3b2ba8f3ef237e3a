//! raylib painter for [`RenderFrame`]s.
//!
//! Triangles are submitted with both windings, so mirrored parts (facing
//! left) draw correctly with back-face culling left on.

use raylib::prelude::*;

use super::shadowmap::{box_corners, box_triangles};
use super::{DrawCommand, RenderFrame};
use crate::components::bodypart::PartShape;

fn v3(v: glam::Vec3) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

fn rgb(c: [u8; 3]) -> Color {
    Color::new(c[0], c[1], c[2], 255)
}

fn camera(frame: &RenderFrame) -> Camera3D {
    Camera3D::orthographic(
        v3(frame.camera.eye),
        v3(frame.camera.target),
        v3(frame.camera.up),
        frame.camera.ortho_height,
    )
}

fn double_sided<D: RaylibDraw3D>(d: &mut D, tri: [glam::Vec3; 3], color: Color) {
    d.draw_triangle3D(v3(tri[0]), v3(tri[1]), v3(tri[2]), color);
    d.draw_triangle3D(v3(tri[0]), v3(tri[2]), v3(tri[1]), color);
}

fn draw_part<D: RaylibDraw3D>(d: &mut D, command: &DrawCommand) {
    match command.shape {
        PartShape::Box { half_extents } => {
            let corners = box_corners(command.center, half_extents).map(|c| command.model.transform_point3(c));
            // Two triangles per face, faces in FACE_NORMALS order.
            for (i, tri) in box_triangles(&corners).enumerate() {
                double_sided(d, tri, rgb(command.face_colors[i / 2]));
            }
        }
        PartShape::Sphere { radius } => {
            let center = command.model.transform_point3(command.center);
            let scale = (command.model.x_axis.truncate().length() + command.model.y_axis.truncate().length()) * 0.5;
            d.draw_sphere(v3(center), radius * scale, rgb(command.face_colors[0]));
        }
    }
}

/// Paint `frame` inside an open drawing scope.
pub fn draw_frame(d: &mut RaylibDrawHandle, frame: &RenderFrame) {
    d.clear_background(rgb(frame.clear_color));
    let mut d3 = d.begin_mode3D(camera(frame));

    let floor = frame.floor;
    let [x0, x1] = floor.x_range;
    let [z0, z1] = floor.z_range;
    let corners = [
        glam::Vec3::new(x0, floor.y, z0),
        glam::Vec3::new(x1, floor.y, z0),
        glam::Vec3::new(x1, floor.y, z1),
        glam::Vec3::new(x0, floor.y, z1),
    ];
    double_sided(&mut d3, [corners[0], corners[2], corners[1]], rgb(floor.color));
    double_sided(&mut d3, [corners[0], corners[3], corners[2]], rgb(floor.color));

    // Patches sit just above the floor to avoid z-fighting.
    for patch in &frame.floor_shadow {
        let alpha = (patch.alpha.clamp(0.0, 1.0) * 255.0) as u8;
        let c = patch.center + glam::Vec3::new(0.0, 0.25, 0.0);
        let h = patch.half_size;
        let quad = [
            c + glam::Vec3::new(-h, 0.0, -h),
            c + glam::Vec3::new(h, 0.0, -h),
            c + glam::Vec3::new(h, 0.0, h),
            c + glam::Vec3::new(-h, 0.0, h),
        ];
        let color = Color::new(0, 0, 0, alpha);
        double_sided(&mut d3, [quad[0], quad[2], quad[1]], color);
        double_sided(&mut d3, [quad[0], quad[3], quad[2]], color);
    }

    if let Some(shadow) = frame.contact_shadow {
        let alpha = (shadow.alpha.clamp(0.0, 1.0) * 255.0) as u8;
        let lifted = shadow.center + glam::Vec3::new(0.0, 0.5, 0.0);
        d3.draw_circle_3D(
            v3(lifted),
            shadow.radius,
            Vector3::new(1.0, 0.0, 0.0),
            90.0,
            Color::new(0, 0, 0, alpha),
        );
    }

    for item in &frame.items {
        d3.draw_sphere(v3(item.center), item.radius, rgb(item.color));
    }

    for command in &frame.commands {
        draw_part(&mut d3, command);
    }
}
