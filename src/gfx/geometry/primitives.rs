//! # Primitive Shape Generation
//!
//! Each generator emits positions, normals and UVs with counter-clockwise
//! front faces. Vertex ordering follows the common web scene-graph layouts so
//! texture sets line up without per-shape fixes.

use super::GeometryData;
use std::f32::consts::PI;

/// Axis-aligned box centred at the origin
///
/// Each face is a separate quad with its own normal and a full 0..1 UV range.
pub fn generate_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::new();

    // (u axis, v axis, w axis, u dir, v dir, extent u, extent v, signed extent w)
    let faces: [(usize, usize, usize, f32, f32, f32, f32, f32); 6] = [
        (2, 1, 0, -1.0, -1.0, depth, height, width),  // +X
        (2, 1, 0, 1.0, -1.0, depth, height, -width),  // -X
        (0, 2, 1, 1.0, 1.0, width, depth, height),    // +Y
        (0, 2, 1, 1.0, -1.0, width, depth, -height),  // -Y
        (0, 1, 2, 1.0, -1.0, width, height, depth),   // +Z
        (0, 1, 2, -1.0, -1.0, width, height, -depth), // -Z
    ];

    for (u, v, w, udir, vdir, extent_u, extent_v, extent_w) in faces {
        let start = data.vertices.len() as u32;
        let normal_sign = if extent_w > 0.0 { 1.0 } else { -1.0 };

        for iy in 0..2 {
            let y = iy as f32 * extent_v - extent_v / 2.0;
            for ix in 0..2 {
                let x = ix as f32 * extent_u - extent_u / 2.0;

                let mut position = [0.0; 3];
                position[u] = x * udir;
                position[v] = y * vdir;
                position[w] = extent_w / 2.0;

                let mut normal = [0.0; 3];
                normal[w] = normal_sign;

                data.push_vertex(position, normal, [ix as f32, 1.0 - iy as f32]);
            }
        }

        let a = start;
        let b = start + 2;
        let c = start + 3;
        let d = start + 1;
        data.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    data
}

/// Flat plane in the XY plane facing +Z
///
/// # Arguments
/// * `width`, `height` - Extent along X and Y
/// * `width_segments`, `height_segments` - Subdivisions (at least 1)
pub fn generate_plane(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let grid_x = width_segments.max(1);
    let grid_y = height_segments.max(1);
    let segment_width = width / grid_x as f32;
    let segment_height = height / grid_y as f32;

    for iy in 0..=grid_y {
        let y = iy as f32 * segment_height - height / 2.0;
        for ix in 0..=grid_x {
            let x = ix as f32 * segment_width - width / 2.0;
            data.push_vertex(
                [x, -y, 0.0],
                [0.0, 0.0, 1.0],
                [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
            );
        }
    }

    let row = grid_x + 1;
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = ix + row * iy;
            let b = ix + row * (iy + 1);
            let c = (ix + 1) + row * (iy + 1);
            let d = (ix + 1) + row * iy;
            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    data
}

/// UV sphere centred at the origin
///
/// Poles sit on the Y axis; the seam column is duplicated so UVs wrap cleanly.
pub fn generate_sphere(radius: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut grid = Vec::with_capacity(height_segments as usize + 1);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;

        // Offset pole UVs to the middle of their segment
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * PI * 2.0;
            let theta = v * PI;

            let position = [
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            ];
            let normal = normalize(position);

            row.push(data.push_vertex(position, normal, [u + u_offset, 1.0 - v]));
        }
        grid.push(row);
    }

    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];

            if iy != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    data
}

/// Closed cone centred at the origin with its apex at `+height / 2`
///
/// With four radial segments this is a square pyramid whose corners lie on
/// the X and Z axes.
pub fn generate_cone(radius: f32, height: f32, radial_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let radial_segments = radial_segments.max(3);
    let half_height = height / 2.0;
    let slope = radius / height;

    // Side: row 0 is the apex ring, row 1 the base ring
    let mut rows = [Vec::new(), Vec::new()];
    for (y, row) in rows.iter_mut().enumerate() {
        let v = y as f32;
        let ring_radius = v * radius;

        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let theta = u * PI * 2.0;
            let (sin_t, cos_t) = theta.sin_cos();

            let position = [
                ring_radius * sin_t,
                -v * height + half_height,
                ring_radius * cos_t,
            ];
            let normal = normalize([sin_t, slope, cos_t]);
            row.push(data.push_vertex(position, normal, [u, 1.0 - v]));
        }
    }

    for x in 0..radial_segments as usize {
        // The apex triangle of each quad is degenerate, keep only the lower one
        let b = rows[1][x];
        let c = rows[1][x + 1];
        let d = rows[0][x + 1];
        data.indices.extend_from_slice(&[b, c, d]);
    }

    // Base cap
    let center_start = data.vertices.len() as u32;
    for _ in 0..radial_segments {
        data.push_vertex([0.0, -half_height, 0.0], [0.0, -1.0, 0.0], [0.5, 0.5]);
    }
    let ring_start = data.vertices.len() as u32;
    for x in 0..=radial_segments {
        let u = x as f32 / radial_segments as f32;
        let (sin_t, cos_t) = (u * PI * 2.0).sin_cos();
        data.push_vertex(
            [radius * sin_t, -half_height, radius * cos_t],
            [0.0, -1.0, 0.0],
            [cos_t * 0.5 + 0.5, -sin_t * 0.5 + 0.5],
        );
    }
    for x in 0..radial_segments {
        let center = center_start + x;
        let i = ring_start + x;
        data.indices.extend_from_slice(&[i + 1, i, center]);
    }

    data
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 1.0, 0.0]
    }
}
