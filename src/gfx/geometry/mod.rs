//! # Procedural Geometry Generation
//!
//! Generators for the primitive shapes the scene is built from. All shapes are
//! Y-up, use counter-clockwise front faces and place the UV origin at the
//! bottom-left, so textures authored for a typical web scene graph map the
//! same way.
//!
//! ## Supported Primitives
//!
//! - **Box**: axis-aligned box, one quad per face
//! - **Plane**: XY plane facing +Z with configurable subdivisions
//! - **Sphere**: UV sphere with configurable resolution
//! - **Cone**: closed cone with apex on +Y
//!
//! ## Usage
//!
//! ```rust
//! use haunted_house::gfx::geometry::{generate_box, generate_cone, generate_plane};
//!
//! let walls = generate_box(4.0, 2.5, 4.0);
//! let roof = generate_cone(3.5, 1.0, 4);
//! let door = generate_plane(2.2, 2.2, 100, 100);
//! assert_eq!(walls.triangle_count(), 12);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        self.normals.push(normal);
        self.tex_coords.push(uv);
        index
    }

    /// Interleaves the attribute streams into the renderer's vertex format
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex3D {
                position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }
}
