//! # Procedural Geometry Generation
//!
//! Pure builders producing vertex and index data for the editor's primitive
//! shapes, plus the OBJ importer used for mesh objects. Nothing in here touches
//! the GPU; uploads happen later in the scene layer.
//!
//! ## Supported Primitives
//!
//! - **Cube**: unit cube, one quad per face
//! - **Sphere**: UV sphere with configurable resolution
//! - **Pyramid**: square base with the apex on +Y
//! - **Cylinder**: Y-up cylinder with capped ends
//! - **Plane**: flat ground plane in XZ
//!
//! ## Usage
//!
//! ```rust
//! use stagehand::gfx::geometry::{generate_cube, generate_sphere, generate_pyramid};
//!
//! let cube_data = generate_cube();
//! let sphere_data = generate_sphere(20, 20);
//! let pyramid_data = generate_pyramid(1.0, 1.0);
//! assert_eq!(pyramid_data.indices.len(), 18);
//! ```

pub mod import;
pub mod primitives;

pub use import::{import_mesh, ImportError, MeshData};
pub use primitives::*;

use cgmath::{InnerSpace, Vector3};

use crate::gfx::scene::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, PartialEq)]
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
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            tex_coords: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Interleaves positions, normals and texture coordinates into the GPU vertex format
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        (0..self.vertices.len())
            .map(|i| Vertex3D {
                position: self.vertices[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }

    /// Replaces the normals with area-weighted averages of the adjacent face normals
    pub fn compute_smooth_normals(&mut self) {
        let mut accumulated = vec![Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= self.vertices.len() || i1 >= self.vertices.len() || i2 >= self.vertices.len()
            {
                continue;
            }

            let v0 = Vector3::from(self.vertices[i0]);
            let v1 = Vector3::from(self.vertices[i1]);
            let v2 = Vector3::from(self.vertices[i2]);
            let face_normal = (v1 - v0).cross(v2 - v0);

            for index in [i0, i1, i2] {
                accumulated[index] += face_normal;
            }
        }

        self.normals = accumulated
            .into_iter()
            .map(|n| {
                if n.magnitude2() > 0.0 {
                    n.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect();
    }
}

impl Default for GeometryData {
    fn default() -> Self {
        Self::new()
    }
}
