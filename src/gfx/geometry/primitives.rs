//! # Primitive Shape Generation
//!
//! This module contains functions to generate the editor's primitive shapes.
//! All shapes are Y-up, centered on the origin (the pyramid sits on y = 0),
//! and wound counter-clockwise when seen from outside.

use super::GeometryData;
use std::f32::consts::PI;

/// Cube edge length used for new cube objects
pub const CUBE_SIZE: f32 = 1.0;
/// Sphere radius used for new sphere objects
pub const SPHERE_RADIUS: f32 = 1.0;
/// Sphere resolution (sectors and stacks) used for new sphere objects
pub const SPHERE_SEGMENTS: u32 = 20;
pub const PYRAMID_BASE: f32 = 1.0;
pub const PYRAMID_HEIGHT: f32 = 1.0;
pub const CYLINDER_RADIUS: f32 = 1.0;
pub const CYLINDER_HEIGHT: f32 = 2.0;
pub const CYLINDER_SECTORS: u32 = 20;
/// Ground plane edge length
pub const PLANE_SIZE: f32 = 300.0;

/// Generate a unit cube centered at the origin
///
/// Returns a cube with vertices from -0.5 to 0.5 on all axes.
/// Each face has proper normals pointing outward and UV coordinates from 0 to 1.
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();
    let h = CUBE_SIZE * 0.5;

    #[rustfmt::skip]
    let positions = [
        // Front face
        [-h, -h,  h], [ h, -h,  h], [ h,  h,  h], [-h,  h,  h],
        // Back face
        [-h, -h, -h], [-h,  h, -h], [ h,  h, -h], [ h, -h, -h],
        // Left face
        [-h, -h, -h], [-h, -h,  h], [-h,  h,  h], [-h,  h, -h],
        // Right face
        [ h, -h,  h], [ h, -h, -h], [ h,  h, -h], [ h,  h,  h],
        // Top face
        [-h,  h,  h], [ h,  h,  h], [ h,  h, -h], [-h,  h, -h],
        // Bottom face
        [-h, -h, -h], [ h, -h, -h], [ h, -h,  h], [-h, -h,  h],
    ];

    #[rustfmt::skip]
    let tex_coords = [
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [1.0, 1.0], [1.0, 0.0], [0.0, 0.0], [0.0, 1.0],
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
    ];

    let face_normals = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    data.vertices = positions.to_vec();
    data.tex_coords = tex_coords.to_vec();
    data.normals = face_normals
        .iter()
        .flat_map(|normal| std::iter::repeat(*normal).take(4))
        .collect();
    data.indices = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect();

    data
}

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `sectors` - Number of vertical segments (longitude lines)
/// * `stacks` - Number of horizontal segments (latitude lines)
///
/// Returns a sphere of radius [`SPHERE_RADIUS`] centered at the origin.
pub fn generate_sphere(sectors: u32, stacks: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let sectors = sectors.max(3);
    let stacks = stacks.max(2);

    for stack in 0..=stacks {
        let theta = stack as f32 * PI / stacks as f32; // 0 at the north pole
        let (sin_theta, cos_theta) = theta.sin_cos();

        for sector in 0..=sectors {
            let phi = sector as f32 * 2.0 * PI / sectors as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            data.vertices.push([
                normal[0] * SPHERE_RADIUS,
                normal[1] * SPHERE_RADIUS,
                normal[2] * SPHERE_RADIUS,
            ]);
            data.normals.push(normal);
            data.tex_coords
                .push([sector as f32 / sectors as f32, stack as f32 / stacks as f32]);
        }
    }

    for stack in 0..stacks {
        for sector in 0..sectors {
            let first = stack * (sectors + 1) + sector;
            let second = first + sectors + 1;

            // The pole rows collapse to a point, so skip their degenerate halves
            if stack != 0 {
                data.indices.extend_from_slice(&[first, first + 1, second]);
            }
            if stack != stacks - 1 {
                data.indices
                    .extend_from_slice(&[second, first + 1, second + 1]);
            }
        }
    }

    data
}

/// Generate a square-based pyramid standing on the XZ plane
///
/// Five shared vertices (four base corners and the apex) and eighteen indices:
/// two base triangles facing down and one triangle per side.
pub fn generate_pyramid(base_size: f32, height: f32) -> GeometryData {
    let mut data = GeometryData::new();
    let half = base_size * 0.5;

    data.vertices = vec![
        [-half, 0.0, half],
        [half, 0.0, half],
        [half, 0.0, -half],
        [-half, 0.0, -half],
        [0.0, height, 0.0],
    ];
    data.tex_coords = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.5, 0.5]];

    data.indices = vec![0, 2, 1, 0, 3, 2];
    for i in 0..4u32 {
        data.indices.extend_from_slice(&[i, (i + 1) % 4, 4]);
    }

    data.compute_smooth_normals();
    data
}

/// Generate a plane in the XZ plane with its normal pointing up (+Y)
///
/// # Arguments
/// * `width` - Extent along X
/// * `depth` - Extent along Z
/// * `width_segments` - Number of subdivisions along width
/// * `depth_segments` - Number of subdivisions along depth
pub fn generate_plane(width: f32, depth: f32, width_segments: u32, depth_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let d_segs = depth_segments.max(1);

    for z in 0..=d_segs {
        let v = z as f32 / d_segs as f32;
        let pos_z = (v - 0.5) * depth;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, 0.0, pos_z]);
            data.normals.push([0.0, 1.0, 0.0]);
            data.tex_coords.push([u, v]);
        }
    }

    // Counter-clockwise when viewed from above
    for z in 0..d_segs {
        for x in 0..w_segs {
            let i = z * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, next_row, i + 1]);
            data.indices
                .extend_from_slice(&[next_row, next_row + 1, i + 1]);
        }
    }

    data
}

/// Generate a Y-up cylinder
///
/// # Arguments
/// * `radius` - Radius of the cylinder
/// * `height` - Height of the cylinder, extending from -height/2 to height/2
/// * `sectors` - Number of circular segments
///
/// Produces `sectors * 12` indices: two side triangles and one triangle per cap
/// for every sector.
pub fn generate_cylinder(radius: f32, height: f32, sectors: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let segs = sectors.max(3);
    let half_height = height * 0.5;

    // Side ring: bottom/top pairs with outward normals
    for i in 0..=segs {
        let angle = i as f32 * 2.0 * PI / segs as f32;
        let (sin_a, cos_a) = angle.sin_cos();
        let (x, z) = (radius * cos_a, radius * sin_a);
        let u = i as f32 / segs as f32;

        data.vertices.push([x, -half_height, z]);
        data.normals.push([cos_a, 0.0, sin_a]);
        data.tex_coords.push([u, 1.0]);

        data.vertices.push([x, half_height, z]);
        data.normals.push([cos_a, 0.0, sin_a]);
        data.tex_coords.push([u, 0.0]);
    }

    for i in 0..segs {
        let bottom_current = i * 2;
        let top_current = bottom_current + 1;
        let bottom_next = bottom_current + 2;
        let top_next = bottom_next + 1;

        data.indices
            .extend_from_slice(&[bottom_current, top_current, bottom_next]);
        data.indices
            .extend_from_slice(&[top_current, top_next, bottom_next]);
    }

    // Caps get their own rings so they can carry flat normals
    for (y, normal_y) in [(-half_height, -1.0f32), (half_height, 1.0f32)] {
        let center = data.vertices.len() as u32;
        data.vertices.push([0.0, y, 0.0]);
        data.normals.push([0.0, normal_y, 0.0]);
        data.tex_coords.push([0.5, 0.5]);

        let ring_start = center + 1;
        for i in 0..=segs {
            let angle = i as f32 * 2.0 * PI / segs as f32;
            let (sin_a, cos_a) = angle.sin_cos();
            data.vertices.push([radius * cos_a, y, radius * sin_a]);
            data.normals.push([0.0, normal_y, 0.0]);
            data.tex_coords.push([0.5 + 0.5 * cos_a, 0.5 + 0.5 * sin_a]);
        }

        for i in 0..segs {
            let current = ring_start + i;
            let next = current + 1;
            if normal_y < 0.0 {
                data.indices.extend_from_slice(&[center, current, next]);
            } else {
                data.indices.extend_from_slice(&[center, next, current]);
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    /// Checks every triangle faces away from the given interior point
    fn assert_outward(data: &GeometryData, interior: Vector3<f32>) {
        for tri in data.indices.chunks_exact(3) {
            let a = Vector3::from(data.vertices[tri[0] as usize]);
            let b = Vector3::from(data.vertices[tri[1] as usize]);
            let c = Vector3::from(data.vertices[tri[2] as usize]);
            let normal = (b - a).cross(c - a);
            if normal.magnitude2() < 1e-12 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(
                normal.dot(centroid - interior) > 0.0,
                "triangle {:?} faces inward",
                tri
            );
        }
    }

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube();
        assert_eq!(cube.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_outward(&cube, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
        assert_eq!(sphere.vertices.len(), 21 * 21);
        assert_eq!(sphere.indices.len(), 19 * 20 * 6);
        assert_eq!(sphere.vertices.len(), sphere.normals.len());
        assert_eq!(sphere.vertices.len(), sphere.tex_coords.len());
        assert_outward(&sphere, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_pyramid_generation() {
        let pyramid = generate_pyramid(PYRAMID_BASE, PYRAMID_HEIGHT);
        assert_eq!(pyramid.vertices.len(), 5);
        assert_eq!(pyramid.indices.len(), 18);
        assert_eq!(pyramid.vertices[4], [0.0, 1.0, 0.0]);
        assert_outward(&pyramid, Vector3::new(0.0, 0.25, 0.0));
    }

    #[test]
    fn test_cylinder_generation() {
        let cylinder = generate_cylinder(CYLINDER_RADIUS, CYLINDER_HEIGHT, CYLINDER_SECTORS);
        assert_eq!(cylinder.indices.len(), CYLINDER_SECTORS as usize * 12);
        let max_y = cylinder
            .vertices
            .iter()
            .map(|v| v[1])
            .fold(f32::MIN, f32::max);
        assert_eq!(max_y, 1.0);
        assert_outward(&cylinder, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertices.len(), 9); // 3x3 grid
        assert_eq!(plane.indices.len(), 24); // 4 quads * 2 triangles * 3 indices
        assert_outward(&plane, Vector3::new(0.0, -1.0, 0.0));

        let ground = generate_plane(PLANE_SIZE, PLANE_SIZE, 1, 1);
        assert_eq!(ground.indices.len(), 6);
    }

    #[test]
    fn test_smooth_normals_are_unit_length() {
        let pyramid = generate_pyramid(1.0, 1.0);
        for normal in &pyramid.normals {
            approx::assert_relative_eq!(Vector3::from(*normal).magnitude(), 1.0, epsilon = 1e-5);
        }
    }
}
