//! Scene object model
//!
//! A [`SceneObject`] pairs plain editable state ([`ObjectSnapshot`]) with the GPU
//! geometry built for its [`Shape`]. Snapshots are value copies used by the
//! undo history and persistence; they never own GPU resources.

use std::{fmt, ops::Range, sync::Arc};

use cgmath::{Deg, Matrix, Matrix4, SquareMatrix, Vector3};
use wgpu::{util::DeviceExt, Device};

use crate::{
    gfx::{
        geometry::{self, GeometryData, MeshData},
        resources::{material::MaterialHandle, texture::TextureHandle},
    },
    wgpu_utils::{BindGroupBuilder, BindGroupLayoutWithDesc, UniformBuffer},
};

use super::{scene::RenderSettings, vertex::Vertex3D};

/// RGBA color; alpha below 1.0 makes an object transparent
pub type Color = [f32; 4];

pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];

/// Stable logical identity of a scene object
///
/// Ids are assigned monotonically by the object manager and never reissued,
/// so an id stays valid across compaction of the underlying storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminator over the kinds of placeable objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Cube,
    Sphere,
    Pyramid,
    Cylinder,
    Plane,
    Mesh,
}

impl ObjectKind {
    /// The primitive kinds, in menu order
    pub const PRIMITIVES: [ObjectKind; 5] = [
        ObjectKind::Cube,
        ObjectKind::Sphere,
        ObjectKind::Pyramid,
        ObjectKind::Cylinder,
        ObjectKind::Plane,
    ];

    /// Type tag used in project files
    pub fn tag(self) -> &'static str {
        match self {
            ObjectKind::Cube => "cube",
            ObjectKind::Sphere => "sphere",
            ObjectKind::Pyramid => "pyramid",
            ObjectKind::Cylinder => "cylinder",
            ObjectKind::Plane => "plane",
            ObjectKind::Mesh => "model",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "cube" => Some(ObjectKind::Cube),
            "sphere" => Some(ObjectKind::Sphere),
            "pyramid" => Some(ObjectKind::Pyramid),
            "cylinder" => Some(ObjectKind::Cylinder),
            "plane" => Some(ObjectKind::Plane),
            "model" => Some(ObjectKind::Mesh),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Cube => "Cube",
            ObjectKind::Sphere => "Sphere",
            ObjectKind::Pyramid => "Pyramid",
            ObjectKind::Cylinder => "Cylinder",
            ObjectKind::Plane => "Plane",
            ObjectKind::Mesh => "Model",
        }
    }
}

/// What an object is made of: a primitive or shared imported mesh data
///
/// Meshes compare by identity of their shared data, not by content.
#[derive(Debug, Clone)]
pub enum Shape {
    Cube,
    Sphere,
    Pyramid,
    Cylinder,
    Plane,
    Mesh(Arc<MeshData>),
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Shape::Mesh(a), Shape::Mesh(b)) => Arc::ptr_eq(a, b),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Shape {
    /// Primitive shape for a kind; `None` for meshes, which need imported data
    pub fn primitive(kind: ObjectKind) -> Option<Self> {
        match kind {
            ObjectKind::Cube => Some(Shape::Cube),
            ObjectKind::Sphere => Some(Shape::Sphere),
            ObjectKind::Pyramid => Some(Shape::Pyramid),
            ObjectKind::Cylinder => Some(Shape::Cylinder),
            ObjectKind::Plane => Some(Shape::Plane),
            ObjectKind::Mesh => None,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Shape::Cube => ObjectKind::Cube,
            Shape::Sphere => ObjectKind::Sphere,
            Shape::Pyramid => ObjectKind::Pyramid,
            Shape::Cylinder => ObjectKind::Cylinder,
            Shape::Plane => ObjectKind::Plane,
            Shape::Mesh(_) => ObjectKind::Mesh,
        }
    }

    /// Runs the geometry builder matching this shape
    pub fn build_geometry(&self) -> Geometry {
        match self {
            Shape::Cube => Geometry::Cube(Mesh::from_geometry(&geometry::generate_cube())),
            Shape::Sphere => Geometry::Sphere(Mesh::from_geometry(&geometry::generate_sphere(
                geometry::SPHERE_SEGMENTS,
                geometry::SPHERE_SEGMENTS,
            ))),
            Shape::Pyramid => Geometry::Pyramid(Mesh::from_geometry(&geometry::generate_pyramid(
                geometry::PYRAMID_BASE,
                geometry::PYRAMID_HEIGHT,
            ))),
            Shape::Cylinder => {
                Geometry::Cylinder(Mesh::from_geometry(&geometry::generate_cylinder(
                    geometry::CYLINDER_RADIUS,
                    geometry::CYLINDER_HEIGHT,
                    geometry::CYLINDER_SECTORS,
                )))
            }
            Shape::Plane => Geometry::Plane(Mesh::from_geometry(&geometry::generate_plane(
                geometry::PLANE_SIZE,
                geometry::PLANE_SIZE,
                1,
                1,
            ))),
            Shape::Mesh(data) => {
                Geometry::Mesh(data.parts.iter().map(Mesh::from_geometry).collect())
            }
        }
    }
}

/// Position, Euler rotation in degrees, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Model matrix composed as translate * rotateX * rotateY * rotateZ * scale
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Deg(self.rotation.x))
            * Matrix4::from_angle_y(Deg(self.rotation.y))
            * Matrix4::from_angle_z(Deg(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Per-object shading switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadingFlags {
    pub use_texture: bool,
    pub use_color: bool,
    pub use_pbr: bool,
    pub use_lighting: bool,
}

impl Default for ShadingFlags {
    fn default() -> Self {
        Self {
            use_texture: false,
            use_color: true,
            use_pbr: false,
            use_lighting: true,
        }
    }
}

impl ShadingFlags {
    /// Objects with neither texture nor PBR always shade with their color
    pub fn normalized(mut self) -> Self {
        if !self.use_texture && !self.use_pbr {
            self.use_color = true;
        }
        self
    }
}

/// The single shading source used for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    Pbr(MaterialHandle),
    Texture(TextureHandle),
    Color,
}

impl ShadingMode {
    /// Code passed to the shader
    pub fn shader_code(self) -> u32 {
        match self {
            ShadingMode::Color => 0,
            ShadingMode::Texture(_) => 1,
            ShadingMode::Pbr(_) => 2,
        }
    }
}

/// Full value copy of an object's editable state
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub name: String,
    pub shape: Shape,
    pub transform: Transform,
    pub color: Color,
    pub shading: ShadingFlags,
    pub texture: Option<TextureHandle>,
    pub material: Option<MaterialHandle>,
}

impl ObjectSnapshot {
    pub fn kind(&self) -> ObjectKind {
        self.shape.kind()
    }

    pub fn is_transparent(&self) -> bool {
        self.color[3] < 1.0
    }

    /// Resolves which source shades this object, by precedence PBR > texture > color
    pub fn shading_mode(&self, settings: &RenderSettings) -> ShadingMode {
        if self.shading.use_pbr && settings.pbr_enabled {
            if let Some(material) = self.material {
                return ShadingMode::Pbr(material);
            }
        }
        if self.shading.use_texture && settings.textures_enabled {
            if let Some(texture) = self.texture {
                return ShadingMode::Texture(texture);
            }
        }
        ShadingMode::Color
    }
}

/// GPU buffers of one uploaded mesh
///
/// Move-only: [`GpuMesh::release`] consumes the value, so buffers cannot be
/// released twice or used after release.
pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &Device, vertices: &[Vertex3D], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    fn release(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// CPU mesh data plus its buffers once uploaded
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    gpu: Option<GpuMesh>,
}

impl Mesh {
    pub fn from_geometry(data: &GeometryData) -> Self {
        Self {
            vertices: data.to_vertices(),
            indices: data.indices.clone(),
            gpu: None,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn upload(&mut self, device: &Device) {
        if self.gpu.is_none() && !self.indices.is_empty() {
            self.gpu = Some(GpuMesh::upload(device, &self.vertices, &self.indices));
        }
    }

    pub fn release(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.release();
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.release();
    }
}

/// Geometry owned by an object, one variant per kind
pub enum Geometry {
    Cube(Mesh),
    Sphere(Mesh),
    Pyramid(Mesh),
    Cylinder(Mesh),
    Plane(Mesh),
    Mesh(Vec<Mesh>),
}

impl Geometry {
    pub fn meshes(&self) -> &[Mesh] {
        match self {
            Geometry::Cube(mesh)
            | Geometry::Sphere(mesh)
            | Geometry::Pyramid(mesh)
            | Geometry::Cylinder(mesh)
            | Geometry::Plane(mesh) => std::slice::from_ref(mesh),
            Geometry::Mesh(parts) => parts,
        }
    }

    fn meshes_mut(&mut self) -> &mut [Mesh] {
        match self {
            Geometry::Cube(mesh)
            | Geometry::Sphere(mesh)
            | Geometry::Pyramid(mesh)
            | Geometry::Cylinder(mesh)
            | Geometry::Plane(mesh) => std::slice::from_mut(mesh),
            Geometry::Mesh(parts) => parts,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.meshes().iter().all(Mesh::is_uploaded)
    }

    pub fn upload(&mut self, device: &Device) {
        for mesh in self.meshes_mut() {
            mesh.upload(device);
        }
    }

    pub fn release(&mut self) {
        for mesh in self.meshes_mut() {
            mesh.release();
        }
    }
}

/// Per-object uniform data, rewritten for every draw
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: shading mode, y: lighting enabled, zw: unused
    pub params: [u32; 4],
}

impl ObjectUniform {
    pub fn new(model: Matrix4<f32>, color: Color, mode: ShadingMode, lit: bool) -> Self {
        let normal_matrix = model
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: model.into(),
            normal_matrix: normal_matrix.into(),
            color,
            params: [mode.shader_code(), lit as u32, 0, 0],
        }
    }
}

/// Per-object uniform buffer and its bind group
pub struct ObjectGpuResources {
    pub uniform: UniformBuffer<ObjectUniform>,
    pub bind_group: wgpu::BindGroup,
}

/// A live object held by the object manager
pub struct SceneObject {
    state: ObjectSnapshot,
    geometry: Geometry,
    gpu_resources: Option<ObjectGpuResources>,
}

impl SceneObject {
    /// Builds the geometry for the snapshot's shape; GPU upload happens later
    pub fn from_snapshot(state: ObjectSnapshot) -> Self {
        let geometry = state.shape.build_geometry();
        Self {
            state,
            geometry,
            gpu_resources: None,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.state.id
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.state.kind()
    }

    pub fn transform(&self) -> &Transform {
        &self.state.transform
    }

    pub fn color(&self) -> Color {
        self.state.color
    }

    pub fn shading(&self) -> ShadingFlags {
        self.state.shading
    }

    pub fn state(&self) -> &ObjectSnapshot {
        &self.state
    }

    pub fn snapshot(&self) -> ObjectSnapshot {
        self.state.clone()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn is_transparent(&self) -> bool {
        self.state.is_transparent()
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.state.transform.model_matrix()
    }

    /// Overwrites the editable state, rebuilding geometry only when the shape changed
    pub(crate) fn apply_snapshot(&mut self, snapshot: &ObjectSnapshot) {
        if snapshot.shape != self.state.shape {
            self.release_gpu_resources();
            self.geometry = snapshot.shape.build_geometry();
        }
        self.state = snapshot.clone();
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.gpu_resources.is_some() && self.geometry.is_uploaded()
    }

    pub fn gpu_resources(&self) -> Option<&ObjectGpuResources> {
        self.gpu_resources.as_ref()
    }

    /// Uploads geometry and creates the per-object uniform bind group
    pub fn init_gpu_resources(&mut self, device: &Device, layout: &BindGroupLayoutWithDesc) {
        self.geometry.upload(device);

        if self.gpu_resources.is_none() {
            let uniform = UniformBuffer::new(device);
            let bind_group = BindGroupBuilder::new(layout)
                .resource(uniform.binding_resource())
                .create(device, "Object Bind Group");
            self.gpu_resources = Some(ObjectGpuResources {
                uniform,
                bind_group,
            });
        }
    }

    /// Writes this frame's uniform data for the object
    pub fn update_uniform(&mut self, queue: &wgpu::Queue, content: ObjectUniform) {
        if let Some(resources) = self.gpu_resources.as_mut() {
            resources.uniform.update_content(queue, content);
        }
    }

    pub fn release_gpu_resources(&mut self) {
        self.geometry.release();
        if let Some(resources) = self.gpu_resources.take() {
            resources.uniform.destroy();
        }
    }
}

impl Drop for SceneObject {
    fn drop(&mut self) {
        self.release_gpu_resources();
    }
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_geometry(&mut self, geometry: &'a Geometry);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        // Skip meshes that are not uploaded yet
        let Some(gpu) = &mesh.gpu else {
            return;
        };

        self.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        self.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..gpu.index_count, 0, instances);
    }

    fn draw_geometry(&mut self, geometry: &'b Geometry) {
        for mesh in geometry.meshes() {
            self.draw_mesh(mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{Vector4, Zero};

    fn snapshot(shape: Shape) -> ObjectSnapshot {
        ObjectSnapshot {
            id: ObjectId(1),
            name: "test".to_string(),
            shape,
            transform: Transform::default(),
            color: WHITE,
            shading: ShadingFlags::default(),
            texture: None,
            material: None,
        }
    }

    #[test]
    fn test_model_matrix_order() {
        let transform = Transform {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Vector3::new(0.0, 90.0, 0.0),
            scale: Vector3::new(2.0, 1.0, 1.0),
        };
        // Scale first, then rotate +X onto -Z, then translate
        let p = transform.model_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_axes_apply_z_first() {
        let transform = Transform {
            position: Vector3::zero(),
            rotation: Vector3::new(90.0, 0.0, 90.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        };
        // Rz maps +X to +Y, then Rx maps +Y to +Z
        let p = transform.model_matrix() * Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_shading_precedence() {
        let settings = RenderSettings::default();
        let material = MaterialHandle(2);
        let texture = TextureHandle(1);

        let mut state = snapshot(Shape::Cube);
        state.shading = ShadingFlags {
            use_texture: true,
            use_color: true,
            use_pbr: true,
            use_lighting: true,
        };
        state.texture = Some(texture);
        state.material = Some(material);
        assert_eq!(state.shading_mode(&settings), ShadingMode::Pbr(material));

        state.shading.use_pbr = false;
        assert_eq!(state.shading_mode(&settings), ShadingMode::Texture(texture));

        state.shading.use_texture = false;
        assert_eq!(state.shading_mode(&settings), ShadingMode::Color);

        // Nothing enabled still falls back to color
        state.shading.use_color = false;
        assert_eq!(state.shading_mode(&settings), ShadingMode::Color);
    }

    #[test]
    fn test_global_toggles_disable_sources() {
        let mut settings = RenderSettings::default();
        let mut state = snapshot(Shape::Sphere);
        state.shading.use_pbr = true;
        state.shading.use_texture = true;
        state.material = Some(MaterialHandle(0));
        state.texture = Some(TextureHandle(0));

        settings.pbr_enabled = false;
        assert_eq!(
            state.shading_mode(&settings),
            ShadingMode::Texture(TextureHandle(0))
        );
        settings.textures_enabled = false;
        assert_eq!(state.shading_mode(&settings), ShadingMode::Color);
    }

    #[test]
    fn test_normalized_flags_force_color() {
        let flags = ShadingFlags {
            use_texture: false,
            use_color: false,
            use_pbr: false,
            use_lighting: true,
        }
        .normalized();
        assert!(flags.use_color);
    }

    #[test]
    fn test_geometry_variant_matches_shape() {
        let object = SceneObject::from_snapshot(snapshot(Shape::Pyramid));
        assert!(matches!(object.geometry(), Geometry::Pyramid(_)));
        assert_eq!(object.geometry().meshes()[0].index_count(), 18);
        assert!(!object.has_gpu_resources());
    }

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in ObjectKind::PRIMITIVES {
            assert_eq!(ObjectKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ObjectKind::from_tag("model"), Some(ObjectKind::Mesh));
        assert_eq!(ObjectKind::from_tag("teapot"), None);
    }

    #[test]
    fn test_meshes_compare_by_shared_data() {
        let data = Arc::new(MeshData {
            source: "model.obj".into(),
            parts: vec![geometry::generate_cube()],
        });
        let copy = Arc::new((*data).clone());

        assert_eq!(Shape::Mesh(Arc::clone(&data)), Shape::Mesh(Arc::clone(&data)));
        assert_ne!(Shape::Mesh(data), Shape::Mesh(copy));
        assert_eq!(Shape::Cube, Shape::Cube);
        assert_ne!(Shape::Cube, Shape::Sphere);
    }
}
