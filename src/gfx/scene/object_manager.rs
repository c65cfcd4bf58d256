//! Bounded storage for live scene objects
//!
//! Objects are kept densely packed in insertion order; removing one shifts
//! the ones after it down. Positions are therefore unstable and every
//! long-lived reference should use [`ObjectId`] instead.

use wgpu::Device;

use crate::{
    gfx::resources::{material::MaterialHandle, texture::TextureHandle},
    wgpu_utils::BindGroupLayoutWithDesc,
};

use super::object::{
    Color, ObjectId, ObjectSnapshot, SceneObject, ShadingFlags, Shape, Transform,
};

/// Maximum number of simultaneously live objects
pub const MAX_OBJECTS: usize = 1000;

/// Everything needed to create an object except its identity
#[derive(Debug, Clone)]
pub struct ObjectSpec {
    pub shape: Shape,
    pub transform: Transform,
    pub color: Color,
    pub shading: ShadingFlags,
    pub texture: Option<TextureHandle>,
    pub material: Option<MaterialHandle>,
}

impl ObjectSpec {
    pub fn new(shape: Shape, transform: Transform) -> Self {
        Self {
            shape,
            transform,
            color: super::object::WHITE,
            shading: ShadingFlags::default(),
            texture: None,
            material: None,
        }
    }
}

pub struct ObjectManager {
    objects: Vec<SceneObject>,
    capacity: usize,
    next_id: u32,
}

impl Default for ObjectManager {
    fn default() -> Self {
        Self::new(MAX_OBJECTS)
    }
}

impl ObjectManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity.min(MAX_OBJECTS)),
            capacity,
            next_id: 1,
        }
    }

    /// Drops every object; ids keep counting from where they were
    pub fn initialize(&mut self) {
        self.cleanup();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.objects.len() >= self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn get(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut SceneObject> {
        self.objects.get_mut(index)
    }

    pub fn find(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|object| object.id() == id)
    }

    fn find_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.id() == id)
    }

    /// Creates a new object with a fresh id
    ///
    /// Returns `None` when the manager is at capacity.
    pub(crate) fn add_object(&mut self, spec: ObjectSpec) -> Option<ObjectId> {
        if self.is_full() {
            log::warn!(
                "Object limit of {} reached, {} not added",
                self.capacity,
                spec.shape.kind().label()
            );
            return None;
        }

        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let snapshot = ObjectSnapshot {
            id,
            name: format!("{} {}", spec.shape.kind().label(), id.value()),
            shape: spec.shape,
            transform: spec.transform,
            color: spec.color,
            shading: spec.shading.normalized(),
            texture: spec.texture,
            material: spec.material,
        };

        log::debug!("Added {} ({})", snapshot.name, id);
        self.objects.push(SceneObject::from_snapshot(snapshot));
        Some(id)
    }

    /// Re-inserts a previously captured object, keeping its id
    ///
    /// Used by undo/redo and project loading. Fails if the manager is full
    /// or an object with the same id is already live.
    pub(crate) fn insert_snapshot(&mut self, snapshot: ObjectSnapshot) -> bool {
        if self.is_full() {
            log::warn!(
                "Object limit of {} reached, {} not restored",
                self.capacity,
                snapshot.name
            );
            return false;
        }
        if self.index_of(snapshot.id).is_some() {
            log::warn!("Object {} is already live", snapshot.id);
            return false;
        }

        self.next_id = self.next_id.max(snapshot.id.value() + 1);
        self.objects.push(SceneObject::from_snapshot(snapshot));
        true
    }

    /// Removes the object at `index`, compacting the ones after it
    pub(crate) fn remove_object(&mut self, index: usize) -> Option<ObjectSnapshot> {
        if index >= self.objects.len() {
            log::warn!(
                "Cannot remove object at {}, only {} objects",
                index,
                self.objects.len()
            );
            return None;
        }

        let mut object = self.objects.remove(index);
        object.release_gpu_resources();
        log::debug!("Removed {} ({})", object.name(), object.id());
        Some(object.snapshot())
    }

    pub(crate) fn remove_by_id(&mut self, id: ObjectId) -> Option<ObjectSnapshot> {
        let index = self.index_of(id)?;
        self.remove_object(index)
    }

    /// Overwrites the live object whose id matches the snapshot
    pub(crate) fn update_object(&mut self, snapshot: &ObjectSnapshot) -> bool {
        match self.find_mut(snapshot.id) {
            Some(object) => {
                object.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Releases GPU resources and removes every object
    pub fn cleanup(&mut self) {
        for object in &mut self.objects {
            object.release_gpu_resources();
        }
        self.objects.clear();
    }

    /// Uploads any object whose GPU resources do not exist yet
    pub fn init_gpu_resources(&mut self, device: &Device, layout: &BindGroupLayoutWithDesc) {
        for object in self.objects.iter_mut().filter(|o| !o.has_gpu_resources()) {
            object.init_gpu_resources(device, layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::object::ObjectKind;
    use cgmath::Vector3;

    fn cube_at(x: f32) -> ObjectSpec {
        ObjectSpec::new(Shape::Cube, Transform::at(Vector3::new(x, 0.0, 0.0)))
    }

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let mut manager = ObjectManager::default();
        let a = manager.add_object(cube_at(0.0)).unwrap();
        let b = manager.add_object(cube_at(1.0)).unwrap();
        manager.remove_by_id(b);
        let c = manager.add_object(cube_at(2.0)).unwrap();
        assert!(a < b && b < c);

        manager.initialize();
        let d = manager.add_object(cube_at(3.0)).unwrap();
        assert!(d > c);
    }

    #[test]
    fn test_names_follow_kind_and_id() {
        let mut manager = ObjectManager::default();
        let id = manager
            .add_object(ObjectSpec::new(Shape::Sphere, Transform::default()))
            .unwrap();
        let object = manager.find(id).unwrap();
        assert_eq!(object.name(), format!("Sphere {}", id.value()));
        assert_eq!(object.kind(), ObjectKind::Sphere);
    }

    #[test]
    fn test_removal_compacts_and_keeps_identity() {
        let mut manager = ObjectManager::default();
        let ids: Vec<_> = (0..3)
            .map(|i| manager.add_object(cube_at(i as f32)).unwrap())
            .collect();

        let removed = manager.remove_object(0).unwrap();
        assert_eq!(removed.id, ids[0]);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.index_of(ids[1]), Some(0));
        assert_eq!(manager.index_of(ids[2]), Some(1));
        assert_eq!(manager.find(ids[2]).unwrap().transform().position.x, 2.0);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut manager = ObjectManager::default();
        manager.add_object(cube_at(0.0));
        assert!(manager.remove_object(5).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_capacity_is_a_hard_ceiling() {
        let mut manager = ObjectManager::new(3);
        for i in 0..3 {
            assert!(manager.add_object(cube_at(i as f32)).is_some());
        }
        assert!(manager.is_full());
        assert!(manager.add_object(cube_at(9.0)).is_none());
        assert_eq!(manager.len(), 3);
    }

    #[test]
    fn test_insert_snapshot_preserves_id() {
        let mut manager = ObjectManager::default();
        let id = manager.add_object(cube_at(0.0)).unwrap();
        let snapshot = manager.remove_by_id(id).unwrap();

        assert!(manager.insert_snapshot(snapshot.clone()));
        assert_eq!(manager.find(id).unwrap().snapshot(), snapshot);
        // Duplicate ids are refused
        assert!(!manager.insert_snapshot(snapshot));

        let next = manager.add_object(cube_at(1.0)).unwrap();
        assert!(next > id);
    }

    #[test]
    fn test_insert_snapshot_advances_id_counter() {
        let mut manager = ObjectManager::default();
        let id = manager.add_object(cube_at(0.0)).unwrap();
        let mut snapshot = manager.remove_by_id(id).unwrap();
        snapshot.id = ObjectId(40);
        assert!(manager.insert_snapshot(snapshot));
        assert_eq!(manager.add_object(cube_at(1.0)), Some(ObjectId(41)));
    }

    #[test]
    fn test_update_by_id() {
        let mut manager = ObjectManager::default();
        let id = manager.add_object(cube_at(0.0)).unwrap();
        let mut snapshot = manager.find(id).unwrap().snapshot();
        snapshot.color = [1.0, 0.0, 0.0, 0.5];
        snapshot.shape = Shape::Cylinder;

        assert!(manager.update_object(&snapshot));
        let object = manager.find(id).unwrap();
        assert!(object.is_transparent());
        assert_eq!(object.kind(), ObjectKind::Cylinder);

        snapshot.id = ObjectId(999);
        assert!(!manager.update_object(&snapshot));
    }

    #[test]
    fn test_flags_are_normalized_on_add() {
        let mut manager = ObjectManager::default();
        let mut spec = cube_at(0.0);
        spec.shading.use_color = false;
        let id = manager.add_object(spec).unwrap();
        assert!(manager.find(id).unwrap().shading().use_color);
    }
}
