//! In-memory scene used by tests and the headless tooling.

use std::collections::HashMap;

use crate::error::{Result, SceneError};
use crate::host::SceneHost;
use crate::object::{ObjectId, SceneObject};

/// Ordered object list with an id index.
#[derive(Debug)]
pub struct Scene {
    objects: Vec<SceneObject>,
    index: HashMap<ObjectId, usize>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, object) in self.objects.iter().enumerate().skip(start) {
            self.index.insert(object.id, i);
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneHost for Scene {
    fn allocate_id(&mut self) -> ObjectId {
        // Ids restored from history may sit above the counter
        while self.index.contains_key(&ObjectId(self.next_id)) {
            self.next_id += 1;
        }
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert_object(&mut self, object: SceneObject) -> Result<()> {
        if self.index.contains_key(&object.id) {
            return Err(SceneError::DuplicateId(object.id));
        }
        self.next_id = self.next_id.max(object.id.0 + 1);
        self.index.insert(object.id, self.objects.len());
        self.objects.push(object);
        Ok(())
    }

    fn remove_object(&mut self, id: ObjectId) -> Result<SceneObject> {
        let idx = self.index.remove(&id).ok_or(SceneError::ObjectNotFound(id))?;
        let object = self.objects.remove(idx);
        self.reindex_from(idx);
        Ok(object)
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.index.clear();
    }

    fn objects(&self) -> Vec<&SceneObject> {
        self.objects.iter().collect()
    }

    fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.index.get(&id).map(|&i| &self.objects[i])
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        let i = *self.index.get(&id)?;
        self.objects.get_mut(i)
    }

    fn len(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::geometry::Geometry;
    use crate::object::Transform;

    fn cube() -> Arc<Geometry> {
        Arc::new(Geometry::cuboid(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_remove_keeps_order_and_index() {
        let mut scene = Scene::new();
        let a = scene.add_object("a", cube(), Transform::IDENTITY).unwrap();
        let b = scene.add_object("b", cube(), Transform::IDENTITY).unwrap();
        let c = scene.add_object("c", cube(), Transform::IDENTITY).unwrap();

        scene.remove_object(a).unwrap();
        assert_eq!(scene.object_ids(), vec![b, c]);
        assert_eq!(scene.object(c).unwrap().name, "c");
        assert!(scene.remove_object(a).is_err());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut scene = Scene::new();
        scene.insert_object(SceneObject::new(ObjectId(7), "x", cube())).unwrap();
        let err = scene
            .insert_object(SceneObject::new(ObjectId(7), "y", cube()))
            .unwrap_err();
        assert_eq!(err, SceneError::DuplicateId(ObjectId(7)));
    }

    #[test]
    fn test_allocate_skips_restored_ids() {
        let mut scene = Scene::new();
        scene.insert_object(SceneObject::new(ObjectId(3), "x", cube())).unwrap();
        let id = scene.allocate_id();
        assert_eq!(id, ObjectId(4));

        scene.clear();
        assert!(scene.is_empty());
        // Counter is not rewound by clear
        assert_eq!(scene.allocate_id(), ObjectId(5));
    }
}
