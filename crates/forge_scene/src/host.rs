//! The interface editor tools use to read and write the scene.

use std::sync::Arc;

use forge_math::{ray_aabb, ray_triangle, triangle_normal, Ray};
use glam::Vec3;

use crate::error::Result;
use crate::geometry::Geometry;
use crate::object::{ObjectId, SceneObject, Transform};

/// A ray hit against one object's triangles.
#[derive(Clone, Debug, PartialEq)]
pub struct RayHit {
    pub object: ObjectId,
    /// World-space hit point
    pub point: Vec3,
    pub distance: f32,
    /// Triangle index into the object's geometry
    pub face_index: Option<usize>,
    /// Unit normal of the hit triangle in the object's local frame
    pub local_normal: Vec3,
    /// Hit triangle in world space
    pub face_vertices: [Vec3; 3],
}

/// Scene storage as seen by the editor.
///
/// Object order is significant: history snapshots record objects in the
/// order returned by [`SceneHost::objects`] and restore them in that order.
pub trait SceneHost {
    /// Reserve a fresh id that is not in use.
    fn allocate_id(&mut self) -> ObjectId;

    /// Add an object with a caller-chosen id.
    fn insert_object(&mut self, object: SceneObject) -> Result<()>;

    fn remove_object(&mut self, id: ObjectId) -> Result<SceneObject>;

    /// Remove every object.
    fn clear(&mut self);

    fn objects(&self) -> Vec<&SceneObject>;

    fn object(&self, id: ObjectId) -> Option<&SceneObject>;

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject>;

    fn object_ids(&self) -> Vec<ObjectId> {
        self.objects().iter().map(|o| o.id).collect()
    }

    fn len(&self) -> usize {
        self.objects().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    /// Create an object with a fresh id.
    fn add_object(
        &mut self,
        name: &str,
        geometry: Arc<Geometry>,
        transform: Transform,
    ) -> Result<ObjectId> {
        let id = self.allocate_id();
        self.insert_object(SceneObject::new(id, name, geometry).with_transform(transform))?;
        Ok(id)
    }

    fn transform(&self, id: ObjectId) -> Option<Transform> {
        self.object(id).map(|o| o.transform)
    }

    fn set_transform(&mut self, id: ObjectId, transform: Transform) -> Result<()> {
        let object = self
            .object_mut(id)
            .ok_or(crate::error::SceneError::ObjectNotFound(id))?;
        object.transform = transform;
        Ok(())
    }

    /// All object hits along `ray`, nearest first.
    fn raycast(&self, ray: &Ray) -> Vec<RayHit> {
        raycast_objects(self.objects(), ray)
    }
}

/// Intersect `ray` with the triangles of each object.
///
/// Each object contributes at most its nearest hit. Objects whose world
/// bounds the ray misses are skipped without touching their triangles.
pub fn raycast_objects<'a>(
    objects: impl IntoIterator<Item = &'a SceneObject>,
    ray: &Ray,
) -> Vec<RayHit> {
    if !ray.is_valid() {
        return Vec::new();
    }

    let mut hits: Vec<RayHit> = objects
        .into_iter()
        .filter(|object| {
            object
                .world_bounds()
                .map_or(false, |bounds| ray_aabb(ray, &bounds).is_some())
        })
        .filter_map(|object| raycast_object(object, ray))
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

fn raycast_object(object: &SceneObject, ray: &Ray) -> Option<RayHit> {
    let transform = &object.transform;
    let mut nearest: Option<RayHit> = None;

    for (index, [a, b, c]) in object.geometry.triangles() {
        let Some(local_normal) = triangle_normal(a, b, c) else {
            continue;
        };
        let world = [
            transform.transform_point(a),
            transform.transform_point(b),
            transform.transform_point(c),
        ];
        let Some(hit) = ray_triangle(ray, world[0], world[1], world[2]) else {
            continue;
        };
        if nearest.as_ref().map_or(true, |n| hit.distance < n.distance) {
            nearest = Some(RayHit {
                object: object.id,
                point: ray.at(hit.distance),
                distance: hit.distance,
                face_index: Some(index),
                local_normal,
                face_vertices: world,
            });
        }
    }

    nearest
}
