//! Coplanar face highlighting.
//!
//! A raycast only reports one triangle, but a flat face of a mesh is usually
//! made of several. The highlight collects every triangle of the hit mesh
//! that lies in the same plane so the whole face lights up.

use forge_math::{triangle_normal, Plane};
use forge_scene::{ObjectId, RayHit, SceneObject, Transform};
use glam::Vec3;

use crate::core::FaceSnapPreferences;

/// Triangles to draw over a hovered face, already in world space and offset
/// off the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceHighlight {
    /// None for the ground plane
    pub object: Option<ObjectId>,
    pub triangles: Vec<[Vec3; 3]>,
    /// World-space outward normal of the face
    pub normal: Vec3,
    /// Only the hit triangle could be used
    pub fallback: bool,
}

impl FaceHighlight {
    pub fn is_ground(&self) -> bool {
        self.object.is_none()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// World-space normal of a local face normal.
///
/// Uses the inverse-transpose of the object's scale so non-uniform and
/// mirrored scales keep the normal perpendicular to the face and outward.
pub fn world_face_normal(transform: &Transform, local_normal: Vec3) -> Vec3 {
    let scale = transform.scale;
    let safe = Vec3::select(scale.abs().cmpgt(Vec3::splat(1e-8)), scale, Vec3::ONE);
    (transform.rotation * (local_normal / safe)).normalize_or_zero()
}

/// Highlight every triangle of `object` coplanar with the hit triangle.
///
/// The reference plane comes from the hit triangle's world vertices. A
/// triangle joins the highlight when its normal is nearly parallel to the
/// reference and its first vertex lies within the plane tolerance.
pub fn coplanar_highlight(
    object: &SceneObject,
    hit: &RayHit,
    prefs: &FaceSnapPreferences,
) -> FaceHighlight {
    let [a, b, c] = hit.face_vertices;
    let mut outward = world_face_normal(&object.transform, hit.local_normal);

    let reference = triangle_normal(a, b, c);
    if let Some(reference) = reference {
        if outward == Vec3::ZERO {
            outward = reference;
        }
    }

    let mut triangles = Vec::new();
    if let (Some(reference), Some(_)) = (reference, hit.face_index) {
        let plane = Plane::from_point_normal(a, reference);
        let transform = &object.transform;

        for (_, [p0, p1, p2]) in object.geometry.triangles() {
            let world = [
                transform.transform_point(p0),
                transform.transform_point(p1),
                transform.transform_point(p2),
            ];
            let Some(normal) = triangle_normal(world[0], world[1], world[2]) else {
                continue;
            };
            if normal.dot(reference) > prefs.parallel_threshold
                && plane.signed_distance(world[0]).abs() <= prefs.plane_tolerance
            {
                triangles.push(world);
            }
        }
    }

    let fallback = triangles.is_empty();
    if fallback {
        triangles.push(hit.face_vertices);
    }

    let offset = outward * prefs.highlight_offset;
    for tri in &mut triangles {
        for v in tri.iter_mut() {
            *v += offset;
        }
    }

    FaceHighlight {
        object: Some(object.id),
        triangles,
        normal: outward,
        fallback,
    }
}

/// Fixed-size quad on the ground plane centered on `point`.
pub fn ground_highlight(point: Vec3, prefs: &FaceSnapPreferences) -> FaceHighlight {
    let h = prefs.ground_quad_size * 0.5;
    let center = Vec3::new(point.x, prefs.highlight_offset, point.z);
    let corner = |x: f32, z: f32| center + Vec3::new(x, 0.0, z);

    // Counter-clockwise seen from above
    let triangles = vec![
        [corner(-h, -h), corner(-h, h), corner(h, h)],
        [corner(-h, -h), corner(h, h), corner(h, -h)],
    ];

    FaceHighlight {
        object: None,
        triangles,
        normal: Vec3::Y,
        fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use forge_math::Ray;
    use forge_scene::{Geometry, Scene, SceneHost};

    fn hit_top(scene: &Scene) -> RayHit {
        let ray = Ray::new(Vec3::new(0.1, 10.0, 0.2), Vec3::NEG_Y);
        scene.raycast(&ray).into_iter().next().unwrap()
    }

    #[test]
    fn test_box_top_face_is_two_triangles() {
        let mut scene = Scene::new();
        let id = scene
            .add_object("box", Arc::new(Geometry::cuboid(2.0, 2.0, 2.0)), Transform::IDENTITY)
            .unwrap();
        let hit = hit_top(&scene);
        let prefs = FaceSnapPreferences::default();

        let highlight = coplanar_highlight(scene.object(id).unwrap(), &hit, &prefs);
        assert!(!highlight.fallback);
        assert_eq!(highlight.triangle_count(), 2);
        assert!((highlight.normal - Vec3::Y).length() < 1e-5);
        for tri in &highlight.triangles {
            for v in tri {
                assert!((v.y - 1.05).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_missing_face_index_falls_back_to_hit_triangle() {
        let mut scene = Scene::new();
        let id = scene
            .add_object("box", Arc::new(Geometry::cuboid(2.0, 2.0, 2.0)), Transform::IDENTITY)
            .unwrap();
        let mut hit = hit_top(&scene);
        hit.face_index = None;

        let highlight =
            coplanar_highlight(scene.object(id).unwrap(), &hit, &FaceSnapPreferences::default());
        assert!(highlight.fallback);
        assert_eq!(highlight.triangle_count(), 1);
    }

    #[test]
    fn test_mirrored_object_normal_stays_outward() {
        let t = Transform::IDENTITY.with_scale(Vec3::new(1.0, -1.0, 1.0));
        // The local top face ends up at the bottom
        let n = world_face_normal(&t, Vec3::Y);
        assert!((n - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_ground_quad() {
        let prefs = FaceSnapPreferences::default();
        let highlight = ground_highlight(Vec3::new(3.0, 0.0, -1.0), &prefs);
        assert!(highlight.is_ground());
        assert_eq!(highlight.triangle_count(), 2);

        let xs: Vec<f32> = highlight.triangles.iter().flatten().map(|v| v.x).collect();
        let min = xs.iter().cloned().fold(f32::MAX, f32::min);
        let max = xs.iter().cloned().fold(f32::MIN, f32::max);
        assert!((min - 2.0).abs() < 1e-6);
        assert!((max - 4.0).abs() < 1e-6);
    }
}
