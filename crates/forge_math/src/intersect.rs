//! Intersection tests for picking
//!
//! Provides ray intersection tests against:
//! - Plane (drag planes, the ground)
//! - AABB (slab method)
//! - Sphere (handle markers)
//! - Triangle (Möller-Trumbore algorithm)

use glam::Vec3;

use crate::bounds::Aabb;
use crate::consts::{DEGENERATE_LENGTH_SQ, PARALLEL_EPSILON};
use crate::plane::Plane;
use crate::ray::Ray;

/// Result of a ray-triangle intersection
#[derive(Clone, Copy, Debug)]
pub struct TriangleHit {
    /// Distance along ray to hit point
    pub distance: f32,
    /// Barycentric coordinates [w, u, v] where w = 1 - u - v
    pub barycentric: [f32; 3],
}

/// Ray-plane intersection.
///
/// Returns the distance along the ray, or None when the ray is parallel to
/// the plane or the plane lies behind the ray origin.
pub fn ray_plane(ray: &Ray, plane: &Plane) -> Option<f32> {
    let denom = plane.normal.dot(ray.direction);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = -plane.signed_distance(ray.origin) / denom;
    (t >= 0.0).then_some(t)
}

/// Ray-AABB intersection using the slab method
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = ray.direction.recip();

    let t1 = (aabb.min - ray.origin) * inv_dir;
    let t2 = (aabb.max - ray.origin) * inv_dir;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    // Behind the origin, or a miss
    if tmax < 0.0 || tmin > tmax {
        None
    } else {
        Some(if tmin < 0.0 { tmax } else { tmin })
    }
}

/// Ray-sphere intersection, nearest positive distance.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;

    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = -b - sqrt_d;
    let t2 = -b + sqrt_d;

    if t1 >= 0.0 {
        Some(t1)
    } else if t2 >= 0.0 {
        Some(t2)
    } else {
        None
    }
}

/// Ray-Triangle intersection using Möller-Trumbore algorithm.
///
/// Both faces are hit; the editor picks faces regardless of winding.
pub fn ray_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<TriangleHit> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t <= EPSILON {
        return None;
    }

    Some(TriangleHit {
        distance: t,
        barycentric: [1.0 - u - v, u, v],
    })
}

/// Unit normal of a counter-clockwise triangle, None for zero-area triangles.
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let n = (b - a).cross(c - a);
    if n.length_squared() <= DEGENERATE_LENGTH_SQ {
        None
    } else {
        Some(n.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ray_plane_hit_and_parallel() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        assert_abs_diff_eq!(ray_plane(&ray, &Plane::ground()).unwrap(), 5.0, epsilon = 1e-6);

        let parallel = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::X);
        assert!(ray_plane(&parallel, &Plane::ground()).is_none());

        let away = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Y);
        assert!(ray_plane(&away, &Plane::ground()).is_none());
    }

    #[test]
    fn test_ray_aabb() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::ONE);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert_abs_diff_eq!(ray_aabb(&ray, &aabb).unwrap(), 4.0, epsilon = 1e-5);

        let miss = Ray::new(Vec3::new(3.0, 0.0, -5.0), Vec3::Z);
        assert!(ray_aabb(&miss, &aabb).is_none());
    }

    #[test]
    fn test_ray_sphere() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let t = ray_sphere(&ray, Vec3::ZERO, 1.0).unwrap();
        assert_abs_diff_eq!(t, 4.0, epsilon = 1e-5);
        assert!(ray_sphere(&ray, Vec3::new(0.0, 3.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_ray_triangle_both_windings() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 5.0), Vec3::NEG_Z);
        let a = Vec3::ZERO;
        let b = Vec3::X;
        let c = Vec3::Y;

        let hit = ray_triangle(&ray, a, b, c).unwrap();
        assert_abs_diff_eq!(hit.distance, 5.0, epsilon = 1e-5);
        assert!(ray_triangle(&ray, a, c, b).is_some());

        let miss = Ray::new(Vec3::new(2.0, 2.0, 5.0), Vec3::NEG_Z);
        assert!(ray_triangle(&miss, a, b, c).is_none());
    }

    #[test]
    fn test_triangle_normal() {
        let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        assert_abs_diff_eq!(n.z, 1.0, epsilon = 1e-6);
        assert!(triangle_normal(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());
    }
}
