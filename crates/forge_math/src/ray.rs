//! 3D Ray for picking
//!
//! Rays come from the camera through a pointer position and are tested
//! against handles, triangles and drag planes.

use glam::{Mat4, Vec3};

/// 3D ray for intersection testing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray with normalized direction
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn from_points(start: Vec3, end: Vec3) -> Self {
        Self::new(start, end - start)
    }

    /// Get a point at distance t along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform the ray by a matrix.
    ///
    /// The origin is transformed as a point, the direction as a vector.
    pub fn transform(&self, matrix: &Mat4) -> Self {
        Self::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.direction.length_squared() > crate::consts::DEGENERATE_LENGTH_SQ
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_direction_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(ray.direction.length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::from_points(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(ray.at(5.0).z, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_direction_is_invalid() {
        assert!(!Ray::new(Vec3::ONE, Vec3::ZERO).is_valid());
    }
}
