//! Infinite planes used as drag surfaces and snap targets

use glam::Vec3;

/// Plane in point-normal form, stored as `normal · p = distance`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// The ground plane y = 0, facing up.
    #[inline]
    pub fn ground() -> Self {
        Self::horizontal(0.0)
    }

    /// Horizontal plane at height `y`, facing up.
    #[inline]
    pub fn horizontal(y: f32) -> Self {
        Self {
            normal: Vec3::Y,
            distance: y,
        }
    }

    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    /// A point lying on the plane.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.normal * self.distance
    }

    /// Positive in front of the plane, negative behind.
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    #[inline]
    pub fn project_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_signed_distance() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
        assert_abs_diff_eq!(plane.signed_distance(Vec3::new(5.0, 5.0, 0.0)), 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(plane.signed_distance(Vec3::ZERO), -2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_project_point() {
        let plane = Plane::ground();
        let p = plane.project_point(Vec3::new(1.0, 4.0, -2.0));
        assert_eq!(p, Vec3::new(1.0, 0.0, -2.0));
    }
}
