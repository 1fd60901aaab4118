//! # forge_math - Geometry helpers for direct manipulation
//!
//! Bounding boxes, rays, planes and the intersection tests the editor tools
//! are built on. Vector, matrix and quaternion types come from `glam` and are
//! re-exported so downstream crates agree on a single math stack.

pub mod axis;
pub mod bounds;
pub mod intersect;
pub mod plane;
pub mod ray;
pub mod snap;

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use axis::{Axis, ParseAxisError};
pub use bounds::Aabb;
pub use intersect::{ray_aabb, ray_plane, ray_sphere, ray_triangle, triangle_normal, TriangleHit};
pub use plane::Plane;
pub use ray::Ray;
pub use snap::{clamp_magnitude, snap_to_increment, snap_vec3};

/// Common math constants
pub mod consts {
    /// Squared length below which a direction is treated as degenerate.
    pub const DEGENERATE_LENGTH_SQ: f32 = 1e-12;
    /// Denominator magnitude below which a ray is parallel to a plane.
    pub const PARALLEL_EPSILON: f32 = 1e-6;
}

pub mod prelude {
    pub use crate::axis::Axis;
    pub use crate::bounds::Aabb;
    pub use crate::intersect::{ray_aabb, ray_plane, ray_sphere, ray_triangle, triangle_normal};
    pub use crate::plane::Plane;
    pub use crate::ray::Ray;
    pub use crate::snap::{clamp_magnitude, snap_to_increment, snap_vec3};
    pub use glam::{Mat4, Quat, Vec2, Vec3};
}
