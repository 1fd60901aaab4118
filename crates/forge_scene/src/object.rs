//! Placed solids and their transforms.

use std::sync::Arc;

use forge_math::Aabb;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;

/// Arbitrary per-object metadata carried through history and project files.
pub type UserData = serde_json::Map<String, serde_json::Value>;

/// Object identifier, stable across undo/redo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Object({})", self.0)
    }
}

/// Position, orientation and (possibly negative) per-axis scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[inline]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    #[inline]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[inline]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local-to-world matrix (scale, then rotate, then translate).
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Map a local point to world space.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (point * self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Surface appearance of a solid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Linear RGB
    pub color: [f32; 3],
    #[serde(default)]
    pub transparent: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_opacity() -> f32 {
    1.0
}

impl Material {
    pub fn solid(color: [f32; 3]) -> Self {
        Self {
            color,
            transparent: false,
            opacity: 1.0,
        }
    }

    /// Translucent grey used for subtractive "hole" solids.
    pub fn hole() -> Self {
        Self {
            color: [0.6, 0.6, 0.6],
            transparent: true,
            opacity: 0.4,
        }
    }

    /// Loud magenta used when geometry could not be recovered.
    pub fn placeholder() -> Self {
        Self {
            color: [1.0, 0.0, 1.0],
            transparent: true,
            opacity: 0.6,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::solid([0.8, 0.8, 0.8])
    }
}

/// A solid placed in the scene.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub transform: Transform,
    /// Shared so that history snapshots and restored objects reuse one copy
    pub geometry: Arc<Geometry>,
    pub material: Material,
    pub user_data: UserData,
    /// Solid (true) or subtractive hole (false)
    pub is_solid: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl SceneObject {
    pub fn new(id: ObjectId, name: impl Into<String>, geometry: Arc<Geometry>) -> Self {
        Self {
            id,
            name: name.into(),
            transform: Transform::IDENTITY,
            geometry,
            material: Material::default(),
            user_data: UserData::new(),
            is_solid: true,
            cast_shadow: true,
            receive_shadow: true,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn as_hole(mut self) -> Self {
        self.is_solid = false;
        self.material = Material::hole();
        self
    }

    #[inline]
    pub fn world_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Axis-aligned local bounds in unscaled geometry space.
    #[inline]
    pub fn local_bounds(&self) -> Aabb {
        self.geometry.local_bounds()
    }

    /// World-space axis-aligned bounds, None when empty or not finite.
    pub fn world_bounds(&self) -> Option<Aabb> {
        let local = self.local_bounds();
        if !local.is_finite() {
            return None;
        }
        let world = local.transform(&self.world_matrix());
        world.is_finite().then_some(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_world_bounds_follow_transform() {
        let object = SceneObject::new(ObjectId(1), "box", Arc::new(Geometry::cuboid(2.0, 2.0, 2.0)))
            .with_transform(
                Transform::from_position(Vec3::new(5.0, 1.0, 0.0)).with_scale(Vec3::new(2.0, 1.0, 1.0)),
            );
        let bounds = object.world_bounds().unwrap();
        assert_abs_diff_eq!(bounds.min.x, 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(bounds.max.x, 7.0, epsilon = 1e-5);
        assert_abs_diff_eq!(bounds.min.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_geometry_has_no_bounds() {
        let object = SceneObject::new(ObjectId(1), "empty", Arc::new(Geometry::empty()));
        assert!(object.world_bounds().is_none());
    }

    #[test]
    fn test_transform_point_matches_matrix() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_z(0.7))
            .with_scale(Vec3::new(2.0, -1.0, 0.5));
        let p = Vec3::new(0.3, -0.4, 1.2);
        let a = t.transform_point(p);
        let b = t.to_matrix().transform_point3(p);
        assert_abs_diff_eq!(a.distance(b), 0.0, epsilon = 1e-5);
    }
}
