//! # forge_scene - Scene host for the Forge solid modeler
//!
//! The editor tools never own solids. They read and write transforms through
//! the [`SceneHost`] trait, which a renderer-backed scene graph implements in
//! the application and the in-memory [`Scene`] implements for tests and the
//! headless tooling.
//!
//! ## Architecture
//!
//! ```text
//! Pointer → Camera::screen_ray → SceneHost::raycast → RayHit
//!                                        │
//!                      SceneObject { transform, geometry, material }
//! ```

pub mod camera;
pub mod error;
pub mod geometry;
pub mod host;
pub mod object;
pub mod scene;

pub use camera::Camera;
pub use error::{Result, SceneError};
pub use geometry::{Geometry, GeometryKind};
pub use host::{raycast_objects, RayHit, SceneHost};
pub use object::{Material, ObjectId, SceneObject, Transform, UserData};
pub use scene::Scene;

pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::geometry::{Geometry, GeometryKind};
    pub use crate::host::{RayHit, SceneHost};
    pub use crate::object::{Material, ObjectId, SceneObject, Transform};
    pub use crate::scene::Scene;
}
