//! Integration tests for forge_scene
//!
//! Picking through the camera against the in-memory scene.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use forge_scene::prelude::*;
use glam::{Vec2, Vec3};

#[test]
fn test_pick_through_screen_center() {
    let mut scene = Scene::new();
    let near = scene
        .add_object("near", Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), Transform::from_position(Vec3::new(0.0, 0.0, 3.0)))
        .unwrap();
    let far = scene
        .add_object("far", Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), Transform::IDENTITY)
        .unwrap();

    let camera = Camera::new(Vec3::new(0.1, 0.2, 10.0), Vec3::new(0.1, 0.2, 0.0)).with_viewport(800.0, 600.0);
    let hits = scene.raycast(&camera.screen_ray(Vec2::new(400.0, 300.0)));

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].object, near);
    assert_eq!(hits[1].object, far);
    assert_abs_diff_eq!(hits[0].point.z, 3.5, epsilon = 1e-3);
    assert!((hits[0].local_normal - Vec3::Z).length() < 1e-5);
}

#[test]
fn test_rebuilt_kinds_match_builders() {
    let kind = GeometryKind::Cylinder {
        radius: 0.5,
        height: 2.0,
        segments: 16,
    };
    let rebuilt = Geometry::from_kind(&kind);
    assert_eq!(rebuilt, Geometry::cylinder(0.5, 2.0, 16));

    let bounds = rebuilt.local_bounds();
    assert_abs_diff_eq!(bounds.max.y, 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(bounds.min.y, -1.0, epsilon = 1e-5);
}

#[test]
fn test_removed_object_is_not_picked() {
    let mut scene = Scene::new();
    let id = scene
        .add_object("box", Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), Transform::IDENTITY)
        .unwrap();
    scene.remove_object(id).unwrap();

    let ray = forge_math::Ray::new(Vec3::new(0.1, 5.0, 0.2), Vec3::NEG_Y);
    assert!(scene.raycast(&ray).is_empty());
    assert!(scene.remove_object(id).is_err());
}
