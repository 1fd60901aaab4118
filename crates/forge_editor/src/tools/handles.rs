//! Resize handle layout.
//!
//! Handles live in a *frame*: for a single object this is its own position
//! and rotation, with bounds taken from its scaled local box; for a group it
//! is the world frame around the union of the selected world boxes. Handle
//! directions are expressed in frame axes.
//!
//! Nine handles are laid out: four base corners, four base edge midpoints and
//! one at the center of the face opposite the base.

use forge_math::{ray_sphere, Aabb, Axis, Ray};
use forge_scene::{ObjectId, SceneHost, SceneObject};
use glam::{Quat, Vec3};

pub const HANDLE_COUNT: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleRole {
    Corner,
    Edge,
    /// Center of the face opposite the base
    Top,
}

/// Handle directions with Y as the vertical axis.
const CANONICAL: [(HandleRole, [f32; 3]); HANDLE_COUNT] = [
    (HandleRole::Corner, [-1.0, 0.0, -1.0]),
    (HandleRole::Corner, [1.0, 0.0, -1.0]),
    (HandleRole::Corner, [1.0, 0.0, 1.0]),
    (HandleRole::Corner, [-1.0, 0.0, 1.0]),
    (HandleRole::Edge, [0.0, 0.0, -1.0]),
    (HandleRole::Edge, [1.0, 0.0, 0.0]),
    (HandleRole::Edge, [0.0, 0.0, 1.0]),
    (HandleRole::Edge, [-1.0, 0.0, 0.0]),
    (HandleRole::Top, [0.0, 1.0, 0.0]),
];

/// Base face candidates in tie-break order.
const BASE_CANDIDATES: [(Axis, f32); 6] = [
    (Axis::X, 1.0),
    (Axis::X, -1.0),
    (Axis::Y, 1.0),
    (Axis::Y, -1.0),
    (Axis::Z, 1.0),
    (Axis::Z, -1.0),
];

/// Pick the frame face that points most downward in world space.
///
/// Returns the face axis and side (-1 for the minimum face). The first
/// candidate reaching the maximum wins ties.
pub fn choose_base(rotation: Quat) -> (Axis, f32) {
    let down = rotation.inverse() * Vec3::NEG_Y;
    let mut best = (Axis::Y, -1.0);
    let mut best_dot = f32::NEG_INFINITY;
    for (axis, side) in BASE_CANDIDATES {
        let dot = axis.get(down) * side;
        if dot > best_dot {
            best_dot = dot;
            best = (axis, side);
        }
    }
    best
}

/// Coordinate frame the handles are laid out in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleFrame {
    pub rotation: Quat,
    pub origin: Vec3,
    /// Box in frame coordinates
    pub bounds: Aabb,
    /// Frame axis normal to the base face
    pub base_axis: Axis,
    /// Side of the base face along `base_axis`: -1 minimum, +1 maximum
    pub base_side: f32,
    /// Per-axis mirror state; -1 puts a handle on the opposite side
    pub signs: Vec3,
    /// Laid out around several objects in world axes
    pub group: bool,
}

impl HandleFrame {
    /// World-axis frame around a group's union box.
    pub fn for_group(bounds: Aabb, signs: Vec3) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            origin: Vec3::ZERO,
            bounds,
            base_axis: Axis::Y,
            base_side: -1.0,
            signs,
            group: true,
        }
    }

    /// Object-local frame. None when the object has no finite bounds.
    pub fn for_object(object: &SceneObject, adaptive_base: bool) -> Option<Self> {
        let local = object.local_bounds();
        if !local.is_finite() {
            return None;
        }
        let t = &object.transform;
        let bounds = Aabb::from_points(local.corners().into_iter().map(|c| c * t.scale));
        if !bounds.is_finite() {
            return None;
        }

        let (base_axis, base_side) = if adaptive_base {
            choose_base(t.rotation)
        } else {
            (Axis::Y, -1.0)
        };

        Some(Self {
            rotation: t.rotation,
            origin: t.position,
            bounds,
            base_axis,
            base_side,
            signs: t.scale.signum(),
            group: false,
        })
    }

    #[inline]
    pub fn to_world(&self, point: Vec3) -> Vec3 {
        self.origin + self.rotation * point
    }

    #[inline]
    pub fn to_frame(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.origin)
    }

    #[inline]
    pub fn vector_to_frame(&self, v: Vec3) -> Vec3 {
        self.rotation.inverse() * v
    }

    /// World direction of a frame axis.
    #[inline]
    pub fn axis_world(&self, axis: Axis) -> Vec3 {
        self.rotation * axis.unit()
    }

    /// The two frame axes spanning the base face.
    pub fn base_plane_axes(&self) -> (Axis, Axis) {
        match self.base_axis {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    /// Map a Y-up handle direction onto the frame's base orientation.
    pub fn frame_direction(&self, canonical: Vec3) -> Vec3 {
        let (h1, h2) = self.base_plane_axes();
        let mut d = Vec3::ZERO;
        h1.set(&mut d, canonical.x);
        self.base_axis.set(&mut d, -self.base_side * canonical.y);
        h2.set(&mut d, canonical.z);
        d
    }

    /// Frame-space position of a handle with the given frame direction.
    pub fn handle_position(&self, direction: Vec3) -> Vec3 {
        let mut p = self.bounds.center();
        for axis in Axis::ALL {
            let (min, max) = self.bounds.extent(axis);
            let sign = axis.get(self.signs);
            let mut d = axis.get(direction);
            if d == 0.0 && axis == self.base_axis {
                // Ring handles sit on the base face
                d = self.base_side;
            }
            if d != 0.0 {
                axis.set(&mut p, if d * sign > 0.0 { max } else { min });
            }
        }
        p
    }
}

/// A pickable resize handle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeHandle {
    pub index: usize,
    pub role: HandleRole,
    /// Frame-space direction with components in {-1, 0, 1}
    pub direction: Vec3,
    /// World-space position
    pub position: Vec3,
}

impl ResizeHandle {
    pub fn is_vertical(&self) -> bool {
        self.role == HandleRole::Top
    }
}

/// The nine handles around the current selection.
#[derive(Clone, Debug, PartialEq)]
pub struct HandleLayout {
    pub frame: HandleFrame,
    pub handles: Vec<ResizeHandle>,
    /// Objects the layout was computed for
    pub objects: Vec<ObjectId>,
}

impl HandleLayout {
    /// Lay out handles for `selection`.
    ///
    /// A single object gets its own frame; several objects share a world frame
    /// around the union of their boxes. Objects without finite bounds are
    /// skipped, and None means no handles should be shown.
    pub fn compute(
        scene: &dyn SceneHost,
        selection: &[ObjectId],
        adaptive_base: bool,
        group_signs: Vec3,
    ) -> Option<Self> {
        let objects: Vec<&SceneObject> = selection.iter().filter_map(|&id| scene.object(id)).collect();

        let frame = match objects.as_slice() {
            [] => return None,
            [object] => HandleFrame::for_object(object, adaptive_base)?,
            many => {
                let bounds = many
                    .iter()
                    .filter_map(|o| o.world_bounds())
                    .reduce(|a, b| a.union(&b))?;
                HandleFrame::for_group(bounds, group_signs)
            }
        };

        Some(Self::from_frame(frame, objects.iter().map(|o| o.id).collect()))
    }

    pub fn from_frame(frame: HandleFrame, objects: Vec<ObjectId>) -> Self {
        let handles = CANONICAL
            .iter()
            .enumerate()
            .map(|(index, (role, canonical))| {
                let direction = frame.frame_direction(Vec3::from_array(*canonical));
                ResizeHandle {
                    index,
                    role: *role,
                    direction,
                    position: frame.to_world(frame.handle_position(direction)),
                }
            })
            .collect();

        Self {
            frame,
            handles,
            objects,
        }
    }

    pub fn handle(&self, index: usize) -> Option<&ResizeHandle> {
        self.handles.get(index)
    }

    /// Nearest handle whose pick sphere the ray enters before `limit`.
    ///
    /// Pass the distance of the nearest solid hit as `limit` so handles
    /// behind geometry cannot be grabbed.
    pub fn pick(&self, ray: &Ray, radius: f32, limit: f32) -> Option<usize> {
        self.handles
            .iter()
            .filter_map(|h| ray_sphere(ray, h.position, radius).map(|t| (h.index, t)))
            .filter(|&(_, t)| t < limit)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use forge_scene::{Geometry, Scene, Transform};

    #[test]
    fn test_identity_base_is_bottom() {
        assert_eq!(choose_base(Quat::IDENTITY), (Axis::Y, -1.0));
    }

    #[test]
    fn test_upside_down_base_is_local_top() {
        let (axis, side) = choose_base(Quat::from_rotation_x(std::f32::consts::PI));
        assert_eq!(axis, Axis::Y);
        assert_eq!(side, 1.0);
    }

    #[test]
    fn test_on_side_base_follows_rotation() {
        // Local +X now points down
        let (axis, side) = choose_base(Quat::from_rotation_z(-std::f32::consts::FRAC_PI_2));
        assert_eq!(axis, Axis::X);
        assert_eq!(side, 1.0);
    }

    #[test]
    fn test_single_object_layout() {
        let mut scene = Scene::new();
        let id = scene
            .add_object(
                "box",
                Arc::new(Geometry::cuboid(2.0, 2.0, 2.0)),
                Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
            )
            .unwrap();

        let layout = HandleLayout::compute(&scene, &[id], true, Vec3::ONE).unwrap();
        assert_eq!(layout.handles.len(), HANDLE_COUNT);

        // Corners on the ground, top handle on the top face
        assert!((layout.handles[2].position - Vec3::new(1.0, 0.0, 1.0)).length() < 1e-5);
        assert!((layout.handles[5].position - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((layout.handles[8].position - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_mirrored_axis_moves_handle_to_min_side() {
        let mut scene = Scene::new();
        let id = scene
            .add_object(
                "box",
                Arc::new(Geometry::cuboid(2.0, 2.0, 2.0)),
                Transform::IDENTITY.with_scale(Vec3::new(-1.0, 1.0, 1.0)),
            )
            .unwrap();

        let layout = HandleLayout::compute(&scene, &[id], true, Vec3::ONE).unwrap();
        // +X edge handle now on the numerically smaller side
        assert!((layout.handles[5].position.x + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_selection_has_no_layout() {
        let scene = Scene::new();
        assert!(HandleLayout::compute(&scene, &[], true, Vec3::ONE).is_none());
    }

    #[test]
    fn test_pick_nearest_handle() {
        let frame = HandleFrame::for_group(Aabb::new(Vec3::ZERO, Vec3::splat(2.0)), Vec3::ONE);
        let layout = HandleLayout::from_frame(frame, Vec::new());

        // Straight down onto the top handle at (1, 2, 1)
        let ray = Ray::new(Vec3::new(1.0, 10.0, 1.0), Vec3::NEG_Y);
        assert_eq!(layout.pick(&ray, 0.25, f32::INFINITY), Some(8));

        let miss = Ray::new(Vec3::new(5.0, 10.0, 5.0), Vec3::NEG_Y);
        assert_eq!(layout.pick(&miss, 0.25, f32::INFINITY), None);
    }

    #[test]
    fn test_pick_respects_limit() {
        let frame = HandleFrame::for_group(Aabb::new(Vec3::ZERO, Vec3::splat(2.0)), Vec3::ONE);
        let layout = HandleLayout::from_frame(frame, Vec::new());

        // Top handle sphere is entered at t = 7.75
        let ray = Ray::new(Vec3::new(1.0, 10.0, 1.0), Vec3::NEG_Y);
        assert_eq!(layout.pick(&ray, 0.25, 7.0), None);
        assert_eq!(layout.pick(&ray, 0.25, 8.0), Some(8));
    }

    #[test]
    fn test_empty_geometry_has_no_layout() {
        let mut scene = Scene::new();
        let empty = Arc::new(Geometry::empty());
        let a = scene.add_object("a", empty.clone(), Transform::IDENTITY).unwrap();
        let b = scene
            .add_object("b", empty, Transform::from_position(Vec3::X * 3.0))
            .unwrap();

        assert!(HandleLayout::compute(&scene, &[a], true, Vec3::ONE).is_none());
        assert!(HandleLayout::compute(&scene, &[a, b], true, Vec3::ONE).is_none());
    }
}
