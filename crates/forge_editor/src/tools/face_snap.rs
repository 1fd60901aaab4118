//! Face snap tool.
//!
//! Two clicks: the first picks a face on the object to move, the second
//! picks a face on another object (or the ground). The source object is then
//! rotated and translated so the two faces sit flush and opposing.

use forge_math::{ray_plane, Plane, Ray};
use forge_scene::{ObjectId, RayHit, SceneHost, Transform};
use glam::{Quat, Vec3};

use super::coplanar::{coplanar_highlight, ground_highlight, world_face_normal, FaceHighlight};
use super::tool::{PointerInput, Tool, ToolContext, ToolKind, ToolResult};
use crate::error::{EditorError, Result};

/// A picked face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceSelection {
    /// None for the ground plane at y = 0
    pub object: Option<ObjectId>,
    /// World-space face normal
    pub normal: Vec3,
    /// World-space point on the face
    pub point: Vec3,
    pub face_index: Option<usize>,
}

impl FaceSelection {
    pub fn ground(point: Vec3) -> Self {
        Self {
            object: None,
            normal: Vec3::Y,
            point,
            face_index: None,
        }
    }

    pub fn is_ground(&self) -> bool {
        self.object.is_none()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum FaceSnapState {
    #[default]
    Inactive,
    AwaitingSource,
    AwaitingTarget(FaceSelection),
}

/// What the pointer ray lands on.
enum PointerHit {
    Object(RayHit),
    Ground(Vec3),
    Nothing,
}

fn cast_pointer(scene: &dyn SceneHost, ray: &Ray) -> PointerHit {
    if let Some(hit) = scene.raycast(ray).into_iter().next() {
        return PointerHit::Object(hit);
    }
    match ray_plane(ray, &Plane::ground()) {
        Some(t) => PointerHit::Ground(ray.at(t)),
        None => PointerHit::Nothing,
    }
}

/// Rotate and move `object` so its face (`source_normal`, `source_point`)
/// lies on the target face and points against `target_normal`.
///
/// The rotation is the shortest arc from the source normal to the negated
/// target normal, applied in world space before the current orientation.
/// Afterwards the rotated source point coincides with `target_point`.
pub fn perform_snap(
    scene: &mut dyn SceneHost,
    object: ObjectId,
    source_normal: Vec3,
    source_point: Vec3,
    target_point: Vec3,
    target_normal: Vec3,
) -> Result<Transform> {
    let sn = source_normal
        .try_normalize()
        .ok_or(EditorError::DegenerateNormal)?;
    let tn = target_normal
        .try_normalize()
        .ok_or(EditorError::DegenerateNormal)?;
    let mut transform = scene
        .transform(object)
        .ok_or(EditorError::ObjectNotFound(object))?;

    let q = Quat::from_rotation_arc(sn, -tn);
    let offset = source_point - transform.position;

    transform.rotation = (q * transform.rotation).normalize();
    transform.position = target_point - q * offset;
    scene.set_transform(object, transform)?;

    log::debug!(
        "Snapped {} onto {:?} (normal {:?})",
        object,
        target_point,
        tn
    );
    Ok(transform)
}

/// Two-click face snap tool.
#[derive(Debug, Default)]
pub struct FaceSnapController {
    state: FaceSnapState,
    highlight: Option<FaceHighlight>,
}

impl FaceSnapController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FaceSnapState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != FaceSnapState::Inactive
    }

    /// Source face picked by the first click.
    pub fn source(&self) -> Option<&FaceSelection> {
        match &self.state {
            FaceSnapState::AwaitingTarget(source) => Some(source),
            _ => None,
        }
    }

    /// Hover highlight, if the pointer is over a face.
    pub fn highlight(&self) -> Option<&FaceHighlight> {
        self.highlight.as_ref()
    }

    /// Start the workflow, forgetting any previous source.
    pub fn activate(&mut self) {
        self.state = FaceSnapState::AwaitingSource;
        self.highlight = None;
    }

    pub fn deactivate(&mut self) {
        self.state = FaceSnapState::Inactive;
        self.highlight = None;
    }

    /// Face under the ray: the nearest object face, else the ground.
    pub fn pick(&self, scene: &dyn SceneHost, ray: &Ray) -> Option<FaceSelection> {
        match cast_pointer(scene, ray) {
            PointerHit::Object(hit) => {
                let object = scene.object(hit.object)?;
                Some(FaceSelection {
                    object: Some(hit.object),
                    normal: world_face_normal(&object.transform, hit.local_normal),
                    point: hit.point,
                    face_index: hit.face_index,
                })
            }
            PointerHit::Ground(point) => Some(FaceSelection::ground(point)),
            PointerHit::Nothing => None,
        }
    }

    fn pick_source(&mut self, ray: &Ray, ctx: &mut ToolContext<'_>) -> ToolResult {
        let Some(source) = self.pick(&*ctx.scene, ray) else {
            return ToolResult::Rejected(EditorError::NoFaceHit);
        };
        if source.is_ground() {
            return ToolResult::Rejected(EditorError::GroundAsSource);
        }
        log::debug!("Face snap source: {:?}", source);
        self.state = FaceSnapState::AwaitingTarget(source);
        ToolResult::Handled
    }

    fn pick_target(
        &mut self,
        source: FaceSelection,
        ray: &Ray,
        ctx: &mut ToolContext<'_>,
    ) -> ToolResult {
        let Some(source_id) = source.object else {
            self.state = FaceSnapState::AwaitingSource;
            return ToolResult::Rejected(EditorError::GroundAsSource);
        };
        let Some(target) = self.pick(&*ctx.scene, ray) else {
            return ToolResult::Rejected(EditorError::NoFaceHit);
        };
        if target.object == Some(source_id) {
            return ToolResult::Rejected(EditorError::SelfSnap);
        }
        if !ctx.scene.contains(source_id) {
            self.state = FaceSnapState::AwaitingSource;
            return ToolResult::Rejected(EditorError::ObjectNotFound(source_id));
        }
        if source.normal.length_squared() == 0.0 || target.normal.length_squared() == 0.0 {
            return ToolResult::Rejected(EditorError::DegenerateNormal);
        }

        ctx.history.snapshot(&*ctx.scene);
        match perform_snap(
            ctx.scene,
            source_id,
            source.normal,
            source.point,
            target.point,
            target.normal,
        ) {
            Ok(_) => {
                log::info!("Face snap applied to {}", source_id);
                self.deactivate();
                ToolResult::Finished
            }
            Err(e) => ToolResult::Rejected(e),
        }
    }
}

impl Tool for FaceSnapController {
    fn kind(&self) -> ToolKind {
        ToolKind::FaceSnap
    }

    fn on_activate(&mut self, _ctx: &mut ToolContext<'_>) -> Result<()> {
        self.activate();
        Ok(())
    }

    fn on_deactivate(&mut self, _ctx: &mut ToolContext<'_>) {
        self.deactivate();
    }

    fn on_pointer_down(&mut self, input: &PointerInput, ctx: &mut ToolContext<'_>) -> ToolResult {
        match self.state {
            FaceSnapState::Inactive => ToolResult::Ignored,
            FaceSnapState::AwaitingSource => self.pick_source(&input.ray, ctx),
            FaceSnapState::AwaitingTarget(source) => self.pick_target(source, &input.ray, ctx),
        }
    }

    fn on_pointer_move(&mut self, input: &PointerInput, ctx: &mut ToolContext<'_>) -> ToolResult {
        if !self.is_active() {
            return ToolResult::Ignored;
        }

        let prefs = &ctx.prefs.face_snap;
        self.highlight = match cast_pointer(&*ctx.scene, &input.ray) {
            PointerHit::Object(hit) => ctx
                .scene
                .object(hit.object)
                .map(|object| coplanar_highlight(object, &hit, prefs)),
            PointerHit::Ground(point) => Some(ground_highlight(point, prefs)),
            PointerHit::Nothing => None,
        };
        ToolResult::Handled
    }

    /// Drop the picked source and wait for a new one.
    fn cancel(&mut self, _ctx: &mut ToolContext<'_>) -> ToolResult {
        match self.state {
            FaceSnapState::AwaitingTarget(_) => {
                self.state = FaceSnapState::AwaitingSource;
                ToolResult::Handled
            }
            _ => ToolResult::Ignored,
        }
    }

    fn reset(&mut self) {
        if let FaceSnapState::AwaitingTarget(_) = self.state {
            self.state = FaceSnapState::AwaitingSource;
        }
        self.highlight = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use approx::assert_relative_eq;
    use forge_scene::{Geometry, Scene};

    #[test]
    fn test_snap_onto_ground_flips_face() {
        let mut scene = Scene::new();
        let id = scene
            .add_object("box", Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), Transform::IDENTITY)
            .unwrap();

        let t = perform_snap(
            &mut scene,
            id,
            Vec3::Y,
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::ZERO,
            Vec3::Y,
        )
        .unwrap();

        let moved = t.position + t.rotation * (Vec3::new(0.0, 5.0, 0.0) - Vec3::ZERO);
        assert!(moved.length() < 1e-5);

        let normal = t.rotation * Vec3::Y;
        assert_relative_eq!(normal.y, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_normal_is_rejected() {
        let mut scene = Scene::new();
        let id = scene
            .add_object("box", Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), Transform::IDENTITY)
            .unwrap();

        let result = perform_snap(&mut scene, id, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Vec3::Y);
        assert!(matches!(result, Err(EditorError::DegenerateNormal)));
        assert_eq!(scene.transform(id), Some(Transform::IDENTITY));
    }

    #[test]
    fn test_side_face_onto_top_face() {
        let mut scene = Scene::new();
        let id = scene
            .add_object(
                "box",
                Arc::new(Geometry::cuboid(2.0, 2.0, 2.0)),
                Transform::from_position(Vec3::new(5.0, 1.0, 0.0)),
            )
            .unwrap();

        // +X face center of the box onto a table top at y = 3
        let t = perform_snap(
            &mut scene,
            id,
            Vec3::X,
            Vec3::new(6.0, 1.0, 0.0),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::Y,
        )
        .unwrap();

        let normal = t.rotation * Vec3::X;
        assert!((normal - Vec3::NEG_Y).length() < 1e-5);
        // The box center sits one half-size above the target
        assert!((t.position - Vec3::new(0.0, 4.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_activate_clears_source() {
        let mut tool = FaceSnapController::new();
        tool.state = FaceSnapState::AwaitingTarget(FaceSelection::ground(Vec3::ZERO));
        tool.activate();
        assert_eq!(tool.state(), &FaceSnapState::AwaitingSource);
        assert!(tool.source().is_none());
    }
}
