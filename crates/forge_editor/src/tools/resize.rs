//! Bounding box resize tool.
//!
//! Dragging a handle scales the selection along the axes the handle
//! controls while the opposite side of the box stays put. Dragging past the
//! anchor mirrors the selection: the scale factor turns negative and the
//! handle continues on the other side of the box.
//!
//! State machine: `Idle -> Hovering(handle) -> Dragging(session) -> Idle`.
//! History is snapshotted when a drag starts.

use forge_math::{clamp_magnitude, ray_plane, snap_vec3, Axis, Plane, Ray};
use forge_scene::{Camera, ObjectId, SceneHost, Transform};
use glam::Vec3;

use super::handles::{HandleFrame, HandleLayout, ResizeHandle};
use super::tool::{PointerInput, Tool, ToolContext, ToolKind, ToolResult};
use crate::core::ResizePreferences;
use crate::error::{EditorError, Result};

/// Extents below this are treated as this size when computing factors.
const MIN_EXTENT: f32 = 1e-4;

/// Everything captured when a drag starts.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub handle: usize,
    /// Handle direction in frame axes with the mirror state applied
    pub direction: Vec3,
    pub plane: Plane,
    /// Drag plane point under the pointer at drag start
    pub start_point: Vec3,
    /// Frame and bounds at drag start
    pub frame: HandleFrame,
    pub initial: Vec<(ObjectId, Transform)>,
    /// Last accepted per-axis scale factor
    pub scale_factor: Vec3,
}

impl DragSession {
    /// Fixed point of the resize in frame coordinates.
    ///
    /// Per axis this is the box minimum when the handle pulls toward the
    /// maximum side and the box maximum otherwise.
    pub fn anchor(&self) -> Vec3 {
        let bounds = &self.frame.bounds;
        let mut anchor = bounds.center();
        for axis in Axis::ALL {
            let (min, max) = bounds.extent(axis);
            axis.set(&mut anchor, if axis.get(self.direction) >= 0.0 { min } else { max });
        }
        anchor
    }

    /// Per-axis scale factors for a frame-space drag offset.
    ///
    /// Axes the handle does not control stay at 1. A resulting extent at or
    /// below `min_size` keeps the previous factor for that axis.
    pub fn scale_factors(&self, offset: Vec3, prefs: &ResizePreferences) -> Vec3 {
        let size = self.frame.bounds.size();
        let mut factors = Vec3::ONE;
        for axis in Axis::ALL {
            let d = axis.get(self.direction);
            if d == 0.0 {
                continue;
            }
            let initial = axis.get(size).max(MIN_EXTENT);
            let new_size = initial + axis.get(offset) * d;
            let factor = if new_size.abs() <= prefs.min_size {
                axis.get(self.scale_factor)
            } else {
                clamp_magnitude(new_size / initial, prefs.min_scale_factor)
            };
            axis.set(&mut factors, factor);
        }
        factors
    }

    /// Transform of an object after scaling by `factors` about the anchor.
    pub fn scaled_transform(&self, initial: &Transform, factors: Vec3) -> Transform {
        let anchor = self.anchor();
        let local = self.frame.to_frame(initial.position);
        let mut t = *initial;
        t.position = self.frame.to_world(anchor + (local - anchor) * factors);
        t.scale = initial.scale * factors;
        t
    }

    /// Mirror state of the handles for the current factors.
    pub fn live_signs(&self) -> Vec3 {
        self.frame.signs * self.scale_factor.signum()
    }
}

/// Resize tool state.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ResizeState {
    #[default]
    Idle,
    Hovering(usize),
    Dragging(DragSession),
}

/// Nine-handle resize tool.
#[derive(Debug)]
pub struct ResizeHandleController {
    state: ResizeState,
    layout: Option<HandleLayout>,
    /// Mirror state of the group frame for `group_members`
    group_signs: Vec3,
    group_members: Vec<ObjectId>,
}

impl Default for ResizeHandleController {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizeHandleController {
    pub fn new() -> Self {
        Self {
            state: ResizeState::Idle,
            layout: None,
            group_signs: Vec3::ONE,
            group_members: Vec::new(),
        }
    }

    pub fn state(&self) -> &ResizeState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ResizeState::Dragging(_))
    }

    pub fn hovered(&self) -> Option<usize> {
        match self.state {
            ResizeState::Hovering(index) => Some(index),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            ResizeState::Dragging(session) => Some(session),
            _ => None,
        }
    }

    pub fn layout(&self) -> Option<&HandleLayout> {
        self.layout.as_ref()
    }

    /// Visible handles; empty when nothing resizable is selected.
    pub fn handles(&self) -> &[ResizeHandle] {
        self.layout.as_ref().map_or(&[], |l| l.handles.as_slice())
    }

    /// Recompute handle positions from the live selection and transforms.
    pub fn refresh(&mut self, ctx: &ToolContext<'_>) {
        let selected = ctx.selection.selected();
        if selected != self.group_members.as_slice() {
            self.group_signs = Vec3::ONE;
            self.group_members = selected.to_vec();
        }

        let signs = self.session().map_or(self.group_signs, |s| s.live_signs());
        self.layout = HandleLayout::compute(
            &*ctx.scene,
            selected,
            ctx.prefs.resize.adaptive_base,
            signs,
        );

        if self.layout.is_none() && self.hovered().is_some() {
            self.state = ResizeState::Idle;
        }
    }

    /// Handle under the ray that is not hidden behind a solid.
    pub fn hit_test(&self, ray: &Ray, radius: f32, scene: &dyn SceneHost) -> Option<usize> {
        let layout = self.layout.as_ref()?;
        let limit = scene
            .raycast(ray)
            .first()
            .map_or(f32::INFINITY, |hit| hit.distance);
        layout.pick(ray, radius, limit)
    }

    /// Plane a handle is dragged along.
    ///
    /// Ring handles slide on the base face plane; the top handle moves on a
    /// plane that contains the vertical axis and faces the camera.
    pub fn drag_plane(&self, handle: usize, camera: &Camera) -> Option<Plane> {
        let layout = self.layout.as_ref()?;
        let h = layout.handle(handle)?;
        let up = layout.frame.axis_world(layout.frame.base_axis);

        if !h.is_vertical() {
            return Some(Plane::from_point_normal(h.position, up));
        }

        let forward = camera.forward();
        let mut normal = forward - up * forward.dot(up);
        if normal.length_squared() < 1e-6 {
            normal = up.any_orthonormal_vector();
        }
        Some(Plane::from_point_normal(h.position, normal))
    }

    /// Start dragging `handle` from a world point on its drag plane.
    pub fn begin_drag(
        &mut self,
        ctx: &mut ToolContext<'_>,
        handle: usize,
        start_point: Vec3,
    ) -> Result<()> {
        if self.is_dragging() {
            self.end_drag(ctx);
        }
        self.refresh(ctx);

        let plane = self
            .drag_plane(handle, ctx.camera)
            .ok_or(EditorError::InvalidHandle(handle))?;
        let layout = self.layout.as_ref().ok_or(EditorError::InvalidHandle(handle))?;
        let h = layout.handle(handle).ok_or(EditorError::InvalidHandle(handle))?;

        let initial: Vec<(ObjectId, Transform)> = layout
            .objects
            .iter()
            .filter_map(|&id| ctx.scene.transform(id).map(|t| (id, t)))
            .collect();

        ctx.history.snapshot(&*ctx.scene);

        let session = DragSession {
            handle,
            direction: h.direction * layout.frame.signs,
            plane,
            start_point: plane.project_point(start_point),
            frame: layout.frame,
            initial,
            scale_factor: Vec3::ONE,
        };
        log::debug!(
            "Resize drag on handle {} ({:?}) for {} objects",
            handle,
            h.role,
            session.initial.len()
        );
        self.state = ResizeState::Dragging(session);
        Ok(())
    }

    /// Move the drag to a world point, projected onto the drag plane.
    pub fn drag_to(&mut self, ctx: &mut ToolContext<'_>, point: Vec3) -> ToolResult {
        let prefs = ctx.prefs.resize.clone();
        let ResizeState::Dragging(session) = &mut self.state else {
            return ToolResult::Ignored;
        };

        let world_offset = session.plane.project_point(point) - session.start_point;
        let mut offset = session.frame.vector_to_frame(world_offset);
        if let Some(increment) = prefs.snap_increment {
            offset = snap_vec3(offset, increment);
        }

        let factors = session.scale_factors(offset, &prefs);
        session.scale_factor = factors;

        for (id, initial) in &session.initial {
            let t = session.scaled_transform(initial, factors);
            if let Err(e) = ctx.scene.set_transform(*id, t) {
                log::warn!("Resize skipped {}: {}", id, e);
            }
        }

        let offset = session.frame.rotation * offset;
        self.refresh(ctx);
        ToolResult::DragProgress { offset }
    }

    /// Finish the drag, keeping the last computed transforms.
    pub fn end_drag(&mut self, ctx: &mut ToolContext<'_>) -> ToolResult {
        if !self.is_dragging() {
            return ToolResult::Ignored;
        }
        let ResizeState::Dragging(session) = std::mem::take(&mut self.state) else {
            return ToolResult::Ignored;
        };

        if session.frame.group {
            self.group_signs = session.live_signs();
        }
        log::info!(
            "Resized {} objects by {:?}",
            session.initial.len(),
            session.scale_factor
        );
        self.refresh(ctx);
        ToolResult::Completed
    }

    /// Abort the drag and put every object back where it started.
    pub fn cancel_drag(&mut self, ctx: &mut ToolContext<'_>) -> ToolResult {
        if !self.is_dragging() {
            return ToolResult::Ignored;
        }
        let ResizeState::Dragging(session) = std::mem::take(&mut self.state) else {
            return ToolResult::Ignored;
        };

        for (id, initial) in &session.initial {
            if let Err(e) = ctx.scene.set_transform(*id, *initial) {
                log::warn!("Could not restore {} after cancelled resize: {}", id, e);
            }
        }
        log::debug!("Resize drag cancelled");
        self.refresh(ctx);
        ToolResult::Handled
    }
}

impl Tool for ResizeHandleController {
    fn kind(&self) -> ToolKind {
        ToolKind::Resize
    }

    fn on_activate(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        self.state = ResizeState::Idle;
        self.refresh(ctx);
        Ok(())
    }

    fn on_deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        self.end_drag(ctx);
        self.state = ResizeState::Idle;
        self.layout = None;
    }

    fn on_pointer_down(&mut self, input: &PointerInput, ctx: &mut ToolContext<'_>) -> ToolResult {
        if self.is_dragging() {
            return ToolResult::Handled;
        }

        let Some(handle) = self.hit_test(&input.ray, ctx.prefs.resize.handle_radius, &*ctx.scene)
        else {
            return ToolResult::Ignored;
        };

        let start = self
            .drag_plane(handle, ctx.camera)
            .and_then(|plane| ray_plane(&input.ray, &plane).map(|t| input.ray.at(t)));
        let Some(start) = start else {
            log::debug!("Handle {} drag plane not reachable from pointer", handle);
            return ToolResult::Rejected(EditorError::DragPlaneMissed);
        };

        match self.begin_drag(ctx, handle, start) {
            Ok(()) => ToolResult::Handled,
            Err(e) => ToolResult::Rejected(e),
        }
    }

    fn on_pointer_move(&mut self, input: &PointerInput, ctx: &mut ToolContext<'_>) -> ToolResult {
        if let Some(plane) = self.session().map(|s| s.plane) {
            return match ray_plane(&input.ray, &plane) {
                Some(t) => self.drag_to(ctx, input.ray.at(t)),
                None => ToolResult::Handled,
            };
        }

        match self.hit_test(&input.ray, ctx.prefs.resize.handle_radius, &*ctx.scene) {
            Some(index) => {
                self.state = ResizeState::Hovering(index);
                ToolResult::Handled
            }
            None => {
                self.state = ResizeState::Idle;
                ToolResult::Ignored
            }
        }
    }

    fn on_pointer_up(&mut self, _input: &PointerInput, ctx: &mut ToolContext<'_>) -> ToolResult {
        self.end_drag(ctx)
    }

    fn cancel(&mut self, ctx: &mut ToolContext<'_>) -> ToolResult {
        self.cancel_drag(ctx)
    }

    fn update(&mut self, ctx: &mut ToolContext<'_>) {
        self.refresh(ctx);
    }

    fn reset(&mut self) {
        self.state = ResizeState::Idle;
        self.layout = None;
        self.group_signs = Vec3::ONE;
        self.group_members.clear();
    }
}
