//! The editor session.
//!
//! Owns the scene host, camera, selection, history, preferences and the
//! three tools, and routes pointer input to whichever tool is active.
//! Presses a tool does not take become a click or box-select gesture.

use std::sync::Arc;

use forge_math::Axis;
use forge_scene::{Camera, Geometry, ObjectId, Scene, SceneHost, Transform};
use glam::{Vec2, Vec3};

use super::{EditorPreferences, HistoryStore, Notifications, ScreenRect, SelectionSet};
use crate::error::{EditorError, Result};
use crate::tools::{
    perform_snap, ActiveTool, AlignController, AlignMode, FaceSnapController, Modifiers,
    PointerInput, ResizeHandleController, Tool, ToolContext, ToolResult,
};

/// Mutable borrows of the three tools, split off the session next to a
/// [`ToolContext`].
struct Tools<'a> {
    resize: &'a mut ResizeHandleController,
    align: &'a mut AlignController,
    face_snap: &'a mut FaceSnapController,
}

impl<'a> Tools<'a> {
    fn get(&mut self, active: ActiveTool) -> Option<&mut dyn Tool> {
        match active {
            ActiveTool::None => None,
            ActiveTool::Resize => Some(&mut *self.resize as &mut dyn Tool),
            ActiveTool::Align => Some(&mut *self.align as &mut dyn Tool),
            ActiveTool::FaceSnap => Some(&mut *self.face_snap as &mut dyn Tool),
        }
    }

    fn reset_all(&mut self) {
        self.resize.reset();
        self.align.reset();
        self.face_snap.reset();
    }
}

/// Press that no tool consumed.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Gesture {
    start: Vec2,
    current: Vec2,
}

/// Interactive editing session over a scene host.
pub struct EditorSession<S: SceneHost = Scene> {
    scene: S,
    camera: Camera,
    selection: SelectionSet,
    history: HistoryStore,
    prefs: EditorPreferences,
    notifications: Notifications,
    active_tool: ActiveTool,
    resize: ResizeHandleController,
    align: AlignController,
    face_snap: FaceSnapController,
    gesture: Option<Gesture>,
}

impl Default for EditorSession<Scene> {
    fn default() -> Self {
        Self::new(Scene::new(), EditorPreferences::default())
    }
}

impl<S: SceneHost> EditorSession<S> {
    pub fn new(scene: S, prefs: EditorPreferences) -> Self {
        let prefs = prefs.validated();
        let mut session = Self {
            scene,
            camera: Camera::default(),
            selection: SelectionSet::new(),
            history: HistoryStore::from_preferences(&prefs.history),
            prefs,
            notifications: Notifications::new(),
            active_tool: ActiveTool::None,
            resize: ResizeHandleController::new(),
            align: AlignController::new(),
            face_snap: FaceSnapController::new(),
            gesture: None,
        };
        if let Err(e) = session.set_active_tool(ActiveTool::default()) {
            log::warn!("Default tool refused activation: {}", e);
        }
        session
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Direct scene access. Tools pick up changes on the next [`update`](Self::update).
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn preferences(&self) -> &EditorPreferences {
        &self.prefs
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    pub fn active_tool(&self) -> ActiveTool {
        self.active_tool
    }

    pub fn resize_tool(&self) -> &ResizeHandleController {
        &self.resize
    }

    pub fn align_tool(&self) -> &AlignController {
        &self.align
    }

    pub fn face_snap_tool(&self) -> &FaceSnapController {
        &self.face_snap
    }

    /// Box-select rectangle of the gesture in progress, if any.
    pub fn selection_rect(&self) -> Option<ScreenRect> {
        self.gesture.map(|g| ScreenRect::from_corners(g.start, g.current))
    }

    fn parts(&mut self) -> (ToolContext<'_>, Tools<'_>) {
        let Self {
            scene,
            camera,
            selection,
            history,
            prefs,
            resize,
            align,
            face_snap,
            ..
        } = self;
        (
            ToolContext {
                scene,
                selection,
                history,
                camera,
                prefs,
            },
            Tools {
                resize,
                align,
                face_snap,
            },
        )
    }

    fn dispatch(
        &mut self,
        f: impl FnOnce(&mut dyn Tool, &mut ToolContext<'_>) -> ToolResult,
    ) -> ToolResult {
        let active = self.active_tool;
        let (mut ctx, mut tools) = self.parts();
        match tools.get(active) {
            Some(tool) => f(tool, &mut ctx),
            None => ToolResult::Ignored,
        }
    }

    // ---------------------------------------------------------------------
    // Tools
    // ---------------------------------------------------------------------

    /// Switch tools, deactivating the current one first.
    ///
    /// A tool that refuses activation leaves the previous tool active and
    /// posts a warning.
    pub fn set_active_tool(&mut self, next: ActiveTool) -> Result<()> {
        let previous = self.active_tool;
        if next == previous {
            return Ok(());
        }

        {
            let (mut ctx, mut tools) = self.parts();
            if let Some(tool) = tools.get(previous) {
                tool.on_deactivate(&mut ctx);
            }
        }

        let activated = {
            let (mut ctx, mut tools) = self.parts();
            match tools.get(next) {
                Some(tool) => tool.on_activate(&mut ctx),
                None => Ok(()),
            }
        };

        match activated {
            Ok(()) => {
                log::info!("Active tool: {:?}", next);
                self.active_tool = next;
                Ok(())
            }
            Err(e) => {
                self.notifications.warn(e.to_string());
                let restored = {
                    let (mut ctx, mut tools) = self.parts();
                    match tools.get(previous) {
                        Some(tool) => tool.on_activate(&mut ctx),
                        None => Ok(()),
                    }
                };
                self.active_tool = if restored.is_ok() { previous } else { ActiveTool::None };
                Err(e)
            }
        }
    }

    fn finish_result(&mut self, result: ToolResult) -> ToolResult {
        match &result {
            ToolResult::Rejected(e) => self.notifications.warn(e.to_string()),
            ToolResult::Finished => {
                if let Err(e) = self.set_active_tool(ActiveTool::default()) {
                    log::warn!("Could not return to the default tool: {}", e);
                }
                self.update();
            }
            ToolResult::Completed => self.update(),
            _ => {}
        }
        result
    }

    // ---------------------------------------------------------------------
    // Pointer input
    // ---------------------------------------------------------------------

    fn pointer_input(&self, screen: Vec2, modifiers: Modifiers) -> PointerInput {
        PointerInput::new(screen, self.camera.screen_ray(screen)).with_modifiers(modifiers)
    }

    pub fn pointer_down(&mut self, screen: Vec2, modifiers: Modifiers) -> ToolResult {
        let input = self.pointer_input(screen, modifiers);
        let result = self.dispatch(|tool, ctx| tool.on_pointer_down(&input, ctx));

        if result.is_consumed() {
            self.gesture = None;
        } else {
            self.gesture = Some(Gesture {
                start: screen,
                current: screen,
            });
        }
        self.finish_result(result)
    }

    pub fn pointer_move(&mut self, screen: Vec2, modifiers: Modifiers) -> ToolResult {
        if let Some(gesture) = &mut self.gesture {
            gesture.current = screen;
            return ToolResult::Handled;
        }
        let input = self.pointer_input(screen, modifiers);
        let result = self.dispatch(|tool, ctx| tool.on_pointer_move(&input, ctx));
        self.finish_result(result)
    }

    pub fn pointer_up(&mut self, screen: Vec2, modifiers: Modifiers) -> ToolResult {
        if let Some(gesture) = self.gesture.take() {
            if gesture.start.distance(screen) < self.prefs.selection.box_select_min_pixels {
                self.click_select(screen, modifiers);
            } else {
                self.box_select(gesture.start, screen);
            }
            self.update();
            return ToolResult::Handled;
        }

        let input = self.pointer_input(screen, modifiers);
        let result = self.dispatch(|tool, ctx| tool.on_pointer_up(&input, ctx));
        self.finish_result(result)
    }

    /// Abort the gesture or drag in progress (Escape).
    pub fn cancel(&mut self) -> ToolResult {
        if self.gesture.take().is_some() {
            return ToolResult::Handled;
        }
        let result = self.dispatch(|tool, ctx| tool.cancel(ctx));
        self.finish_result(result)
    }

    /// Per-frame tick: refresh the active tool's handles and highlights.
    pub fn update(&mut self) {
        if self.selection.take_dirty() {
            log::trace!("Selection changed: {:?}", self.selection.selected());
        }
        let active = self.active_tool;
        let (mut ctx, mut tools) = self.parts();
        if let Some(tool) = tools.get(active) {
            tool.update(&mut ctx);
        }
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    fn click_select(&mut self, screen: Vec2, modifiers: Modifiers) {
        let ray = self.camera.screen_ray(screen);
        let hit = self.scene.raycast(&ray).into_iter().next();

        match (hit, modifiers.toggles_selection()) {
            (Some(hit), true) => self.selection.toggle(hit.object),
            (Some(hit), false) => self.selection.select_single(Some(hit.object)),
            (None, true) => {}
            (None, false) => self.selection.clear(),
        }
    }

    pub fn select_single(&mut self, id: Option<ObjectId>) {
        self.selection.select_single(id);
        self.update();
    }

    pub fn toggle_selection(&mut self, id: ObjectId) {
        self.selection.toggle(id);
        self.update();
    }

    /// Replace the selection with `ids`, in order.
    pub fn select_objects(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        self.selection.replace(ids);
        self.update();
    }

    pub fn select_all(&mut self) {
        self.selection.replace(self.scene.object_ids());
        self.update();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.update();
    }

    /// Add objects whose origins project inside the rectangle.
    ///
    /// Returns false, leaving the selection as is, for rectangles below the
    /// pixel threshold.
    pub fn box_select(&mut self, corner_a: Vec2, corner_b: Vec2) -> bool {
        let selected = self.selection.box_select(
            self.scene.objects(),
            &self.camera,
            corner_a,
            corner_b,
            self.prefs.selection.box_select_min_pixels,
        );
        self.update();
        selected
    }

    pub fn on_selection_change(&mut self, listener: impl FnMut(&[ObjectId]) + 'static) {
        self.selection.on_change(listener);
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    pub fn snapshot(&mut self) {
        self.history.snapshot(&self.scene);
    }

    /// Step back in history; a silent no-op at the oldest snapshot.
    pub fn undo(&mut self) -> bool {
        let restored = self.history.undo(&mut self.scene, &mut self.selection);
        if restored {
            self.after_restore();
        }
        restored
    }

    /// Step forward in history; a silent no-op at the newest snapshot.
    pub fn redo(&mut self) -> bool {
        let restored = self.history.redo(&mut self.scene, &mut self.selection);
        if restored {
            self.after_restore();
        }
        restored
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn after_restore(&mut self) {
        self.gesture = None;
        let (_, mut tools) = self.parts();
        tools.reset_all();
        self.update();
    }

    // ---------------------------------------------------------------------
    // Scene edits
    // ---------------------------------------------------------------------

    /// Empty the scene, selection and history.
    pub fn new_project(&mut self) {
        self.scene.clear();
        self.selection.clear();
        self.history.clear();
        self.after_restore();
        if let Err(e) = self.set_active_tool(ActiveTool::default()) {
            log::warn!("Default tool refused activation: {}", e);
        }
        self.notifications.info("New project");
    }

    /// Add an object and select it.
    pub fn add_object(
        &mut self,
        name: &str,
        geometry: Arc<Geometry>,
        transform: Transform,
    ) -> Result<ObjectId> {
        self.history.snapshot(&self.scene);
        let id = self.scene.add_object(name, geometry, transform)?;
        log::info!("Added {} '{}'", id, name);
        self.select_single(Some(id));
        Ok(id)
    }

    /// Remove every selected object. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        self.history.snapshot(&self.scene);

        let ids = self.selection.selected().to_vec();
        let mut removed = 0;
        for id in ids {
            match self.scene.remove_object(id) {
                Ok(_) => removed += 1,
                Err(e) => log::warn!("Delete {}: {}", id, e),
            }
        }
        self.selection.clear();
        self.update();
        log::info!("Deleted {} objects", removed);
        removed
    }

    // ---------------------------------------------------------------------
    // Direct operations
    // ---------------------------------------------------------------------

    /// Drag resize handle `handle` by a world offset in one step.
    ///
    /// The offset is applied from the handle's position and projected onto
    /// its drag plane, exactly as a pointer drag would.
    pub fn drag_resize_handle(&mut self, handle: usize, delta: Vec3) -> Result<()> {
        self.set_active_tool(ActiveTool::Resize)?;

        let result = {
            let (mut ctx, tools) = self.parts();
            tools.resize.refresh(&ctx);
            let start = tools.resize.handles().get(handle).map(|h| h.position);
            match start {
                Some(start) => match tools.resize.begin_drag(&mut ctx, handle, start) {
                    Ok(()) => {
                        tools.resize.drag_to(&mut ctx, start + delta);
                        tools.resize.end_drag(&mut ctx);
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                None => Err(EditorError::InvalidHandle(handle)),
            }
        };

        if let Err(e) = &result {
            self.notifications.warn(e.to_string());
        }
        result
    }

    /// Align the selection along `axis`. Returns how many objects moved.
    pub fn align_selection(&mut self, axis: Axis, mode: AlignMode) -> Result<usize> {
        let result = {
            let (mut ctx, tools) = self.parts();
            tools.align.apply_alignment(&mut ctx, axis, mode)
        };
        if let Err(e) = &result {
            self.notifications.warn(e.to_string());
        }
        self.update();
        result
    }

    /// Mate a face of `object` with a target face, snapshotting first.
    pub fn snap_faces(
        &mut self,
        object: ObjectId,
        source_normal: Vec3,
        source_point: Vec3,
        target_point: Vec3,
        target_normal: Vec3,
    ) -> Result<Transform> {
        let result = if !self.scene.contains(object) {
            Err(EditorError::ObjectNotFound(object))
        } else if source_normal.length_squared() == 0.0 || target_normal.length_squared() == 0.0 {
            Err(EditorError::DegenerateNormal)
        } else {
            self.history.snapshot(&self.scene);
            perform_snap(
                &mut self.scene,
                object,
                source_normal,
                source_point,
                target_point,
                target_normal,
            )
        };

        if let Err(e) = &result {
            self.notifications.warn(e.to_string());
        }
        self.update();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn session_with_boxes(positions: &[Vec3]) -> (EditorSession, Vec<ObjectId>) {
        let mut session = EditorSession::default();
        let cube = Arc::new(Geometry::cuboid(2.0, 2.0, 2.0));
        let ids = positions
            .iter()
            .map(|&p| {
                session
                    .scene_mut()
                    .add_object("box", cube.clone(), Transform::from_position(p))
                    .unwrap()
            })
            .collect();
        (session, ids)
    }

    fn center(session: &EditorSession) -> Vec2 {
        session.camera().viewport * 0.5
    }

    #[test]
    fn test_resize_is_default_tool() {
        let session = EditorSession::default();
        assert_eq!(session.active_tool(), ActiveTool::Resize);
    }

    #[test]
    fn test_click_selects_and_miss_clears() {
        let (mut session, ids) = session_with_boxes(&[Vec3::ZERO]);
        let c = center(&session);

        session.pointer_down(c, Modifiers::NONE);
        session.pointer_up(c, Modifiers::NONE);
        assert_eq!(session.selection().selected(), &[ids[0]]);
        assert!(session.resize_tool().layout().is_some());

        let corner = Vec2::new(5.0, 5.0);
        session.pointer_down(corner, Modifiers::NONE);
        session.pointer_up(corner, Modifiers::NONE);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_ctrl_click_toggles() {
        let (mut session, ids) = session_with_boxes(&[Vec3::ZERO]);
        let c = center(&session);
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };

        session.pointer_down(c, ctrl);
        session.pointer_up(c, ctrl);
        assert!(session.selection().contains(ids[0]));

        session.pointer_down(c, ctrl);
        session.pointer_up(c, ctrl);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_align_needs_two_objects() {
        let (mut session, ids) = session_with_boxes(&[Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)]);
        session.select_single(Some(ids[0]));

        let result = session.set_active_tool(ActiveTool::Align);
        assert!(matches!(
            result,
            Err(EditorError::NotEnoughObjects { required: 2, found: 1 })
        ));
        assert_eq!(session.active_tool(), ActiveTool::Resize);
        assert_eq!(session.notifications().len(), 1);

        session.select_all();
        session.set_active_tool(ActiveTool::Align).unwrap();
        assert_eq!(session.align_tool().handles().len(), 9);
    }

    #[test]
    fn test_selection_listener_sees_changes() {
        let (mut session, ids) = session_with_boxes(&[Vec3::ZERO]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        session.on_selection_change(move |sel| sink.borrow_mut().push(sel.len()));

        session.select_single(Some(ids[0]));
        session.select_single(Some(ids[0]));
        session.clear_selection();
        assert_eq!(*seen.borrow(), vec![1, 0]);
    }

    #[test]
    fn test_delete_then_undo_restores() {
        let (mut session, ids) = session_with_boxes(&[Vec3::ZERO, Vec3::X * 4.0]);
        session.select_single(Some(ids[1]));

        assert_eq!(session.delete_selected(), 1);
        assert_eq!(session.scene().len(), 1);

        assert!(session.undo());
        assert_eq!(session.scene().len(), 2);
        assert!(session.scene().contains(ids[1]));
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_new_project_clears_everything() {
        let (mut session, _) = session_with_boxes(&[Vec3::ZERO]);
        session.select_all();
        session.snapshot();

        session.new_project();
        assert!(session.scene().is_empty());
        assert!(session.selection().is_empty());
        assert!(session.history().is_empty());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_bad_handle_is_reported() {
        let (mut session, ids) = session_with_boxes(&[Vec3::ZERO]);
        session.select_single(Some(ids[0]));

        let result = session.drag_resize_handle(12, Vec3::X);
        assert!(matches!(result, Err(EditorError::InvalidHandle(12))));
        assert_eq!(session.notifications().len(), 1);
    }
}
