//! Align tool.
//!
//! Lines up the selected objects along one axis by their box minimums,
//! centers or maximums. Three pickable handles per axis sit just outside the
//! selection bounds; hovering one previews the result as ghost boxes and
//! clicking it applies the alignment.

use std::str::FromStr;

use forge_math::{ray_sphere, Aabb, Axis, Ray};
use forge_scene::{ObjectId, SceneHost};
use glam::Vec3;
use thiserror::Error;

use super::tool::{PointerInput, Tool, ToolContext, ToolKind, ToolResult};
use crate::core::AlignPreferences;
use crate::error::{EditorError, Result};

/// Objects needed before anything can be aligned.
const MIN_OBJECTS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlignMode {
    Min,
    Center,
    Max,
}

impl AlignMode {
    pub const ALL: [AlignMode; 3] = [AlignMode::Min, AlignMode::Center, AlignMode::Max];

    pub fn name(&self) -> &'static str {
        match self {
            AlignMode::Min => "min",
            AlignMode::Center => "center",
            AlignMode::Max => "max",
        }
    }

    /// Box-center an object needs so that its aligned side sits on `target`.
    pub fn desired_center(&self, target: f32, half_size: f32) -> f32 {
        match self {
            AlignMode::Min => target + half_size,
            AlignMode::Center => target,
            AlignMode::Max => target - half_size,
        }
    }
}

impl std::fmt::Display for AlignMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown align mode '{0}', expected min, center or max")]
pub struct ParseAlignModeError(pub String);

impl FromStr for AlignMode {
    type Err = ParseAlignModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(AlignMode::Min),
            "center" | "centre" | "mid" => Ok(AlignMode::Center),
            "max" => Ok(AlignMode::Max),
            _ => Err(ParseAlignModeError(s.to_string())),
        }
    }
}

/// Where the selected boxes should line up along `axis`.
///
/// `Min` is the smallest box minimum, `Max` the largest box maximum and
/// `Center` the mean of the box centers (each object weighted equally).
/// None for an empty slice.
pub fn alignment_target(bounds: &[Aabb], axis: Axis, mode: AlignMode) -> Option<f32> {
    if bounds.is_empty() {
        return None;
    }
    let target = match mode {
        AlignMode::Min => bounds
            .iter()
            .map(|b| axis.get(b.min))
            .fold(f32::INFINITY, f32::min),
        AlignMode::Max => bounds
            .iter()
            .map(|b| axis.get(b.max))
            .fold(f32::NEG_INFINITY, f32::max),
        AlignMode::Center => {
            bounds.iter().map(|b| axis.get(b.center())).sum::<f32>() / bounds.len() as f32
        }
    };
    Some(target)
}

/// Shift along `axis` that aligns `bounds` to `target`.
pub fn alignment_shift(bounds: &Aabb, axis: Axis, mode: AlignMode, target: f32) -> f32 {
    let center = axis.get(bounds.center());
    let half = axis.get(bounds.half_extents());
    mode.desired_center(target, half) - center
}

/// A pickable align handle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlignHandle {
    pub axis: Axis,
    pub mode: AlignMode,
    pub position: Vec3,
}

/// Ghost boxes showing where each object would end up.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignPreview {
    pub axis: Axis,
    pub mode: AlignMode,
    pub target: f32,
    pub ghosts: Vec<(ObjectId, Aabb)>,
}

/// World boxes of the selected objects that have any.
fn selected_bounds(scene: &dyn SceneHost, selection: &[ObjectId]) -> Vec<(ObjectId, Aabb)> {
    selection
        .iter()
        .filter_map(|&id| scene.object(id))
        .filter_map(|o| o.world_bounds().map(|b| (o.id, b)))
        .collect()
}

/// Handle positions around `bounds`: min, center and max for each axis.
pub fn handle_positions(bounds: &Aabb, prefs: &AlignPreferences) -> Vec<AlignHandle> {
    let pad = prefs.handle_padding;
    let center = bounds.center();
    let mut handles = Vec::with_capacity(9);

    for axis in Axis::ALL {
        for mode in AlignMode::ALL {
            let along = match mode {
                AlignMode::Min => axis.get(bounds.min),
                AlignMode::Center => axis.get(center),
                AlignMode::Max => axis.get(bounds.max),
            };
            let position = match axis {
                Axis::X => Vec3::new(along, bounds.min.y, bounds.max.z + pad),
                Axis::Y => Vec3::new(bounds.max.x + pad, along, bounds.max.z + pad),
                Axis::Z => Vec3::new(bounds.min.x - pad, bounds.min.y, along),
            };
            handles.push(AlignHandle {
                axis,
                mode,
                position,
            });
        }
    }
    handles
}

/// Align tool. Needs at least two selected objects.
#[derive(Debug, Default)]
pub struct AlignController {
    active: bool,
    handles: Vec<AlignHandle>,
    hovered: Option<usize>,
    preview: Option<AlignPreview>,
}

impl AlignController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handles(&self) -> &[AlignHandle] {
        &self.handles
    }

    pub fn hovered(&self) -> Option<&AlignHandle> {
        self.hovered.and_then(|i| self.handles.get(i))
    }

    pub fn preview(&self) -> Option<&AlignPreview> {
        self.preview.as_ref()
    }

    pub fn compute_alignment_target(
        &self,
        scene: &dyn SceneHost,
        selection: &[ObjectId],
        axis: Axis,
        mode: AlignMode,
    ) -> Option<f32> {
        let bounds: Vec<Aabb> = selected_bounds(scene, selection)
            .into_iter()
            .map(|(_, b)| b)
            .collect();
        alignment_target(&bounds, axis, mode)
    }

    /// Final boxes after aligning, without touching the scene.
    pub fn preview_alignment(
        &self,
        scene: &dyn SceneHost,
        selection: &[ObjectId],
        axis: Axis,
        mode: AlignMode,
    ) -> Option<AlignPreview> {
        let boxes = selected_bounds(scene, selection);
        let all: Vec<Aabb> = boxes.iter().map(|(_, b)| *b).collect();
        let target = alignment_target(&all, axis, mode)?;

        let ghosts = boxes
            .into_iter()
            .map(|(id, b)| {
                let mut offset = Vec3::ZERO;
                axis.set(&mut offset, alignment_shift(&b, axis, mode, target));
                (id, b.translate(offset))
            })
            .collect();

        Some(AlignPreview {
            axis,
            mode,
            target,
            ghosts,
        })
    }

    /// Align the selection and return how many objects were moved.
    ///
    /// History is snapshotted first. Only the position component along
    /// `axis` changes.
    pub fn apply_alignment(
        &mut self,
        ctx: &mut ToolContext<'_>,
        axis: Axis,
        mode: AlignMode,
    ) -> Result<usize> {
        let boxes = selected_bounds(&*ctx.scene, ctx.selection.selected());
        if boxes.len() < MIN_OBJECTS {
            return Err(EditorError::NotEnoughObjects {
                required: MIN_OBJECTS,
                found: boxes.len(),
            });
        }

        let all: Vec<Aabb> = boxes.iter().map(|(_, b)| *b).collect();
        let target = alignment_target(&all, axis, mode).ok_or(EditorError::NotEnoughObjects {
            required: MIN_OBJECTS,
            found: 0,
        })?;

        ctx.history.snapshot(&*ctx.scene);

        let mut moved = 0;
        for (id, bounds) in &boxes {
            let shift = alignment_shift(bounds, axis, mode, target);
            let Some(mut transform) = ctx.scene.transform(*id) else {
                continue;
            };
            let position = axis.get(transform.position) + shift;
            axis.set(&mut transform.position, position);
            ctx.scene.set_transform(*id, transform)?;
            if shift != 0.0 {
                moved += 1;
            }
        }

        log::info!(
            "Aligned {} objects to {} {} = {:.3}",
            boxes.len(),
            axis,
            mode,
            target
        );

        self.preview = None;
        self.refresh_handles(ctx);
        Ok(moved)
    }

    /// Reposition the handles around the current selection bounds.
    pub fn refresh_handles(&mut self, ctx: &ToolContext<'_>) {
        let union = selected_bounds(&*ctx.scene, ctx.selection.selected())
            .into_iter()
            .map(|(_, b)| b)
            .reduce(|a, b| a.union(&b));

        self.handles = match union {
            Some(bounds) if ctx.selection.len() >= MIN_OBJECTS => {
                handle_positions(&bounds, &ctx.prefs.align)
            }
            _ => Vec::new(),
        };
        if self.hovered.map_or(false, |i| i >= self.handles.len()) {
            self.hovered = None;
            self.preview = None;
        }
    }

    /// Nearest handle the ray passes through.
    pub fn pick(&self, ray: &Ray, radius: f32) -> Option<usize> {
        self.handles
            .iter()
            .enumerate()
            .filter_map(|(i, h)| ray_sphere(ray, h.position, radius).map(|t| (i, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

impl Tool for AlignController {
    fn kind(&self) -> ToolKind {
        ToolKind::Align
    }

    fn on_activate(&mut self, ctx: &mut ToolContext<'_>) -> Result<()> {
        let found = ctx.selection.len();
        if found < MIN_OBJECTS {
            return Err(EditorError::NotEnoughObjects {
                required: MIN_OBJECTS,
                found,
            });
        }
        self.active = true;
        self.hovered = None;
        self.preview = None;
        self.refresh_handles(ctx);
        Ok(())
    }

    fn on_deactivate(&mut self, _ctx: &mut ToolContext<'_>) {
        self.active = false;
        self.reset();
    }

    fn on_pointer_down(&mut self, input: &PointerInput, ctx: &mut ToolContext<'_>) -> ToolResult {
        if !self.active {
            return ToolResult::Ignored;
        }
        let Some(index) = self.pick(&input.ray, ctx.prefs.align.handle_radius) else {
            return ToolResult::Ignored;
        };
        let handle = self.handles[index];

        match self.apply_alignment(ctx, handle.axis, handle.mode) {
            Ok(_) => ToolResult::Completed,
            Err(e) => ToolResult::Rejected(e),
        }
    }

    fn on_pointer_move(&mut self, input: &PointerInput, ctx: &mut ToolContext<'_>) -> ToolResult {
        if !self.active {
            return ToolResult::Ignored;
        }

        let hovered = self.pick(&input.ray, ctx.prefs.align.handle_radius);
        if hovered != self.hovered {
            let preview = hovered.and_then(|i| {
                let h = self.handles[i];
                self.preview_alignment(&*ctx.scene, ctx.selection.selected(), h.axis, h.mode)
            });
            self.hovered = hovered;
            self.preview = preview;
        }

        if self.hovered.is_some() {
            ToolResult::Handled
        } else {
            ToolResult::Ignored
        }
    }

    fn update(&mut self, ctx: &mut ToolContext<'_>) {
        if self.active {
            self.refresh_handles(ctx);
        }
    }

    fn reset(&mut self) {
        self.handles.clear();
        self.hovered = None;
        self.preview = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(min: f32, max: f32) -> Aabb {
        Aabb::new(Vec3::new(min, 0.0, 0.0), Vec3::new(max, 1.0, 1.0))
    }

    #[test]
    fn test_min_target() {
        let boxes = [span(0.0, 10.0), span(5.0, 20.0)];
        assert_eq!(alignment_target(&boxes, Axis::X, AlignMode::Min), Some(0.0));
        assert_eq!(alignment_target(&boxes, Axis::X, AlignMode::Max), Some(20.0));
    }

    #[test]
    fn test_center_target_is_mean_of_centers() {
        let boxes = [span(1.0, 3.0), span(6.0, 10.0)];
        assert_eq!(alignment_target(&boxes, Axis::X, AlignMode::Center), Some(5.0));
    }

    #[test]
    fn test_empty_has_no_target() {
        assert_eq!(alignment_target(&[], Axis::Y, AlignMode::Min), None);
    }

    #[test]
    fn test_shift_puts_side_on_target() {
        let b = span(5.0, 20.0);
        assert_eq!(alignment_shift(&b, Axis::X, AlignMode::Min, 0.0), -5.0);
        assert_eq!(alignment_shift(&b, Axis::X, AlignMode::Max, 30.0), 10.0);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Center".parse::<AlignMode>(), Ok(AlignMode::Center));
        assert!("middle".parse::<AlignMode>().is_err());
    }

    #[test]
    fn test_handles_sit_outside_bounds() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::splat(2.0));
        let handles = handle_positions(&bounds, &AlignPreferences::default());
        assert_eq!(handles.len(), 9);

        let x_max = handles
            .iter()
            .find(|h| h.axis == Axis::X && h.mode == AlignMode::Max)
            .unwrap();
        assert_eq!(x_max.position, Vec3::new(2.0, 0.0, 2.5));
    }
}
