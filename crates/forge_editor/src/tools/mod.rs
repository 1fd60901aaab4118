//! Viewport tools.
//!
//! - [`ResizeHandleController`]: nine-handle bounding box resize
//! - [`FaceSnapController`]: pick a face, pick a target, mate them
//! - [`AlignController`]: min/center/max alignment handles

pub mod align;
pub mod coplanar;
pub mod face_snap;
pub mod handles;
pub mod resize;
pub mod tool;

pub use align::{
    alignment_shift, alignment_target, AlignController, AlignHandle, AlignMode, AlignPreview,
    ParseAlignModeError,
};
pub use coplanar::{coplanar_highlight, ground_highlight, world_face_normal, FaceHighlight};
pub use face_snap::{perform_snap, FaceSelection, FaceSnapController, FaceSnapState};
pub use handles::{HandleFrame, HandleLayout, HandleRole, ResizeHandle, HANDLE_COUNT};
pub use resize::{DragSession, ResizeHandleController, ResizeState};
pub use tool::{ActiveTool, Modifiers, PointerInput, Tool, ToolContext, ToolKind, ToolResult};
