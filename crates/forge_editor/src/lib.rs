//! # forge_editor - Direct manipulation for the Forge solid modeler
//!
//! The editor session owns everything a pointer gesture can touch apart from
//! the scene itself:
//!
//! - [`SelectionSet`]: ordered selection, first element is the primary
//! - [`HistoryStore`]: snapshot undo/redo with content-addressed geometry
//! - [`ResizeHandleController`]: nine-handle resize with anchoring and mirroring
//! - [`FaceSnapController`]: two-click face-to-face mating
//! - [`AlignController`]: min/center/max alignment across a selection
//!
//! ## Architecture
//!
//! ```text
//! host input ──► EditorSession ──► ActiveTool ──► Tool::on_pointer_*
//!                     │                               │
//!                     │           ToolContext { scene, selection, history, .. }
//!                     ▼                               ▼
//!               Notifications                  SceneHost transforms
//! ```
//!
//! Only one tool is active at a time; activation goes through
//! [`EditorSession::set_active_tool`], which deactivates the previous tool
//! first.

pub mod core;
pub mod error;
pub mod script;
pub mod tools;

pub use crate::core::{
    EditorPreferences, EditorSession, HistorySnapshot, HistoryStore, NoticeLevel,
    Notifications, SelectionSet,
};
pub use error::{EditorError, Result};
pub use script::{run_script, SessionScript, Step};
pub use tools::{
    ActiveTool, AlignController, AlignMode, FaceSnapController, Modifiers, PointerInput,
    ResizeHandleController, Tool, ToolContext, ToolKind, ToolResult,
};

pub mod prelude {
    pub use crate::core::{EditorPreferences, EditorSession, HistoryStore, SelectionSet};
    pub use crate::error::{EditorError, Result};
    pub use crate::tools::{ActiveTool, AlignMode, Modifiers, ToolKind, ToolResult};
    pub use forge_math::{Axis, Vec2, Vec3};
    pub use forge_scene::prelude::*;
}
