//! Tool trait and the types tools exchange with the session.

use forge_math::Ray;
use forge_scene::{Camera, SceneHost};
use glam::{Vec2, Vec3};

use crate::core::{EditorPreferences, HistoryStore, SelectionSet};
use crate::error::{EditorError, Result};

/// The tools the session can activate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Resize,
    Align,
    FaceSnap,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Resize => "Resize",
            ToolKind::Align => "Align",
            ToolKind::FaceSnap => "Face Snap",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which tool receives pointer input. At most one at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveTool {
    None,
    /// Resize handles follow the selection; this is the resting tool
    #[default]
    Resize,
    Align,
    FaceSnap,
}

impl ActiveTool {
    pub fn kind(&self) -> Option<ToolKind> {
        match self {
            ActiveTool::None => None,
            ActiveTool::Resize => Some(ToolKind::Resize),
            ActiveTool::Align => Some(ToolKind::Align),
            ActiveTool::FaceSnap => Some(ToolKind::FaceSnap),
        }
    }
}

impl From<ToolKind> for ActiveTool {
    fn from(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Resize => ActiveTool::Resize,
            ToolKind::Align => ActiveTool::Align,
            ToolKind::FaceSnap => ActiveTool::FaceSnap,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Cmd on macOS
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl or Cmd held: clicks toggle instead of replacing the selection.
    pub fn toggles_selection(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A pointer event with its pick ray already resolved by the session.
#[derive(Clone, Copy, Debug)]
pub struct PointerInput {
    /// Pixel position in the viewport
    pub screen: Vec2,
    pub ray: Ray,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn new(screen: Vec2, ray: Ray) -> Self {
        Self {
            screen,
            ray,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Result of tool operations.
#[derive(Debug)]
pub enum ToolResult {
    /// The tool did not use the event
    Ignored,
    /// The tool used the event, nothing else to report
    Handled,
    /// A drag moved; `offset` is the world-space drag offset from its start
    DragProgress { offset: Vec3 },
    /// An edit was committed and the tool stays active
    Completed,
    /// An edit was committed and the tool wants to hand control back
    Finished,
    /// The event was refused; the tool state is unchanged
    Rejected(EditorError),
}

impl ToolResult {
    /// Whether the tool took the event.
    pub fn is_consumed(&self) -> bool {
        !matches!(self, ToolResult::Ignored)
    }
}

/// Everything a tool may read or mutate while handling an event.
pub struct ToolContext<'a> {
    pub scene: &'a mut dyn SceneHost,
    pub selection: &'a mut SelectionSet,
    pub history: &'a mut HistoryStore,
    pub camera: &'a Camera,
    pub prefs: &'a EditorPreferences,
}

/// A tool for viewport interaction.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Display name.
    fn name(&self) -> &str {
        self.kind().name()
    }

    /// Called when the tool becomes active. An error refuses activation.
    fn on_activate(&mut self, _ctx: &mut ToolContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called when the tool becomes inactive.
    fn on_deactivate(&mut self, _ctx: &mut ToolContext<'_>) {}

    fn on_pointer_down(&mut self, _input: &PointerInput, _ctx: &mut ToolContext<'_>) -> ToolResult {
        ToolResult::Ignored
    }

    fn on_pointer_move(&mut self, _input: &PointerInput, _ctx: &mut ToolContext<'_>) -> ToolResult {
        ToolResult::Ignored
    }

    fn on_pointer_up(&mut self, _input: &PointerInput, _ctx: &mut ToolContext<'_>) -> ToolResult {
        ToolResult::Ignored
    }

    /// Abort the gesture in progress (Escape).
    fn cancel(&mut self, _ctx: &mut ToolContext<'_>) -> ToolResult {
        ToolResult::Ignored
    }

    /// Refresh derived state (called each frame and after selection changes).
    fn update(&mut self, _ctx: &mut ToolContext<'_>) {}

    /// Forget per-object state after the scene was rebuilt from history.
    fn reset(&mut self) {}
}
