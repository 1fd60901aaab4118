//! Core editor state: selection, history, preferences and the session.

pub mod geometry_cache;
pub mod history;
pub mod notifications;
pub mod preferences;
pub mod selection;
pub mod session;

pub use geometry_cache::{content_id, GeometryCache, GeometryId};
pub use history::{GeometryRef, HistorySnapshot, HistoryStore, SerializedObject};
pub use notifications::{Notice, NoticeLevel, Notifications};
pub use preferences::{
    AlignPreferences, EditorPreferences, FaceSnapPreferences, HistoryPreferences,
    ResizePreferences, SelectionPreferences,
};
pub use selection::{ScreenRect, SelectionListener, SelectionSet};
pub use session::EditorSession;
