//! Error types for the editor

use forge_scene::{ObjectId, SceneError};
use thiserror::Error;

/// Editor errors
///
/// Precondition failures (too few objects, self-snap) surface to the user as
/// notifications; none of them leave a tool half-transitioned.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The operation needs a larger selection
    #[error("Select at least {required} objects (have {found})")]
    NotEnoughObjects { required: usize, found: usize },

    /// Face snap source and target are the same object
    #[error("Cannot snap an object onto itself")]
    SelfSnap,

    /// The ground plane was picked as the face snap source
    #[error("Pick a face on an object as the snap source, not the ground")]
    GroundAsSource,

    /// Nothing under the pointer
    #[error("No face under the pointer")]
    NoFaceHit,

    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// A face normal with zero length
    #[error("Face normal is degenerate")]
    DegenerateNormal,

    /// A resize handle index outside the layout
    #[error("No resize handle {0}")]
    InvalidHandle(usize),

    /// The drag plane could not be reached from the pointer
    #[error("Pointer does not reach the drag plane")]
    DragPlaneMissed,

    #[error("Invalid preferences: {0}")]
    Preferences(String),

    #[error("Invalid session script: {0}")]
    Script(String),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;
