//! Error types for scene hosts

use thiserror::Error;

use crate::object::ObjectId;

/// Scene host errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// No object with this id is in the scene
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// An object with this id is already in the scene
    #[error("Duplicate object id: {0}")]
    DuplicateId(ObjectId),
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
