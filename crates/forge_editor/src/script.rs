//! Headless session scripts.
//!
//! A script is a TOML file of `[[step]]` tables replayed against an
//! [`EditorSession`], for reproducing editing sequences without a viewport:
//!
//! ```toml
//! [[step]]
//! action = "add"
//! name = "base"
//! shape = { type = "box", width = 4.0, height = 1.0, depth = 4.0 }
//! position = [0.0, 0.5, 0.0]
//!
//! [[step]]
//! action = "select"
//! names = ["base"]
//!
//! [[step]]
//! action = "resize"
//! handle = 5
//! delta = [2.0, 0.0, 0.0]
//! ```

use std::path::Path;
use std::sync::Arc;

use forge_math::Axis;
use forge_scene::{Geometry, GeometryKind, ObjectId, SceneHost, Transform};
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::EditorSession;
use crate::error::{EditorError, Result};
use crate::tools::AlignMode;

fn one() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// One scripted action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Add {
        name: String,
        shape: GeometryKind,
        #[serde(default)]
        position: [f32; 3],
        /// XYZ Euler angles in degrees
        #[serde(default)]
        rotation_deg: [f32; 3],
        #[serde(default = "one")]
        scale: [f32; 3],
    },
    Select {
        names: Vec<String>,
        /// Toggle each object instead of replacing the selection
        #[serde(default)]
        toggle: bool,
    },
    SelectAll,
    ClearSelection,
    Delete,
    Resize {
        handle: usize,
        delta: [f32; 3],
    },
    Align {
        axis: String,
        mode: String,
    },
    Snap {
        object: String,
        source_normal: [f32; 3],
        source_point: [f32; 3],
        target_point: [f32; 3],
        target_normal: [f32; 3],
    },
    Snapshot,
    Undo,
    Redo,
}

/// Ordered list of steps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

impl SessionScript {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let script = Self::from_toml_str(&content)?;
        log::info!("Loaded {} script steps from {:?}", script.steps.len(), path);
        Ok(script)
    }
}

fn find_object<S: SceneHost>(session: &EditorSession<S>, name: &str) -> Result<ObjectId> {
    session
        .scene()
        .objects()
        .into_iter()
        .find(|o| o.name == name)
        .map(|o| o.id)
        .ok_or_else(|| EditorError::Script(format!("no object named '{}'", name)))
}

/// Run one step. Precondition failures are returned as errors.
pub fn run_step<S: SceneHost>(session: &mut EditorSession<S>, step: &Step) -> Result<()> {
    match step {
        Step::Add {
            name,
            shape,
            position,
            rotation_deg,
            scale,
        } => {
            let [rx, ry, rz] = rotation_deg.map(f32::to_radians);
            let transform = Transform::from_position(Vec3::from_array(*position))
                .with_rotation(Quat::from_euler(EulerRot::XYZ, rx, ry, rz))
                .with_scale(Vec3::from_array(*scale));
            session.add_object(name, Arc::new(Geometry::from_kind(shape)), transform)?;
        }
        Step::Select { names, toggle } => {
            let ids = names
                .iter()
                .map(|n| find_object(session, n))
                .collect::<Result<Vec<_>>>()?;
            if *toggle {
                for id in ids {
                    session.toggle_selection(id);
                }
            } else {
                session.select_objects(ids);
            }
        }
        Step::SelectAll => session.select_all(),
        Step::ClearSelection => session.clear_selection(),
        Step::Delete => {
            session.delete_selected();
        }
        Step::Resize { handle, delta } => {
            session.drag_resize_handle(*handle, Vec3::from_array(*delta))?;
        }
        Step::Align { axis, mode } => {
            let axis: Axis = axis
                .parse()
                .map_err(|e: forge_math::ParseAxisError| EditorError::Script(e.to_string()))?;
            let mode: AlignMode = mode
                .parse()
                .map_err(|e: crate::tools::ParseAlignModeError| EditorError::Script(e.to_string()))?;
            session.align_selection(axis, mode)?;
        }
        Step::Snap {
            object,
            source_normal,
            source_point,
            target_point,
            target_normal,
        } => {
            let id = find_object(session, object)?;
            session.snap_faces(
                id,
                Vec3::from_array(*source_normal),
                Vec3::from_array(*source_point),
                Vec3::from_array(*target_point),
                Vec3::from_array(*target_normal),
            )?;
        }
        Step::Snapshot => session.snapshot(),
        Step::Undo => {
            session.undo();
        }
        Step::Redo => {
            session.redo();
        }
    }
    Ok(())
}

/// Run every step in order, stopping at the first error.
pub fn run_script<S: SceneHost>(session: &mut EditorSession<S>, script: &SessionScript) -> Result<()> {
    for (index, step) in script.steps.iter().enumerate() {
        log::debug!("Step {}: {:?}", index + 1, step);
        run_step(session, step).map_err(|e| {
            EditorError::Script(format!("step {} failed: {}", index + 1, e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
[[step]]
action = "add"
name = "a"
shape = { type = "box", width = 2.0, height = 2.0, depth = 2.0 }
position = [0.0, 1.0, 0.0]

[[step]]
action = "add"
name = "b"
shape = { type = "box", width = 2.0, height = 2.0, depth = 2.0 }
position = [6.0, 3.0, 0.0]

[[step]]
action = "select_all"

[[step]]
action = "align"
axis = "y"
mode = "min"
"#;

    #[test]
    fn test_parse_steps() {
        let script = SessionScript::from_toml_str(SCRIPT).unwrap();
        assert_eq!(script.steps.len(), 4);
        assert!(matches!(&script.steps[0], Step::Add { name, scale, .. } if name == "a" && *scale == [1.0; 3]));
        assert_eq!(script.steps[2], Step::SelectAll);
    }

    #[test]
    fn test_run_aligns_bottoms() {
        let script = SessionScript::from_toml_str(SCRIPT).unwrap();
        let mut session = EditorSession::default();
        run_script(&mut session, &script).unwrap();

        let b = find_object(&session, "b").unwrap();
        let y = session.scene().transform(b).unwrap().position.y;
        assert!((y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_object_fails() {
        let script = SessionScript {
            steps: vec![Step::Select {
                names: vec!["ghost".into()],
                toggle: false,
            }],
        };
        let mut session = EditorSession::default();
        let err = run_script(&mut session, &script).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
