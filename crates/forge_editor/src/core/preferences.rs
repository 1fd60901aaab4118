//! Editor preferences and settings.
//!
//! Persistent settings that survive editor restarts, stored as TOML. Every
//! field has a default, so a partial file (or an empty one) loads cleanly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// Undo history settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryPreferences {
    /// Maximum number of retained snapshots
    pub capacity: usize,
    /// Store geometry once in a content-addressed cache instead of per snapshot
    pub dedupe_geometry: bool,
}

impl Default for HistoryPreferences {
    fn default() -> Self {
        Self {
            capacity: 50,
            dedupe_geometry: true,
        }
    }
}

/// Resize handle settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizePreferences {
    /// Drag offsets are rounded to this increment when set
    pub snap_increment: Option<f32>,
    /// A resized extent at or below this is rejected for the frame
    pub min_size: f32,
    /// Smallest absolute scale factor applied to an axis
    pub min_scale_factor: f32,
    /// Pick radius of a handle in world units
    pub handle_radius: f32,
    /// Place the handle ring on the most downward-facing face of a rotated object
    pub adaptive_base: bool,
}

impl Default for ResizePreferences {
    fn default() -> Self {
        Self {
            snap_increment: None,
            min_size: 0.1,
            min_scale_factor: 0.001,
            handle_radius: 0.25,
            adaptive_base: true,
        }
    }
}

/// Face snap and coplanar highlight settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceSnapPreferences {
    /// Minimum normal dot product for a triangle to count as coplanar
    pub parallel_threshold: f32,
    /// Maximum distance from the reference plane for a coplanar triangle
    pub plane_tolerance: f32,
    /// Highlight offset along the face normal
    pub highlight_offset: f32,
    /// Edge length of the ground highlight quad
    pub ground_quad_size: f32,
}

impl Default for FaceSnapPreferences {
    fn default() -> Self {
        Self {
            parallel_threshold: 0.99,
            plane_tolerance: 0.1,
            highlight_offset: 0.05,
            ground_quad_size: 2.0,
        }
    }
}

/// Align handle settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignPreferences {
    /// Distance between the selection bounds and the handles
    pub handle_padding: f32,
    pub handle_radius: f32,
}

impl Default for AlignPreferences {
    fn default() -> Self {
        Self {
            handle_padding: 0.5,
            handle_radius: 0.2,
        }
    }
}

/// Viewport selection settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPreferences {
    /// Box selections narrower or shorter than this (pixels) are ignored
    pub box_select_min_pixels: f32,
}

impl Default for SelectionPreferences {
    fn default() -> Self {
        Self {
            box_select_min_pixels: 5.0,
        }
    }
}

/// Editor preferences and settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPreferences {
    pub history: HistoryPreferences,
    pub resize: ResizePreferences,
    pub face_snap: FaceSnapPreferences,
    pub align: AlignPreferences,
    pub selection: SelectionPreferences,
}

impl EditorPreferences {
    /// Parse preferences from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let prefs: Self = toml::from_str(content)?;
        Ok(prefs.validated())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load preferences from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let prefs = Self::from_toml_str(&content)
            .map_err(|e| EditorError::Preferences(format!("{}: {}", path.display(), e)))?;
        log::info!("Loaded preferences from {:?}", path);
        Ok(prefs)
    }

    /// Load from `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No preferences at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load(path) {
            Ok(prefs) => prefs,
            Err(e) => {
                log::warn!("Failed to load preferences from {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save preferences to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        log::info!("Saved preferences to {:?}", path);
        Ok(())
    }

    /// Get the default preferences path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("forge_editor");
            p.push("preferences.toml");
            p
        })
    }

    /// Clamp out-of-range values back to something usable.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        if self.history.capacity == 0 {
            log::warn!("history.capacity must be at least 1, using 1");
            self.history.capacity = 1;
        }

        let resize = &mut self.resize;
        if let Some(increment) = resize.snap_increment {
            if !(increment > 0.0 && increment.is_finite()) {
                log::warn!("Ignoring resize.snap_increment {}", increment);
                resize.snap_increment = None;
            }
        }
        clamp_non_negative("resize.min_size", &mut resize.min_size, defaults.resize.min_size);
        if !(resize.min_scale_factor > 0.0 && resize.min_scale_factor.is_finite()) {
            log::warn!(
                "resize.min_scale_factor must be positive, using {}",
                defaults.resize.min_scale_factor
            );
            resize.min_scale_factor = defaults.resize.min_scale_factor;
        }
        clamp_non_negative(
            "resize.handle_radius",
            &mut resize.handle_radius,
            defaults.resize.handle_radius,
        );

        let snap = &mut self.face_snap;
        if !(-1.0..=1.0).contains(&snap.parallel_threshold) {
            log::warn!(
                "face_snap.parallel_threshold must be within [-1, 1], using {}",
                defaults.face_snap.parallel_threshold
            );
            snap.parallel_threshold = defaults.face_snap.parallel_threshold;
        }
        clamp_non_negative(
            "face_snap.plane_tolerance",
            &mut snap.plane_tolerance,
            defaults.face_snap.plane_tolerance,
        );
        clamp_non_negative(
            "face_snap.highlight_offset",
            &mut snap.highlight_offset,
            defaults.face_snap.highlight_offset,
        );
        clamp_non_negative(
            "face_snap.ground_quad_size",
            &mut snap.ground_quad_size,
            defaults.face_snap.ground_quad_size,
        );

        clamp_non_negative(
            "align.handle_padding",
            &mut self.align.handle_padding,
            defaults.align.handle_padding,
        );
        clamp_non_negative(
            "align.handle_radius",
            &mut self.align.handle_radius,
            defaults.align.handle_radius,
        );
        clamp_non_negative(
            "selection.box_select_min_pixels",
            &mut self.selection.box_select_min_pixels,
            defaults.selection.box_select_min_pixels,
        );

        self
    }
}

fn clamp_non_negative(name: &str, value: &mut f32, default: f32) {
    if !(*value >= 0.0 && value.is_finite()) {
        log::warn!("{} must be a non-negative number, using {}", name, default);
        *value = default;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let prefs = EditorPreferences::from_toml_str(
            r#"
            [history]
            capacity = 10

            [resize]
            snap_increment = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(prefs.history.capacity, 10);
        assert!(prefs.history.dedupe_geometry);
        assert_eq!(prefs.resize.snap_increment, Some(0.5));
        assert_eq!(prefs.resize.min_size, 0.1);
        assert_eq!(prefs.face_snap, FaceSnapPreferences::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        let prefs = EditorPreferences::from_toml_str("").unwrap();
        assert_eq!(prefs, EditorPreferences::default());
    }

    #[test]
    fn test_validation_clamps() {
        let mut prefs = EditorPreferences::default();
        prefs.history.capacity = 0;
        prefs.resize.min_scale_factor = 0.0;
        prefs.resize.snap_increment = Some(-1.0);
        prefs.face_snap.plane_tolerance = -3.0;

        let prefs = prefs.validated();
        assert_eq!(prefs.history.capacity, 1);
        assert_eq!(prefs.resize.min_scale_factor, 0.001);
        assert_eq!(prefs.resize.snap_increment, None);
        assert_eq!(prefs.face_snap.plane_tolerance, 0.1);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut prefs = EditorPreferences::default();
        prefs.align.handle_padding = 1.25;
        prefs.resize.snap_increment = Some(0.25);

        let text = prefs.to_toml_string().unwrap();
        let parsed = EditorPreferences::from_toml_str(&text).unwrap();
        assert_eq!(parsed, prefs);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(EditorPreferences::from_toml_str("[history\ncapacity = 3").is_err());
    }

    #[test]
    fn test_load_reports_broken_file() {
        let path = std::env::temp_dir().join(format!("forge_prefs_{}.toml", std::process::id()));
        std::fs::write(&path, "[resize\nmin_size = 0.5").unwrap();

        let err = EditorPreferences::load(&path).unwrap_err();
        assert!(matches!(&err, EditorError::Preferences(msg) if msg.contains("forge_prefs_")));
        assert_eq!(EditorPreferences::load_or_default(&path), EditorPreferences::default());

        std::fs::remove_file(&path).unwrap();
    }
}
