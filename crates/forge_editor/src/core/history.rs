//! Snapshot-based undo/redo history.
//!
//! Every destructive edit is preceded by [`HistoryStore::snapshot`], which
//! serializes the whole scene. Geometry goes through a content-addressed
//! [`GeometryCache`] so snapshots only carry ids for meshes that did not
//! change.
//!
//! The store keeps `cursor` on the snapshot that matches the scene. Undo at
//! the newest snapshot first seals the live scene as a new snapshot when it
//! has diverged, so redo can come back to it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use forge_scene::{Geometry, Material, ObjectId, SceneHost, SceneObject, Transform, UserData};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::geometry_cache::{GeometryCache, GeometryId};
use super::preferences::HistoryPreferences;
use super::selection::SelectionSet;
use crate::error::Result;

/// Where a serialized object's geometry lives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum GeometryRef {
    /// Entry in the history geometry cache
    Cached { id: GeometryId },
    /// Raw arrays carried by the snapshot itself
    Inline { geometry: Geometry },
}

/// One object as stored in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedObject {
    pub id: ObjectId,
    pub name: String,
    pub geometry: GeometryRef,
    pub material: Material,
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    #[serde(default)]
    pub user_data: UserData,
    #[serde(default = "default_true")]
    pub is_solid: bool,
    #[serde(default = "default_true")]
    pub cast_shadow: bool,
    #[serde(default = "default_true")]
    pub receive_shadow: bool,
}

fn default_true() -> bool {
    true
}

impl SerializedObject {
    pub fn from_object(object: &SceneObject, geometry: GeometryRef) -> Self {
        let t = &object.transform;
        Self {
            id: object.id,
            name: object.name.clone(),
            geometry,
            material: object.material.clone(),
            position: t.position.to_array(),
            rotation: t.rotation.to_array(),
            scale: t.scale.to_array(),
            user_data: object.user_data.clone(),
            is_solid: object.is_solid,
            cast_shadow: object.cast_shadow,
            receive_shadow: object.receive_shadow,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: Vec3::from_array(self.position),
            rotation: Quat::from_array(self.rotation).normalize(),
            scale: Vec3::from_array(self.scale),
        }
    }
}

/// Serialized copy of the whole scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub objects: Vec<SerializedObject>,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl HistorySnapshot {
    /// Serialize every object in the scene.
    ///
    /// With a cache, geometry is interned and referenced by id; without one
    /// the raw arrays are copied inline.
    pub fn capture(scene: &dyn SceneHost, mut cache: Option<&mut GeometryCache>) -> Self {
        let objects = scene
            .objects()
            .into_iter()
            .map(|object| {
                let geometry = match cache.as_deref_mut() {
                    Some(cache) => GeometryRef::Cached {
                        id: cache.intern(&object.geometry),
                    },
                    None => GeometryRef::Inline {
                        geometry: (*object.geometry).clone(),
                    },
                };
                SerializedObject::from_object(object, geometry)
            })
            .collect();

        Self {
            objects,
            timestamp: now_millis(),
        }
    }

    /// Whether both snapshots describe the same scene, ignoring timestamps.
    pub fn same_state(&self, other: &HistorySnapshot) -> bool {
        self.objects == other.objects
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn cached_ids(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().filter_map(|o| match &o.geometry {
            GeometryRef::Cached { id } => Some(id.as_str()),
            GeometryRef::Inline { .. } => None,
        })
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Undo/redo history of scene snapshots.
#[derive(Debug)]
pub struct HistoryStore {
    snapshots: Vec<HistorySnapshot>,
    /// Index of the snapshot matching the scene; None while empty
    cursor: Option<usize>,
    capacity: usize,
    dedupe_geometry: bool,
    cache: GeometryCache,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    /// Default maximum history size.
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: None,
            capacity: capacity.max(1),
            dedupe_geometry: true,
            cache: GeometryCache::new(),
        }
    }

    pub fn from_preferences(prefs: &HistoryPreferences) -> Self {
        Self::with_capacity(prefs.capacity).with_dedupe(prefs.dedupe_geometry)
    }

    pub fn with_dedupe(mut self, dedupe_geometry: bool) -> Self {
        self.dedupe_geometry = dedupe_geometry;
        self
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshots(&self) -> &[HistorySnapshot] {
        &self.snapshots
    }

    /// Snapshot at the cursor.
    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.cursor.and_then(|c| self.snapshots.get(c))
    }

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Whether undo may do something.
    ///
    /// At the newest snapshot this also reports true, since an edited scene
    /// is sealed first; undo is a no-op there if nothing changed.
    pub fn can_undo(&self) -> bool {
        match self.cursor {
            Some(c) => c > 0 || (self.is_at_tip() && self.capacity > 1),
            None => false,
        }
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(false, |c| c + 1 < self.snapshots.len())
    }

    /// Drop all snapshots and cached geometry.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
        self.cache.clear();
    }

    /// Record the current scene, discarding any redo branch.
    pub fn snapshot(&mut self, scene: &dyn SceneHost) {
        let snapshot = self.capture(scene);
        self.push(snapshot);
        log::debug!(
            "History snapshot {} of {} ({} cached geometries)",
            self.cursor.map_or(0, |c| c + 1),
            self.snapshots.len(),
            self.cache.len()
        );
    }

    /// Step back one snapshot. Returns whether the scene was restored.
    pub fn undo(&mut self, scene: &mut dyn SceneHost, selection: &mut SelectionSet) -> bool {
        if self.is_at_tip() && self.capacity > 1 {
            self.seal_tip(scene);
        }

        let cursor = match self.cursor {
            Some(c) if c > 0 => c - 1,
            _ => {
                log::debug!("Nothing to undo");
                return false;
            }
        };

        self.cursor = Some(cursor);
        self.restore_index(cursor, scene, selection);
        log::info!("Undo to snapshot {} of {}", cursor + 1, self.snapshots.len());
        true
    }

    /// Step forward one snapshot. Returns whether the scene was restored.
    pub fn redo(&mut self, scene: &mut dyn SceneHost, selection: &mut SelectionSet) -> bool {
        let cursor = match self.cursor {
            Some(c) if c + 1 < self.snapshots.len() => c + 1,
            _ => {
                log::debug!("Nothing to redo");
                return false;
            }
        };

        self.cursor = Some(cursor);
        self.restore_index(cursor, scene, selection);
        log::info!("Redo to snapshot {} of {}", cursor + 1, self.snapshots.len());
        true
    }

    /// Rebuild the scene from `snapshot`.
    ///
    /// Objects keep their ids. Geometry missing from the cache becomes a
    /// placeholder box so the object is never dropped. The selection is
    /// cleared since it referred to the replaced objects.
    pub fn restore(
        &self,
        snapshot: &HistorySnapshot,
        scene: &mut dyn SceneHost,
        selection: &mut SelectionSet,
    ) {
        scene.clear();

        for entry in &snapshot.objects {
            let (geometry, placeholder) = self.resolve_geometry(entry);

            let mut object = SceneObject::new(entry.id, entry.name.clone(), geometry)
                .with_transform(entry.transform())
                .with_material(entry.material.clone());
            if placeholder {
                object.material = Material::placeholder();
            }
            object.user_data = entry.user_data.clone();
            object.is_solid = entry.is_solid;
            object.cast_shadow = entry.cast_shadow;
            object.receive_shadow = entry.receive_shadow;

            if let Err(e) = scene.insert_object(object.clone()) {
                log::warn!("Restoring {}: {}, assigning a new id", entry.id, e);
                object.id = scene.allocate_id();
                if let Err(e) = scene.insert_object(object) {
                    log::error!("Dropping {} from restore: {}", entry.id, e);
                }
            }
        }

        selection.clear();
    }

    fn resolve_geometry(&self, entry: &SerializedObject) -> (Arc<Geometry>, bool) {
        match &entry.geometry {
            GeometryRef::Cached { id } => match self.cache.get(id) {
                Some(geometry) => (geometry, false),
                None => {
                    log::warn!(
                        "Geometry {} for {} missing from history cache, using placeholder",
                        id,
                        entry.id
                    );
                    (Arc::new(Geometry::placeholder()), true)
                }
            },
            GeometryRef::Inline { geometry } if geometry.is_empty() => {
                // Only the constructor parameters survived
                (Arc::new(Geometry::from_kind(&geometry.kind)), false)
            }
            GeometryRef::Inline { geometry } => (Arc::new(geometry.clone()), false),
        }
    }

    fn capture(&mut self, scene: &dyn SceneHost) -> HistorySnapshot {
        let cache = self.dedupe_geometry.then_some(&mut self.cache);
        HistorySnapshot::capture(scene, cache)
    }

    fn push(&mut self, snapshot: HistorySnapshot) {
        let unchanged = self.is_at_tip()
            && self.current().map_or(false, |tip| tip.same_state(&snapshot));
        if unchanged {
            log::debug!("Scene unchanged since last snapshot, not recorded");
            self.prune_cache();
            return;
        }

        if let Some(cursor) = self.cursor {
            self.snapshots.truncate(cursor + 1);
        }
        self.snapshots.push(snapshot);

        if self.snapshots.len() > self.capacity {
            // The list shifted under the cursor, so it stays on the last index
            self.snapshots.remove(0);
        }
        self.cursor = Some(self.snapshots.len() - 1);

        self.prune_cache();
    }

    fn is_at_tip(&self) -> bool {
        self.cursor.map_or(false, |c| c + 1 == self.snapshots.len())
    }

    fn seal_tip(&mut self, scene: &dyn SceneHost) {
        let live = self.capture(scene);
        let changed = self.current().map_or(true, |tip| !tip.same_state(&live));
        if changed {
            log::debug!("Sealing edited scene before undo");
            self.push(live);
        } else {
            self.prune_cache();
        }
    }

    fn restore_index(&self, index: usize, scene: &mut dyn SceneHost, selection: &mut SelectionSet) {
        if let Some(snapshot) = self.snapshots.get(index) {
            self.restore(snapshot, scene, selection);
        }
    }

    fn prune_cache(&mut self) {
        let referenced: HashSet<&str> = self.snapshots.iter().flat_map(|s| s.cached_ids()).collect();
        let removed = self.cache.retain_referenced(&referenced);
        if removed > 0 {
            log::debug!("Pruned {} unreferenced geometries from history cache", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_scene::Scene;

    fn scene_with_box() -> (Scene, ObjectId) {
        let mut scene = Scene::new();
        let id = scene
            .add_object(
                "box",
                Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)),
                Transform::IDENTITY,
            )
            .unwrap();
        (scene, id)
    }

    fn move_to(scene: &mut Scene, id: ObjectId, x: f32) {
        scene.object_mut(id).unwrap().transform.position.x = x;
    }

    fn x_of(scene: &Scene, id: ObjectId) -> f32 {
        scene.object(id).unwrap().transform.position.x
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let (mut scene, _) = scene_with_box();
        let mut selection = SelectionSet::new();
        let mut history = HistoryStore::new();
        assert!(!history.undo(&mut scene, &mut selection));
        assert!(!history.redo(&mut scene, &mut selection));
    }

    #[test]
    fn test_unchanged_scene_is_not_sealed() {
        let (mut scene, _) = scene_with_box();
        let mut selection = SelectionSet::new();
        let mut history = HistoryStore::new();

        history.snapshot(&scene);
        assert!(!history.undo(&mut scene, &mut selection));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_identical_boxes_share_cache_entry() {
        let (mut scene, _) = scene_with_box();
        scene
            .add_object(
                "twin",
                Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)),
                Transform::from_position(Vec3::X * 3.0),
            )
            .unwrap();

        let mut history = HistoryStore::new();
        history.snapshot(&scene);
        history.snapshot(&scene);
        assert_eq!(history.cache_len(), 1);
    }

    #[test]
    fn test_repeated_snapshot_of_unchanged_scene_is_skipped() {
        let (mut scene, id) = scene_with_box();
        let mut history = HistoryStore::new();

        history.snapshot(&scene);
        history.snapshot(&scene);
        assert_eq!(history.len(), 1);

        move_to(&mut scene, id, 2.0);
        history.snapshot(&scene);
        history.snapshot(&scene);
        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), Some(1));
    }

    #[test]
    fn test_inline_mode_skips_cache() {
        let (scene, _) = scene_with_box();
        let mut history = HistoryStore::new().with_dedupe(false);
        history.snapshot(&scene);

        assert_eq!(history.cache_len(), 0);
        assert!(matches!(
            history.current().unwrap().objects[0].geometry,
            GeometryRef::Inline { .. }
        ));
    }

    #[test]
    fn test_restore_keeps_ids_and_clears_selection() {
        let (mut scene, id) = scene_with_box();
        let mut selection = SelectionSet::new();
        let mut history = HistoryStore::new();

        history.snapshot(&scene);
        move_to(&mut scene, id, 4.0);
        selection.select_single(Some(id));

        assert!(history.undo(&mut scene, &mut selection));
        assert_eq!(x_of(&scene, id), 0.0);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_missing_cache_entry_restores_placeholder() {
        let (mut scene, id) = scene_with_box();
        let mut selection = SelectionSet::new();
        let history = HistoryStore::new();

        let mut snapshot = HistorySnapshot::capture(&scene, None);
        snapshot.objects[0].geometry = GeometryRef::Cached {
            id: "does-not-exist".to_string(),
        };

        history.restore(&snapshot, &mut scene, &mut selection);
        let object = scene.object(id).unwrap();
        assert_eq!(object.material, Material::placeholder());
        assert_eq!(*object.geometry, Geometry::placeholder());
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let (mut scene, id) = scene_with_box();
        scene
            .object_mut(id)
            .unwrap()
            .user_data
            .insert("tag".into(), serde_json::json!("hinge"));

        let snapshot = HistorySnapshot::capture(&scene, None);
        let json = snapshot.to_json().unwrap();
        let parsed = HistorySnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_cache_pruned_after_truncation() {
        let (mut scene, id) = scene_with_box();
        let mut selection = SelectionSet::new();
        let mut history = HistoryStore::new();

        history.snapshot(&scene);
        scene.object_mut(id).unwrap().geometry = Arc::new(Geometry::uv_sphere(1.0, 8, 4));
        history.snapshot(&scene);
        assert_eq!(history.cache_len(), 2);

        // Back to the box, then branch: the sphere snapshot is discarded
        assert!(history.undo(&mut scene, &mut selection));
        history.snapshot(&scene);
        assert_eq!(history.cache_len(), 1);
    }
}
