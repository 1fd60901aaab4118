//! Selection management with multi-select support.
//!
//! - Click: replace selection
//! - Ctrl/Cmd+Click: toggle
//! - Drag a rectangle: add everything inside to the selection
//!
//! The first element is the primary object. Tools operate on the whole set.

use forge_scene::{Camera, ObjectId, SceneObject};
use glam::Vec2;

/// Callback invoked with the new selection after every change.
pub type SelectionListener = Box<dyn FnMut(&[ObjectId])>;

/// Screen-space rectangle in pixels, normalized so `min <= max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// True when either side is shorter than `min_pixels`.
    pub fn is_degenerate(&self, min_pixels: f32) -> bool {
        let size = self.size();
        size.x < min_pixels || size.y < min_pixels
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Ordered set of selected objects.
#[derive(Default)]
pub struct SelectionSet {
    /// Currently selected objects, in selection order
    selected: Vec<ObjectId>,
    listeners: Vec<SelectionListener>,
    /// Whether the selection changed since the flag was last taken
    dirty: bool,
}

impl std::fmt::Debug for SelectionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionSet")
            .field("selected", &self.selected)
            .field("listeners", &self.listeners.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The primary (first selected) object.
    pub fn primary(&self) -> Option<ObjectId> {
        self.selected.first().copied()
    }

    pub fn selected(&self) -> &[ObjectId] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.selected.contains(&id)
    }

    /// Check and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Register a listener called with the new ordered selection on change.
    pub fn on_change(&mut self, listener: impl FnMut(&[ObjectId]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replace the selection with a single object, or clear it with `None`.
    pub fn select_single(&mut self, id: Option<ObjectId>) {
        self.replace(id);
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle(&mut self, id: ObjectId) {
        if let Some(index) = self.selected.iter().position(|&s| s == id) {
            self.selected.remove(index);
        } else {
            self.selected.push(id);
        }
        self.changed();
    }

    /// Replace the selection wholesale, dropping duplicates.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        let mut next = Vec::new();
        for id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        if next != self.selected {
            self.selected = next;
            self.changed();
        }
    }

    /// Add every id not already selected, keeping the existing order first.
    pub fn union(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        let before = self.selected.len();
        for id in ids {
            if !self.selected.contains(&id) {
                self.selected.push(id);
            }
        }
        if self.selected.len() != before {
            self.changed();
        }
    }

    /// Drop an object, e.g. after it was deleted from the scene.
    pub fn remove(&mut self, id: ObjectId) {
        let before = self.selected.len();
        self.selected.retain(|&s| s != id);
        if self.selected.len() != before {
            self.changed();
        }
    }

    pub fn clear(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.changed();
        }
    }

    /// Union every object whose projected origin falls inside the rectangle.
    ///
    /// Rectangles with a side under `min_pixels` are stray clicks and leave
    /// the selection untouched. Returns whether the gesture counted as a box.
    pub fn box_select<'a>(
        &mut self,
        objects: impl IntoIterator<Item = &'a SceneObject>,
        camera: &Camera,
        corner_a: Vec2,
        corner_b: Vec2,
        min_pixels: f32,
    ) -> bool {
        let rect = ScreenRect::from_corners(corner_a, corner_b);
        if rect.is_degenerate(min_pixels) {
            log::debug!("Ignoring box select of {:?} pixels", rect.size());
            return false;
        }

        let inside: Vec<ObjectId> = objects
            .into_iter()
            .filter(|object| {
                camera
                    .project_to_screen(object.transform.position)
                    .map_or(false, |p| rect.contains(p))
            })
            .map(|object| object.id)
            .collect();

        log::debug!("Box select found {} objects", inside.len());
        self.union(inside);
        true
    }

    fn changed(&mut self) {
        self.dirty = true;
        for listener in &mut self.listeners {
            listener(&self.selected);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_toggle_recomputes_primary() {
        let mut selection = SelectionSet::new();
        selection.replace([ObjectId(1), ObjectId(2), ObjectId(3)]);
        assert_eq!(selection.primary(), Some(ObjectId(1)));

        selection.toggle(ObjectId(1));
        assert_eq!(selection.primary(), Some(ObjectId(2)));
        assert_eq!(selection.selected(), &[ObjectId(2), ObjectId(3)]);

        selection.toggle(ObjectId(1));
        assert_eq!(selection.selected(), &[ObjectId(2), ObjectId(3), ObjectId(1)]);
    }

    #[test]
    fn test_replace_drops_duplicates() {
        let mut selection = SelectionSet::new();
        selection.replace([ObjectId(4), ObjectId(4), ObjectId(5)]);
        assert_eq!(selection.selected(), &[ObjectId(4), ObjectId(5)]);
    }

    #[test]
    fn test_listeners_see_new_selection() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let mut selection = SelectionSet::new();
        selection.on_change(move |ids| sink.borrow_mut().push(ids.to_vec()));

        selection.select_single(Some(ObjectId(9)));
        selection.union([ObjectId(9), ObjectId(10)]);
        selection.select_single(None);
        // No change, no notification
        selection.clear();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1], vec![ObjectId(9), ObjectId(10)]);
        assert!(seen[2].is_empty());
    }

    #[test]
    fn test_screen_rect_normalizes() {
        let rect = ScreenRect::from_corners(Vec2::new(10.0, 40.0), Vec2::new(2.0, 4.0));
        assert_eq!(rect.min, Vec2::new(2.0, 4.0));
        assert_eq!(rect.size(), Vec2::new(8.0, 36.0));
        assert!(!rect.is_degenerate(5.0));
        assert!(ScreenRect::from_corners(Vec2::ZERO, Vec2::new(2.0, 2.0)).is_degenerate(5.0));
    }
}
