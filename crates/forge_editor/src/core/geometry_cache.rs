//! Content-addressed geometry store shared by all history snapshots.
//!
//! Geometry is keyed by a SHA-256 digest of its kind, constructor parameters
//! and raw arrays, so two independently built but identical meshes share one
//! entry.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use forge_scene::Geometry;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest identifying a geometry by content.
pub type GeometryId = String;

/// Compute the content id of a geometry.
pub fn content_id(geometry: &Geometry) -> GeometryId {
    let mut hasher = Sha256::new();

    // Debug output of the kind covers the variant and its parameters
    hasher.update(format!("{:?}", geometry.kind).as_bytes());

    hasher.update(b"positions");
    hasher.update((geometry.positions.len() as u64).to_le_bytes());
    for p in &geometry.positions {
        for c in p {
            hasher.update(c.to_le_bytes());
        }
    }

    match &geometry.indices {
        Some(indices) => {
            hasher.update(b"indices");
            hasher.update((indices.len() as u64).to_le_bytes());
            for i in indices {
                hasher.update(i.to_le_bytes());
            }
        }
        None => hasher.update(b"no-indices"),
    }

    hasher.update(b"normals");
    hasher.update((geometry.normals.len() as u64).to_le_bytes());
    for n in &geometry.normals {
        for c in n {
            hasher.update(c.to_le_bytes());
        }
    }

    hasher.update(b"uvs");
    hasher.update((geometry.uvs.len() as u64).to_le_bytes());
    for uv in &geometry.uvs {
        for c in uv {
            hasher.update(c.to_le_bytes());
        }
    }

    let hash = hasher.finalize();
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Geometry cache keyed by content id.
#[derive(Debug, Default)]
pub struct GeometryCache {
    entries: HashMap<GeometryId, Arc<Geometry>>,
    /// Ids of recently seen allocations, so shared geometry is hashed once
    known: HashMap<usize, (Weak<Geometry>, GeometryId)>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `geometry` if its content is new and return its id.
    pub fn intern(&mut self, geometry: &Arc<Geometry>) -> GeometryId {
        let key = Arc::as_ptr(geometry) as usize;
        if let Some((weak, id)) = self.known.get(&key) {
            if weak.upgrade().map_or(false, |g| Arc::ptr_eq(&g, geometry)) {
                return id.clone();
            }
        }

        let id = content_id(geometry);
        self.entries
            .entry(id.clone())
            .or_insert_with(|| geometry.clone());
        self.known.insert(key, (Arc::downgrade(geometry), id.clone()));
        id
    }

    pub fn get(&self, id: &str) -> Option<Arc<Geometry>> {
        self.entries.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Drop every entry not in `referenced`. Returns the number removed.
    pub fn retain_referenced(&mut self, referenced: &HashSet<&str>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| referenced.contains(id.as_str()));
        self.known
            .retain(|_, (weak, id)| weak.strong_count() > 0 && referenced.contains(id.as_str()));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.known.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_geometry_shares_entry() {
        let mut cache = GeometryCache::new();
        let a = Arc::new(Geometry::cuboid(1.0, 2.0, 3.0));
        let b = Arc::new(Geometry::cuboid(1.0, 2.0, 3.0));

        let id_a = cache.intern(&a);
        let id_b = cache.intern(&b);
        assert_eq!(id_a, id_b);
        assert_eq!(cache.len(), 1);
        assert_eq!(id_a.len(), 64);
    }

    #[test]
    fn test_different_parameters_differ() {
        let a = content_id(&Geometry::cuboid(1.0, 2.0, 3.0));
        let b = content_id(&Geometry::cuboid(1.0, 2.0, 3.5));
        let c = content_id(&Geometry::cylinder(1.0, 2.0, 16));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_retain_referenced() {
        let mut cache = GeometryCache::new();
        let keep = cache.intern(&Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)));
        cache.intern(&Arc::new(Geometry::uv_sphere(1.0, 8, 4)));
        assert_eq!(cache.len(), 2);

        let referenced: HashSet<&str> = [keep.as_str()].into_iter().collect();
        assert_eq!(cache.retain_referenced(&referenced), 1);
        assert!(cache.contains(&keep));
        assert_eq!(cache.len(), 1);
    }
}
