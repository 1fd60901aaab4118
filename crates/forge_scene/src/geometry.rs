//! Triangle geometry for solids, with the constructor parameters that
//! produced it so it can be rebuilt from a compact description.

use forge_math::Aabb;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// How a geometry was produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryKind {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Cylinder {
        radius: f32,
        height: f32,
        segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Imported or boolean-combined triangles; only the raw arrays describe it
    Mesh,
    /// A kind this build does not recognise
    #[serde(other)]
    Unknown,
}

impl GeometryKind {
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::Box { .. } => "Box",
            GeometryKind::Cylinder { .. } => "Cylinder",
            GeometryKind::Sphere { .. } => "Sphere",
            GeometryKind::Mesh => "Mesh",
            GeometryKind::Unknown => "Unknown",
        }
    }
}

/// Raw triangle data in local (unscaled) space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub positions: Vec<[f32; 3]>,
    /// Triangle list indices; None means `positions` is a plain triangle list
    #[serde(default)]
    pub indices: Option<Vec<u32>>,
    #[serde(default)]
    pub normals: Vec<[f32; 3]>,
    #[serde(default)]
    pub uvs: Vec<[f32; 2]>,
}

impl Geometry {
    /// Edge length of the fallback box.
    pub const DEFAULT_BOX_SIZE: f32 = 1.0;

    pub fn empty() -> Self {
        Self {
            kind: GeometryKind::Mesh,
            positions: Vec::new(),
            indices: None,
            normals: Vec::new(),
            uvs: Vec::new(),
        }
    }

    /// Triangle soup or indexed mesh from an importer or the CSG service.
    pub fn mesh(positions: Vec<[f32; 3]>, indices: Option<Vec<u32>>) -> Self {
        Self {
            kind: GeometryKind::Mesh,
            positions,
            indices,
            normals: Vec::new(),
            uvs: Vec::new(),
        }
    }

    /// Box centered on the origin.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let mut geometry = Self {
            kind: GeometryKind::Box { width, height, depth },
            ..Self::empty()
        };
        let half = Vec3::new(width, height, depth) * 0.5;

        // (normal, u, v) with u x v = normal
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];

        for (normal, u, v) in faces {
            let c = normal * half;
            let u = u * half;
            let v = v * half;
            geometry.push_quad([c - u - v, c + u - v, c + u + v, c - u + v], normal);
        }
        geometry
    }

    /// Y-axis cylinder centered on the origin.
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut geometry = Self {
            kind: GeometryKind::Cylinder { radius, height, segments },
            ..Self::empty()
        };
        let half = height * 0.5;
        let ring = |i: u32| {
            let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
            Vec3::new(theta.cos(), 0.0, -theta.sin())
        };

        for i in 0..segments {
            let (d0, d1) = (ring(i), ring(i + 1));
            let (b0, b1) = (d0 * radius - Vec3::Y * half, d1 * radius - Vec3::Y * half);
            let (t0, t1) = (d0 * radius + Vec3::Y * half, d1 * radius + Vec3::Y * half);

            let base = geometry.positions.len() as u32;
            for (p, n) in [(b0, d0), (b1, d1), (t1, d1), (t0, d0)] {
                geometry.push_vertex(p, n, [0.0, 0.0]);
            }
            geometry.push_indices(&[base, base + 1, base + 2, base, base + 2, base + 3]);

            let top = Vec3::Y * half;
            geometry.push_triangle([top, t0, t1], Vec3::Y);
            geometry.push_triangle([-top, b1, b0], Vec3::NEG_Y);
        }
        geometry
    }

    /// Latitude/longitude sphere centered on the origin.
    pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut geometry = Self {
            kind: GeometryKind::Sphere {
                radius,
                width_segments,
                height_segments,
            },
            ..Self::empty()
        };

        for j in 0..=height_segments {
            let v = j as f32 / height_segments as f32;
            let phi = v * std::f32::consts::PI;
            for i in 0..=width_segments {
                let u = i as f32 / width_segments as f32;
                let theta = u * std::f32::consts::TAU;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), -phi.sin() * theta.sin());
                geometry.push_vertex(n * radius, n, [u, v]);
            }
        }

        let stride = width_segments + 1;
        let mut indices = Vec::new();
        for j in 0..height_segments {
            for i in 0..width_segments {
                let d = j * stride + i;
                let c = j * stride + i + 1;
                let a = (j + 1) * stride + i;
                let b = (j + 1) * stride + i + 1;
                indices.extend_from_slice(&[a, b, c, a, c, d]);
            }
        }
        geometry.push_indices(&indices);
        geometry
    }

    /// Fixed-size box standing in for geometry that could not be recovered.
    pub fn placeholder() -> Self {
        Self::cuboid(Self::DEFAULT_BOX_SIZE, Self::DEFAULT_BOX_SIZE, Self::DEFAULT_BOX_SIZE)
    }

    /// Rebuild from constructor parameters alone.
    ///
    /// Kinds that only raw arrays can describe fall back to the default box.
    pub fn from_kind(kind: &GeometryKind) -> Self {
        match *kind {
            GeometryKind::Box { width, height, depth } => Self::cuboid(width, height, depth),
            GeometryKind::Cylinder { radius, height, segments } => {
                Self::cylinder(radius, height, segments)
            }
            GeometryKind::Sphere {
                radius,
                width_segments,
                height_segments,
            } => Self::uv_sphere(radius, width_segments, height_segments),
            GeometryKind::Mesh | GeometryKind::Unknown => {
                log::warn!("Cannot rebuild {} geometry from parameters, using default box", kind.name());
                Self::placeholder()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Vertices of triangle `index` in local space.
    ///
    /// None when the index data points outside the position array.
    pub fn triangle(&self, index: usize) -> Option<[Vec3; 3]> {
        let corner = |k: usize| -> Option<Vec3> {
            let vertex = match &self.indices {
                Some(indices) => *indices.get(index * 3 + k)? as usize,
                None => index * 3 + k,
            };
            self.positions.get(vertex).map(|p| Vec3::from_array(*p))
        };
        Some([corner(0)?, corner(1)?, corner(2)?])
    }

    pub fn triangles(&self) -> impl Iterator<Item = (usize, [Vec3; 3])> + '_ {
        (0..self.triangle_count()).filter_map(move |i| self.triangle(i).map(|t| (i, t)))
    }

    pub fn local_bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().map(|p| Vec3::from_array(*p)))
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) {
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        self.uvs.push(uv);
    }

    fn push_indices(&mut self, indices: &[u32]) {
        self.indices.get_or_insert_with(Vec::new).extend_from_slice(indices);
    }

    fn push_triangle(&mut self, corners: [Vec3; 3], normal: Vec3) {
        let base = self.positions.len() as u32;
        for p in corners {
            self.push_vertex(p, normal, [0.0, 0.0]);
        }
        self.push_indices(&[base, base + 1, base + 2]);
    }

    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let base = self.positions.len() as u32;
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for (p, uv) in corners.into_iter().zip(uvs) {
            self.push_vertex(p, normal, uv);
        }
        self.push_indices(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_math::triangle_normal;

    #[test]
    fn test_cuboid_faces_point_outward() {
        let geometry = Geometry::cuboid(2.0, 4.0, 6.0);
        assert_eq!(geometry.triangle_count(), 12);

        for (_, [a, b, c]) in geometry.triangles() {
            let n = triangle_normal(a, b, c).unwrap();
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid) > 0.0, "inward face at {centroid:?}");
        }

        let bounds = geometry.local_bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_cylinder_side_faces_point_outward() {
        let geometry = Geometry::cylinder(1.0, 2.0, 8);
        for (_, [a, b, c]) in geometry.triangles() {
            if let Some(n) = triangle_normal(a, b, c) {
                let centroid = (a + b + c) / 3.0;
                assert!(n.dot(centroid) > 0.0);
            }
        }
    }

    #[test]
    fn test_from_kind_round_trips_parameters() {
        let kind = GeometryKind::Sphere {
            radius: 2.0,
            width_segments: 12,
            height_segments: 6,
        };
        let rebuilt = Geometry::from_kind(&kind);
        assert_eq!(rebuilt, Geometry::uv_sphere(2.0, 12, 6));
    }

    #[test]
    fn test_unknown_kind_falls_back_to_box() {
        let rebuilt = Geometry::from_kind(&GeometryKind::Unknown);
        assert_eq!(rebuilt, Geometry::placeholder());
    }

    #[test]
    fn test_unknown_kind_deserializes() {
        let json = r#"{"kind":{"type":"torus_knot"},"positions":[]}"#;
        let geometry: Geometry = serde_json::from_str(json).unwrap();
        assert_eq!(geometry.kind, GeometryKind::Unknown);
    }

    #[test]
    fn test_triangle_with_bad_index_is_none() {
        let geometry = Geometry::mesh(vec![[0.0; 3], [1.0, 0.0, 0.0]], Some(vec![0, 1, 7]));
        assert!(geometry.triangle(0).is_none());
        assert_eq!(geometry.triangles().count(), 0);
    }
}
