//! Polygonizer output.

// Vertex counts fit in f64 mantissas
#![allow(clippy::cast_precision_loss)]

use nalgebra::{Point3, Vector3};
use skin_field::FieldBounds;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Triangle mesh extracted from a field.
///
/// Triangles use counter-clockwise winding seen from outside, so the
/// right-hand face normal points out of the surface. `normals` is either
/// empty or holds one unit normal per position.
///
/// Geometry is a plain value: every polygonization produces a new one.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshGeometry {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Per-vertex outward normals, or empty.
    pub normals: Vec<Vector3<f64>>,
    /// Triangles as indices into `positions`.
    pub triangles: Vec<[u32; 3]>,
}

impl MeshGeometry {
    /// Empty geometry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Whether there are no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Whether per-vertex normals are present.
    #[must_use]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Box around all positions, or `None` when there are none.
    #[must_use]
    pub fn bounds(&self) -> Option<FieldBounds> {
        let (first, rest) = self.positions.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for p in rest {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some(FieldBounds { min, max })
    }

    /// Corner positions of a triangle.
    #[must_use]
    pub fn triangle_positions(&self, triangle: usize) -> Option<[Point3<f64>; 3]> {
        let [a, b, c] = *self.triangles.get(triangle)?;
        Some([
            *self.positions.get(a as usize)?,
            *self.positions.get(b as usize)?,
            *self.positions.get(c as usize)?,
        ])
    }

    /// Signed enclosed volume.
    ///
    /// Positive for a closed surface with outward winding.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        (0..self.triangles.len())
            .filter_map(|t| self.triangle_positions(t))
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)) / 6.0)
            .sum()
    }

    /// Centroid of the vertex positions, or `None` when there are none.
    #[must_use]
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.positions.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.positions.iter().map(|p| p.coords).sum();
        Some(Point3::from(sum / self.positions.len() as f64))
    }
}

impl std::fmt::Display for MeshGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MeshGeometry: {} vertices, {} triangles",
            self.vertex_count(),
            self.triangle_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit tetrahedron with outward winding.
    fn tetrahedron() -> MeshGeometry {
        MeshGeometry {
            positions: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            normals: Vec::new(),
            triangles: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        }
    }

    #[test]
    fn empty_geometry() {
        let mesh = MeshGeometry::new();
        assert!(mesh.is_empty());
        assert!(mesh.bounds().is_none());
        assert!(mesh.centroid().is_none());
        assert_relative_eq!(mesh.signed_volume(), 0.0);
    }

    #[test]
    fn counts_and_bounds() {
        let mesh = tetrahedron();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 4);
        assert!(!mesh.has_normals());

        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Point3::origin());
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
        assert!(mesh.triangle_positions(4).is_none());
    }

    #[test]
    fn volume_sign_follows_winding() {
        let mut mesh = tetrahedron();
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-12);

        for t in &mut mesh.triangles {
            t.swap(1, 2);
        }
        assert_relative_eq!(mesh.signed_volume(), -1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn display() {
        assert_eq!(tetrahedron().to_string(), "MeshGeometry: 4 vertices, 4 triangles");
    }
}
