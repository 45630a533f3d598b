//! Support boxes for implicit fields.

use nalgebra::{Isometry3, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned box outside which a field evaluates to zero.
///
/// Boxes are closed: points on the faces are contained.
///
/// # Example
///
/// ```
/// use skin_field::FieldBounds;
/// use nalgebra::Point3;
///
/// let bounds = FieldBounds::new(Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 3.0, 1.0));
/// assert!(bounds.contains(&Point3::new(0.0, 1.5, 0.0)));
/// assert!(!bounds.contains(&Point3::new(0.0, 4.0, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldBounds {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl FieldBounds {
    /// Create a box from two corners, sorting each axis.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Create a cube of half-width `half_extent` centered at `center`.
    #[must_use]
    pub fn cube(center: Point3<f64>, half_extent: f64) -> Self {
        Self {
            min: Point3::new(
                center.x - half_extent,
                center.y - half_extent,
                center.z - half_extent,
            ),
            max: Point3::new(
                center.x + half_extent,
                center.y + half_extent,
                center.z + half_extent,
            ),
        }
    }

    /// Check whether a point lies inside the box (inclusive).
    #[inline]
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Whether every coordinate of both corners is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.coords.iter().chain(self.max.coords.iter()).all(|c| c.is_finite())
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Grow the box by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point3::new(self.min.x - margin, self.min.y - margin, self.min.z - margin),
            max: Point3::new(self.max.x + margin, self.max.y + margin, self.max.z + margin),
        }
    }

    /// The eight corners of the box.
    #[must_use]
    pub fn corners(&self) -> [Point3<f64>; 8] {
        [
            Point3::new(self.min.x, self.min.y, self.min.z),
            Point3::new(self.max.x, self.min.y, self.min.z),
            Point3::new(self.min.x, self.max.y, self.min.z),
            Point3::new(self.max.x, self.max.y, self.min.z),
            Point3::new(self.min.x, self.min.y, self.max.z),
            Point3::new(self.max.x, self.min.y, self.max.z),
            Point3::new(self.min.x, self.max.y, self.max.z),
            Point3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Axis-aligned box enclosing this box after a rigid transform.
    ///
    /// Used to move a bone's local support box into world space. A box that
    /// is not finite maps to the box covering all of space.
    #[must_use]
    pub fn transformed(&self, transform: &Isometry3<f64>) -> Self {
        if !self.is_finite() {
            return Self {
                min: Point3::from(Vector3::repeat(f64::NEG_INFINITY)),
                max: Point3::from(Vector3::repeat(f64::INFINITY)),
            };
        }
        let corners = self.corners();
        let first = transform * corners[0];
        let mut result = Self {
            min: first,
            max: first,
        };
        for corner in &corners[1..] {
            let p = transform * corner;
            result.min = Point3::new(result.min.x.min(p.x), result.min.y.min(p.y), result.min.z.min(p.z));
            result.max = Point3::new(result.max.x.max(p.x), result.max.y.max(p.y), result.max.z.max(p.z));
        }
        result
    }
}
