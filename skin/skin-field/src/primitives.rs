//! Built-in bone field primitives.
//!
//! Both primitives use the Wyvill falloff on a distance to a skeletal
//! element (a point or a segment), which gives values in `[0, 1]` with
//! compact support and a smooth (C2) transition to zero.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounds::FieldBounds;
use crate::error::{FieldResult, require_positive};
use crate::field::ImplicitField;

/// Wyvill compact-support falloff `(1 - t^2)^3` for `t = distance / radius`.
///
/// Returns `1.0` at distance zero and `0.0` at or beyond `radius`.
///
/// # Example
///
/// ```
/// use skin_field::wyvill_falloff;
///
/// assert_eq!(wyvill_falloff(0.0, 2.0), 1.0);
/// assert_eq!(wyvill_falloff(2.0, 2.0), 0.0);
/// assert!(wyvill_falloff(1.0, 2.0) > 0.0);
/// ```
#[inline]
#[must_use]
pub fn wyvill_falloff(distance: f64, radius: f64) -> f64 {
    if distance >= radius {
        return 0.0;
    }
    let t = distance / radius;
    let s = 1.0 - t * t;
    s * s * s
}

/// Gradient of the Wyvill falloff with respect to the query point, given the
/// offset from the closest skeletal point.
fn wyvill_gradient(offset: &Vector3<f64>, radius: f64) -> Vector3<f64> {
    let distance = offset.norm();
    if distance >= radius || distance == 0.0 {
        return Vector3::zeros();
    }
    let t = distance / radius;
    let s = 1.0 - t * t;
    // d/dd (1 - d^2/r^2)^3 = -6 d / r^2 (1 - d^2/r^2)^2
    let slope = -6.0 * distance / (radius * radius) * s * s;
    offset * (slope / distance)
}

/// A point bone: falloff around the bone origin.
///
/// # Example
///
/// ```
/// use skin_field::{ImplicitField, SphereField};
/// use nalgebra::Point3;
///
/// let joint = SphereField::new(1.0).unwrap();
/// assert_eq!(joint.value(&Point3::origin()), 1.0);
/// assert_eq!(joint.value(&Point3::new(1.5, 0.0, 0.0)), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SphereField {
    radius: f64,
}

impl SphereField {
    /// Create a sphere field with the given support radius.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FieldError::InvalidParameter`] if `radius` is not
    /// positive and finite.
    pub fn new(radius: f64) -> FieldResult<Self> {
        Ok(Self {
            radius: require_positive("radius", radius)?,
        })
    }

    /// Support radius.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }
}

impl ImplicitField for SphereField {
    fn value(&self, point: &Point3<f64>) -> f64 {
        wyvill_falloff(point.coords.norm(), self.radius)
    }

    fn gradient(&self, point: &Point3<f64>) -> Vector3<f64> {
        wyvill_gradient(&point.coords, self.radius)
    }

    fn support(&self) -> Option<FieldBounds> {
        Some(FieldBounds::cube(Point3::origin(), self.radius))
    }
}

/// A segment bone running from the bone origin along local +Y.
///
/// This is the usual shape for limbs: a capsule of influence around the
/// bone segment `[0, length]` on the Y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CapsuleField {
    length: f64,
    radius: f64,
}

impl CapsuleField {
    /// Create a capsule field for a bone of `length` with support `radius`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FieldError::InvalidParameter`] if either value is not
    /// positive and finite.
    pub fn new(length: f64, radius: f64) -> FieldResult<Self> {
        Ok(Self {
            length: require_positive("length", length)?,
            radius: require_positive("radius", radius)?,
        })
    }

    /// Bone length along local +Y.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Support radius around the segment.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Offset from the closest point on the bone segment to `point`.
    fn offset(&self, point: &Point3<f64>) -> Vector3<f64> {
        let y = point.y.clamp(0.0, self.length);
        Vector3::new(point.x, point.y - y, point.z)
    }
}

impl ImplicitField for CapsuleField {
    fn value(&self, point: &Point3<f64>) -> f64 {
        wyvill_falloff(self.offset(point).norm(), self.radius)
    }

    fn gradient(&self, point: &Point3<f64>) -> Vector3<f64> {
        wyvill_gradient(&self.offset(point), self.radius)
    }

    fn support(&self) -> Option<FieldBounds> {
        Some(FieldBounds::new(
            Point3::new(-self.radius, -self.radius, -self.radius),
            Point3::new(self.radius, self.length + self.radius, self.radius),
        ))
    }
}
