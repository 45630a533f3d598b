//! The per-bone implicit field capability.

use std::fmt::Debug;

use nalgebra::{Point3, Vector3};

use crate::bounds::FieldBounds;

/// Step used by [`central_difference`] when a field has no analytic gradient.
pub const GRADIENT_STEP: f64 = 1e-4;

/// A scalar field attached to a single bone, expressed in bone-local space.
///
/// Implementations are shared between skeletons (`Arc<dyn ImplicitField>`)
/// and evaluated from many threads at once, so they must be immutable.
///
/// Values follow the crate convention: `[0, 1]`, larger inside.
pub trait ImplicitField: Debug + Send + Sync {
    /// Field value at a bone-local point.
    fn value(&self, point: &Point3<f64>) -> f64;

    /// Field gradient at a bone-local point.
    ///
    /// The default uses central differences on [`ImplicitField::value`].
    /// Skeleton normals are taken from the blended field, which is not
    /// differentiable through arbitrary operators, so the polygonizer
    /// differentiates the blend numerically and never calls this. It serves
    /// callers that query a single bone.
    fn gradient(&self, point: &Point3<f64>) -> Vector3<f64> {
        central_difference(|p| self.value(p), point, GRADIENT_STEP)
    }

    /// Bone-local box outside which [`ImplicitField::value`] is exactly zero.
    ///
    /// `None` means the field has unbounded support and must be evaluated
    /// everywhere.
    fn support(&self) -> Option<FieldBounds>;
}

/// Gradient of `f` at `point` by central differences with step `h`.
///
/// # Example
///
/// ```
/// use skin_field::central_difference;
/// use nalgebra::Point3;
///
/// let g = central_difference(|p| p.x * 2.0 + p.z, &Point3::origin(), 1e-3);
/// assert!((g.x - 2.0).abs() < 1e-9);
/// assert!((g.z - 1.0).abs() < 1e-9);
/// ```
pub fn central_difference<F>(f: F, point: &Point3<f64>, h: f64) -> Vector3<f64>
where
    F: Fn(&Point3<f64>) -> f64,
{
    let dx = Vector3::new(h, 0.0, 0.0);
    let dy = Vector3::new(0.0, h, 0.0);
    let dz = Vector3::new(0.0, 0.0, h);
    let inv = 1.0 / (2.0 * h);

    Vector3::new(
        (f(&(point + dx)) - f(&(point - dx))) * inv,
        (f(&(point + dy)) - f(&(point - dy))) * inv,
        (f(&(point + dz)) - f(&(point - dz))) * inv,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Debug)]
    struct Ramp;

    impl ImplicitField for Ramp {
        fn value(&self, point: &Point3<f64>) -> f64 {
            (1.0 - point.coords.norm()).max(0.0)
        }

        fn support(&self) -> Option<FieldBounds> {
            None
        }
    }

    #[test]
    fn default_gradient_points_inward() {
        let g = Ramp.gradient(&Point3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(g.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(g.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn central_difference_of_quadratic() {
        let g = central_difference(|p| p.y * p.y, &Point3::new(0.0, 3.0, 0.0), 1e-3);
        assert_relative_eq!(g.y, 6.0, epsilon = 1e-6);
    }
}
