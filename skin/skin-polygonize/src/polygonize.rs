//! Skeleton to mesh.

use rayon::prelude::*;
use skin_skeleton::Skeleton;
use tracing::debug;

use crate::error::{PolygonizeError, PolygonizeResult};
use crate::grid::SampleGrid;
use crate::marching_cubes::marching_cubes;
use crate::mesh::MeshGeometry;
use crate::params::PolygonizeParams;
use crate::plan::FieldPlan;

/// Polygonize a skeleton's blended field.
///
/// A missing skeleton yields empty geometry. Otherwise the skeleton's current
/// pose snapshot is resolved into a [`FieldPlan`] and handed to
/// [`polygonize_plan`].
///
/// The result depends only on the skeleton and `params`: the same inputs give
/// identical geometry, whatever the thread count.
///
/// # Errors
///
/// See [`polygonize_plan`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use skin_field::SphereField;
/// use skin_skeleton::{Bone, BoneId, Skeleton};
/// use skin_polygonize::{PolygonizeParams, polygonize};
///
/// let params = PolygonizeParams::preview();
/// assert!(polygonize(None, &params).unwrap().is_empty());
///
/// let field = Arc::new(SphereField::new(2.0).unwrap());
/// let skeleton = Skeleton::single(Arc::new(Bone::new(BoneId::new(0), field)));
/// let mesh = polygonize(Some(&skeleton), &params).unwrap();
/// assert!(mesh.triangle_count() > 0);
/// assert!(mesh.has_normals());
/// ```
pub fn polygonize(skeleton: Option<&Skeleton>, params: &PolygonizeParams) -> PolygonizeResult<MeshGeometry> {
    let Some(skeleton) = skeleton else {
        debug!("No skeleton, producing empty geometry");
        return Ok(MeshGeometry::new());
    };

    let plan = FieldPlan::new(skeleton, &params.blend);
    polygonize_plan(&plan, params)
}

/// Polygonize an already resolved field.
///
/// Samples the field on a grid covering `params.bounds` (or the plan's
/// support when unset) plus padding, extracts the iso surface with
/// [`marching_cubes`] and, if enabled, evaluates per-vertex normals from the
/// field gradient.
///
/// # Errors
///
/// - Any [`PolygonizeParams::validate`] error
/// - [`PolygonizeError::UnboundedField`] if no bounds are set and some bone
///   has unbounded support
/// - [`PolygonizeError::InvalidBounds`] if the plan's support box is not
///   finite
/// - [`PolygonizeError::GridTooLarge`] if the grid exceeds `params.max_cells`
///   or cannot be represented
pub fn polygonize_plan(plan: &FieldPlan, params: &PolygonizeParams) -> PolygonizeResult<MeshGeometry> {
    params.validate()?;

    let bounds = params
        .bounds
        .or_else(|| plan.bounds())
        .ok_or(PolygonizeError::UnboundedField)?;

    if !bounds.is_finite() {
        return Err(PolygonizeError::InvalidBounds(bounds));
    }

    let too_large = |cells| PolygonizeError::GridTooLarge {
        cells,
        max: params.max_cells,
    };
    let dimensions = SampleGrid::dimensions_for(&bounds, params.cell_size, params.padding)
        .ok_or_else(|| too_large(usize::MAX))?;
    let cells = budgeted_cells(dimensions).unwrap_or(usize::MAX);
    if cells > params.max_cells {
        return Err(too_large(cells));
    }

    let mut grid = SampleGrid::from_bounds(&bounds, params.cell_size, params.padding)
        .ok_or_else(|| too_large(usize::MAX))?;
    grid.fill(|p| plan.value(p));

    let mut mesh = marching_cubes(&grid, params.iso_value);

    if params.compute_normals {
        mesh.normals = mesh
            .positions
            .par_iter()
            .map(|p| plan.normal(p, params.normal_epsilon))
            .collect();
    }

    let (nx, ny, nz) = dimensions;
    debug!(
        bones = plan.bone_count(),
        nx,
        ny,
        nz,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "Polygonized skeleton field"
    );

    Ok(mesh)
}

/// Cells counted against `max_cells`. An axis with a single point still
/// counts as one layer.
fn budgeted_cells((nx, ny, nz): (usize, usize, usize)) -> Option<usize> {
    let layers = |n: usize| n.saturating_sub(1).max(1);
    layers(nx).checked_mul(layers(ny))?.checked_mul(layers(nz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Point3};
    use skin_field::{BlendOperator, CapsuleField, FieldBounds, ImplicitField, SphereField};
    use skin_skeleton::{Bone, BoneId};

    use crate::params::BlendParams;

    /// Radius at which the Wyvill falloff equals 0.5, relative to the bone
    /// radius.
    fn iso_radius(radius: f64) -> f64 {
        radius * (1.0 - 0.5_f64.cbrt()).sqrt()
    }

    fn sphere(radius: f64) -> Skeleton {
        let field = Arc::new(SphereField::new(radius).unwrap());
        Skeleton::single(Arc::new(Bone::new(BoneId::new(0), field)))
    }

    /// Constant field with no support box.
    #[derive(Debug)]
    struct Fog;

    impl ImplicitField for Fog {
        fn value(&self, _point: &Point3<f64>) -> f64 {
            0.25
        }

        fn support(&self) -> Option<FieldBounds> {
            None
        }
    }

    /// Field whose support box is open along +x.
    #[derive(Debug)]
    struct Beam;

    impl ImplicitField for Beam {
        fn value(&self, point: &Point3<f64>) -> f64 {
            if point.y.abs() < 1.0 && point.z.abs() < 1.0 { 1.0 } else { 0.0 }
        }

        fn support(&self) -> Option<FieldBounds> {
            Some(FieldBounds::new(
                Point3::new(0.0, -1.0, -1.0),
                Point3::new(f64::INFINITY, 1.0, 1.0),
            ))
        }
    }

    fn capsule_chain() -> Skeleton {
        let field = Arc::new(CapsuleField::new(1.0, 0.5).unwrap());
        let bones = (0..3u32)
            .map(|i| {
                let transform = Isometry3::translation(0.0, f64::from(i) * 0.8, 0.0);
                Arc::new(Bone::new(BoneId::new(u64::from(i)), field.clone()).with_transform(transform))
            })
            .collect();
        Skeleton::new(bones, vec![None, Some(0), Some(1)]).unwrap()
    }

    #[test]
    fn missing_skeleton_is_empty_geometry() {
        let mesh = polygonize(None, &PolygonizeParams::default()).unwrap();
        assert_eq!(mesh, MeshGeometry::new());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn sphere_surface_sits_at_iso_radius() {
        let skeleton = sphere(2.0);
        let params = PolygonizeParams::default().with_cell_size(0.1);
        let mesh = polygonize(Some(&skeleton), &params).unwrap();

        let r = iso_radius(2.0);
        for p in &mesh.positions {
            assert_relative_eq!(p.coords.norm(), r, epsilon = 0.02);
        }

        let volume = 4.0 / 3.0 * std::f64::consts::PI * r.powi(3);
        assert_relative_eq!(mesh.signed_volume(), volume, max_relative = 0.1);
    }

    #[test]
    fn normals_point_outward() {
        let skeleton = sphere(1.5);
        let mesh = polygonize(Some(&skeleton), &PolygonizeParams::default()).unwrap();

        assert!(mesh.has_normals());
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-6);
            assert!(n.dot(&p.coords.normalize()) > 0.95);
        }
    }

    #[test]
    fn normals_can_be_skipped() {
        let skeleton = sphere(1.0);
        let params = PolygonizeParams::default().with_normals(false);
        let mesh = polygonize(Some(&skeleton), &params).unwrap();

        assert!(!mesh.is_empty());
        assert!(mesh.normals.is_empty());
    }

    #[test]
    fn output_is_deterministic() {
        let skeleton = capsule_chain();
        let params = PolygonizeParams::default()
            .with_blend(BlendParams::uniform(BlendOperator::Sum));

        let first = polygonize(Some(&skeleton), &params).unwrap();
        let second = polygonize(Some(&skeleton), &params).unwrap();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn output_does_not_depend_on_thread_count() {
        let skeleton = capsule_chain();
        let params = PolygonizeParams::default();

        let run = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| polygonize(Some(&skeleton), &params).unwrap())
        };

        let single = run(1);
        assert!(!single.is_empty());
        assert_eq!(single, run(4));
        assert_eq!(single, run(8));
    }

    #[test]
    fn pose_refresh_moves_the_surface() {
        let skeleton = sphere(1.0);
        skeleton.set_bone_transform(0, Isometry3::translation(3.0, 0.0, 0.0));

        let mesh = polygonize(Some(&skeleton), &PolygonizeParams::default()).unwrap();
        let centroid = mesh.centroid().unwrap();

        assert_relative_eq!(centroid.x, 3.0, epsilon = 0.05);
        assert_relative_eq!(centroid.y, 0.0, epsilon = 0.05);
    }

    #[test]
    fn unbounded_field_needs_bounds() {
        let skeleton = Skeleton::single(Arc::new(Bone::new(BoneId::new(0), Arc::new(Fog))));
        let params = PolygonizeParams::default();

        assert_eq!(
            polygonize(Some(&skeleton), &params).unwrap_err(),
            PolygonizeError::UnboundedField
        );

        // Below iso everywhere: no surface, but no error
        let params = params.with_bounds(FieldBounds::cube(Point3::origin(), 1.0));
        assert!(polygonize(Some(&skeleton), &params).unwrap().is_empty());
    }

    #[test]
    fn grid_limit_is_enforced() {
        let skeleton = sphere(1.0);
        let params = PolygonizeParams::default().with_max_cells(100);

        let err = polygonize(Some(&skeleton), &params).unwrap_err();
        assert!(matches!(err, PolygonizeError::GridTooLarge { max: 100, .. }));
    }

    #[test]
    fn flat_grid_counts_against_limit() {
        let skeleton = sphere(1.0);
        let bounds = FieldBounds::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2000.0, 0.0, 2000.0));
        let params = PolygonizeParams::default()
            .with_cell_size(1.0)
            .with_padding(0)
            .with_max_cells(1000)
            .with_bounds(bounds);

        let err = polygonize(Some(&skeleton), &params).unwrap_err();
        assert_eq!(
            err,
            PolygonizeError::GridTooLarge {
                cells: 2000 * 2000,
                max: 1000,
            }
        );
    }

    #[test]
    fn open_sampling_bounds_are_rejected() {
        let skeleton = sphere(1.0);
        let open = FieldBounds::new(Point3::origin(), Point3::new(f64::INFINITY, 1.0, 1.0));
        let params = PolygonizeParams::default().with_bounds(open);

        assert_eq!(
            polygonize(Some(&skeleton), &params).unwrap_err(),
            PolygonizeError::InvalidBounds(open)
        );
    }

    #[test]
    fn open_support_box_is_rejected() {
        let bone = Bone::new(BoneId::new(0), Arc::new(Beam))
            .with_transform(Isometry3::translation(0.0, 1.0, 0.0));
        let skeleton = Skeleton::single(Arc::new(bone));

        let err = polygonize(Some(&skeleton), &PolygonizeParams::default()).unwrap_err();
        assert!(matches!(err, PolygonizeError::InvalidBounds(_)));

        // Explicit bounds take over
        let params = PolygonizeParams::default().with_bounds(FieldBounds::cube(Point3::origin(), 3.0));
        assert!(!polygonize(Some(&skeleton), &params).unwrap().is_empty());
    }

    #[test]
    fn oversized_grid_is_an_error() {
        let skeleton = sphere(1.0);
        let params = PolygonizeParams::default()
            .with_cell_size(1e-12)
            .with_max_cells(usize::MAX)
            .with_bounds(FieldBounds::cube(Point3::origin(), 1e12));

        let err = polygonize(Some(&skeleton), &params).unwrap_err();
        assert!(matches!(err, PolygonizeError::GridTooLarge { cells: usize::MAX, .. }));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let skeleton = sphere(1.0);
        let params = PolygonizeParams::default().with_cell_size(-1.0);

        assert_eq!(
            polygonize(Some(&skeleton), &params).unwrap_err(),
            PolygonizeError::InvalidCellSize(-1.0)
        );
    }
}
