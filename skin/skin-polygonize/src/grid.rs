//! Regular grid of sampled field values.

// Grid sizes are small enough that these casts are exact in practice
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use skin_field::FieldBounds;

/// A 3D grid of field samples.
///
/// Values are stored with x varying fastest, then y, then z, so every
/// z-slab is one contiguous chunk.
#[derive(Debug, Clone)]
pub struct SampleGrid {
    values: Vec<f64>,
    dimensions: (usize, usize, usize),
    origin: Point3<f64>,
    cell_size: f64,
}

impl SampleGrid {
    /// Create a zero-filled grid.
    ///
    /// # Example
    ///
    /// ```
    /// use nalgebra::Point3;
    /// use skin_polygonize::SampleGrid;
    ///
    /// let grid = SampleGrid::new((4, 3, 2), Point3::origin(), 0.5);
    /// assert_eq!(grid.len(), 24);
    /// assert_eq!(grid.cell_count(), 6);
    /// ```
    #[must_use]
    pub fn new(dimensions: (usize, usize, usize), origin: Point3<f64>, cell_size: f64) -> Self {
        let (nx, ny, nz) = dimensions;
        Self {
            values: vec![0.0; nx * ny * nz],
            dimensions,
            origin,
            cell_size,
        }
    }

    /// Grid point counts needed to cover `bounds` plus `padding` cells on
    /// every side.
    ///
    /// Returns `None` if the bounds are not finite or a count does not fit
    /// in `usize`.
    #[must_use]
    pub fn dimensions_for(bounds: &FieldBounds, cell_size: f64, padding: usize) -> Option<(usize, usize, usize)> {
        if !bounds.is_finite() {
            return None;
        }
        let extent = bounds.max - bounds.min;
        let pad = 2.0 * padding as f64 * cell_size;
        let count = |length: f64| {
            let cells = ((length + pad) / cell_size).ceil();
            // `usize::MAX as f64` rounds up to 2^64
            (cells.is_finite() && cells >= 0.0 && cells < usize::MAX as f64)
                .then(|| cells as usize)
                .and_then(|n| n.checked_add(1))
        };
        Some((count(extent.x)?, count(extent.y)?, count(extent.z)?))
    }

    /// Create a grid covering `bounds` plus `padding` cells on every side.
    ///
    /// Returns `None` under the same conditions as
    /// [`dimensions_for`](Self::dimensions_for), or if the point count
    /// overflows.
    #[must_use]
    pub fn from_bounds(bounds: &FieldBounds, cell_size: f64, padding: usize) -> Option<Self> {
        let dimensions @ (nx, ny, nz) = Self::dimensions_for(bounds, cell_size, padding)?;
        nx.checked_mul(ny)?.checked_mul(nz)?;
        let pad = padding as f64 * cell_size;
        let origin = bounds.min - Vector3::repeat(pad);
        Some(Self::new(dimensions, origin, cell_size))
    }

    /// Grid dimensions in points.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize, usize) {
        self.dimensions
    }

    /// Minimum corner.
    #[must_use]
    pub const fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Cell edge length.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of grid points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the grid has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of cells (one fewer than points along each axis).
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        let (nx, ny, nz) = self.dimensions;
        nx.saturating_sub(1) * ny.saturating_sub(1) * nz.saturating_sub(1)
    }

    /// All values, x fastest.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at grid coordinates, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> Option<f64> {
        self.contains(ix, iy, iz).then(|| self.values[self.index(ix, iy, iz)])
    }

    /// World position of a grid point.
    #[must_use]
    pub fn position(&self, ix: usize, iy: usize, iz: usize) -> Point3<f64> {
        Point3::new(
            self.origin.x + ix as f64 * self.cell_size,
            self.origin.y + iy as f64 * self.cell_size,
            self.origin.z + iz as f64 * self.cell_size,
        )
    }

    /// Linear index of grid coordinates.
    #[must_use]
    pub const fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        ix + iy * self.dimensions.0 + iz * self.dimensions.0 * self.dimensions.1
    }

    /// Sample `field` at every grid point, one z-slab per task.
    pub fn fill<F>(&mut self, field: F)
    where
        F: Fn(&Point3<f64>) -> f64 + Sync,
    {
        let (nx, ny, _) = self.dimensions;
        let slab = nx * ny;
        if slab == 0 {
            return;
        }
        let origin = self.origin;
        let cell = self.cell_size;

        self.values
            .par_chunks_mut(slab)
            .enumerate()
            .for_each(|(iz, values)| {
                let z = origin.z + iz as f64 * cell;
                for iy in 0..ny {
                    let y = origin.y + iy as f64 * cell;
                    for ix in 0..nx {
                        let point = Point3::new(origin.x + ix as f64 * cell, y, z);
                        values[ix + iy * nx] = field(&point);
                    }
                }
            });
    }

    fn contains(&self, ix: usize, iy: usize, iz: usize) -> bool {
        ix < self.dimensions.0 && iy < self.dimensions.1 && iz < self.dimensions.2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_bounds_pads_every_side() {
        let bounds = FieldBounds::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let grid = SampleGrid::from_bounds(&bounds, 0.5, 1).unwrap();

        assert_eq!(grid.dimensions(), (7, 5, 5));
        assert_relative_eq!(grid.origin().x, -0.5);
        assert_relative_eq!(grid.position(6, 4, 4).x, 2.5);
        assert_relative_eq!(grid.position(6, 4, 4).y, 1.5);
    }

    #[test]
    fn flat_axis_has_one_point() {
        let bounds = FieldBounds::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 2.0));
        assert_eq!(SampleGrid::dimensions_for(&bounds, 1.0, 0), Some((3, 1, 3)));
    }

    #[test]
    fn unrepresentable_bounds_have_no_dimensions() {
        let open = FieldBounds::new(Point3::origin(), Point3::new(f64::INFINITY, 1.0, 1.0));
        assert_eq!(SampleGrid::dimensions_for(&open, 0.1, 2), None);
        assert!(SampleGrid::from_bounds(&open, 0.1, 2).is_none());

        let huge = FieldBounds::new(Point3::new(-1e300, 0.0, 0.0), Point3::new(1e300, 1.0, 1.0));
        assert_eq!(SampleGrid::dimensions_for(&huge, 0.1, 2), None);

        // Each axis fits, the point count does not
        let wide = FieldBounds::cube(Point3::origin(), 1e8);
        assert!(SampleGrid::dimensions_for(&wide, 1e-3, 0).is_some());
        assert!(SampleGrid::from_bounds(&wide, 1e-3, 0).is_none());
    }

    #[test]
    fn fill_matches_positions() {
        let mut grid = SampleGrid::new((3, 4, 5), Point3::new(1.0, 2.0, 3.0), 0.25);
        grid.fill(|p| p.x + 10.0 * p.y + 100.0 * p.z);

        for iz in 0..5 {
            for iy in 0..4 {
                for ix in 0..3 {
                    let p = grid.position(ix, iy, iz);
                    let expected = p.x + 10.0 * p.y + 100.0 * p.z;
                    assert_relative_eq!(grid.get(ix, iy, iz).unwrap(), expected, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn out_of_range_is_none() {
        let grid = SampleGrid::new((2, 2, 2), Point3::origin(), 1.0);
        assert!(grid.get(2, 0, 0).is_none());
        assert_eq!(grid.get(1, 1, 1), Some(0.0));
    }

    #[test]
    fn empty_grid() {
        let mut grid = SampleGrid::new((0, 3, 3), Point3::origin(), 1.0);
        grid.fill(|_| 1.0);
        assert!(grid.is_empty());
        assert_eq!(grid.cell_count(), 0);
    }
}
