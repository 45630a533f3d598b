//! Marching cubes over a [`SampleGrid`].

// Vertex indices fit in u32 for any grid under the cell limit
#![allow(clippy::cast_possible_truncation)]

use hashbrown::HashMap;
use nalgebra::Point3;
use rayon::prelude::*;

use crate::grid::SampleGrid;
use crate::mesh::MeshGeometry;
use crate::tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};

/// Vertices and triangles of one z-slab, indexed locally.
#[derive(Debug, Default)]
struct Slab {
    /// Edge key and position, in first-use order.
    vertices: Vec<(usize, Point3<f64>)>,
    triangles: Vec<[u32; 3]>,
}

/// Extract the surface `value == iso` from a sampled grid.
///
/// Points with `value > iso` are inside. Vertices are shared between
/// neighbouring cells, triangles wind counter-clockwise seen from outside,
/// and normals are left empty.
///
/// Cells are processed one z-slab per task; slabs are merged in z order, so
/// the output is identical for every thread count.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use skin_polygonize::{SampleGrid, marching_cubes};
///
/// let mut grid = SampleGrid::new((5, 5, 5), Point3::new(-1.0, -1.0, -1.0), 0.5);
/// grid.fill(|p| 1.0 - p.coords.norm());
/// let mesh = marching_cubes(&grid, 0.5);
///
/// assert!(!mesh.is_empty());
/// assert!(mesh.signed_volume() > 0.0);
/// ```
#[must_use]
pub fn marching_cubes(grid: &SampleGrid, iso: f64) -> MeshGeometry {
    let (nx, ny, nz) = grid.dimensions();
    if nx < 2 || ny < 2 || nz < 2 {
        return MeshGeometry::new();
    }

    let slabs: Vec<Slab> = (0..nz - 1)
        .into_par_iter()
        .map(|iz| {
            let mut slab = Slab::default();
            let mut local: HashMap<usize, u32> = HashMap::new();
            for iy in 0..ny - 1 {
                for ix in 0..nx - 1 {
                    process_cell(grid, iso, (ix, iy, iz), &mut slab, &mut local);
                }
            }
            slab
        })
        .collect();

    merge_slabs(slabs)
}

/// Join slabs in order, sharing vertices that lie on slab boundaries.
fn merge_slabs(slabs: Vec<Slab>) -> MeshGeometry {
    let total_vertices: usize = slabs.iter().map(|s| s.vertices.len()).sum();
    let total_triangles: usize = slabs.iter().map(|s| s.triangles.len()).sum();

    let mut mesh = MeshGeometry {
        positions: Vec::with_capacity(total_vertices),
        normals: Vec::new(),
        triangles: Vec::with_capacity(total_triangles),
    };
    let mut global: HashMap<usize, u32> = HashMap::with_capacity(total_vertices);

    for slab in slabs {
        let remap: Vec<u32> = slab
            .vertices
            .iter()
            .map(|&(key, position)| {
                *global.entry(key).or_insert_with(|| {
                    mesh.positions.push(position);
                    (mesh.positions.len() - 1) as u32
                })
            })
            .collect();

        mesh.triangles.extend(
            slab.triangles
                .iter()
                .map(|t| [remap[t[0] as usize], remap[t[1] as usize], remap[t[2] as usize]]),
        );
    }

    mesh
}

fn process_cell(
    grid: &SampleGrid,
    iso: f64,
    (ix, iy, iz): (usize, usize, usize),
    slab: &mut Slab,
    local: &mut HashMap<usize, u32>,
) {
    let values = grid.values();
    let mut corner_values = [0.0; 8];
    let mut corner_index = [0usize; 8];
    let mut cube = 0usize;

    for (corner, offset) in CORNER_OFFSETS.iter().enumerate() {
        let index = grid.index(ix + offset[0], iy + offset[1], iz + offset[2]);
        corner_index[corner] = index;
        corner_values[corner] = values[index];
        if values[index] > iso {
            cube |= 1 << corner;
        }
    }

    let edges = EDGE_TABLE[cube];
    if edges == 0 {
        return;
    }

    let mut edge_vertex = [0u32; 12];
    for (edge, &[c0, c1]) in EDGE_CORNERS.iter().enumerate() {
        if edges & (1 << edge) == 0 {
            continue;
        }

        // Edges are keyed by their lower grid point and axis so that every
        // cell touching the edge finds the same vertex.
        let (lower, upper) = if corner_index[c0] < corner_index[c1] { (c0, c1) } else { (c1, c0) };
        let axis = edge_axis(&CORNER_OFFSETS[lower], &CORNER_OFFSETS[upper]);
        let key = corner_index[lower] * 3 + axis;

        edge_vertex[edge] = *local.entry(key).or_insert_with(|| {
            let p0 = corner_position(grid, (ix, iy, iz), lower);
            let p1 = corner_position(grid, (ix, iy, iz), upper);
            let position = interpolate(p0, p1, corner_values[lower], corner_values[upper], iso);
            slab.vertices.push((key, position));
            (slab.vertices.len() - 1) as u32
        });
    }

    // The table winds towards the inside corners; swap to wind outwards.
    for tri in TRI_TABLE[cube].chunks_exact(3) {
        if tri[0] < 0 {
            break;
        }
        slab.triangles.push([
            edge_vertex[tri[0] as usize],
            edge_vertex[tri[2] as usize],
            edge_vertex[tri[1] as usize],
        ]);
    }
}

fn edge_axis(a: &[usize; 3], b: &[usize; 3]) -> usize {
    (0..3).find(|&axis| a[axis] != b[axis]).unwrap_or(0)
}

fn corner_position(grid: &SampleGrid, (ix, iy, iz): (usize, usize, usize), corner: usize) -> Point3<f64> {
    let offset = CORNER_OFFSETS[corner];
    grid.position(ix + offset[0], iy + offset[1], iz + offset[2])
}

/// Point on the segment where the linear interpolant crosses `iso`.
fn interpolate(p0: Point3<f64>, p1: Point3<f64>, v0: f64, v1: f64, iso: f64) -> Point3<f64> {
    let delta = v1 - v0;
    let t = if delta.abs() > f64::EPSILON {
        ((iso - v0) / delta).clamp(0.0, 1.0)
    } else {
        0.5
    };
    p0 + (p1 - p0) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ball_grid(resolution: usize) -> SampleGrid {
        let cell = 2.0 / (resolution - 1) as f64;
        let mut grid = SampleGrid::new(
            (resolution, resolution, resolution),
            Point3::new(-1.0, -1.0, -1.0),
            cell,
        );
        grid.fill(|p| 1.0 - p.coords.norm());
        grid
    }

    #[test]
    fn uniform_grid_has_no_surface() {
        let mut grid = SampleGrid::new((4, 4, 4), Point3::origin(), 1.0);
        grid.fill(|_| 1.0);
        assert!(marching_cubes(&grid, 0.5).is_empty());

        grid.fill(|_| 0.0);
        assert!(marching_cubes(&grid, 0.5).is_empty());
    }

    #[test]
    fn single_inside_corner() {
        let mut grid = SampleGrid::new((2, 2, 2), Point3::origin(), 1.0);
        grid.fill(|p| if p.coords.norm() < 0.1 { 1.0 } else { 0.0 });

        let mesh = marching_cubes(&grid, 0.5);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);

        // Face normal points away from the inside corner
        let [a, b, c] = mesh.triangle_positions(0).unwrap();
        let normal = (b - a).cross(&(c - a));
        assert!(normal.x > 0.0 && normal.y > 0.0 && normal.z > 0.0);
    }

    #[test]
    fn ball_is_outward_with_shared_vertices() {
        let mesh = marching_cubes(&ball_grid(17), 0.5);

        assert!(!mesh.is_empty());
        let volume = mesh.signed_volume();
        let expected = 4.0 / 3.0 * std::f64::consts::PI * 0.125;
        assert!(volume > 0.0);
        assert_relative_eq!(volume, expected, max_relative = 0.15);

        // Shared vertices: no edge is used by more than two triangles
        let mut edges: HashMap<(u32, u32), usize> = HashMap::new();
        for t in &mesh.triangles {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                *edges.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
        assert!(edges.values().all(|&count| count <= 2));
        assert!(edges.values().filter(|&&count| count == 2).count() > edges.len() / 2);
    }

    #[test]
    fn vertices_lie_on_the_surface() {
        let mesh = marching_cubes(&ball_grid(21), 0.5);
        for p in &mesh.positions {
            assert_relative_eq!(p.coords.norm(), 0.5, epsilon = 0.02);
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let grid = ball_grid(19);
        assert_eq!(marching_cubes(&grid, 0.5), marching_cubes(&grid, 0.5));
    }

    #[test]
    fn interpolation_handles_flat_edges() {
        let p = interpolate(Point3::origin(), Point3::new(1.0, 0.0, 0.0), 0.5, 0.5, 0.5);
        assert_relative_eq!(p.x, 0.5);

        let p = interpolate(Point3::origin(), Point3::new(1.0, 0.0, 0.0), 1.0, 0.0, 0.75);
        assert_relative_eq!(p.x, 0.25);
    }
}
