//! Blended field evaluation and isosurface extraction for implicit skinning.
//!
//! Turns a [`Skeleton`](skin_skeleton::Skeleton) into triangle geometry:
//!
//! 1. [`FieldPlan`] resolves the skeleton once: pose snapshot, per-bone blend
//!    operators, support boxes
//! 2. [`SampleGrid`] samples the blended field over the support, one z-slab
//!    per rayon task
//! 3. [`marching_cubes`] extracts the iso surface with shared vertices and
//!    outward winding
//! 4. Normals come from the field gradient
//!
//! [`polygonize`] runs the whole pipeline.
//!
//! # Blending
//!
//! Each bone combines its own value with its children's blended values
//! (`[own, child_1, .., child_k]`, children ascending) using its
//! [`BlendOperator`](skin_field::BlendOperator). Roots are combined with
//! [`BlendParams::root_operator`]. Operators are chosen per bone through
//! [`BlendParams`].
//!
//! # Determinism
//!
//! Geometry is a pure function of the skeleton's pose snapshot and the
//! parameters. Parallel results are merged in grid order, so repeated runs
//! give identical output.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use skin_field::{BlendOperator, CapsuleField};
//! use skin_skeleton::{Bone, BoneId, Skeleton};
//! use skin_polygonize::{BlendParams, PolygonizeParams, polygonize};
//!
//! let field = Arc::new(CapsuleField::new(1.0, 0.4).unwrap());
//! let bones = vec![
//!     Arc::new(Bone::new(BoneId::new(0), field.clone())),
//!     Arc::new(Bone::new(BoneId::new(1), field)),
//! ];
//! let skeleton = Skeleton::new(bones, vec![None, Some(0)]).unwrap();
//!
//! let params = PolygonizeParams::preview()
//!     .with_cell_size(0.1)
//!     .with_blend(BlendParams::uniform(BlendOperator::Sum));
//! let mesh = polygonize(Some(&skeleton), &params).unwrap();
//!
//! assert!(!mesh.is_empty());
//! assert!(mesh.signed_volume() > 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod grid;
mod marching_cubes;
mod mesh;
mod params;
mod plan;
mod polygonize;
mod tables;

pub use error::{PolygonizeError, PolygonizeResult};
pub use grid::SampleGrid;
pub use marching_cubes::marching_cubes;
pub use mesh::MeshGeometry;
pub use params::{BlendParams, PolygonizeParams};
pub use plan::FieldPlan;
pub use polygonize::{polygonize, polygonize_plan};
