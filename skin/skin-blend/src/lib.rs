//! Incremental update controller for implicit skinning.
//!
//! An [`ImplicitBlend`] node owns the sparse per-surface inputs, the merged
//! [`Skeleton`](skin_skeleton::Skeleton) and the polygonized geometry. It
//! rebuilds the skeleton only when the inputs change structurally, refreshes
//! the pose separately, and recomputes geometry on request.
//!
//! Which outputs an input change invalidates is described by an explicit
//! [`AttributeDependencies`] registry, built once and shared between nodes.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use skin_field::CapsuleField;
//! use skin_skeleton::{Bone, BoneId, Skeleton};
//! use skin_polygonize::PolygonizeParams;
//! use skin_blend::{AttributeDependencies, ImplicitBlend, UpdateOutcome};
//!
//! let deps = Arc::new(AttributeDependencies::implicit_blend());
//! let mut node = ImplicitBlend::new("finger", deps).with_params(PolygonizeParams::default());
//!
//! let field = Arc::new(CapsuleField::new(1.0, 0.5).unwrap());
//! let phalanx = Arc::new(Skeleton::single(Arc::new(Bone::new(BoneId::new(0), field))));
//! node.set_surface(0, Some(phalanx), None).unwrap();
//!
//! assert_eq!(node.update_skeleton(), UpdateOutcome::Rebuilt { bones: 1 });
//! assert_eq!(node.update_skeleton(), UpdateOutcome::Unchanged);
//! assert!(!node.mesh_geometry().unwrap().is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod dependencies;
mod node;
mod outcome;

pub use dependencies::{AttributeDependencies, BlendAttribute};
pub use node::ImplicitBlend;
pub use outcome::UpdateOutcome;
