//! Implicit skinning core.
//!
//! Builds one skeleton out of independently authored implicit bone surfaces
//! and their attachment graph, then turns the blended implicit field of that
//! skeleton into triangle geometry.
//!
//! This umbrella crate re-exports the `skin-*` crates:
//!
//! - [`field`] - Per-bone implicit fields, primitives and blend operators
//! - [`skeleton`] - Bones, skeletons, hierarchy ordering and the merge builder
//! - [`polygonize`] - Field evaluation plans, sampling and marching cubes
//! - [`blend`] - The incremental update controller node
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use skin::prelude::*;
//!
//! let deps = Arc::new(AttributeDependencies::implicit_blend());
//! let mut node = ImplicitBlend::new("leg", deps).with_params(PolygonizeParams::default());
//!
//! let ids = BoneIdAllocator::new();
//! let thigh = Arc::new(CapsuleField::new(1.5, 0.6).unwrap());
//! let shin = Arc::new(CapsuleField::new(1.2, 0.5).unwrap());
//!
//! let upper = Bone::new(ids.allocate(), thigh);
//! let lower = Bone::new(ids.allocate(), shin).with_transform(Isometry3::translation(0.0, 1.5, 0.0));
//!
//! node.set_surface(0, Some(Arc::new(Skeleton::single(Arc::new(upper)))), None).unwrap();
//! node.set_surface(1, Some(Arc::new(Skeleton::single(Arc::new(lower)))), Some(0)).unwrap();
//!
//! let skeleton = node.world_implicit().unwrap();
//! assert_eq!(skeleton.parents(), &[None, Some(0)]);
//!
//! let mesh = node.mesh_geometry().unwrap();
//! assert!(mesh.triangle_count() > 0);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

// =============================================================================
// Re-exports
// =============================================================================

/// Per-bone implicit fields, primitives and blend operators.
pub use skin_field as field;

/// Bones, skeletons, hierarchy ordering and the merge builder.
pub use skin_skeleton as skeleton;

/// Field evaluation plans, sampling and marching cubes.
pub use skin_polygonize as polygonize;

/// The incremental update controller node.
pub use skin_blend as blend;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for implicit skinning.
///
/// # Usage
///
/// ```
/// use skin::prelude::*;
/// ```
pub mod prelude {
    // Fields
    pub use skin_field::{
        BlendOperator, CapsuleField, Combinator, FieldBounds, ImplicitField, Isometry3, Point3,
        SphereField, Vector3,
    };

    // Skeletons
    pub use skin_skeleton::{
        Bone, BoneId, BoneIdAllocator, Skeleton, SkeletonError, SurfaceSlots, hierarchy_order,
        merge_skeletons,
    };

    // Polygonization
    pub use skin_polygonize::{BlendParams, MeshGeometry, PolygonizeParams, polygonize};

    // Controller
    pub use skin_blend::{AttributeDependencies, BlendAttribute, ImplicitBlend, UpdateOutcome};
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports() {
        let surfaces = SurfaceSlots::new();
        assert!(merge_skeletons(&surfaces).unwrap().is_none());
        assert!(polygonize(None, &PolygonizeParams::default()).unwrap().is_empty());
    }
}
