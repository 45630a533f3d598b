//! Bone and skeleton data model for implicit skinning.
//!
//! A [`Skeleton`] is a flat list of shared [`Bone`]s plus a parent relation in
//! which every parent precedes its children. Skeletons are composed from
//! independently authored sub-skeletons ("surfaces") by [`merge_skeletons`],
//! which orders surfaces with [`hierarchy_order`] and rejects cyclic
//! attachments.
//!
//! # Overview
//!
//! - [`Bone`] - Identity, shared field parameters, live transform
//! - [`Skeleton`] - Bones plus parent positions and a pose snapshot
//! - [`SurfaceSlots`] - Sparse, growable per-surface inputs
//! - [`hierarchy_order`] - Parents-first ordering of a parent-index array
//! - [`merge_skeletons`] - Flatten surfaces and their attachments into one
//!   skeleton
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use skin_field::SphereField;
//! use skin_skeleton::{Bone, BoneId, Skeleton, SurfaceSlots, merge_skeletons};
//!
//! let field = Arc::new(SphereField::new(1.0).unwrap());
//! let hand = Arc::new(Skeleton::single(Arc::new(Bone::new(BoneId::new(1), field.clone()))));
//! let finger = Arc::new(Skeleton::single(Arc::new(Bone::new(BoneId::new(2), field))));
//!
//! let mut surfaces = SurfaceSlots::new();
//! surfaces.set(0, Some(hand), None).unwrap();
//! surfaces.set(1, Some(finger), Some(0)).unwrap();
//!
//! let merged = merge_skeletons(&surfaces).unwrap().unwrap();
//! assert_eq!(merged.bone_count(), 2);
//! assert_eq!(merged.parent_position(1), Some(0));
//! ```
//!
//! # Ownership
//!
//! Bones are reference counted. Merging never copies a bone: the merged
//! skeleton holds the same `Arc<Bone>` as its inputs, and a bone that appears
//! in several inputs appears once per input in the output.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bone;
mod error;
mod hierarchy;
mod merge;
mod skeleton;
mod surfaces;

pub use bone::{Bone, BoneId, BoneIdAllocator};
pub use error::{SkeletonError, SkeletonResult};
pub use hierarchy::hierarchy_order;
pub use merge::merge_skeletons;
pub use skeleton::Skeleton;
pub use surfaces::{MAX_SURFACES, SurfaceInput, SurfaceSlots};
