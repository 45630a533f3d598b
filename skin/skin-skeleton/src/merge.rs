//! Skeleton merge builder.

use std::sync::Arc;

use tracing::debug;

use crate::bone::Bone;
use crate::error::SkeletonResult;
use crate::hierarchy::hierarchy_order;
use crate::skeleton::Skeleton;
use crate::surfaces::SurfaceSlots;

/// Merge per-surface sub-skeletons into one skeleton.
///
/// Surfaces are processed parents-first (see [`hierarchy_order`]). Each
/// surface appends all of its bones, keeping their internal parent relation.
/// Root bones of a surface attach to the first bone appended for the parent
/// surface; when that surface contributed no bones (or there is no parent
/// surface) they stay roots.
///
/// Bones are shared, not copied. A bone present in several surfaces gets one
/// entry per surface.
///
/// Returns `Ok(None)` when no surface contributes a bone.
///
/// # Errors
///
/// - [`SkeletonError::CyclicAttachment`](crate::SkeletonError::CyclicAttachment)
///   if the surface parents form a cycle; nothing is produced
/// - Any [`Skeleton::new`] error if a sub-skeleton breaks its own invariants
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use skin_field::SphereField;
/// use skin_skeleton::{Bone, BoneId, Skeleton, SurfaceSlots, merge_skeletons};
///
/// let field = Arc::new(SphereField::new(1.0).unwrap());
/// let single = |id| Arc::new(Skeleton::single(Arc::new(Bone::new(BoneId::new(id), field.clone()))));
///
/// let mut surfaces = SurfaceSlots::new();
/// surfaces.set(0, Some(single(0)), Some(1)).unwrap();
/// surfaces.set(1, Some(single(1)), Some(0)).unwrap();
///
/// let err = merge_skeletons(&surfaces).unwrap_err();
/// assert!(err.is_cycle());
/// ```
pub fn merge_skeletons(surfaces: &SurfaceSlots) -> SkeletonResult<Option<Skeleton>> {
    let order = hierarchy_order(&surfaces.parents())?;

    let total: usize = surfaces
        .iter()
        .filter_map(|(_, input)| input)
        .map(|input| input.bone_count())
        .sum();

    let mut bones: Vec<Arc<Bone>> = Vec::with_capacity(total);
    let mut parents: Vec<Option<usize>> = Vec::with_capacity(total);
    let mut first_bone: Vec<Option<usize>> = vec![None; surfaces.len()];

    for surface in order {
        let Some(input) = surfaces.get(surface) else {
            continue;
        };
        let Some(sub) = input.skeleton.as_ref() else {
            continue;
        };

        // Root bones of this surface attach here. Out of range parents were
        // already reported by the resolver.
        let attach = input
            .parent
            .and_then(|parent| first_bone.get(parent).copied().flatten());

        let base = bones.len();
        first_bone[surface] = Some(base);

        for (local, bone) in sub.bones().iter().enumerate() {
            bones.push(Arc::clone(bone));
            parents.push(match sub.parent_position(local) {
                Some(local_parent) => Some(base + local_parent),
                None => attach,
            });
        }
    }

    if bones.is_empty() {
        debug!(surfaces = surfaces.len(), "merge produced no bones");
        return Ok(None);
    }

    debug!(
        surfaces = surfaces.len(),
        bones = bones.len(),
        "merged surface skeletons"
    );

    Skeleton::new(bones, parents).map(Some)
}
