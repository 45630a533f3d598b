//! Sparse per-surface merge inputs.

use std::sync::Arc;

use crate::error::{SkeletonError, SkeletonResult};
use crate::skeleton::Skeleton;

/// Number of logical surface indices a [`SurfaceSlots`] accepts.
pub const MAX_SURFACES: usize = 1 << 16;

/// One surface's contribution to a merge.
#[derive(Debug, Clone, Default)]
pub struct SurfaceInput {
    /// The surface's sub-skeleton; `None` contributes no bones.
    pub skeleton: Option<Arc<Skeleton>>,
    /// Index of the surface this one attaches to, if any.
    pub parent: Option<usize>,
}

impl SurfaceInput {
    /// Create an input.
    #[must_use]
    pub const fn new(skeleton: Option<Arc<Skeleton>>, parent: Option<usize>) -> Self {
        Self { skeleton, parent }
    }

    /// Number of bones this surface contributes.
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.skeleton.as_ref().map_or(0, |s| s.bone_count())
    }
}

impl PartialEq for SurfaceInput {
    /// Sub-skeletons compare by identity, parents by value.
    fn eq(&self, other: &Self) -> bool {
        let same_skeleton = match (&self.skeleton, &other.skeleton) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_skeleton && self.parent == other.parent
    }
}

/// Surface inputs addressed by logical index.
///
/// Inputs can arrive in any order; storage grows to the highest index seen.
/// Indices never written are unset and behave like a surface with no bones
/// and no parent. Writes at or beyond [`MAX_SURFACES`] are rejected.
///
/// # Example
///
/// ```
/// use skin_skeleton::SurfaceSlots;
///
/// let mut slots = SurfaceSlots::new();
/// slots.set(3, None, Some(1)).unwrap();
/// assert_eq!(slots.len(), 4);
/// assert!(slots.get(0).is_none());
/// assert_eq!(slots.parents(), vec![None, None, None, Some(1)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SurfaceSlots {
    slots: Vec<Option<SurfaceInput>>,
}

impl SurfaceSlots {
    /// Create an empty set of slots.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Build slots from dense inputs.
    #[must_use]
    pub fn from_inputs(inputs: impl IntoIterator<Item = SurfaceInput>) -> Self {
        Self {
            slots: inputs.into_iter().map(Some).collect(),
        }
    }

    /// Number of logical indices (highest set index plus one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no index was ever set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Input at `index`, or `None` if unset.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SurfaceInput> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Set both the sub-skeleton and parent at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SkeletonError::SurfaceIndexOutOfRange`] if `index` is not
    /// below [`MAX_SURFACES`]. The slots are left unchanged.
    pub fn set(
        &mut self,
        index: usize,
        skeleton: Option<Arc<Skeleton>>,
        parent: Option<usize>,
    ) -> SkeletonResult<()> {
        *self.slot_mut(index)? = Some(SurfaceInput::new(skeleton, parent));
        Ok(())
    }

    /// Set only the sub-skeleton at `index`, keeping its parent.
    ///
    /// # Errors
    ///
    /// See [`SurfaceSlots::set`].
    pub fn set_skeleton(&mut self, index: usize, skeleton: Option<Arc<Skeleton>>) -> SkeletonResult<()> {
        self.slot_mut(index)?.get_or_insert_with(SurfaceInput::default).skeleton = skeleton;
        Ok(())
    }

    /// Set only the parent at `index`, keeping its sub-skeleton.
    ///
    /// # Errors
    ///
    /// See [`SurfaceSlots::set`].
    pub fn set_parent(&mut self, index: usize, parent: Option<usize>) -> SkeletonResult<()> {
        self.slot_mut(index)?.get_or_insert_with(SurfaceInput::default).parent = parent;
        Ok(())
    }

    /// Unset `index`. Storage does not shrink.
    ///
    /// Returns the previous input, if any.
    pub fn clear(&mut self, index: usize) -> Option<SurfaceInput> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Parent of every logical index; unset indices have no parent.
    #[must_use]
    pub fn parents(&self) -> Vec<Option<usize>> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().and_then(|s| s.parent))
            .collect()
    }

    /// Sub-skeleton at `index`, if set and non-empty.
    #[must_use]
    pub fn skeleton(&self, index: usize) -> Option<&Arc<Skeleton>> {
        self.get(index).and_then(|s| s.skeleton.as_ref())
    }

    /// Iterate over `(index, input)` for every logical index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&SurfaceInput>)> {
        self.slots.iter().enumerate().map(|(i, s)| (i, s.as_ref()))
    }

    fn slot_mut(&mut self, index: usize) -> SkeletonResult<&mut Option<SurfaceInput>> {
        if index >= MAX_SURFACES {
            return Err(SkeletonError::SurfaceIndexOutOfRange {
                index,
                max: MAX_SURFACES,
            });
        }
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        Ok(&mut self.slots[index])
    }
}

impl PartialEq for SurfaceSlots {
    /// Trailing unset indices are not significant.
    fn eq(&self, other: &Self) -> bool {
        let len = self.slots.len().max(other.slots.len());
        (0..len).all(|i| self.get(i) == other.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::{Bone, BoneId};
    use skin_field::SphereField;

    fn skeleton(id: u64) -> Arc<Skeleton> {
        let field = Arc::new(SphereField::new(1.0).unwrap());
        Arc::new(Skeleton::single(Arc::new(Bone::new(BoneId::new(id), field))))
    }

    #[test]
    fn grows_out_of_order() {
        let mut slots = SurfaceSlots::new();
        slots.set(2, Some(skeleton(2)), None).unwrap();
        slots.set(0, Some(skeleton(0)), None).unwrap();

        assert_eq!(slots.len(), 3);
        assert!(slots.get(1).is_none());
        assert!(slots.skeleton(2).is_some());
        assert!(slots.skeleton(1).is_none());
    }

    #[test]
    fn index_limit_is_enforced() {
        let mut slots = SurfaceSlots::new();
        slots.set(0, Some(skeleton(0)), None).unwrap();

        let expected = SkeletonError::SurfaceIndexOutOfRange {
            index: usize::MAX,
            max: MAX_SURFACES,
        };
        assert_eq!(slots.set(usize::MAX, None, None), Err(expected.clone()));
        assert_eq!(slots.set_skeleton(usize::MAX, None), Err(expected.clone()));
        assert_eq!(slots.set_parent(usize::MAX, Some(0)), Err(expected));
        assert!(slots.set(MAX_SURFACES, None, None).is_err());
        assert_eq!(slots.len(), 1);

        slots.set(MAX_SURFACES - 1, None, None).unwrap();
        assert_eq!(slots.len(), MAX_SURFACES);
    }

    #[test]
    fn partial_updates_keep_the_other_field() {
        let mut slots = SurfaceSlots::new();
        let s = skeleton(1);
        slots.set_parent(1, Some(0)).unwrap();
        slots.set_skeleton(1, Some(Arc::clone(&s))).unwrap();

        let input = slots.get(1).unwrap();
        assert_eq!(input.parent, Some(0));
        assert!(Arc::ptr_eq(input.skeleton.as_ref().unwrap(), &s));
        assert_eq!(input.bone_count(), 1);
    }

    #[test]
    fn clear_unsets() {
        let mut slots = SurfaceSlots::new();
        slots.set(0, Some(skeleton(0)), None).unwrap();
        assert!(slots.clear(0).is_some());
        assert!(slots.get(0).is_none());
        assert_eq!(slots.len(), 1);
        assert!(slots.clear(5).is_none());
    }

    #[test]
    fn equality_by_identity() {
        let s = skeleton(0);
        let mut a = SurfaceSlots::new();
        let mut b = SurfaceSlots::new();
        a.set(0, Some(Arc::clone(&s)), None).unwrap();
        b.set(0, Some(Arc::clone(&s)), None).unwrap();
        assert_eq!(a, b);

        // Same id, different bone object
        b.set(0, Some(skeleton(0)), None).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn equality_ignores_trailing_unset() {
        let s = skeleton(0);
        let mut a = SurfaceSlots::new();
        let mut b = SurfaceSlots::new();
        a.set(0, Some(Arc::clone(&s)), None).unwrap();
        b.set(0, Some(s), None).unwrap();
        b.set(4, None, None).unwrap();
        b.clear(4);
        assert_eq!(a, b);
    }

    #[test]
    fn parent_change_is_a_difference() {
        let s = skeleton(0);
        let mut a = SurfaceSlots::new();
        a.set(0, Some(Arc::clone(&s)), None).unwrap();
        let mut b = a.clone();
        b.set_parent(0, Some(3)).unwrap();
        assert_ne!(a, b);
    }
}
