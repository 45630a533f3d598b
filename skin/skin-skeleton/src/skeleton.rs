//! The skeleton container.

use std::sync::Arc;

use hashbrown::HashMap;
use nalgebra::Isometry3;
use parking_lot::RwLock;
use skin_field::FieldBounds;

use crate::bone::{Bone, BoneId};
use crate::error::{SkeletonError, SkeletonResult};

/// A non-empty list of bones plus a parent relation.
///
/// Invariants, checked by [`Skeleton::new`]:
/// - At least one bone
/// - Every parent position is strictly less than its child's position
///
/// The same bone (and so the same [`BoneId`]) may occur at more than one
/// position when a skeleton is merged from aliasing inputs; id lookups return
/// the first occurrence.
///
/// Besides structure, a skeleton holds a pose snapshot: one world transform
/// per position, copied from the bones by [`Skeleton::update_bones_data`].
/// Structure never changes after construction; the snapshot is refreshed in
/// place.
#[derive(Debug)]
pub struct Skeleton {
    bones: Vec<Arc<Bone>>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    first_position: HashMap<BoneId, usize>,
    pose: RwLock<Vec<Isometry3<f64>>>,
}

impl Skeleton {
    /// Create a skeleton from bones and parent positions.
    ///
    /// `parents[i]` is the position of bone `i`'s parent, or `None` for a
    /// root.
    ///
    /// # Errors
    ///
    /// - [`SkeletonError::EmptySkeleton`] if `bones` is empty
    /// - [`SkeletonError::LengthMismatch`] if the lists differ in length
    /// - [`SkeletonError::ParentOutOfOrder`] if a parent does not precede
    ///   its child
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use skin_field::CapsuleField;
    /// use skin_skeleton::{Bone, BoneId, Skeleton};
    ///
    /// let field = Arc::new(CapsuleField::new(1.0, 0.4).unwrap());
    /// let bones = vec![
    ///     Arc::new(Bone::new(BoneId::new(0), field.clone())),
    ///     Arc::new(Bone::new(BoneId::new(1), field)),
    /// ];
    /// let skeleton = Skeleton::new(bones, vec![None, Some(0)]).unwrap();
    /// assert_eq!(skeleton.parent(BoneId::new(1)), Some(BoneId::new(0)));
    /// ```
    pub fn new(bones: Vec<Arc<Bone>>, parents: Vec<Option<usize>>) -> SkeletonResult<Self> {
        if bones.is_empty() {
            return Err(SkeletonError::EmptySkeleton);
        }
        if bones.len() != parents.len() {
            return Err(SkeletonError::LengthMismatch {
                bones: bones.len(),
                parents: parents.len(),
            });
        }

        let mut children = vec![Vec::new(); bones.len()];
        for (position, parent) in parents.iter().enumerate() {
            if let Some(parent) = *parent {
                if parent >= position {
                    return Err(SkeletonError::ParentOutOfOrder { position, parent });
                }
                children[parent].push(position);
            }
        }

        let mut first_position = HashMap::with_capacity(bones.len());
        for (position, bone) in bones.iter().enumerate() {
            first_position.entry(bone.id()).or_insert(position);
        }

        let pose = bones.iter().map(|b| b.transform()).collect();

        Ok(Self {
            bones,
            parents,
            children,
            first_position,
            pose: RwLock::new(pose),
        })
    }

    /// A skeleton holding a single root bone.
    #[must_use]
    pub fn single(bone: Arc<Bone>) -> Self {
        let mut first_position = HashMap::with_capacity(1);
        first_position.insert(bone.id(), 0);
        let pose = vec![bone.transform()];

        Self {
            bones: vec![bone],
            parents: vec![None],
            children: vec![Vec::new()],
            first_position,
            pose: RwLock::new(pose),
        }
    }

    /// Number of bones (always at least 1).
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Bones in position order.
    #[must_use]
    pub fn bones(&self) -> &[Arc<Bone>] {
        &self.bones
    }

    /// Bone ids in position order.
    pub fn bone_ids(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.bones.iter().map(|b| b.id())
    }

    /// Bone at a position.
    #[must_use]
    pub fn bone_at(&self, position: usize) -> Option<&Arc<Bone>> {
        self.bones.get(position)
    }

    /// First bone with the given id.
    #[must_use]
    pub fn bone(&self, id: BoneId) -> Option<&Arc<Bone>> {
        self.position_of(id).map(|p| &self.bones[p])
    }

    /// First position holding the given id.
    #[must_use]
    pub fn position_of(&self, id: BoneId) -> Option<usize> {
        self.first_position.get(&id).copied()
    }

    /// Id of the parent of the (first) bone with the given id.
    #[must_use]
    pub fn parent(&self, id: BoneId) -> Option<BoneId> {
        let position = self.position_of(id)?;
        self.parents[position].map(|p| self.bones[p].id())
    }

    /// Parent position of the bone at `position`.
    #[must_use]
    pub fn parent_position(&self, position: usize) -> Option<usize> {
        self.parents.get(position).copied().flatten()
    }

    /// All parent positions, indexed by bone position.
    #[must_use]
    pub fn parents(&self) -> &[Option<usize>] {
        &self.parents
    }

    /// Child positions of the bone at `position`, ascending.
    #[must_use]
    pub fn children(&self, position: usize) -> &[usize] {
        self.children.get(position).map(Vec::as_slice).unwrap_or_default()
    }

    /// Positions of root bones, ascending.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.parents
            .iter()
            .enumerate()
            .filter_map(|(position, parent)| parent.is_none().then_some(position))
    }

    /// Whether both skeletons hold the same bones (by identity) with the same
    /// parent relation.
    #[must_use]
    pub fn same_structure(&self, other: &Self) -> bool {
        self.parents == other.parents
            && self
                .bones
                .iter()
                .zip(&other.bones)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }

    // =========================================================================
    // Pose
    // =========================================================================

    /// Re-read every bone's transform into the pose snapshot.
    ///
    /// This is the cheap pose refresh path: structure is untouched.
    pub fn update_bones_data(&self) {
        let mut pose = self.pose.write();
        for (slot, bone) in pose.iter_mut().zip(&self.bones) {
            *slot = bone.transform();
        }
    }

    /// Set the transform of the bone at `position` and refresh its snapshot
    /// entry.
    ///
    /// The bone is shared, so other skeletons holding it see the new
    /// transform after their own refresh. Returns `false` if `position` is out
    /// of range.
    pub fn set_bone_transform(&self, position: usize, transform: Isometry3<f64>) -> bool {
        let Some(bone) = self.bones.get(position) else {
            return false;
        };
        bone.set_transform(transform);
        let mut pose = self.pose.write();
        for (slot, other) in pose.iter_mut().zip(&self.bones) {
            if Arc::ptr_eq(other, bone) {
                *slot = transform;
            }
        }
        true
    }

    /// Snapshot transform of the bone at `position`.
    #[must_use]
    pub fn bone_transform(&self, position: usize) -> Option<Isometry3<f64>> {
        self.pose.read().get(position).copied()
    }

    /// Copy of the whole pose snapshot, indexed by position.
    #[must_use]
    pub fn pose(&self) -> Vec<Isometry3<f64>> {
        self.pose.read().clone()
    }

    /// World-space box enclosing every bone's support under the current
    /// snapshot.
    ///
    /// Returns `None` if any bone's field is unbounded.
    #[must_use]
    pub fn world_bounds(&self) -> Option<FieldBounds> {
        let pose = self.pose.read();
        let mut result: Option<FieldBounds> = None;
        for (bone, transform) in self.bones.iter().zip(pose.iter()) {
            let support = bone.world_support(transform)?;
            result = Some(match result {
                Some(bounds) => bounds.union(&support),
                None => support,
            });
        }
        result
    }
}
