//! Bones: identity, field parameters and live transform.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::{Isometry3, Point3};
use parking_lot::RwLock;
use skin_field::{FieldBounds, ImplicitField};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque, stable bone identifier.
///
/// Ids are compared and hashed but carry no ordering meaning; they need not
/// be contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneId(u64);

impl BoneId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bone#{}", self.0)
    }
}

/// Hands out fresh [`BoneId`]s.
///
/// Create one per process (or per scene) and pass it to every bone producer.
#[derive(Debug, Default)]
pub struct BoneIdAllocator {
    next: AtomicU64,
}

impl BoneIdAllocator {
    /// Create an allocator starting at id 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Create an allocator whose first id is `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocate the next id.
    pub fn allocate(&self) -> BoneId {
        BoneId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// A rigid implicit-surface primitive.
///
/// Identity and field parameters are fixed at construction. The transform
/// (bone-local to world) is pose data and may be updated in place by the
/// bone's producer; skeletons pick it up on their next pose refresh.
#[derive(Debug)]
pub struct Bone {
    id: BoneId,
    field: Arc<dyn ImplicitField>,
    transform: RwLock<Isometry3<f64>>,
}

impl Bone {
    /// Create a bone at the identity transform.
    ///
    /// The field is shared, not copied.
    #[must_use]
    pub fn new(id: BoneId, field: Arc<dyn ImplicitField>) -> Self {
        Self {
            id,
            field,
            transform: RwLock::new(Isometry3::identity()),
        }
    }

    /// Set the initial transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Isometry3<f64>) -> Self {
        *self.transform.get_mut() = transform;
        self
    }

    /// The bone id.
    #[must_use]
    pub const fn id(&self) -> BoneId {
        self.id
    }

    /// The bone's field parameters.
    #[must_use]
    pub fn field(&self) -> &Arc<dyn ImplicitField> {
        &self.field
    }

    /// Current bone-local to world transform.
    #[must_use]
    pub fn transform(&self) -> Isometry3<f64> {
        *self.transform.read()
    }

    /// Replace the bone-local to world transform.
    pub fn set_transform(&self, transform: Isometry3<f64>) {
        *self.transform.write() = transform;
    }

    /// Field value at a world-space point under the current transform.
    #[must_use]
    pub fn world_value(&self, point: &Point3<f64>) -> f64 {
        let local = self.transform().inverse_transform_point(point);
        self.field.value(&local)
    }

    /// World-space support box under `transform`, if the field is bounded.
    #[must_use]
    pub fn world_support(&self, transform: &Isometry3<f64>) -> Option<FieldBounds> {
        self.field.support().map(|b| b.transformed(transform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use skin_field::SphereField;

    fn sphere_bone(id: u64) -> Bone {
        Bone::new(BoneId::new(id), Arc::new(SphereField::new(1.0).unwrap()))
    }

    #[test]
    fn allocator_is_sequential() {
        let ids = BoneIdAllocator::starting_at(10);
        assert_eq!(ids.allocate(), BoneId::new(10));
        assert_eq!(ids.allocate(), BoneId::new(11));
    }

    #[test]
    fn bone_id_display() {
        assert_eq!(BoneId::new(7).to_string(), "bone#7");
    }

    #[test]
    fn world_value_follows_transform() {
        let bone = sphere_bone(1);
        assert_relative_eq!(bone.world_value(&Point3::origin()), 1.0);

        bone.set_transform(Isometry3::translation(5.0, 0.0, 0.0));
        assert_relative_eq!(bone.world_value(&Point3::origin()), 0.0);
        assert_relative_eq!(bone.world_value(&Point3::new(5.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn shared_bone_sees_updates() {
        let bone = Arc::new(sphere_bone(1));
        let alias = Arc::clone(&bone);
        bone.set_transform(Isometry3::translation(0.0, 2.0, 0.0));
        assert_relative_eq!(alias.transform().translation.vector.y, 2.0);
    }

    #[test]
    fn world_support_moves_with_transform() {
        let bone = sphere_bone(1);
        let support = bone
            .world_support(&Isometry3::translation(0.0, 0.0, 3.0))
            .unwrap();
        assert_relative_eq!(support.min.z, 2.0);
        assert_relative_eq!(support.max.z, 4.0);
    }
}
