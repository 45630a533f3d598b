//! Attribute dependency registry for blend nodes.

use std::fmt;

use hashbrown::{HashMap, HashSet};

/// Inputs and outputs of an [`ImplicitBlend`](crate::ImplicitBlend) node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlendAttribute {
    /// The per-surface input array as a whole.
    Surfaces,
    /// One surface's sub-skeleton.
    Implicit,
    /// One surface's parent surface index.
    ParentIndex,
    /// The merged skeleton output.
    WorldImplicit,
    /// The polygonized geometry output.
    MeshGeometryUpdate,
}

impl fmt::Display for BlendAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Surfaces => "surfaces",
            Self::Implicit => "implicit",
            Self::ParentIndex => "parentIdx",
            Self::WorldImplicit => "worldImplicit",
            Self::MeshGeometryUpdate => "meshGeometryUpdate",
        };
        f.write_str(name)
    }
}

/// Directed "affects" relation between attributes.
///
/// Built once and shared by every node of a kind; nothing here is global.
///
/// # Example
///
/// ```
/// use skin_blend::{AttributeDependencies, BlendAttribute};
///
/// let deps = AttributeDependencies::implicit_blend();
/// assert!(deps.is_affected_by(BlendAttribute::MeshGeometryUpdate, BlendAttribute::ParentIndex));
/// assert!(!deps.is_affected_by(BlendAttribute::Implicit, BlendAttribute::WorldImplicit));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AttributeDependencies {
    affects: HashMap<BlendAttribute, Vec<BlendAttribute>>,
}

impl AttributeDependencies {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry used by [`ImplicitBlend`](crate::ImplicitBlend):
    ///
    /// - `implicit`, `parentIdx` and `surfaces` affect `worldImplicit`
    /// - `worldImplicit` affects `meshGeometryUpdate`
    #[must_use]
    pub fn implicit_blend() -> Self {
        let mut deps = Self::new();
        deps.add(BlendAttribute::Implicit, BlendAttribute::WorldImplicit);
        deps.add(BlendAttribute::WorldImplicit, BlendAttribute::MeshGeometryUpdate);
        deps.add(BlendAttribute::ParentIndex, BlendAttribute::WorldImplicit);
        deps.add(BlendAttribute::Surfaces, BlendAttribute::WorldImplicit);
        deps
    }

    /// Record that changing `source` changes `target`.
    pub fn add(&mut self, source: BlendAttribute, target: BlendAttribute) {
        let targets = self.affects.entry(source).or_default();
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    /// Attributes directly affected by `source`, in insertion order.
    #[must_use]
    pub fn direct_dependents(&self, source: BlendAttribute) -> &[BlendAttribute] {
        self.affects.get(&source).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether changing `source` (transitively) changes `target`.
    ///
    /// Every attribute affects itself.
    #[must_use]
    pub fn is_affected_by(&self, target: BlendAttribute, source: BlendAttribute) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![source];

        while let Some(attribute) = pending.pop() {
            if attribute == target {
                return true;
            }
            if visited.insert(attribute) {
                pending.extend_from_slice(self.direct_dependents(attribute));
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BlendAttribute::{Implicit, MeshGeometryUpdate, ParentIndex, Surfaces, WorldImplicit};

    #[test]
    fn blend_registry() {
        let deps = AttributeDependencies::implicit_blend();

        for input in [Surfaces, Implicit, ParentIndex] {
            assert!(deps.is_affected_by(WorldImplicit, input));
            assert!(deps.is_affected_by(MeshGeometryUpdate, input));
        }
        assert!(deps.is_affected_by(MeshGeometryUpdate, WorldImplicit));
        assert!(!deps.is_affected_by(WorldImplicit, MeshGeometryUpdate));
        assert!(!deps.is_affected_by(Surfaces, Implicit));
    }

    #[test]
    fn reflexive() {
        let deps = AttributeDependencies::new();
        assert!(deps.is_affected_by(Implicit, Implicit));
        assert!(!deps.is_affected_by(WorldImplicit, Implicit));
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut deps = AttributeDependencies::new();
        deps.add(Implicit, WorldImplicit);
        deps.add(Implicit, WorldImplicit);
        assert_eq!(deps.direct_dependents(Implicit), &[WorldImplicit]);
        assert!(deps.direct_dependents(Surfaces).is_empty());
    }

    #[test]
    fn cyclic_registry_terminates() {
        let mut deps = AttributeDependencies::new();
        deps.add(Implicit, WorldImplicit);
        deps.add(WorldImplicit, Implicit);
        assert!(!deps.is_affected_by(Surfaces, Implicit));
        assert!(deps.is_affected_by(Implicit, WorldImplicit));
    }

    #[test]
    fn display_names() {
        assert_eq!(ParentIndex.to_string(), "parentIdx");
        assert_eq!(MeshGeometryUpdate.to_string(), "meshGeometryUpdate");
    }
}
